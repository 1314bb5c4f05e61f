//! SMS log storage.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::{DeliveryStatus, SmsMessage, SmsStats};
use crate::Result;
use crate::store::{decode_time, encode_time};

/// Repository for the append-only SMS log.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub(crate) const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn insert(&self, sms: &SmsMessage) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO sms_messages
                (id, sender, content, timestamp, forwarded, forwarded_at,
                 email_status, error_message, attempts)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&sms.id)
        .bind(&sms.sender)
        .bind(&sms.content)
        .bind(encode_time(&sms.timestamp))
        .bind(sms.forwarded)
        .bind(sms.forwarded_at.as_ref().map(encode_time))
        .bind(sms.email_status.as_str())
        .bind(&sms.error_message)
        .bind(i64::from(sms.attempts))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: &str) -> Result<Option<SmsMessage>> {
        let row = sqlx::query(
            r"
            SELECT id, sender, content, timestamp, forwarded, forwarded_at,
                   email_status, error_message, attempts
            FROM sms_messages
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_message).transpose()
    }

    /// Lists records newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, limit: u32, skip: u32) -> Result<Vec<SmsMessage>> {
        let rows = sqlx::query(
            r"
            SELECT id, sender, content, timestamp, forwarded, forwarded_at,
                   email_status, error_message, attempts
            FROM sms_messages
            ORDER BY timestamp DESC, rowid DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect()
    }

    /// Computes statistics with "today" starting at UTC midnight.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stats(&self) -> Result<SmsStats> {
        self.stats_at(Utc::now()).await
    }

    /// Computes statistics as of `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stats_at(&self, now: DateTime<Utc>) -> Result<SmsStats> {
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map_or(now, |t| t.and_utc());
        let since = encode_time(&midnight);

        let row = sqlx::query(
            r"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(forwarded), 0) AS forwarded,
                COALESCE(SUM(email_status = 'failed'), 0) AS failed,
                COALESCE(SUM(timestamp >= ?), 0) AS today,
                COALESCE(SUM(timestamp >= ? AND forwarded), 0) AS today_forwarded
            FROM sms_messages
            ",
        )
        .bind(&since)
        .bind(&since)
        .fetch_one(&self.pool)
        .await?;

        #[allow(clippy::cast_sign_loss)]
        let count = |column: &str| row.get::<i64, _>(column).max(0) as u64;

        Ok(SmsStats::from_counts(
            count("total"),
            count("forwarded"),
            count("failed"),
            count("today"),
            count("today_forwarded"),
        ))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn row_to_message(row: &SqliteRow) -> Result<SmsMessage> {
    let timestamp: String = row.get("timestamp");
    let forwarded_at: Option<String> = row.get("forwarded_at");
    let status: String = row.get("email_status");

    Ok(SmsMessage {
        id: row.get("id"),
        sender: row.get("sender"),
        content: row.get("content"),
        timestamp: decode_time(&timestamp)?,
        forwarded: row.get("forwarded"),
        forwarded_at: forwarded_at.as_deref().map(decode_time).transpose()?,
        email_status: DeliveryStatus::parse(&status),
        error_message: row.get("error_message"),
        attempts: row.get::<i64, _>("attempts").max(0) as u32,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::Store;
    use crate::delivery::DeliveryReport;
    use chrono::{Duration, TimeZone};

    async fn repo() -> MessageRepository {
        Store::in_memory().await.unwrap().messages()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        let received = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        let mut sms = SmsMessage::new("+15551234567", "Your code is 1234", received);
        sms.record_delivery(&DeliveryReport::failed("relay down", 3), received);
        repo.insert(&sms).await.unwrap();

        let loaded = repo.get(&sms.id).await.unwrap().unwrap();
        assert_eq!(loaded, sms);
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_paging() {
        let repo = repo().await;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        for i in 0..5 {
            let sms = SmsMessage::new(format!("sender-{i}"), "x", base + Duration::minutes(i));
            repo.insert(&sms).await.unwrap();
        }

        let all = repo.list(100, 0).await.unwrap();
        let senders: Vec<&str> = all.iter().map(|m| m.sender.as_str()).collect();
        assert_eq!(
            senders,
            vec!["sender-4", "sender-3", "sender-2", "sender-1", "sender-0"]
        );

        let page = repo.list(2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].sender, "sender-3");
        assert_eq!(page[1].sender, "sender-2");

        assert!(repo.list(10, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_empty() {
        let stats = repo().await.stats().await.unwrap();
        assert_eq!(stats, SmsStats::default());
    }

    #[tokio::test]
    async fn test_stats_counts_and_today_window() {
        let repo = repo().await;
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();
        let yesterday = now - Duration::days(1);

        let mut sent_today = SmsMessage::new("a", "x", now - Duration::hours(2));
        sent_today.record_delivery(&DeliveryReport::sent(1), now);
        let mut failed_today = SmsMessage::new("b", "x", now - Duration::hours(1));
        failed_today.record_delivery(&DeliveryReport::failed("nope", 1), now);
        let mut sent_yesterday = SmsMessage::new("c", "x", yesterday);
        sent_yesterday.record_delivery(&DeliveryReport::sent(1), yesterday);
        let mut filtered = SmsMessage::new("d", "x", yesterday);
        filtered.skip(DeliveryStatus::Filtered);

        for sms in [&sent_today, &failed_today, &sent_yesterday, &filtered] {
            repo.insert(sms).await.unwrap();
        }

        let stats = repo.stats_at(now).await.unwrap();
        assert_eq!(stats.total_messages, 4);
        assert_eq!(stats.forwarded_messages, 2);
        assert_eq!(stats.failed_messages, 1);
        assert_eq!(stats.today_messages, 2);
        assert_eq!(stats.today_forwarded, 1);
        assert_eq!(stats.forwarding_rate, 50.0);
    }
}
