//! Filter storage.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::{FilterType, FilterUpdate, SmsFilter};
use crate::store::{decode_time, encode_time};
use crate::{Error, Result};

/// Repository for forwarding filters.
#[derive(Debug, Clone)]
pub struct FilterRepository {
    pool: SqlitePool,
}

impl FilterRepository {
    pub(crate) const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores a new filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails, including a
    /// duplicate id.
    pub async fn create(&self, filter: &SmsFilter) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO sms_filters (id, name, filter_type, filter_value, enabled, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&filter.id)
        .bind(&filter.name)
        .bind(filter.filter_type.as_str())
        .bind(&filter.filter_value)
        .bind(filter.enabled)
        .bind(encode_time(&filter.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a filter by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: &str) -> Result<Option<SmsFilter>> {
        let row = sqlx::query(
            r"
            SELECT id, name, filter_type, filter_value, enabled, created_at
            FROM sms_filters
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_filter).transpose()
    }

    /// Lists all filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<SmsFilter>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, filter_type, filter_value, enabled, created_at
            FROM sms_filters
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_filter).collect()
    }

    /// Lists enabled filters in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_enabled(&self) -> Result<Vec<SmsFilter>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, filter_type, filter_value, enabled, created_at
            FROM sms_filters
            WHERE enabled = 1
            ORDER BY created_at ASC, rowid ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_filter).collect()
    }

    /// Applies a partial update.
    ///
    /// Returns whether any stored field actually changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FilterNotFound`] for an unknown id, or an error if
    /// the database query fails.
    pub async fn update(&self, id: &str, update: &FilterUpdate) -> Result<bool> {
        let mut filter = self
            .get(id)
            .await?
            .ok_or_else(|| Error::FilterNotFound(id.to_string()))?;

        if !update.apply(&mut filter) {
            return Ok(false);
        }

        sqlx::query(
            r"
            UPDATE sms_filters
            SET name = ?, filter_type = ?, filter_value = ?, enabled = ?
            WHERE id = ?
            ",
        )
        .bind(&filter.name)
        .bind(filter.filter_type.as_str())
        .bind(&filter.filter_value)
        .bind(filter.enabled)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Deletes a filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FilterNotFound`] for an unknown id, or an error if
    /// the database query fails.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM sms_filters WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::FilterNotFound(id.to_string()));
        }
        Ok(())
    }
}

fn row_to_filter(row: &SqliteRow) -> Result<SmsFilter> {
    let kind: String = row.get("filter_type");
    let created_at: String = row.get("created_at");

    Ok(SmsFilter {
        id: row.get("id"),
        name: row.get("name"),
        filter_type: FilterType::parse(&kind)
            .ok_or_else(|| Error::Corrupt(format!("unknown filter type {kind:?}")))?,
        filter_value: row.get("filter_value"),
        enabled: row.get("enabled"),
        created_at: decode_time(&created_at)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Store;
    use chrono::{Duration, TimeZone, Utc};

    async fn repo() -> FilterRepository {
        Store::in_memory().await.unwrap().filters()
    }

    fn filter_at(name: &str, minutes: i64) -> SmsFilter {
        let mut filter = SmsFilter::new(name, FilterType::Sender, Some(name.to_string()));
        filter.created_at =
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        filter
    }

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let repo = repo().await;
        repo.create(&filter_at("old", 0)).await.unwrap();
        repo.create(&filter_at("new", 5)).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_round_trip_fields() {
        let repo = repo().await;
        let mut filter = filter_at("bank", 1);
        filter.filter_type = FilterType::Keyword;
        filter.filter_value = None;
        filter.enabled = false;
        repo.create(&filter).await.unwrap();

        assert_eq!(repo.get(&filter.id).await.unwrap(), Some(filter));
    }

    #[tokio::test]
    async fn test_list_enabled_skips_disabled() {
        let repo = repo().await;
        let mut off = filter_at("off", 0);
        off.enabled = false;
        repo.create(&off).await.unwrap();
        repo.create(&filter_at("on", 1)).await.unwrap();

        let enabled = repo.list_enabled().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "on");
    }

    #[tokio::test]
    async fn test_update_partial() {
        let repo = repo().await;
        let filter = filter_at("bank", 0);
        repo.create(&filter).await.unwrap();

        let update = FilterUpdate {
            enabled: Some(false),
            ..FilterUpdate::default()
        };
        assert!(repo.update(&filter.id, &update).await.unwrap());
        assert!(!repo.update(&filter.id, &update).await.unwrap());

        let stored = repo.get(&filter.id).await.unwrap().unwrap();
        assert!(!stored.enabled);
        assert_eq!(stored.name, "bank");
        assert_eq!(stored.filter_value.as_deref(), Some("bank"));
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let err = repo()
            .await
            .update("nope", &FilterUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FilterNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let filter = filter_at("bank", 0);
        repo.create(&filter).await.unwrap();

        repo.delete(&filter.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(&filter.id).await,
            Err(Error::FilterNotFound(_))
        ));
    }
}
