//! Email configuration storage.
//!
//! Holds at most one configuration; saving replaces whatever was there.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::{DeliveryMethod, EmailConfig};
use crate::store::{decode_time, encode_time};
use crate::{Error, Result};

/// Repository for the active email configuration.
#[derive(Debug, Clone)]
pub struct EmailConfigRepository {
    pool: SqlitePool,
}

impl EmailConfigRepository {
    pub(crate) const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Replaces any stored configuration with `config`, stamping
    /// `updated_at` with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails; the previous
    /// configuration is then left in place.
    pub async fn replace(&self, mut config: EmailConfig) -> Result<EmailConfig> {
        config.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM email_configs")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r"
            INSERT INTO email_configs
                (id, email_type, smtp_server, smtp_port, smtp_username, smtp_password,
                 use_tls, recipient_email, sender_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&config.id)
        .bind(config.email_type.as_str())
        .bind(&config.smtp_server)
        .bind(config.smtp_port)
        .bind(&config.smtp_username)
        .bind(&config.smtp_password)
        .bind(config.use_tls)
        .bind(&config.recipient_email)
        .bind(&config.sender_name)
        .bind(encode_time(&config.created_at))
        .bind(encode_time(&config.updated_at))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(config)
    }

    /// Returns the most recently saved configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn current(&self) -> Result<Option<EmailConfig>> {
        let row = sqlx::query(
            r"
            SELECT id, email_type, smtp_server, smtp_port, smtp_username, smtp_password,
                   use_tls, recipient_email, sender_name, created_at, updated_at
            FROM email_configs
            ORDER BY updated_at DESC
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_config).transpose()
    }

    /// Removes the stored configuration.
    ///
    /// Returns true if one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn clear(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM email_configs")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_config(row: &SqliteRow) -> Result<EmailConfig> {
    let method: String = row.get("email_type");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(EmailConfig {
        id: row.get("id"),
        email_type: DeliveryMethod::parse(&method)
            .ok_or_else(|| Error::Corrupt(format!("unknown email type {method:?}")))?,
        smtp_server: row.get("smtp_server"),
        smtp_port: row.get("smtp_port"),
        smtp_username: row.get("smtp_username"),
        smtp_password: row.get("smtp_password"),
        use_tls: row.get("use_tls"),
        recipient_email: row.get("recipient_email"),
        sender_name: row.get("sender_name"),
        created_at: decode_time(&created_at)?,
        updated_at: decode_time(&updated_at)?,
    })
}
