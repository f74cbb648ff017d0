//! Persisted row types and the recorder seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{SecretSource, SecretsConfig};

/// One row of the donations table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationRecord {
    pub user_id: String,
    /// Amount in ALGO, as requested by the donor.
    pub amount: f64,
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
}

/// One row of the certificates table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub user_id: String,
    /// Asset id as a decimal string.
    pub asa_id: String,
    pub issue_date: DateTime<Utc>,
    pub tx_hash: String,
}

/// Connection details for the hosted database.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    pub url: String,
    pub service_key: String,
}

impl DatabaseCredentials {
    /// Read both values from the secret source; `None` if either is missing.
    pub fn from_secrets(source: &dyn SecretSource, names: &SecretsConfig) -> Option<Self> {
        Some(Self {
            url: source.get(&names.database_url_var)?,
            service_key: source.get(&names.database_key_var)?,
        })
    }
}

impl std::fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Errors writing an outcome row.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Database credentials are not configured")]
    MissingCredentials,

    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    #[error("Database request failed: {0}")]
    Http(String),

    #[error("Database request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Database rejected insert into {table} ({status}): {body}")]
    Rejected {
        table: String,
        status: u16,
        body: String,
    },
}

/// Append-only store for transaction outcomes.
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Append a donation row.
    async fn insert_donation(
        &self,
        credentials: &DatabaseCredentials,
        record: &DonationRecord,
    ) -> Result<(), RecordError>;

    /// Append a certificate row.
    async fn insert_certificate(
        &self,
        credentials: &DatabaseCredentials,
        record: &CertificateRecord,
    ) -> Result<(), RecordError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticSecrets;

    #[test]
    fn test_credentials_require_both_values() {
        let names = SecretsConfig::default();
        let secrets = StaticSecrets::new([
            ("SUPABASE_URL", "https://db.example.org"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
        ]);

        let creds = DatabaseCredentials::from_secrets(&secrets, &names).unwrap();
        assert_eq!(creds.url, "https://db.example.org");

        let partial = secrets.without("SUPABASE_SERVICE_ROLE_KEY");
        assert!(DatabaseCredentials::from_secrets(&partial, &names).is_none());
    }

    #[test]
    fn test_credentials_debug_hides_key() {
        let creds = DatabaseCredentials {
            url: "https://db.example.org".into(),
            service_key: "very-secret".into(),
        };
        assert!(!format!("{:?}", creds).contains("very-secret"));
    }

    #[test]
    fn test_certificate_row_shape() {
        let record = CertificateRecord {
            user_id: "u1".into(),
            asa_id: "12345".into(),
            issue_date: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            tx_hash: "TX".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["asa_id"], "12345");
        assert_eq!(json["issue_date"], "2024-05-01T10:00:00Z");
    }
}
