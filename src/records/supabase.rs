//! PostgREST-backed recorder for a hosted Supabase project.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::timeout;

use crate::config::StorageConfig;
use crate::records::types::{
    CertificateRecord, DatabaseCredentials, DonationRecord, RecordError, Recorder,
};

/// Writes rows with `POST <url>/rest/v1/<table>`.
#[derive(Debug, Clone)]
pub struct SupabaseRecorder {
    http: reqwest::Client,
    config: StorageConfig,
}

impl SupabaseRecorder {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    async fn insert<T: Serialize + Sync>(
        &self,
        credentials: &DatabaseCredentials,
        table: &str,
        row: &T,
    ) -> Result<(), RecordError> {
        let base = url::Url::parse(&credentials.url)
            .map_err(|e| RecordError::InvalidUrl(e.to_string()))?;
        let endpoint = format!("{}/rest/v1/{}", base.as_str().trim_end_matches('/'), table);

        let request = self
            .http
            .post(&endpoint)
            .header("apikey", &credentials.service_key)
            .bearer_auth(&credentials.service_key)
            .header("Prefer", "return=minimal")
            .json(row)
            .send();

        let response = timeout(Duration::from_secs(self.config.timeout_secs), request)
            .await
            .map_err(|_| RecordError::Timeout(self.config.timeout_secs))?
            .map_err(|e| RecordError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecordError::Rejected {
                table: table.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(table = %table, "Row inserted");
        Ok(())
    }
}

#[async_trait]
impl Recorder for SupabaseRecorder {
    async fn insert_donation(
        &self,
        credentials: &DatabaseCredentials,
        record: &DonationRecord,
    ) -> Result<(), RecordError> {
        self.insert(credentials, &self.config.donations_table, record)
            .await
    }

    async fn insert_certificate(
        &self,
        credentials: &DatabaseCredentials,
        record: &CertificateRecord,
    ) -> Result<(), RecordError> {
        self.insert(credentials, &self.config.certificates_table, record)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_invalid_url_is_reported() {
        let recorder = SupabaseRecorder::new(StorageConfig::default());
        let credentials = DatabaseCredentials {
            url: "not a url".into(),
            service_key: "key".into(),
        };
        let record = DonationRecord {
            user_id: "u1".into(),
            amount: 1.0,
            tx_hash: "TX".into(),
            timestamp: Utc::now(),
        };

        let err = recorder
            .insert_donation(&credentials, &record)
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidUrl(_)));
    }
}
