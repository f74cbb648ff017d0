//! In-process recorder for tests and local runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::records::types::{
    CertificateRecord, DatabaseCredentials, DonationRecord, RecordError, Recorder,
};

/// Append-only rows keyed by user id.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    donations: Arc<DashMap<String, Vec<DonationRecord>>>,
    certificates: Arc<DashMap<String, Vec<CertificateRecord>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, or succeed again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn donations_for(&self, user_id: &str) -> Vec<DonationRecord> {
        self.donations
            .get(user_id)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }

    pub fn certificates_for(&self, user_id: &str) -> Vec<CertificateRecord> {
        self.certificates
            .get(user_id)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }

    /// Total rows across both tables.
    pub fn len(&self) -> usize {
        let donations: usize = self.donations.iter().map(|e| e.value().len()).sum();
        let certificates: usize = self.certificates.iter().map(|e| e.value().len()).sum();
        donations + certificates
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, table: &str) -> Result<(), RecordError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RecordError::Rejected {
                table: table.to_string(),
                status: 503,
                body: "memory recorder set to fail".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Recorder for MemoryRecorder {
    async fn insert_donation(
        &self,
        _credentials: &DatabaseCredentials,
        record: &DonationRecord,
    ) -> Result<(), RecordError> {
        self.check("donations")?;
        self.donations
            .entry(record.user_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn insert_certificate(
        &self,
        _credentials: &DatabaseCredentials,
        record: &CertificateRecord,
    ) -> Result<(), RecordError> {
        self.check("certificates")?;
        self.certificates
            .entry(record.user_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }
}
