//! Live password rotation against cache instances.
//!
//! A rotation is one exchange with one instance: connect, `AUTH` with the
//! credential we believe is current (skipped when none is recorded), then
//! `CONFIG SET requirepass`. The credential store is written only after the
//! instance has accepted the new password.

pub mod client;

use crate::core::{AdminError, Instance, Result};
use crate::storage::CredentialStore;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

pub use client::RedisConnector;

/// Opens administrative links to cache instances
#[async_trait]
pub trait InstanceConnector: Send + Sync {
    /// Connect to `endpoint`. `timeout` bounds the connect and every later
    /// read and write on the returned link.
    ///
    /// Fails with [`AdminError::Unreachable`].
    async fn connect(&self, endpoint: &str, timeout: Duration) -> Result<Box<dyn AdminLink>>;
}

/// An open connection to one instance. Dropping it closes the connection.
#[async_trait]
pub trait AdminLink: Send {
    /// Fails with [`AdminError::AuthFailed`].
    async fn authenticate(&mut self, credential: &str) -> Result<()>;

    /// Make `credential` the instance's required password.
    ///
    /// Fails with [`AdminError::ConfigRejected`].
    async fn require_password(&mut self, credential: &str) -> Result<()>;
}

// ============================================================================
// Rotator
// ============================================================================

pub struct Rotator<C> {
    connector: C,
    timeout: Duration,
}

impl<C: InstanceConnector> Rotator<C> {
    pub fn new(connector: C, timeout: Duration) -> Self {
        Self { connector, timeout }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Rotate `endpoint` from `current` to `new`.
    ///
    /// On success the store holds `new` for `endpoint`; on any error the store
    /// is left as it was.
    pub async fn rotate(
        &self,
        store: &mut CredentialStore,
        endpoint: &str,
        current: &str,
        new: &str,
    ) -> Result<()> {
        if new.is_empty() {
            return Err(AdminError::invalid_argument("no password specified"));
        }

        info!(endpoint, "setting password");
        if let Err(e) = self.exchange(endpoint, current, new).await {
            warn!(endpoint, phase = e.phase(), error = %e, "password not set");
            return Err(e);
        }

        if !store.upsert(endpoint, new) {
            warn!(
                endpoint,
                path = %store.path().display(),
                "instance accepted the new password but the store file was not updated"
            );
        }
        info!(endpoint, "password set");
        Ok(())
    }

    /// Rotate one instance using the credential currently recorded for it
    pub async fn rotate_instance(
        &self,
        store: &mut CredentialStore,
        instance: &Instance,
        new: &str,
    ) -> Result<()> {
        let current = store.get(instance.endpoint()).to_string();
        self.rotate(store, instance.endpoint(), &current, new).await
    }

    /// Rotate every instance in order.
    ///
    /// Each instance's current credential is read from the store right before
    /// its own attempt. Failures are collected, never abort the batch.
    pub async fn rotate_all(
        &self,
        store: &mut CredentialStore,
        instances: &[Instance],
        new: &str,
    ) -> Result<BatchReport> {
        if new.is_empty() {
            return Err(AdminError::invalid_argument("no password specified"));
        }

        let mut report = BatchReport::default();
        for instance in instances {
            let result = self.rotate_instance(store, instance, new).await;
            let persisted = result.is_ok() && store.is_synced();
            report.outcomes.push(RotationOutcome {
                instance_id: instance.id(),
                endpoint: instance.endpoint().to_string(),
                result,
                persisted,
            });
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch rotation finished"
        );
        Ok(report)
    }

    async fn exchange(&self, endpoint: &str, current: &str, new: &str) -> Result<()> {
        let mut link = self.connector.connect(endpoint, self.timeout).await?;
        if !current.is_empty() {
            link.authenticate(current).await?;
        }
        link.require_password(new).await?;
        drop(link);
        Ok(())
    }
}

// ============================================================================
// Batch Report
// ============================================================================

#[derive(Debug)]
pub struct RotationOutcome {
    pub instance_id: usize,
    pub endpoint: String,
    pub result: Result<()>,
    /// The new credential reached the store file. Always false on error.
    pub persisted: bool,
}

impl RotationOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-instance results of a batch rotation, in inventory order
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<RotationOutcome>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[RotationOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}
