//! Credential lookup
//!
//! Booking attempts resolve the user's password and payment reference at
//! call time through [`CredentialLookup`], so the table can be reloaded or
//! replaced without touching the scheduler.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::models::Credential;

/// Resolves an email address to the user's platform credentials
pub trait CredentialLookup: Send + Sync {
    /// Credentials for `email`, or `None` if the user is unknown
    fn lookup(&self, email: &str) -> Option<Credential>;

    /// Whether `email` is a known user
    fn contains(&self, email: &str) -> bool {
        self.lookup(email).is_some()
    }
}

pub type SharedCredentialLookup = Arc<dyn CredentialLookup>;

/// Credential table held in memory
///
/// Emails are matched exactly after trimming surrounding whitespace.
#[derive(Default)]
pub struct StaticCredentials {
    entries: RwLock<HashMap<String, Credential>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the credentials for one user
    pub fn insert(&self, email: impl Into<String>, credential: Credential) {
        let email = email.into();
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(email.trim().to_string(), credential);
        }
    }

    /// Replace the whole table
    pub fn replace_all(&self, table: BTreeMap<String, Credential>) {
        if let Ok(mut entries) = self.entries.write() {
            *entries = table
                .into_iter()
                .map(|(email, credential)| (email.trim().to_string(), credential))
                .collect();
        }
        tracing::info!(users = self.len(), "Credential table loaded");
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<BTreeMap<String, Credential>> for StaticCredentials {
    fn from(table: BTreeMap<String, Credential>) -> Self {
        let credentials = Self::new();
        credentials.replace_all(table);
        credentials
    }
}

impl CredentialLookup for StaticCredentials {
    fn lookup(&self, email: &str) -> Option<Credential> {
        self.entries.read().ok()?.get(email.trim()).cloned()
    }
}
