//! The doctor roster and its remote persistence.
//!
//! The roster document is the single source of truth for doctor
//! identities. Mutations follow a strict discipline: validate locally,
//! write the candidate roster remotely, and only commit the in-memory
//! state once the store accepted the write. A failed write leaves the
//! roster exactly as it was.

use std::sync::Arc;

use tracing::{info, warn};

use turnario_store::{BackupCache, RemoteStore, RetryPolicy, StoreError, VersionToken};

use crate::error::RosterError;
use crate::name::DoctorName;

/// Document path used by every revision of the data so far.
pub const DEFAULT_ROSTER_PATH: &str = "medici.json";

/// The authoritative list of doctor identities.
#[derive(Debug)]
pub struct DoctorRoster {
    store: Arc<RemoteStore>,
    retry: RetryPolicy,
    backup: BackupCache,
    path: String,
    names: Vec<DoctorName>,
    token: Option<VersionToken>,
    degraded: bool,
}

impl DoctorRoster {
    /// Load the roster at session start.
    ///
    /// - Document missing: empty roster, no token; the first save creates it.
    /// - Remote unreachable after retries (or payload corrupt): fall back to
    ///   the local backup; if that is also empty, start with an empty roster
    ///   in degraded mode.
    /// - Bad credentials: fatal, propagated.
    pub async fn load(
        store: Arc<RemoteStore>,
        retry: RetryPolicy,
        backup: BackupCache,
        path: impl Into<String>,
    ) -> Result<Self, RosterError> {
        let path = path.into();

        match retry.run(|| store.get(&path)).await {
            Ok(fetched) => {
                let names = parse_roster_document(&fetched.value);
                backup.save(&path, &fetched.value).await;
                info!(count = names.len(), path = %path, "roster loaded");
                Ok(Self {
                    store,
                    retry,
                    backup,
                    path,
                    names,
                    token: Some(fetched.token),
                    degraded: false,
                })
            }
            Err(StoreError::NotFound(_)) => {
                info!(path = %path, "roster document missing, will create on first save");
                Ok(Self {
                    store,
                    retry,
                    backup,
                    path,
                    names: Vec::new(),
                    token: None,
                    degraded: false,
                })
            }
            Err(err @ StoreError::Unauthorized(_)) => Err(err.into()),
            Err(err) => {
                warn!(error = %err, path = %path, "remote roster unavailable, trying local backup");
                let names = match backup.load(&path).await {
                    Some(value) => parse_roster_document(&value),
                    None => {
                        warn!(path = %path, "no usable local backup, starting empty in degraded mode");
                        Vec::new()
                    }
                };
                Ok(Self {
                    store,
                    retry,
                    backup,
                    path,
                    names,
                    token: None,
                    degraded: true,
                })
            }
        }
    }

    /// The roster, sorted by name key.
    pub fn names(&self) -> &[DoctorName] {
        &self.names
    }

    /// Whether the session is running from backup data because the remote
    /// store was unreachable at load time.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// The version token of the last observed remote revision.
    pub fn version(&self) -> Option<&VersionToken> {
        self.token.as_ref()
    }

    /// Look up a roster member by raw name (case- and accent-insensitive).
    pub fn find(&self, raw: &str) -> Option<&DoctorName> {
        let candidate = DoctorName::parse(raw).ok()?;
        self.names.iter().find(|name| **name == candidate)
    }

    /// Add a doctor.
    ///
    /// Validation failures (malformed or duplicate names) are local and
    /// never reach the store. On remote failure the roster is unchanged.
    pub async fn add(&mut self, raw: &str) -> Result<DoctorName, RosterError> {
        let name = DoctorName::parse(raw)?;
        if self.names.iter().any(|existing| *existing == name) {
            return Err(RosterError::Duplicate(name.to_string()));
        }

        let mut candidate = self.names.clone();
        candidate.push(name.clone());
        candidate.sort();

        let message = format!("Update doctor roster (add {})", name);
        self.commit(candidate, &message).await?;
        info!(doctor = %name, "doctor added");
        Ok(name)
    }

    /// Remove a doctor. Removing a name that is not on the roster fails
    /// locally without a remote write.
    pub async fn remove(&mut self, raw: &str) -> Result<DoctorName, RosterError> {
        let name = DoctorName::parse(raw)?;
        let position = self
            .names
            .iter()
            .position(|existing| *existing == name)
            .ok_or_else(|| RosterError::Unknown(name.to_string()))?;

        let mut candidate = self.names.clone();
        let removed = candidate.remove(position);

        let message = format!("Update doctor roster (remove {})", removed);
        self.commit(candidate, &message).await?;
        info!(doctor = %removed, "doctor removed");
        Ok(removed)
    }

    /// Write the candidate roster remotely; adopt it only on success.
    async fn commit(
        &mut self,
        candidate: Vec<DoctorName>,
        message: &str,
    ) -> Result<(), RosterError> {
        let document = roster_document(&candidate);
        let token = self.token.clone();

        let new_token = self
            .retry
            .run(|| self.store.put(&self.path, &document, token.as_ref(), message))
            .await?;

        self.names = candidate;
        self.token = Some(new_token);
        self.backup.save(&self.path, &document).await;
        Ok(())
    }
}

/// Serialize the roster to its document form: a sorted JSON array of
/// display names.
fn roster_document(names: &[DoctorName]) -> serde_json::Value {
    serde_json::Value::Array(
        names
            .iter()
            .map(|name| serde_json::Value::String(name.as_str().to_string()))
            .collect(),
    )
}

/// Parse a roster document in either of the shapes prior revisions wrote:
/// a JSON array of name strings, or an object
/// `{year, month, medici: {name: [...]}}` from which the names are the
/// `medici` keys. Entries failing validation are skipped with a warning.
pub fn parse_roster_document(value: &serde_json::Value) -> Vec<DoctorName> {
    let raw_names: Vec<&str> = match value {
        serde_json::Value::Array(items) => items.iter().filter_map(|v| v.as_str()).collect(),
        serde_json::Value::Object(map) => match map.get("medici").and_then(|m| m.as_object()) {
            Some(medici) => medici.keys().map(String::as_str).collect(),
            None => {
                warn!("unrecognized roster document shape, treating as empty");
                Vec::new()
            }
        },
        _ => {
            warn!("unrecognized roster document shape, treating as empty");
            Vec::new()
        }
    };

    let mut names: Vec<DoctorName> = Vec::with_capacity(raw_names.len());
    for raw in raw_names {
        match DoctorName::parse(raw) {
            Ok(name) => {
                if names.iter().all(|existing| *existing != name) {
                    names.push(name);
                } else {
                    warn!(name = %raw, "duplicate roster entry skipped");
                }
            }
            Err(err) => warn!(name = %raw, error = %err, "invalid roster entry skipped"),
        }
    }
    names.sort();
    names
}
