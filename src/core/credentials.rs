//! core::credentials
//!
//! The host's persisted credential record and the auth-state probe over it.
//!
//! # Record Format
//!
//! The record is a JSON document stored under a single storage key
//! (default `servercredentials3`):
//!
//! ```json
//! { "Servers": [ { "Id": "s1", "AccessToken": "t", "UserId": "u1",
//!                  "Users": [ { "Id": "u1", "AccessToken": "t" } ] } ] }
//! ```
//!
//! The format belongs to the host application. Only the fields modelled
//! here are ever read or rewritten; everything else is carried through
//! untouched via flattened maps.
//!
//! # Invariants
//!
//! - [`CredentialProbe::is_authenticated`] never fails: unreadable or
//!   malformed data is logged and reported as "not authenticated".
//! - Writes replace the whole record in one `set`, never partially.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::config::StorageConfig;
use crate::store::{KeyValueStore, StoreError};

/// Errors reading or writing the credential record.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed credential record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The persisted credential record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CredentialRecord {
    #[serde(rename = "Servers", default)]
    pub servers: Vec<ServerEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One server in the credential record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerEntry {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "AccessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(rename = "UserId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(rename = "Users", default)]
    pub users: Vec<UserEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One user under a server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserEntry {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "AccessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CredentialRecord {
    /// Parse a record from its stored JSON form.
    pub fn parse(json: &str) -> Result<Self, CredentialError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether the first server's first user carries a non-empty token.
    pub fn has_usable_token(&self) -> bool {
        self.servers
            .first()
            .and_then(|server| server.users.first())
            .and_then(|user| user.access_token.as_deref())
            .is_some_and(|token| !token.is_empty())
    }

    /// Drop every user and blank the server-level token fields.
    ///
    /// Server identities and unknown fields survive.
    pub fn clear_users(&mut self) {
        for server in &mut self.servers {
            server.users.clear();
            if server.access_token.is_some() {
                server.access_token = Some(String::new());
            }
            if server.user_id.is_some() {
                server.user_id = Some(String::new());
            }
        }
    }

    /// Record a signed-in user as the first user of the first server.
    pub fn upsert_login(&mut self, server_id: &str, user_id: &str, token: &str) {
        let position = self
            .servers
            .iter()
            .position(|s| s.id.as_deref() == Some(server_id));
        let mut server = match position {
            Some(index) => self.servers.remove(index),
            None => ServerEntry {
                id: Some(server_id.to_string()),
                ..Default::default()
            },
        };

        server.access_token = Some(token.to_string());
        server.user_id = Some(user_id.to_string());

        let mut user = match server
            .users
            .iter()
            .position(|u| u.id.as_deref() == Some(user_id))
        {
            Some(index) => server.users.remove(index),
            None => UserEntry {
                id: Some(user_id.to_string()),
                ..Default::default()
            },
        };
        user.access_token = Some(token.to_string());
        server.users.insert(0, user);

        self.servers.insert(0, server);
    }
}

/// Reads (and on destructive actions, clears) the credential record.
#[derive(Clone)]
pub struct CredentialProbe {
    store: Arc<dyn KeyValueStore>,
    credentials_key: String,
    session_flag_key: String,
}

impl CredentialProbe {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &StorageConfig) -> Self {
        Self {
            store,
            credentials_key: config.credentials_key.clone(),
            session_flag_key: config.session_flag_key.clone(),
        }
    }

    /// Read the record, if one is stored.
    pub fn read(&self) -> Result<Option<CredentialRecord>, CredentialError> {
        match self.store.get(&self.credentials_key)? {
            Some(json) => Ok(Some(CredentialRecord::parse(&json)?)),
            None => Ok(None),
        }
    }

    /// True iff a usable token exists for the first server's first user.
    pub fn is_authenticated(&self) -> bool {
        match self.read() {
            Ok(Some(record)) => record.has_usable_token(),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "credential record unreadable, treating as signed out");
                false
            }
        }
    }

    /// Clear cached users and tokens and the session flag.
    ///
    /// Failures are logged; a destructive control must still navigate away.
    pub fn clear(&self) {
        if let Err(e) = self.try_clear() {
            warn!(error = %e, "failed to clear cached credentials");
        }
    }

    fn try_clear(&self) -> Result<(), CredentialError> {
        match self.read() {
            Ok(Some(mut record)) => {
                record.clear_users();
                self.write(&record)?;
                debug!("cleared cached server credentials");
            }
            Ok(None) => {}
            Err(CredentialError::Malformed(e)) => {
                debug!(error = %e, "credential record malformed, leaving it in place");
            }
            Err(e) => return Err(e),
        }
        self.store.remove(&self.session_flag_key)?;
        Ok(())
    }

    /// Persist a successful sign-in.
    pub fn record_login(
        &self,
        server_id: &str,
        user_id: &str,
        token: &str,
    ) -> Result<(), CredentialError> {
        let mut record = match self.read() {
            Ok(record) => record.unwrap_or_default(),
            Err(CredentialError::Malformed(_)) => CredentialRecord::default(),
            Err(e) => return Err(e),
        };
        record.upsert_login(server_id, user_id, token);
        self.write(&record)
    }

    fn write(&self, record: &CredentialRecord) -> Result<(), CredentialError> {
        let json = serde_json::to_string(record)?;
        self.store.set(&self.credentials_key, &json)?;
        Ok(())
    }
}

// Custom Debug to avoid dumping the store contents
impl std::fmt::Debug for CredentialProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProbe")
            .field("credentials_key", &self.credentials_key)
            .field("session_flag_key", &self.session_flag_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const KEY: &str = "servercredentials3";

    fn probe_with(json: Option<&str>) -> (Arc<MemoryStore>, CredentialProbe) {
        let store = Arc::new(match json {
            Some(j) => MemoryStore::with_entry(KEY, j),
            None => MemoryStore::new(),
        });
        let probe = CredentialProbe::new(store.clone(), &StorageConfig::default());
        (store, probe)
    }

    #[test]
    fn absent_record_is_not_authenticated() {
        let (_, probe) = probe_with(None);
        assert!(!probe.is_authenticated());
    }

    #[test]
    fn malformed_record_is_not_authenticated() {
        let (_, probe) = probe_with(Some("{ not json"));
        assert!(!probe.is_authenticated());

        let (_, probe) = probe_with(Some(r#"{"Servers": 7}"#));
        assert!(!probe.is_authenticated());
    }

    #[test]
    fn empty_servers_or_users_is_not_authenticated() {
        let (_, probe) = probe_with(Some(r#"{"Servers": []}"#));
        assert!(!probe.is_authenticated());

        let (_, probe) = probe_with(Some(r#"{"Servers": [{"Id": "s", "Users": []}]}"#));
        assert!(!probe.is_authenticated());
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let (_, probe) = probe_with(Some(
            r#"{"Servers": [{"Users": [{"Id": "u", "AccessToken": ""}]}]}"#,
        ));
        assert!(!probe.is_authenticated());
    }

    #[test]
    fn only_first_server_first_user_counts() {
        let (_, probe) = probe_with(Some(
            r#"{"Servers": [
                {"Users": [{"Id": "u"}]},
                {"Users": [{"Id": "v", "AccessToken": "tok"}]}
            ]}"#,
        ));
        assert!(!probe.is_authenticated());
    }

    #[test]
    fn usable_token_is_authenticated() {
        let (_, probe) = probe_with(Some(
            r#"{"Servers": [{"Id": "s", "Users": [{"Id": "u", "AccessToken": "tok"}]}]}"#,
        ));
        assert!(probe.is_authenticated());
    }

    #[test]
    fn clear_drops_users_keeps_servers_and_unknown_fields() {
        let (store, probe) = probe_with(Some(
            r#"{"Servers": [{"Id": "s", "Name": "Living Room", "AccessToken": "tok",
                "UserId": "u", "Users": [{"Id": "u", "AccessToken": "tok"}]}]}"#,
        ));
        store.set("pin_validated", "true").unwrap();

        probe.clear();

        assert!(!probe.is_authenticated());
        assert!(store.get("pin_validated").unwrap().is_none());

        let record = probe.read().unwrap().unwrap();
        let server = &record.servers[0];
        assert_eq!(server.id.as_deref(), Some("s"));
        assert_eq!(server.access_token.as_deref(), Some(""));
        assert_eq!(server.user_id.as_deref(), Some(""));
        assert!(server.users.is_empty());
        assert_eq!(server.extra.get("Name"), Some(&Value::from("Living Room")));
    }

    #[test]
    fn clear_on_absent_or_malformed_record_is_harmless() {
        let (store, probe) = probe_with(None);
        probe.clear();
        assert!(store.get(KEY).unwrap().is_none());

        let (store, probe) = probe_with(Some("garbage"));
        probe.clear();
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("garbage"));
    }

    #[test]
    fn record_login_makes_probe_true() {
        let (_, probe) = probe_with(None);
        probe.record_login("server-1", "user-1", "tok").unwrap();
        assert!(probe.is_authenticated());

        let record = probe.read().unwrap().unwrap();
        assert_eq!(record.servers[0].id.as_deref(), Some("server-1"));
        assert_eq!(record.servers[0].users[0].id.as_deref(), Some("user-1"));
    }

    #[test]
    fn record_login_moves_existing_server_to_front() {
        let (_, probe) = probe_with(Some(
            r#"{"Servers": [{"Id": "other", "Users": []}, {"Id": "server-1", "Users": []}]}"#,
        ));
        probe.record_login("server-1", "user-1", "tok").unwrap();

        let record = probe.read().unwrap().unwrap();
        assert_eq!(record.servers.len(), 2);
        assert_eq!(record.servers[0].id.as_deref(), Some("server-1"));
        assert!(probe.is_authenticated());
    }

    #[test]
    fn debug_does_not_dump_store() {
        let (_, probe) = probe_with(Some(
            r#"{"Servers": [{"Users": [{"AccessToken": "secret-token"}]}]}"#,
        ));
        let debug = format!("{:?}", probe);
        assert!(debug.contains("servercredentials3"));
        assert!(!debug.contains("secret-token"));
    }
}
