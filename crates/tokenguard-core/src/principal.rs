//! Principals and the store they are looked up in.
//!
//! # Environment Format
//!
//! [`MemoryPrincipalStore::from_env`] reads entries of the form
//! `Type:id:token` or `Type:field=value:token`, separated by `;`:
//!
//! ```text
//! TOKENGUARD_PRINCIPALS="User:email=alice@example.com:tok-a;SuperAdmin:7:tok-b"
//! ```

use std::collections::HashMap;
use std::path::Path;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::AuthResult;
use crate::token::secure_compare;

/// Default environment variable read by [`MemoryPrincipalStore::from_default_env`].
pub const DEFAULT_PRINCIPALS_ENV: &str = "TOKENGUARD_PRINCIPALS";

/// An authenticatable record of some principal type.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal type name, e.g. `User`.
    pub principal_type: String,
    /// Record identity.
    pub id: String,
    /// Stored authentication token.
    pub authentication_token: String,
    /// Other identifying fields (e.g. `email`).
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Principal {
    /// Create a principal with no extra attributes.
    pub fn new(
        principal_type: impl Into<String>,
        id: impl Into<String>,
        authentication_token: impl Into<String>,
    ) -> Self {
        Self {
            principal_type: principal_type.into(),
            id: id.into(),
            authentication_token: authentication_token.into(),
            attributes: HashMap::new(),
        }
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(field.into(), value.into());
        self
    }

    /// Value of an identifying field; `id` always resolves to the identity.
    pub fn field(&self, field: &str) -> Option<&str> {
        if field == "id" {
            Some(&self.id)
        } else {
            self.attributes.get(field).map(String::as_str)
        }
    }
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("principal_type", &self.principal_type)
            .field("id", &self.id)
            .field("authentication_token", &"[REDACTED]")
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Lookup of principals by identifier or token.
///
/// Implementations compare tokens in constant time.
pub trait PrincipalStore: Send + Sync {
    /// Find the principal of `principal_type` whose `field` equals `value`.
    fn find_by_identifier(
        &self,
        principal_type: &str,
        field: &str,
        value: &str,
    ) -> AuthResult<Option<Principal>>;

    /// Find the principal of `principal_type` holding `token`.
    fn find_by_token(&self, principal_type: &str, token: &str) -> AuthResult<Option<Principal>>;
}

/// In-memory principal store.
#[derive(Debug, Default)]
pub struct MemoryPrincipalStore {
    /// Principals grouped by type name.
    principals: DashMap<String, Vec<Principal>>,
}

impl MemoryPrincipalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a principal.
    pub fn insert(&self, principal: Principal) {
        self.principals
            .entry(principal.principal_type.clone())
            .or_default()
            .push(principal);
    }

    /// Number of stored principals.
    pub fn len(&self) -> usize {
        self.principals.iter().map(|entry| entry.value().len()).sum()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load principals from a JSON array.
    pub fn from_json_str(json: &str) -> AuthResult<Self> {
        let principals: Vec<Principal> = serde_json::from_str(json)?;
        let store = Self::new();
        for principal in principals {
            store.insert(principal);
        }
        Ok(store)
    }

    /// Load principals from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Load principals from an environment variable.
    ///
    /// Malformed entries are skipped.
    pub fn from_env(env_var: &str) -> Self {
        let store = Self::new();

        if let Ok(entries) = std::env::var(env_var) {
            for entry in entries.split(';') {
                match parse_entry(entry) {
                    Some(principal) => store.insert(principal),
                    None if entry.trim().is_empty() => {}
                    None => tracing::warn!(env_var, "skipping malformed principal entry"),
                }
            }
        }

        store
    }

    /// Load from the default environment variable `TOKENGUARD_PRINCIPALS`.
    pub fn from_default_env() -> Self {
        Self::from_env(DEFAULT_PRINCIPALS_ENV)
    }
}

fn parse_entry(entry: &str) -> Option<Principal> {
    let mut parts = entry.trim().splitn(3, ':');
    let principal_type = parts.next()?.trim();
    let identity = parts.next()?.trim();
    let token = parts.next()?.trim();

    if principal_type.is_empty() || identity.is_empty() || token.is_empty() {
        return None;
    }

    let principal = match identity.split_once('=') {
        Some((field, value)) => {
            Principal::new(principal_type, value, token).with_attribute(field, value)
        }
        None => Principal::new(principal_type, identity, token),
    };
    Some(principal)
}

impl PrincipalStore for MemoryPrincipalStore {
    fn find_by_identifier(
        &self,
        principal_type: &str,
        field: &str,
        value: &str,
    ) -> AuthResult<Option<Principal>> {
        let Some(list) = self.principals.get(principal_type) else {
            return Ok(None);
        };
        let found = list.iter().find(|p| p.field(field) == Some(value)).cloned();
        Ok(found)
    }

    fn find_by_token(&self, principal_type: &str, token: &str) -> AuthResult<Option<Principal>> {
        let Some(list) = self.principals.get(principal_type) else {
            return Ok(None);
        };
        let found = list
            .iter()
            .find(|p| secure_compare(token, &p.authentication_token))
            .cloned();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store() -> MemoryPrincipalStore {
        let store = MemoryPrincipalStore::new();
        store.insert(
            Principal::new("User", "1", "tok-alice").with_attribute("email", "alice@example.com"),
        );
        store.insert(Principal::new("SuperAdmin", "9", "tok-root"));
        store
    }

    #[test]
    fn test_find_by_token_is_scoped_by_type() {
        let store = store();

        let found = store.find_by_token("User", "tok-alice").unwrap().unwrap();
        assert_eq!(found.id, "1");

        assert!(store.find_by_token("SuperAdmin", "tok-alice").unwrap().is_none());
        assert!(store.find_by_token("User", "tok-wrong").unwrap().is_none());
    }

    #[test]
    fn test_find_by_identifier() {
        let store = store();

        let found = store
            .find_by_identifier("User", "email", "alice@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "1");

        let by_id = store.find_by_identifier("SuperAdmin", "id", "9").unwrap();
        assert!(by_id.is_some());
    }

    #[test]
    fn test_parse_entry() {
        let principal = parse_entry("User:email=bob@example.com:tok-bob").unwrap();
        assert_eq!(principal.id, "bob@example.com");
        assert_eq!(principal.field("email"), Some("bob@example.com"));
        assert_eq!(principal.authentication_token, "tok-bob");

        assert!(parse_entry("User:tok-only").is_none());
        assert!(parse_entry("User::tok").is_none());
    }

    #[test]
    fn test_from_json() {
        let store = MemoryPrincipalStore::from_json_str(
            r#"[{ "principal_type": "User", "id": "1", "authentication_token": "t" }]"#,
        )
        .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_from_env_skips_malformed_entries() {
        let var = "TOKENGUARD_TEST_PRINCIPALS_FROM_ENV";
        std::env::set_var(
            var,
            "User:email=alice@example.com:tok-alice; ;broken;SuperAdmin:9:tok-root;User::x",
        );

        let store = MemoryPrincipalStore::from_env(var);
        std::env::remove_var(var);

        assert_eq!(store.len(), 2);
        let alice = store
            .find_by_identifier("User", "email", "alice@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(alice.authentication_token, "tok-alice");
        assert!(store.find_by_token("SuperAdmin", "tok-root").unwrap().is_some());
    }

    #[test]
    fn test_from_env_unset() {
        let store = MemoryPrincipalStore::from_env("TOKENGUARD_TEST_PRINCIPALS_UNSET");
        assert!(store.is_empty());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{ "principal_type": "User", "id": "1", "authentication_token": "tok-alice",
                   "attributes": {{ "email": "alice@example.com" }} }},
                {{ "principal_type": "SuperAdmin", "id": "9", "authentication_token": "tok-root" }}
            ]"#
        )
        .unwrap();

        let store = MemoryPrincipalStore::from_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        let alice = store.find_by_token("User", "tok-alice").unwrap().unwrap();
        assert_eq!(alice.field("email"), Some("alice@example.com"));
    }

    #[test]
    fn test_from_file_errors() {
        let err = MemoryPrincipalStore::from_file("/nonexistent/principals.json").unwrap_err();
        assert!(matches!(err, crate::error::AuthError::Io(_)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "not": "a list" }}"#).unwrap();
        let err = MemoryPrincipalStore::from_file(file.path()).unwrap_err();
        assert!(matches!(err, crate::error::AuthError::Json(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let principal = Principal::new("User", "1", "very-secret");
        assert!(!format!("{:?}", principal).contains("very-secret"));
    }
}
