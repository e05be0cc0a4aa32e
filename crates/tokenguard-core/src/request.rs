//! Per-request authentication state.

use std::collections::HashMap;

use crate::principal::Principal;

/// A signed-in principal and how the sign-in was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    /// The authenticated principal.
    pub principal: Principal,
    /// Whether the sign-in was stored in the session.
    pub stored: bool,
}

/// Request view the guards read credentials from and record sign-ins on.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    params: HashMap<String, String>,
    /// Header names are stored lowercased.
    headers: HashMap<String, String>,
    /// Principals stored in the session, keyed by scope (`user`, `super_admin`).
    session: HashMap<String, Principal>,
    /// Current authenticated subject per scope.
    current: HashMap<String, SignIn>,
}

impl AuthRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Seed the session with a principal, as a previous request would have.
    pub fn with_session(mut self, scope: impl Into<String>, principal: Principal) -> Self {
        self.session.insert(scope.into(), principal);
        self
    }

    /// Get a request parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Get a header value, matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get the principal stored in the session for a scope.
    pub fn session_principal(&self, scope: &str) -> Option<&Principal> {
        self.session.get(scope)
    }

    /// Make `principal` the current subject for `scope`.
    pub fn sign_in(&mut self, scope: &str, principal: Principal, store: bool) {
        if store {
            self.session.insert(scope.to_string(), principal.clone());
        }
        self.current
            .insert(scope.to_string(), SignIn { principal, stored: store });
    }

    /// The current subject for a scope, if any.
    pub fn current(&self, scope: &str) -> Option<&Principal> {
        self.current.get(scope).map(|s| &s.principal)
    }

    /// The sign-in record for a scope, if any.
    pub fn sign_in_record(&self, scope: &str) -> Option<&SignIn> {
        self.current.get(scope)
    }

    /// Check whether any principal is authenticated on this request.
    pub fn is_authenticated(&self) -> bool {
        !self.current.is_empty()
    }
}
