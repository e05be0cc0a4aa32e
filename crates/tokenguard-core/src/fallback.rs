//! Session-based fallback strategies.
//!
//! The strict guard delegates to a [`SessionStrategy`] when token
//! authentication fails and fallback is enabled. The strategy is addressed
//! by the conventional name of its own strict guard (`authenticate_user!`).

use crate::entity::Entity;
use crate::error::AuthResult;
use crate::guard::{GuardOutcome, Rejection, RejectionReason};
use crate::request::AuthRequest;

/// External session-based authentication consulted as a fallback.
pub trait SessionStrategy: Send + Sync {
    /// Run the strategy's strict guard `guard_name` for `entity`.
    ///
    /// Implementations decide their own failure semantics; rejecting with
    /// [`GuardOutcome::Rejected`] is the usual answer.
    fn authenticate(
        &self,
        guard_name: &str,
        entity: &Entity,
        request: &mut AuthRequest,
    ) -> AuthResult<GuardOutcome>;
}

/// Authenticates the principal a previous request stored in the session.
#[derive(Debug, Clone, Default)]
pub struct SessionStoreStrategy;

impl SessionStrategy for SessionStoreStrategy {
    fn authenticate(
        &self,
        guard_name: &str,
        entity: &Entity,
        request: &mut AuthRequest,
    ) -> AuthResult<GuardOutcome> {
        let scope = entity.name_underscore.as_str();

        if let Some(principal) = request.current(scope).cloned() {
            return Ok(GuardOutcome::Authenticated(principal));
        }

        match request.session_principal(scope).cloned() {
            Some(principal) => {
                request.sign_in(scope, principal.clone(), true);
                Ok(GuardOutcome::Authenticated(principal))
            }
            None => {
                tracing::warn!(guard = guard_name, "request rejected: no session");
                Ok(GuardOutcome::Rejected(Rejection::new(
                    guard_name,
                    RejectionReason::NotAuthenticated,
                )))
            }
        }
    }
}

/// Rejects every request; for deployments with no session authentication.
#[derive(Debug, Clone, Default)]
pub struct RejectAllStrategy;

impl SessionStrategy for RejectAllStrategy {
    fn authenticate(
        &self,
        guard_name: &str,
        _entity: &Entity,
        _request: &mut AuthRequest,
    ) -> AuthResult<GuardOutcome> {
        Ok(GuardOutcome::Rejected(Rejection::new(
            guard_name,
            RejectionReason::NotAuthenticated,
        )))
    }
}
