//! Guard operations generated per principal type.
//!
//! Each registration produces two guards bound to one [`Entity`]:
//!
//! - the non-strict guard (`authenticate_<name>_from_token`) signs the
//!   principal in when the request carries a valid token and otherwise lets
//!   the request continue unauthenticated;
//! - the strict guard (`authenticate_<name>_from_token!`) runs the
//!   non-strict guard and, when it does not authenticate, either delegates
//!   to the session strategy's own strict guard or rejects the request.

use std::fmt;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::AuthResult;
use crate::fallback::SessionStrategy;
use crate::principal::{Principal, PrincipalStore};
use crate::request::AuthRequest;
use crate::token::{extract_credentials, secure_compare};

/// Why a strict guard rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// No valid token and fallback disabled.
    InvalidToken,
    /// The session strategy did not authenticate the request either.
    NotAuthenticated,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::InvalidToken => write!(f, "missing or invalid token"),
            RejectionReason::NotAuthenticated => write!(f, "not authenticated"),
        }
    }
}

/// Terminal rejection of a request, surfaced as an unauthenticated response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Name of the guard that rejected.
    pub guard: String,
    /// Rejection reason.
    pub reason: RejectionReason,
}

impl Rejection {
    /// Create a rejection.
    pub fn new(guard: impl Into<String>, reason: RejectionReason) -> Self {
        Self {
            guard: guard.into(),
            reason,
        }
    }
}

/// Result of running a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The principal is now the current subject of the request.
    Authenticated(Principal),
    /// Token resolution failed; the request continues unauthenticated.
    Unauthenticated,
    /// The request must be answered with an unauthenticated response.
    Rejected(Rejection),
}

impl GuardOutcome {
    /// Check if the outcome authenticated a principal.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, GuardOutcome::Authenticated(_))
    }

    /// Check if the outcome rejects the request.
    pub fn is_rejected(&self) -> bool {
        matches!(self, GuardOutcome::Rejected(_))
    }
}

type GuardFn = dyn Fn(&mut AuthRequest) -> AuthResult<GuardOutcome> + Send + Sync;

/// A named, callable guard bound to one entity.
#[derive(Clone)]
pub struct Guard {
    name: String,
    strict: bool,
    entity: Arc<Entity>,
    run: Arc<GuardFn>,
}

impl Guard {
    /// Guard name, e.g. `authenticate_user_from_token!`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the strict (bang) guard.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// The entity this guard authenticates.
    pub fn entity(&self) -> &Arc<Entity> {
        &self.entity
    }

    /// Run the guard against a request.
    pub fn call(&self, request: &mut AuthRequest) -> AuthResult<GuardOutcome> {
        (*self.run)(request)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("name", &self.name)
            .field("strict", &self.strict)
            .field("entity", &self.entity.name)
            .finish()
    }
}

/// Collaborators shared by every guard a component builds.
#[derive(Clone)]
pub struct GuardContext {
    /// Principal lookup.
    pub store: Arc<dyn PrincipalStore>,
    /// Session-based fallback strategy.
    pub fallback: Arc<dyn SessionStrategy>,
    /// Persist token sign-ins in the session.
    pub sign_in_token: bool,
}

impl GuardContext {
    /// Create a guard context.
    pub fn new(store: Arc<dyn PrincipalStore>, fallback: Arc<dyn SessionStrategy>) -> Self {
        Self {
            store,
            fallback,
            sign_in_token: false,
        }
    }

    /// Set whether token sign-ins are stored in the session.
    pub fn with_sign_in_token(mut self, store: bool) -> Self {
        self.sign_in_token = store;
        self
    }
}

/// Build the non-strict and strict guards for an entity.
pub fn build_guards(
    entity: Arc<Entity>,
    fallback_to_devise: bool,
    context: &GuardContext,
) -> (Guard, Guard) {
    let authenticate: Arc<GuardFn> = {
        let entity = entity.clone();
        let store = context.store.clone();
        let sign_in_token = context.sign_in_token;

        Arc::new(move |request: &mut AuthRequest| -> AuthResult<GuardOutcome> {
            match resolve_principal(&entity, store.as_ref(), request)? {
                Some(principal) => {
                    request.sign_in(&entity.name_underscore, principal.clone(), sign_in_token);
                    tracing::debug!(
                        principal = %entity.name,
                        id = %principal.id,
                        stored = sign_in_token,
                        "authenticated from token"
                    );
                    Ok(GuardOutcome::Authenticated(principal))
                }
                None => Ok(GuardOutcome::Unauthenticated),
            }
        })
    };

    let authenticate_bang: Arc<GuardFn> = {
        let entity = entity.clone();
        let authenticate = authenticate.clone();
        let fallback = context.fallback.clone();

        Arc::new(move |request: &mut AuthRequest| -> AuthResult<GuardOutcome> {
            let outcome = (*authenticate)(request)?;
            if outcome.is_authenticated() {
                return Ok(outcome);
            }

            if fallback_to_devise {
                tracing::debug!(
                    principal = %entity.name,
                    fallback = %entity.fallback_guard_name,
                    "token authentication failed, falling back"
                );
                return fallback.authenticate(&entity.fallback_guard_name, &entity, request);
            }

            tracing::warn!(
                principal = %entity.name,
                guard = %entity.auth_guard_bang_name,
                "request rejected: missing or invalid token"
            );
            Ok(GuardOutcome::Rejected(Rejection::new(
                entity.auth_guard_bang_name.clone(),
                RejectionReason::InvalidToken,
            )))
        })
    };

    (
        Guard {
            name: entity.auth_guard_name.clone(),
            strict: false,
            entity: entity.clone(),
            run: authenticate,
        },
        Guard {
            name: entity.auth_guard_bang_name.clone(),
            strict: true,
            entity,
            run: authenticate_bang,
        },
    )
}

/// Resolve the principal a request's token belongs to.
///
/// Missing credentials or a mismatch yield `Ok(None)`; store failures are
/// returned as errors.
pub fn resolve_principal(
    entity: &Entity,
    store: &dyn PrincipalStore,
    request: &AuthRequest,
) -> AuthResult<Option<Principal>> {
    let Some(credentials) = extract_credentials(entity, request) else {
        tracing::debug!(principal = %entity.name, "no token credentials on request");
        return Ok(None);
    };

    let candidate = match (entity.identifier.as_deref(), credentials.identifier) {
        (Some(field), Some(value)) => store.find_by_identifier(&entity.name, field, value)?,
        _ => store.find_by_token(&entity.name, credentials.token)?,
    };

    let principal =
        candidate.filter(|p| secure_compare(credentials.token, &p.authentication_token));
    if principal.is_none() {
        tracing::debug!(principal = %entity.name, "token did not match a stored principal");
    }
    Ok(principal)
}
