//! Token authentication handler registration.
//!
//! A component that handles token authentication implements
//! [`TokenAuthenticationHandler`] by exposing its [`HandlerState`], the
//! shared entities registry and its guard collaborators. Registering a
//! principal type then:
//!
//! 1. finds or creates the type's [`Entity`] in the registry,
//! 2. builds the two guards bound to it and stores them by name,
//! 3. installs the strict guard as a pre-dispatch hook,
//! 4. appends the type to the handled principal types.
//!
//! Registering a type whose guards are already defined on the component is
//! a no-op that returns the existing entity.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::SharedEntitiesManager;
use crate::entity::{Entity, PrincipalType};
use crate::error::{AuthError, AuthResult};
use crate::guard::{build_guards, Guard, GuardContext, GuardOutcome};
use crate::options::{HookOptions, RegistrationOptions};
use crate::request::AuthRequest;

/// Pre-dispatch hook mechanism of a component.
pub trait HookRegistry {
    /// Run the operation `hook_name` before matched actions.
    ///
    /// `options` are passed through untouched by the registrar.
    fn install_hook(&mut self, hook_name: &str, options: HookOptions);
}

/// Per-component registration state.
#[derive(Debug, Clone, Default)]
pub struct HandlerState {
    handled: Vec<PrincipalType>,
    guards: HashMap<String, Guard>,
}

impl HandlerState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Principal types registered so far, in registration order.
    pub fn handled(&self) -> &[PrincipalType] {
        &self.handled
    }

    /// Look up a guard by name.
    pub fn guard(&self, name: &str) -> Option<&Guard> {
        self.guards.get(name)
    }

    /// Names of every defined guard, sorted.
    pub fn guard_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.guards.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn define(&mut self, guard: Guard) {
        self.guards.insert(guard.name().to_string(), guard);
    }

    fn mark_handled(&mut self, principal_type: &PrincipalType) {
        if !self.handled.contains(principal_type) {
            self.handled.push(principal_type.clone());
        }
    }
}

/// Components able to require token authentication for principal types.
pub trait TokenAuthenticationHandler: HookRegistry {
    /// Registration state.
    fn handler_state(&self) -> &HandlerState;

    /// Mutable registration state.
    fn handler_state_mut(&mut self) -> &mut HandlerState;

    /// Registry descriptors are obtained from.
    fn entities_manager(&self) -> &SharedEntitiesManager;

    /// Collaborators the generated guards call into.
    fn guard_context(&self) -> &GuardContext;

    /// Require token authentication for `principal_type` on this component.
    ///
    /// Returns the entity whose guard names are now defined here.
    fn handle_token_authentication_for(
        &mut self,
        principal_type: &PrincipalType,
        options: RegistrationOptions,
    ) -> AuthResult<Arc<Entity>> {
        let entity = self
            .entities_manager()
            .find_or_create_entity(principal_type, options.alias.as_deref())?;

        if self.handler_state().guard(&entity.auth_guard_bang_name).is_some() {
            tracing::debug!(
                principal = %principal_type,
                guard = %entity.auth_guard_bang_name,
                "principal type already handled, skipping"
            );
            return Ok(entity);
        }

        let (authenticate, authenticate_bang) =
            build_guards(entity.clone(), options.fallback_to_devise, self.guard_context());
        let state = self.handler_state_mut();
        state.define(authenticate);
        state.define(authenticate_bang);

        if self.entities_manager().config().install_hooks {
            self.install_hook(&entity.auth_guard_bang_name, options.hook_options);
        }

        self.handler_state_mut().mark_handled(principal_type);

        tracing::debug!(
            principal = %principal_type,
            guard = %entity.auth_guard_bang_name,
            fallback = options.fallback_to_devise,
            "token authentication handled"
        );

        Ok(entity)
    }

    /// Principal types this component handles, in registration order.
    fn handled_token_authenticatables(&self) -> &[PrincipalType] {
        self.handler_state().handled()
    }

    /// Check whether a guard named `guard_name` is defined on this component.
    fn responds_to(&self, guard_name: &str) -> bool {
        self.handler_state().guard(guard_name).is_some()
    }

    /// Invoke a guard by name.
    fn call_guard(&self, guard_name: &str, request: &mut AuthRequest) -> AuthResult<GuardOutcome> {
        self.handler_state()
            .guard(guard_name)
            .ok_or_else(|| AuthError::UnknownGuard(guard_name.to_string()))?
            .call(request)
    }
}
