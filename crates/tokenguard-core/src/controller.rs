//! A request-dispatching component with a before-action hook chain.

use std::sync::Arc;

use serde_json::Value;

use crate::entities::SharedEntitiesManager;
use crate::error::AuthResult;
use crate::fallback::SessionStrategy;
use crate::guard::{GuardContext, GuardOutcome, Rejection};
use crate::handler::{HandlerState, HookRegistry, TokenAuthenticationHandler};
use crate::options::HookOptions;
use crate::principal::PrincipalStore;
use crate::request::AuthRequest;

/// An operation run before matched actions.
#[derive(Debug, Clone, PartialEq)]
pub struct BeforeHook {
    /// Name of the operation to run.
    pub name: String,
    /// Hook options; `only` and `except` restrict the matched actions.
    pub options: HookOptions,
}

impl BeforeHook {
    /// Check whether this hook runs before `action`.
    pub fn applies_to(&self, action: &str) -> bool {
        if let Some(only) = self.options.get("only") {
            return action_listed(only, action);
        }
        if let Some(except) = self.options.get("except") {
            return !action_listed(except, action);
        }
        true
    }
}

fn action_listed(value: &Value, action: &str) -> bool {
    match value {
        Value::String(name) => name == action,
        Value::Array(names) => names.iter().any(|n| n.as_str() == Some(action)),
        _ => false,
    }
}

/// Result of dispatching an action through the hook chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Every hook passed; the action runs.
    Proceed,
    /// A hook rejected the request.
    Halted(Rejection),
}

/// Component holding registered guards and the hooks that run them.
pub struct Controller {
    name: String,
    state: HandlerState,
    hooks: Vec<BeforeHook>,
    entities: SharedEntitiesManager,
    context: GuardContext,
}

impl Controller {
    /// Create a controller with no registered principal types.
    pub fn new(
        name: impl Into<String>,
        entities: SharedEntitiesManager,
        store: Arc<dyn PrincipalStore>,
        fallback: Arc<dyn SessionStrategy>,
    ) -> Self {
        let context = GuardContext::new(store, fallback)
            .with_sign_in_token(entities.config().sign_in_token);

        Self {
            name: name.into(),
            state: HandlerState::new(),
            hooks: Vec::new(),
            entities,
            context,
        }
    }

    /// Controller name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Installed hooks, in installation order.
    pub fn hooks(&self) -> &[BeforeHook] {
        &self.hooks
    }

    /// Run the hooks matching `action` in order, stopping at the first rejection.
    pub fn dispatch(&self, action: &str, request: &mut AuthRequest) -> AuthResult<Dispatch> {
        for hook in self.hooks.iter().filter(|h| h.applies_to(action)) {
            if let GuardOutcome::Rejected(rejection) = self.call_guard(&hook.name, request)? {
                tracing::debug!(
                    controller = %self.name,
                    action,
                    guard = %rejection.guard,
                    "action halted"
                );
                return Ok(Dispatch::Halted(rejection));
            }
        }
        Ok(Dispatch::Proceed)
    }
}

impl HookRegistry for Controller {
    fn install_hook(&mut self, hook_name: &str, options: HookOptions) {
        self.hooks.push(BeforeHook {
            name: hook_name.to_string(),
            options,
        });
    }
}

impl TokenAuthenticationHandler for Controller {
    fn handler_state(&self) -> &HandlerState {
        &self.state
    }

    fn handler_state_mut(&mut self) -> &mut HandlerState {
        &mut self.state
    }

    fn entities_manager(&self) -> &SharedEntitiesManager {
        &self.entities
    }

    fn guard_context(&self) -> &GuardContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hook(options: Value) -> BeforeHook {
        BeforeHook {
            name: "authenticate_user_from_token!".to_string(),
            options: options.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_hook_applies_to_all_actions_by_default() {
        assert!(hook(json!({})).applies_to("index"));
        assert!(hook(json!({"role": "admin"})).applies_to("show"));
    }

    #[test]
    fn test_hook_only() {
        let h = hook(json!({"only": ["create", "update"]}));
        assert!(h.applies_to("create"));
        assert!(!h.applies_to("index"));

        assert!(hook(json!({"only": "index"})).applies_to("index"));
    }

    #[test]
    fn test_hook_except() {
        let h = hook(json!({"except": "index"}));
        assert!(!h.applies_to("index"));
        assert!(h.applies_to("show"));
    }
}
