//! Declarative entry point for token authentication handlers.
//!
//! Every [`TokenAuthenticationHandler`] gains these methods through a
//! blanket implementation, so declaring a component a handler twice is a
//! no-op at the type level.

use std::sync::Arc;

use crate::entity::{Entity, PrincipalType};
use crate::error::AuthResult;
use crate::handler::TokenAuthenticationHandler;
use crate::options::RegistrationOptions;

/// Declarative registration of principal types on a handler component.
pub trait ActsAsTokenAuthenticationHandler: TokenAuthenticationHandler {
    /// Require token authentication for `principal_type` before every
    /// matched action of this component.
    fn acts_as_token_authentication_handler_for(
        &mut self,
        principal_type: &PrincipalType,
        options: RegistrationOptions,
    ) -> AuthResult<Arc<Entity>> {
        self.handle_token_authentication_for(principal_type, options)
    }

    /// Former name of [`Self::acts_as_token_authentication_handler_for`].
    #[deprecated(since = "0.1.0", note = "use `acts_as_token_authentication_handler_for`")]
    fn acts_as_token_authentication_handler(
        &mut self,
        principal_type: &PrincipalType,
        options: RegistrationOptions,
    ) -> AuthResult<Arc<Entity>> {
        self.acts_as_token_authentication_handler_for(principal_type, options)
    }
}

impl<T: TokenAuthenticationHandler + ?Sized> ActsAsTokenAuthenticationHandler for T {}
