//! Tokenguard Core - per-principal bearer token guards.
//!
//! Components declare which principal types (e.g. `User`, `SuperAdmin`)
//! must authenticate with a token before their actions run. Each
//! registration generates a non-strict and a strict guard named after the
//! principal type and installs the strict one as a pre-dispatch hook. The
//! strict guard may fall back to a session-based strategy.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokenguard_core::{
//!     new_shared_entities, ActsAsTokenAuthenticationHandler, AuthRequest, Controller,
//!     MemoryPrincipalStore, RegistrationOptions, SessionStoreStrategy, TokenAuthConfig,
//! };
//!
//! let entities = new_shared_entities(TokenAuthConfig::default());
//! let mut controller = Controller::new(
//!     "PostsController",
//!     entities,
//!     Arc::new(MemoryPrincipalStore::from_default_env()),
//!     Arc::new(SessionStoreStrategy),
//! );
//! controller
//!     .acts_as_token_authentication_handler_for(&"User".into(), RegistrationOptions::new())?;
//!
//! let mut request = AuthRequest::new().with_header("X-User-Token", "tok-alice");
//! let dispatch = controller.dispatch("index", &mut request)?;
//! ```

pub mod acts_as;
pub mod config;
pub mod controller;
pub mod entities;
pub mod entity;
pub mod error;
pub mod fallback;
pub mod guard;
pub mod handler;
pub mod options;
pub mod principal;
pub mod request;
pub mod token;

pub use acts_as::ActsAsTokenAuthenticationHandler;
pub use config::{HeaderNames, TokenAuthConfig};
pub use controller::{BeforeHook, Controller, Dispatch};
pub use entities::{new_shared_entities, EntitiesManager, SharedEntitiesManager};
pub use entity::{Entity, PrincipalType};
pub use error::{AuthError, AuthResult};
pub use fallback::{RejectAllStrategy, SessionStoreStrategy, SessionStrategy};
pub use guard::{Guard, GuardContext, GuardOutcome, Rejection, RejectionReason};
pub use handler::{HandlerState, HookRegistry, TokenAuthenticationHandler};
pub use options::{HookOptions, RegistrationOptions};
pub use principal::{MemoryPrincipalStore, Principal, PrincipalStore};
pub use request::{AuthRequest, SignIn};
