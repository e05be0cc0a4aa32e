//! Tokenguard CLI - evaluate token guards against a simulated request.

mod config;

use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Args, FallbackKind};
use tokenguard_core::{
    new_shared_entities, ActsAsTokenAuthenticationHandler, AuthRequest, Controller, Dispatch,
    MemoryPrincipalStore, PrincipalType, RegistrationOptions, RejectAllStrategy,
    SessionStoreStrategy, SessionStrategy, TokenAuthConfig, TokenAuthenticationHandler,
};

fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args) {
        Ok(false) => {}
        Ok(true) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Register the requested types, dispatch the action and print a report.
/// Returns whether the dispatch was halted.
fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => TokenAuthConfig::from_file(path)?,
        None => TokenAuthConfig::default(),
    }
    .with_env_overrides()?;

    let store = match &args.principals {
        Some(path) => MemoryPrincipalStore::from_file(path)?,
        None => MemoryPrincipalStore::from_default_env(),
    };

    tracing::info!(
        principals = store.len(),
        sign_in_token = config.sign_in_token,
        install_hooks = config.install_hooks,
        "configuration loaded"
    );

    let fallback: Arc<dyn SessionStrategy> = match args.fallback {
        FallbackKind::Session => Arc::new(SessionStoreStrategy),
        FallbackKind::Reject => Arc::new(RejectAllStrategy),
    };

    let entities = new_shared_entities(config);
    let mut controller = Controller::new("CliController", entities, Arc::new(store), fallback);

    let mut registered = Vec::with_capacity(args.types.len());
    for name in &args.types {
        let options = RegistrationOptions::from_json_str(&args.options)?;
        let principal_type = PrincipalType::new(name.as_str());
        let entity = controller.acts_as_token_authentication_handler_for(&principal_type, options)?;
        tracing::info!(
            principal = %entity.name,
            guard = %entity.auth_guard_bang_name,
            "registered"
        );
        registered.push(entity);
    }

    let mut request = AuthRequest::new();
    for (name, value) in args.params {
        request = request.with_param(name, value);
    }
    for (name, value) in args.headers {
        request = request.with_header(name, value);
    }

    let dispatch = controller.dispatch(&args.action, &mut request)?;

    let authenticated: serde_json::Map<String, serde_json::Value> = registered
        .iter()
        .filter_map(|entity| {
            request.current(&entity.name_underscore).map(|p| {
                (
                    entity.name_underscore.clone(),
                    json!({ "type": p.principal_type, "id": p.id }),
                )
            })
        })
        .collect();

    let (report, halted) = match dispatch {
        Dispatch::Proceed => (
            json!({
                "action": args.action,
                "result": "proceed",
                "handled": controller
                    .handled_token_authenticatables()
                    .iter()
                    .map(PrincipalType::name)
                    .collect::<Vec<_>>(),
                "authenticated": authenticated,
            }),
            false,
        ),
        Dispatch::Halted(rejection) => (
            json!({
                "action": args.action,
                "result": "unauthenticated",
                "guard": rejection.guard,
                "reason": rejection.reason.to_string(),
            }),
            true,
        ),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(halted)
}
