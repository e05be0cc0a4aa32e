//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Session strategy consulted when token authentication falls back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FallbackKind {
    /// Authenticate principals stored in the request session.
    Session,
    /// Reject every fallback.
    Reject,
}

/// Evaluate token guards against a simulated request.
#[derive(Parser, Debug)]
#[command(name = "tokenguard")]
#[command(version, about = "Evaluate token authentication guards", long_about = None)]
pub struct Args {
    /// JSON configuration file (header names, identifiers, sign-in storage).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file with stored principals. Defaults to `TOKENGUARD_PRINCIPALS`.
    #[arg(short, long)]
    pub principals: Option<PathBuf>,

    /// Principal types to register on the controller, in order.
    #[arg(short = 't', long = "type", required = true)]
    pub types: Vec<String>,

    /// Registration options as a JSON object, applied to every type.
    #[arg(short, long, default_value = "{}")]
    pub options: String,

    /// Action to dispatch.
    #[arg(short, long, default_value = "index")]
    pub action: String,

    /// Request parameter as `name=value`.
    #[arg(long = "param", value_parser = parse_pair)]
    pub params: Vec<(String, String)>,

    /// Request header as `name=value`.
    #[arg(long = "header", value_parser = parse_pair)]
    pub headers: Vec<(String, String)>,

    /// Fallback session strategy.
    #[arg(long, default_value = "session", value_enum)]
    pub fallback: FallbackKind,

    /// Log level filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "tokenguard=info")]
    pub log_filter: String,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("user_token=abc=def").unwrap(),
            ("user_token".to_string(), "abc=def".to_string())
        );
        assert!(parse_pair("no-separator").is_err());
        assert!(parse_pair("=value").is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "tokenguard",
            "--type",
            "User",
            "--param",
            "user_token=tok",
            "--fallback",
            "reject",
        ])
        .unwrap();

        assert_eq!(args.types, vec!["User".to_string()]);
        assert_eq!(args.params, vec![("user_token".to_string(), "tok".to_string())]);
        assert_eq!(args.fallback, FallbackKind::Reject);
        assert_eq!(args.action, "index");
    }
}
