//! Token extraction and comparison.

use subtle::ConstantTimeEq;

use crate::entity::Entity;
use crate::request::AuthRequest;

/// Credentials located on a request for one principal type.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials<'a> {
    /// Token value.
    pub token: &'a str,
    /// Identifier value, when the entity is configured with one.
    pub identifier: Option<&'a str>,
}

impl std::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("identifier", &self.identifier)
            .finish()
    }
}

/// Read the token (and identifier) for `entity` from params, then headers.
///
/// Returns `None` when the token is missing or blank, or when the entity
/// needs an identifier and none was sent.
pub fn extract_credentials<'a>(
    entity: &Entity,
    request: &'a AuthRequest,
) -> Option<Credentials<'a>> {
    let token = lookup(
        request,
        Some(entity.token_param_name.as_str()),
        Some(entity.token_header_name.as_str()),
    )?;

    let identifier = match entity.identifier {
        Some(_) => Some(lookup(
            request,
            entity.identifier_param_name.as_deref(),
            entity.identifier_header_name.as_deref(),
        )?),
        None => None,
    };

    Some(Credentials { token, identifier })
}

fn lookup<'a>(
    request: &'a AuthRequest,
    param: Option<&str>,
    header: Option<&str>,
) -> Option<&'a str> {
    param
        .and_then(|name| request.param(name))
        .or_else(|| header.and_then(|name| request.header(name)))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Constant-time token comparison.
///
/// Length mismatches still run a comparison so timing does not reveal
/// whether the length matched.
pub fn secure_compare(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenAuthConfig;
    use crate::entity::PrincipalType;

    fn user_entity(config: &TokenAuthConfig) -> Entity {
        Entity::new(&PrincipalType::new("User"), None, config).unwrap()
    }

    #[test]
    fn test_secure_compare() {
        assert!(secure_compare("abc123", "abc123"));
        assert!(!secure_compare("abc124", "abc123"));
        assert!(!secure_compare("abc", "abc123"));
        assert!(!secure_compare("", "abc123"));
    }

    #[test]
    fn test_param_takes_precedence_over_header() {
        let entity = user_entity(&TokenAuthConfig::default());
        let request = AuthRequest::new()
            .with_param("user_token", "from-param")
            .with_header("X-User-Token", "from-header");

        let creds = extract_credentials(&entity, &request).unwrap();
        assert_eq!(creds.token, "from-param");
        assert!(creds.identifier.is_none());
    }

    #[test]
    fn test_header_fallback() {
        let entity = user_entity(&TokenAuthConfig::default());
        let request = AuthRequest::new().with_header("x-user-token", "from-header");

        assert_eq!(extract_credentials(&entity, &request).unwrap().token, "from-header");
    }

    #[test]
    fn test_missing_or_blank_token() {
        let entity = user_entity(&TokenAuthConfig::default());
        assert!(extract_credentials(&entity, &AuthRequest::new()).is_none());

        let blank = AuthRequest::new().with_param("user_token", "  ");
        assert!(extract_credentials(&entity, &blank).is_none());
    }

    #[test]
    fn test_identifier_required_when_configured() {
        let entity = user_entity(&TokenAuthConfig::default().with_identifier("User", "email"));

        let token_only = AuthRequest::new().with_param("user_token", "tok");
        assert!(extract_credentials(&entity, &token_only).is_none());

        let full = token_only.with_header("X-User-Email", "alice@example.com");
        let creds = extract_credentials(&entity, &full).unwrap();
        assert_eq!(creds.identifier, Some("alice@example.com"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials { token: "secret", identifier: None };
        assert!(!format!("{:?}", creds).contains("secret"));
    }
}
