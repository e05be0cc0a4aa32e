//! Principal types and the naming descriptors derived from them.
//!
//! An [`Entity`] records every name the guards of one principal type need:
//! the guard operation names, the request parameter names and the header
//! names the token and identifier are read from.

use std::fmt;

use crate::config::TokenAuthConfig;
use crate::error::{AuthError, AuthResult};

/// Reference to a principal type (e.g. `User`, `SuperAdmin`, `Admin::User`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalType {
    name: String,
}

impl PrincipalType {
    /// Create a principal type reference.
    ///
    /// The name is validated when the type is registered, not here.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check the naming contract: one or more `::`-separated segments, each
    /// starting with an ASCII uppercase letter followed by ASCII alphanumerics.
    pub fn validate(&self) -> AuthResult<()> {
        let valid = !self.name.is_empty()
            && self.name.split("::").all(|segment| {
                let mut chars = segment.chars();
                matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
                    && chars.all(|c| c.is_ascii_alphanumeric())
            });

        if valid {
            Ok(())
        } else {
            Err(AuthError::UnknownPrincipalType(self.name.clone()))
        }
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for PrincipalType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Naming descriptor for one registered principal type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Principal type name, e.g. `SuperAdmin`.
    pub name: String,
    /// Snake-case name used in every derived identifier, e.g. `super_admin`.
    pub name_underscore: String,
    /// Identifier field used to locate principals, if configured.
    pub identifier: Option<String>,
    /// Request parameter carrying the token, e.g. `super_admin_token`.
    pub token_param_name: String,
    /// Request parameter carrying the identifier, e.g. `super_admin_email`.
    pub identifier_param_name: Option<String>,
    /// Header carrying the token, e.g. `X-SuperAdmin-Token`.
    pub token_header_name: String,
    /// Header carrying the identifier, e.g. `X-SuperAdmin-Email`.
    pub identifier_header_name: Option<String>,
    /// Non-strict guard name, e.g. `authenticate_super_admin_from_token`.
    pub auth_guard_name: String,
    /// Strict guard name, e.g. `authenticate_super_admin_from_token!`.
    pub auth_guard_bang_name: String,
    /// Strict guard of the session strategy, e.g. `authenticate_super_admin!`.
    pub fallback_guard_name: String,
}

impl Entity {
    /// Derive the descriptor for a principal type.
    ///
    /// `alias` replaces the snake-case name derived from the type name.
    pub fn new(
        principal_type: &PrincipalType,
        alias: Option<&str>,
        config: &TokenAuthConfig,
    ) -> AuthResult<Self> {
        principal_type.validate()?;
        let name = principal_type.name().to_string();

        let (name_underscore, header_base) = match alias {
            Some(alias) => {
                if !is_snake_identifier(alias) {
                    return Err(AuthError::Config(format!(
                        "invalid alias '{}' for principal type '{}'",
                        alias, name
                    )));
                }
                (alias.to_string(), camelize(alias))
            }
            None => (underscore(&name), name.replace("::", "")),
        };

        let identifier = config.identifiers.get(&name).cloned();
        let headers = config.header_names.get(&name);

        let token_header_name = headers
            .and_then(|h| h.token.clone())
            .unwrap_or_else(|| format!("X-{}-Token", header_base));
        let identifier_header_name = identifier.as_ref().map(|field| {
            headers
                .and_then(|h| h.identifier.clone())
                .unwrap_or_else(|| format!("X-{}-{}", header_base, camelize(field)))
        });

        Ok(Self {
            token_param_name: format!("{}_token", name_underscore),
            identifier_param_name: identifier
                .as_ref()
                .map(|field| format!("{}_{}", name_underscore, field)),
            token_header_name,
            identifier_header_name,
            auth_guard_name: format!("authenticate_{}_from_token", name_underscore),
            auth_guard_bang_name: format!("authenticate_{}_from_token!", name_underscore),
            fallback_guard_name: format!("authenticate_{}!", name_underscore),
            identifier,
            name_underscore,
            name,
        })
    }

    /// Both guard names, non-strict first.
    pub fn guard_names(&self) -> [&str; 2] {
        [&self.auth_guard_name, &self.auth_guard_bang_name]
    }
}

/// Convert a type name to snake case (`Admin::SuperUser` -> `admin_super_user`).
pub fn underscore(name: &str) -> String {
    name.split("::")
        .map(underscore_segment)
        .collect::<Vec<_>>()
        .join("_")
}

fn underscore_segment(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut out = String::with_capacity(segment.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out
}

/// Convert a snake-case name to camel case (`super_admin` -> `SuperAdmin`).
pub fn camelize(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn is_snake_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore() {
        assert_eq!(underscore("User"), "user");
        assert_eq!(underscore("SuperAdmin"), "super_admin");
        assert_eq!(underscore("Admin::User"), "admin_user");
        assert_eq!(underscore("HTTPClient"), "http_client");
        assert_eq!(underscore("User2Factor"), "user2_factor");
    }

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("super_admin"), "SuperAdmin");
        assert_eq!(camelize("email"), "Email");
    }

    #[test]
    fn test_validate() {
        assert!(PrincipalType::new("User").validate().is_ok());
        assert!(PrincipalType::new("Admin::User").validate().is_ok());

        for bad in ["", "user", "Super Admin", "Admin::", "::User", "User-Model"] {
            let err = PrincipalType::new(bad).validate().unwrap_err();
            assert!(matches!(err, AuthError::UnknownPrincipalType(_)), "{bad}");
        }
    }

    #[test]
    fn test_derived_names() {
        let entity = Entity::new(&"SuperAdmin".into(), None, &TokenAuthConfig::default()).unwrap();

        assert_eq!(entity.name, "SuperAdmin");
        assert_eq!(entity.token_param_name, "super_admin_token");
        assert_eq!(entity.token_header_name, "X-SuperAdmin-Token");
        assert_eq!(entity.auth_guard_name, "authenticate_super_admin_from_token");
        assert_eq!(entity.auth_guard_bang_name, "authenticate_super_admin_from_token!");
        assert_eq!(entity.fallback_guard_name, "authenticate_super_admin!");
        assert!(entity.identifier.is_none());
        assert!(entity.identifier_param_name.is_none());
    }

    #[test]
    fn test_identifier_and_header_overrides() {
        let config: TokenAuthConfig = serde_json::from_str(
            r#"{
                "identifiers": { "User": "email" },
                "header_names": { "User": { "token": "X-Auth-Token" } }
            }"#,
        )
        .unwrap();

        let entity = Entity::new(&"User".into(), None, &config).unwrap();
        assert_eq!(entity.identifier.as_deref(), Some("email"));
        assert_eq!(entity.identifier_param_name.as_deref(), Some("user_email"));
        assert_eq!(entity.token_header_name, "X-Auth-Token");
        assert_eq!(entity.identifier_header_name.as_deref(), Some("X-User-Email"));
    }

    #[test]
    fn test_alias() {
        let entity =
            Entity::new(&"User".into(), Some("member"), &TokenAuthConfig::default()).unwrap();
        assert_eq!(entity.name, "User");
        assert_eq!(entity.auth_guard_name, "authenticate_member_from_token");
        assert_eq!(entity.token_param_name, "member_token");
        assert_eq!(entity.token_header_name, "X-Member-Token");

        let err = Entity::new(&"User".into(), Some("Member!"), &TokenAuthConfig::default())
            .unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }
}
