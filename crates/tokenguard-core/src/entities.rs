//! Process-wide registry of entity descriptors.
//!
//! The registry is built once at application start and shared by reference
//! with every component that registers principal types.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::TokenAuthConfig;
use crate::entity::{underscore, Entity, PrincipalType};
use crate::error::{AuthError, AuthResult};

/// Registry mapping principal types to their descriptors.
pub struct EntitiesManager {
    config: Arc<TokenAuthConfig>,
    entities: RwLock<HashMap<String, Arc<Entity>>>,
}

/// Shared handle to an entities registry.
pub type SharedEntitiesManager = Arc<EntitiesManager>;

/// Create a shared registry for the given configuration.
pub fn new_shared_entities(config: TokenAuthConfig) -> SharedEntitiesManager {
    Arc::new(EntitiesManager::new(config))
}

impl EntitiesManager {
    /// Create an empty registry.
    pub fn new(config: TokenAuthConfig) -> Self {
        Self {
            config: Arc::new(config),
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// The configuration descriptors are derived with.
    pub fn config(&self) -> &Arc<TokenAuthConfig> {
        &self.config
    }

    /// Return the descriptor for a principal type, creating it on first use.
    ///
    /// Creation happens at most once per key even under concurrent callers.
    /// An alias equal to the derived snake-case name resolves to the
    /// unaliased descriptor.
    pub fn find_or_create_entity(
        &self,
        principal_type: &PrincipalType,
        alias: Option<&str>,
    ) -> AuthResult<Arc<Entity>> {
        let key = registry_key(principal_type, alias);

        if let Some(entity) = self.entities.read().get(&key) {
            return Ok(entity.clone());
        }

        let mut entities = self.entities.write();
        if let Some(entity) = entities.get(&key) {
            return Ok(entity.clone());
        }

        let alias = alias.filter(|alias| *alias != underscore(principal_type.name()));
        let entity = Entity::new(principal_type, alias, &self.config)?;

        if let Some(existing) = entities
            .values()
            .find(|e| e.name_underscore == entity.name_underscore && e.name != entity.name)
        {
            return Err(AuthError::GuardNameCollision {
                name: entity.name_underscore.clone(),
                existing: existing.name.clone(),
                requested: entity.name.clone(),
            });
        }

        tracing::debug!(
            principal = %entity.name,
            guard = %entity.auth_guard_name,
            "entity descriptor created"
        );

        let entity = Arc::new(entity);
        entities.insert(key, entity.clone());
        Ok(entity)
    }

    /// Look up an existing descriptor without creating one.
    pub fn get(&self, principal_type: &PrincipalType, alias: Option<&str>) -> Option<Arc<Entity>> {
        self.entities
            .read()
            .get(&registry_key(principal_type, alias))
            .cloned()
    }

    /// All registered descriptors, in no particular order.
    pub fn entities(&self) -> Vec<Arc<Entity>> {
        self.entities.read().values().cloned().collect()
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Check if no descriptor has been created yet.
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}

impl Default for EntitiesManager {
    fn default() -> Self {
        Self::new(TokenAuthConfig::default())
    }
}

/// An alias equal to the derived snake-case name keys the plain type.
fn registry_key(principal_type: &PrincipalType, alias: Option<&str>) -> String {
    let name = principal_type.name();
    match alias {
        Some(alias) if alias != underscore(name) => format!("{} as {}", name, alias),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_starts_empty() {
        let manager = EntitiesManager::default();
        assert!(manager.is_empty());
        assert!(manager.get(&"User".into(), None).is_none());
    }

    #[test]
    fn test_find_or_create_is_idempotent() {
        let manager = EntitiesManager::default();
        let user = PrincipalType::new("User");

        let first = manager.find_or_create_entity(&user, None).unwrap();
        let second = manager.find_or_create_entity(&user, None).unwrap();

        assert_eq!(*first, *second);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_distinct_types() {
        let manager = EntitiesManager::default();
        manager.find_or_create_entity(&"User".into(), None).unwrap();
        manager.find_or_create_entity(&"SuperAdmin".into(), None).unwrap();
        manager.find_or_create_entity(&"User".into(), Some("member")).unwrap();

        assert_eq!(manager.len(), 3);
    }

    #[test]
    fn test_alias_matching_derived_name_reuses_entity() {
        let manager = EntitiesManager::default();
        let user = PrincipalType::new("User");

        let plain = manager.find_or_create_entity(&user, None).unwrap();
        let aliased = manager.find_or_create_entity(&user, Some("user")).unwrap();

        assert!(Arc::ptr_eq(&plain, &aliased));
        assert_eq!(manager.len(), 1);
        assert!(manager.get(&user, Some("user")).is_some());

        let manager = EntitiesManager::default();
        let admin = PrincipalType::new("Admin::Staff");
        let aliased = manager.find_or_create_entity(&admin, Some("admin_staff")).unwrap();
        let plain = manager.find_or_create_entity(&admin, None).unwrap();

        assert!(Arc::ptr_eq(&plain, &aliased));
        assert_eq!(aliased.token_header_name, "X-AdminStaff-Token");
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_invalid_type_is_not_registered() {
        let manager = EntitiesManager::default();
        let err = manager.find_or_create_entity(&"user".into(), None).unwrap_err();

        assert!(matches!(err, AuthError::UnknownPrincipalType(_)));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_guard_name_collision() {
        let manager = EntitiesManager::default();
        manager.find_or_create_entity(&"A::Bc".into(), None).unwrap();

        let err = manager.find_or_create_entity(&"ABc".into(), None).unwrap_err();
        assert!(matches!(err, AuthError::GuardNameCollision { .. }));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_concurrent_first_use() {
        let manager = Arc::new(EntitiesManager::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || manager.find_or_create_entity(&"User".into(), None).unwrap())
            })
            .collect();

        let entities: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(manager.len(), 1);
        assert!(entities.iter().all(|e| Arc::ptr_eq(e, &entities[0])));
    }
}
