//! Roles and the permissions attached to them.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use super::listing;
use crate::error::{ServiceError, ServiceResult};
use crate::filter::{
    Compile, Entity, EntityCatalog, FacetResult, ListResult, NoCriteria, PageRequest,
};
use crate::models::{Permissions, Role};
use crate::store::{Store, schema};
use crate::validate::{ValidationError, role_name_is_valid};

pub struct RoleService {
    store: Arc<dyn Store>,
}

impl RoleService {
    const ENTITY: &'static str = "role";

    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn catalog() -> &'static EntityCatalog {
        Entity::Role.catalog()
    }

    pub async fn create(&self, role: Role) -> ServiceResult<Role> {
        check_role_name(&role.role)?;
        let key = JsonValue::from(role.role.as_str());
        listing::insert(&*self.store, schema::ROLES, Self::ENTITY, &key, &role).await?;
        info!(role = %role.role, "role created");
        Ok(role)
    }

    pub async fn get(&self, role: &str) -> ServiceResult<Role> {
        listing::require(&*self.store, schema::ROLES, Self::ENTITY, &JsonValue::from(role)).await
    }

    pub async fn list(&self, request: &PageRequest) -> ServiceResult<ListResult<Role>> {
        listing::fetch_page(&*self.store, Self::catalog(), &NoCriteria {}.compile(), request).await
    }

    /// Replace the role's privileges.
    pub async fn update(&self, role: &str, privileges: Vec<String>) -> ServiceResult<Role> {
        let mut stored = self.get(role).await?;
        stored.privileges = privileges;
        let key = JsonValue::from(role);
        listing::replace(&*self.store, schema::ROLES, Self::ENTITY, &key, &stored).await?;
        info!(role, "role updated");
        Ok(stored)
    }

    /// Delete the role and its permissions record.
    pub async fn delete(&self, role: &str) -> ServiceResult<String> {
        let key = JsonValue::from(role);
        if !self.store.exists(schema::ROLES, &key).await? {
            return Err(ServiceError::not_found(Self::ENTITY, role));
        }
        self.store.delete(schema::PERMISSIONS, &key).await?;
        let message = listing::remove(&*self.store, schema::ROLES, Self::ENTITY, &key).await?;
        info!(role, "role deleted");
        Ok(message)
    }

    pub async fn filterables(&self) -> ServiceResult<FacetResult> {
        listing::filterables(&*self.store, Self::catalog()).await
    }
}

pub struct PermissionsService {
    store: Arc<dyn Store>,
}

impl PermissionsService {
    const ENTITY: &'static str = "permissions";

    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn catalog() -> &'static EntityCatalog {
        Entity::Permissions.catalog()
    }

    /// Attach permissions to an existing role.
    pub async fn create(&self, permissions: Permissions) -> ServiceResult<Permissions> {
        check_role_name(&permissions.role)?;
        let key = JsonValue::from(permissions.role.as_str());
        if !self.store.exists(schema::ROLES, &key).await? {
            warn!(role = %permissions.role, "permissions rejected: role does not exist");
            return Err(ServiceError::not_found(RoleService::ENTITY, &permissions.role));
        }
        listing::insert(&*self.store, schema::PERMISSIONS, Self::ENTITY, &key, &permissions)
            .await?;
        info!(role = %permissions.role, "permissions created");
        Ok(permissions)
    }

    pub async fn get(&self, role: &str) -> ServiceResult<Permissions> {
        listing::require(
            &*self.store,
            schema::PERMISSIONS,
            Self::ENTITY,
            &JsonValue::from(role),
        )
        .await
    }

    pub async fn list(&self, request: &PageRequest) -> ServiceResult<ListResult<Permissions>> {
        listing::fetch_page(&*self.store, Self::catalog(), &NoCriteria {}.compile(), request).await
    }

    pub async fn update(
        &self,
        role: &str,
        permissions: Vec<String>,
    ) -> ServiceResult<Permissions> {
        let mut stored = self.get(role).await?;
        stored.permissions = permissions;
        let key = JsonValue::from(role);
        listing::replace(&*self.store, schema::PERMISSIONS, Self::ENTITY, &key, &stored).await?;
        info!(role, "permissions updated");
        Ok(stored)
    }

    pub async fn delete(&self, role: &str) -> ServiceResult<String> {
        let message = listing::remove(
            &*self.store,
            schema::PERMISSIONS,
            Self::ENTITY,
            &JsonValue::from(role),
        )
        .await?;
        info!(role, "permissions deleted");
        Ok(message)
    }

    pub async fn filterables(&self) -> ServiceResult<FacetResult> {
        listing::filterables(&*self.store, Self::catalog()).await
    }
}

fn check_role_name(role: &str) -> Result<(), ValidationError> {
    if role_name_is_valid(role) {
        Ok(())
    } else {
        warn!(role, "invalid role name");
        Err(ValidationError::InvalidRole(role.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn services() -> (RoleService, PermissionsService) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        (RoleService::new(store.clone()), PermissionsService::new(store))
    }

    fn role(name: &str) -> Role {
        Role {
            role: name.to_string(),
            privileges: vec!["READ".to_string()],
        }
    }

    fn permissions(name: &str) -> Permissions {
        Permissions {
            role: name.to_string(),
            permissions: vec!["houses:read".to_string()],
        }
    }

    #[tokio::test]
    async fn role_names_are_checked() {
        let (roles, _) = services();
        let err = roles.create(role("teacher")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::InvalidRole(_))
        ));
    }

    #[tokio::test]
    async fn permissions_need_an_existing_role() {
        let (roles, perms) = services();
        let err = perms.create(permissions("ROLE_TA")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "role", .. }));

        roles.create(role("ROLE_TA")).await.unwrap();
        perms.create(permissions("ROLE_TA")).await.unwrap();
        let err = perms.create(permissions("ROLE_TA")).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn deleting_a_role_removes_its_permissions() {
        let (roles, perms) = services();
        roles.create(role("ROLE_TA")).await.unwrap();
        perms.create(permissions("ROLE_TA")).await.unwrap();

        roles.delete("ROLE_TA").await.unwrap();
        assert!(matches!(
            perms.get("ROLE_TA").await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn list_is_sorted_by_role() {
        let (roles, _) = services();
        roles.create(role("ROLE_TEACHER")).await.unwrap();
        roles.create(role("ROLE_ADMIN")).await.unwrap();
        let page = roles.list(&PageRequest::default()).await.unwrap();
        let names: Vec<_> = page.rows.iter().map(|r| r.role.as_str()).collect();
        assert_eq!(names, ["ROLE_ADMIN", "ROLE_TEACHER"]);
        assert_eq!(page.total, 2);
        assert!(!page.empty);
    }
}
