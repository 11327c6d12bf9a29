//! Staff user management.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use super::listing;
use super::student::delete_profile;
use crate::error::{ServiceError, ServiceResult};
use crate::filter::{
    Compile, Entity, EntityCatalog, FacetResult, ListResult, PageRequest, UserCriteria,
};
use crate::models::{Person, UserInput, UserSummary};
use crate::store::{Store, schema};
use crate::validate::{
    AccountKind, PersonFields, ValidationError, ValidationRules, non_blank, role_name_is_valid,
};

const ENTITY: &str = "user";

pub struct UserService {
    store: Arc<dyn Store>,
    rules: ValidationRules,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, rules: ValidationRules) -> Self {
        Self { store, rules }
    }

    fn catalog() -> &'static EntityCatalog {
        Entity::User.catalog()
    }

    /// Create an enabled staff account.
    pub async fn create(&self, input: UserInput) -> ServiceResult<UserSummary> {
        let input = self.normalize(input)?;
        let id = input.id_number;
        let key = JsonValue::from(id);
        if self.store.exists(schema::PEOPLE, &key).await? {
            warn!(id_number = id, "user create rejected: id number taken");
            return Err(ServiceError::duplicate(ENTITY, id));
        }

        let mut person = Person {
            id_number: id,
            first_name: None,
            link_name: None,
            last_name: None,
            email: None,
            enabled: true,
            date_assigned_to_house: None,
            house: None,
            roles: Vec::new(),
        };
        apply(&mut person, input);
        listing::insert(&*self.store, schema::PEOPLE, ENTITY, &key, &person).await?;
        info!(id_number = id, roles = ?person.roles, "user created");
        Ok(person.into())
    }

    pub async fn get(&self, id_number: i32) -> ServiceResult<UserSummary> {
        Ok(self.find(id_number).await?.into())
    }

    pub async fn find(&self, id_number: i32) -> ServiceResult<Person> {
        listing::require(&*self.store, schema::PEOPLE, ENTITY, &JsonValue::from(id_number)).await
    }

    /// Users holding any of the criteria's roles; by default the staff roles.
    pub async fn list(
        &self,
        criteria: &UserCriteria,
        request: &PageRequest,
    ) -> ServiceResult<ListResult<UserSummary>> {
        let page: ListResult<Person> =
            listing::fetch_page(&*self.store, Self::catalog(), &criteria.compile(), request)
                .await?;
        Ok(ListResult::new(
            page.rows.into_iter().map(UserSummary::from).collect(),
            page.total,
        ))
    }

    /// Replace the user's fields. The id number in the input is ignored.
    ///
    /// Students are refused: their status depends on these fields, so they
    /// change through [`StudentService`](super::StudentService).
    pub async fn update(&self, id_number: i32, input: UserInput) -> ServiceResult<UserSummary> {
        let input = self.normalize(UserInput { id_number, ..input })?;
        let mut person = self.find(id_number).await?;
        let key = JsonValue::from(id_number);
        if self.store.exists(schema::STUDENT_PROFILES, &key).await? {
            warn!(id_number, "user update rejected: student account");
            return Err(ServiceError::StudentAccount { id_number });
        }
        apply(&mut person, input);
        listing::replace(&*self.store, schema::PEOPLE, ENTITY, &key, &person).await?;
        info!(id_number, "user updated");
        Ok(person.into())
    }

    pub async fn delete(&self, id_number: i32) -> ServiceResult<String> {
        let key = JsonValue::from(id_number);
        if !self.store.exists(schema::PEOPLE, &key).await? {
            return Err(ServiceError::not_found(ENTITY, id_number));
        }
        delete_profile(&*self.store, id_number).await?;
        let message = listing::remove(&*self.store, schema::PEOPLE, ENTITY, &key).await?;
        info!(id_number, "user deleted");
        Ok(message)
    }

    pub async fn filterables(&self) -> ServiceResult<FacetResult> {
        listing::filterables(&*self.store, Self::catalog()).await
    }

    fn normalize(&self, input: UserInput) -> Result<UserInput, ValidationError> {
        let input = UserInput {
            id_number: input.id_number,
            first_name: non_blank(input.first_name),
            link_name: non_blank(input.link_name),
            last_name: non_blank(input.last_name),
            email: non_blank(input.email),
            house: non_blank(input.house),
            roles: input.roles.into_iter().map(|r| r.trim().to_string()).collect(),
        };
        let result = self
            .rules
            .validate_person(
                AccountKind::Staff,
                PersonFields {
                    id_number: input.id_number.into(),
                    first_name: input.first_name.as_deref(),
                    link_name: input.link_name.as_deref(),
                    last_name: input.last_name.as_deref(),
                    email: input.email.as_deref(),
                },
            )
            .and_then(|()| match input.roles.iter().find(|r| !role_name_is_valid(r)) {
                Some(role) => Err(ValidationError::InvalidRole(role.clone())),
                None => Ok(()),
            });
        if let Err(err) = result {
            warn!(error = %err, "user input rejected");
            return Err(err);
        }
        Ok(input)
    }
}

fn apply(person: &mut Person, input: UserInput) {
    person.first_name = input.first_name;
    person.link_name = input.link_name;
    person.last_name = input.last_name;
    person.email = input.email;
    person.roles = input.roles;
    person.assign_house(input.house, listing::today());
}
