//! House management.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use super::listing;
use crate::error::ServiceResult;
use crate::filter::{
    Compile, Entity, EntityCatalog, FacetResult, HouseCriteria, ListResult, PageRequest,
};
use crate::models::{House, HouseInput, HouseSummary, Person};
use crate::store::{Store, schema};
use crate::validate::{AccountKind, ValidationError, id_number_is_valid, non_blank};

const ENTITY: &str = "house";

pub struct HouseService {
    store: Arc<dyn Store>,
}

impl HouseService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn catalog() -> &'static EntityCatalog {
        Entity::House.catalog()
    }

    pub async fn create(&self, input: HouseInput) -> ServiceResult<HouseSummary> {
        let mut input = input;
        input.name = non_blank(Some(input.name))
            .ok_or(ValidationError::MissingField("name"))
            .inspect_err(|_| warn!("house create rejected: no name"))?;
        validate(&input)?;

        let house = House::from(input);
        let key = JsonValue::from(house.name.as_str());
        listing::insert(&*self.store, schema::HOUSES, ENTITY, &key, &house).await?;
        info!(house = %house.name, "house created");
        self.summarize(house).await
    }

    pub async fn get(&self, name: &str) -> ServiceResult<HouseSummary> {
        let house = self.find(name).await?;
        self.summarize(house).await
    }

    /// The stored house without people resolved.
    pub async fn find(&self, name: &str) -> ServiceResult<House> {
        listing::require(&*self.store, schema::HOUSES, ENTITY, &JsonValue::from(name)).await
    }

    pub async fn list(
        &self,
        criteria: &HouseCriteria,
        request: &PageRequest,
    ) -> ServiceResult<ListResult<HouseSummary>> {
        let page: ListResult<House> =
            listing::fetch_page(&*self.store, Self::catalog(), &criteria.compile(), request)
                .await?;
        let mut rows = Vec::with_capacity(page.rows.len());
        for house in page.rows {
            rows.push(self.summarize(house).await?);
        }
        Ok(ListResult::new(rows, page.total))
    }

    /// Replace every field but the name.
    pub async fn update(&self, name: &str, input: HouseInput) -> ServiceResult<HouseSummary> {
        validate(&input)?;
        let mut house = self.find(name).await?;
        house.apply(input);
        let key = JsonValue::from(name);
        listing::replace(&*self.store, schema::HOUSES, ENTITY, &key, &house).await?;
        info!(house = %house.name, "house updated");
        self.summarize(house).await
    }

    pub async fn delete(&self, name: &str) -> ServiceResult<String> {
        let message =
            listing::remove(&*self.store, schema::HOUSES, ENTITY, &JsonValue::from(name)).await?;
        info!(house = %name, "house deleted");
        Ok(message)
    }

    pub async fn filterables(&self) -> ServiceResult<FacetResult> {
        listing::filterables(&*self.store, Self::catalog()).await
    }

    /// Project a house, resolving its housekeeper and prefects. People that
    /// no longer exist are left out.
    pub(crate) async fn summarize(&self, house: House) -> ServiceResult<HouseSummary> {
        let store = &*self.store;
        let housekeeper: Option<Person> = match house.housekeeper {
            Some(id) => listing::load(store, schema::PEOPLE, &JsonValue::from(id)).await?,
            None => None,
        };
        let mut prefects = Vec::with_capacity(house.prefects.len());
        for id in &house.prefects {
            if let Some(person) = listing::load(store, schema::PEOPLE, &JsonValue::from(*id)).await?
            {
                prefects.push(person);
            }
        }
        Ok(HouseSummary::new(house, housekeeper.as_ref(), &prefects))
    }
}

fn validate(input: &HouseInput) -> Result<(), ValidationError> {
    if let Some(id) = input.housekeeper
        && !id_number_is_valid(id.into())
    {
        return Err(ValidationError::InvalidIdNumber {
            kind: AccountKind::Staff,
            id: id.into(),
        });
    }
    if let Some(&id) = input.prefects.iter().find(|id| !id_number_is_valid((**id).into())) {
        return Err(ValidationError::InvalidIdNumber {
            kind: AccountKind::Student,
            id: id.into(),
        });
    }
    Ok(())
}
