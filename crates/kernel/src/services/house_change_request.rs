//! House change requests and the switch that opens or closes submissions.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::listing;
use crate::error::{ServiceError, ServiceResult};
use crate::filter::{
    Compile, Entity, EntityCatalog, FacetResult, HouseChangeRequestCriteria, ListResult,
    PageRequest, Predicate,
};
use crate::models::{
    HouseChangeRequest, HouseChangeRequestInput, HouseChangeRequestSettings,
    HouseChangeRequestSummary, RequestChanges, RequestStatus, StudentRecord,
};
use crate::store::{Store, StoreError, schema, to_row};
use crate::validate::{
    AccountKind, ValidationError, id_number_is_valid, non_blank, parse_date,
    sanitize_denial_explanation, sanitize_explanation,
};

const ENTITY: &str = "house change request";

pub struct HouseChangeRequestService {
    store: Arc<dyn Store>,
}

impl HouseChangeRequestService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn catalog() -> &'static EntityCatalog {
        Entity::HouseChangeRequest.catalog()
    }

    /// Current settings. Submissions are open until someone closes them.
    pub async fn settings(&self) -> ServiceResult<HouseChangeRequestSettings> {
        let key = JsonValue::from(HouseChangeRequestSettings::ID);
        Ok(
            listing::load(&*self.store, schema::HOUSE_CHANGE_REQUEST_SETTINGS, &key)
                .await?
                .unwrap_or_default(),
        )
    }

    pub async fn set_enabled(&self, enabled: bool) -> ServiceResult<HouseChangeRequestSettings> {
        let settings = HouseChangeRequestSettings {
            id: HouseChangeRequestSettings::ID,
            enabled,
        };
        let table = schema::HOUSE_CHANGE_REQUEST_SETTINGS;
        if !self.store.update(table, to_row(&settings)?).await? {
            self.store.insert(table, to_row(&settings)?).await?;
        }
        info!(enabled, "house change request submissions toggled");
        Ok(settings)
    }

    /// File a request. Refused while submissions are closed and when an
    /// identical request already exists.
    pub async fn create(
        &self,
        input: HouseChangeRequestInput,
    ) -> ServiceResult<HouseChangeRequestSummary> {
        if !self.settings().await?.enabled {
            warn!(student = input.student, "house change request refused: submissions closed");
            return Err(ServiceError::SubmissionsClosed);
        }
        let student = self.student(input.student).await?;
        let defaults = Defaults {
            old_house: student.house.clone(),
            request_date: listing::today(),
            status: RequestStatus::Undecided,
        };
        let changes = changes(input, student.id_number, defaults)?;

        if self.store.exists_matching(schema::HOUSE_CHANGE_REQUESTS, &identity(&changes)).await? {
            warn!(student = changes.student, "duplicate house change request");
            return Err(ServiceError::DuplicateRequest {
                student: changes.student,
            });
        }

        let request = HouseChangeRequest::new(changes, listing::today());
        match self
            .store
            .insert(schema::HOUSE_CHANGE_REQUESTS, to_row(&request)?)
            .await
        {
            Ok(()) => {}
            Err(StoreError::Conflict { .. }) => {
                return Err(ServiceError::DuplicateRequest {
                    student: request.student,
                });
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            id = %request.id,
            student = request.student,
            target_house = %request.target_house,
            "house change request created"
        );
        Ok(HouseChangeRequestSummary::new(request, Some(student.display_name())))
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<HouseChangeRequestSummary> {
        let request = self.find(id).await?;
        self.summarize(request).await
    }

    pub async fn find(&self, id: Uuid) -> ServiceResult<HouseChangeRequest> {
        listing::require(
            &*self.store,
            schema::HOUSE_CHANGE_REQUESTS,
            ENTITY,
            &JsonValue::from(id.to_string()),
        )
        .await
    }

    pub async fn list(
        &self,
        criteria: &HouseChangeRequestCriteria,
        request: &PageRequest,
    ) -> ServiceResult<ListResult<HouseChangeRequestSummary>> {
        self.list_matching(&criteria.compile(), request).await
    }

    /// Requests filed by one student.
    pub async fn list_for_student(
        &self,
        student: i32,
        request: &PageRequest,
    ) -> ServiceResult<ListResult<HouseChangeRequestSummary>> {
        debug!(student, "listing house change requests for student");
        self.list_matching(&Predicate::equals("student", student), request)
            .await
    }

    /// Replace the request's fields. Deciding an undecided request stamps
    /// its decision date. Omitted fields keep their stored values.
    pub async fn update(
        &self,
        id: Uuid,
        input: HouseChangeRequestInput,
    ) -> ServiceResult<HouseChangeRequestSummary> {
        let mut request = self.find(id).await?;
        let student = self.student(input.student).await?;
        let defaults = Defaults {
            old_house: request.old_house.clone(),
            request_date: request.request_date,
            status: request.status,
        };
        let changes = changes(input, student.id_number, defaults)?;
        let previous = request.status;
        request.apply(changes, listing::today());

        match self
            .store
            .update(schema::HOUSE_CHANGE_REQUESTS, to_row(&request)?)
            .await
        {
            Ok(true) => {}
            Ok(false) => return Err(ServiceError::not_found(ENTITY, id)),
            Err(StoreError::Conflict { .. }) => {
                return Err(ServiceError::DuplicateRequest {
                    student: request.student,
                });
            }
            Err(err) => return Err(err.into()),
        }
        info!(%id, from = %previous, to = %request.status, "house change request updated");
        Ok(HouseChangeRequestSummary::new(request, Some(student.display_name())))
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<String> {
        let key = JsonValue::from(id.to_string());
        let message =
            listing::remove(&*self.store, schema::HOUSE_CHANGE_REQUESTS, ENTITY, &key).await?;
        info!(%id, "house change request deleted");
        Ok(message)
    }

    pub async fn filterables(&self) -> ServiceResult<FacetResult> {
        listing::filterables(&*self.store, Self::catalog()).await
    }

    async fn list_matching(
        &self,
        predicate: &Predicate,
        request: &PageRequest,
    ) -> ServiceResult<ListResult<HouseChangeRequestSummary>> {
        let page: ListResult<HouseChangeRequest> =
            listing::fetch_page(&*self.store, Self::catalog(), predicate, request).await?;
        let mut rows = Vec::with_capacity(page.rows.len());
        for request in page.rows {
            rows.push(self.summarize(request).await?);
        }
        Ok(ListResult::new(rows, page.total))
    }

    async fn summarize(
        &self,
        request: HouseChangeRequest,
    ) -> ServiceResult<HouseChangeRequestSummary> {
        let name = listing::person_name(&*self.store, Some(request.student)).await?;
        Ok(HouseChangeRequestSummary::new(request, name))
    }

    async fn student(&self, id_number: i32) -> ServiceResult<StudentRecord> {
        if !id_number_is_valid(id_number.into()) {
            return Err(ValidationError::InvalidIdNumber {
                kind: AccountKind::Student,
                id: id_number.into(),
            }
            .into());
        }
        listing::require(
            &*self.store,
            schema::STUDENT_RECORDS,
            "student",
            &JsonValue::from(id_number),
        )
        .await
    }
}

/// Values used for fields the client omitted.
struct Defaults {
    old_house: Option<String>,
    request_date: NaiveDate,
    status: RequestStatus,
}

/// Validate `input`, filling omitted fields from `defaults`.
fn changes(
    input: HouseChangeRequestInput,
    student: i32,
    defaults: Defaults,
) -> Result<RequestChanges, ValidationError> {
    let target_house =
        non_blank(input.target_house).ok_or(ValidationError::MissingField("targetHouse"))?;
    let request_date = match non_blank(input.request_date) {
        Some(date) => parse_date(&date)?,
        None => defaults.request_date,
    };
    let status = match non_blank(input.status) {
        Some(status) => status.parse()?,
        None => defaults.status,
    };
    Ok(RequestChanges {
        student,
        target_house,
        old_house: non_blank(input.old_house).or(defaults.old_house),
        explanation: sanitize_explanation(input.explanation),
        request_date,
        status,
        denial_explanation: sanitize_denial_explanation(input.denial_explanation),
    })
}

/// Matches requests with the same student, houses and explanation.
fn identity(changes: &RequestChanges) -> Predicate {
    Predicate::all([
        Predicate::equals("student", changes.student),
        Predicate::eq_or_null("old_house", changes.old_house.clone()),
        Predicate::equals("target_house", changes.target_house.clone()),
        Predicate::eq_or_null("explanation", changes.explanation.clone()),
    ])
}
