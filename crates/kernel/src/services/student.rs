//! Student management.
//!
//! Students are read from the joined `student_records` relation and written
//! as a `people` row plus a `student_profiles` row with the same id number.
//! The status is re-derived on every write.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use super::house::HouseService;
use super::listing;
use crate::error::{ServiceError, ServiceResult};
use crate::filter::{
    Compile, Entity, EntityCatalog, FacetResult, ListResult, PageRequest, StudentCriteria,
};
use crate::models::{
    Person, ROLE_STUDENT, StudentInput, StudentProfile, StudentRecord, StudentSummary,
    StudentWithHouse,
};
use crate::store::{Store, schema};
use crate::validate::{
    AccountKind, PersonFields, ValidationError, ValidationRules, non_blank, parse_date,
};

const ENTITY: &str = "student";

pub struct StudentService {
    store: Arc<dyn Store>,
    rules: ValidationRules,
}

impl StudentService {
    pub fn new(store: Arc<dyn Store>, rules: ValidationRules) -> Self {
        Self { store, rules }
    }

    fn catalog() -> &'static EntityCatalog {
        Entity::Student.catalog()
    }

    /// Enroll a student. The account is enabled and carries `ROLE_STUDENT`.
    pub async fn create(&self, input: StudentInput) -> ServiceResult<StudentSummary> {
        let fields = self.normalize(input)?;
        let id = fields.id_number;
        let key = JsonValue::from(id);
        if self.store.exists(schema::PEOPLE, &key).await? {
            warn!(id_number = id, "student create rejected: id number taken");
            return Err(ServiceError::duplicate(ENTITY, id));
        }

        let person = Person {
            id_number: id,
            first_name: None,
            link_name: None,
            last_name: None,
            email: None,
            enabled: true,
            date_assigned_to_house: None,
            house: None,
            roles: vec![ROLE_STUDENT.to_string()],
        };
        let profile = StudentProfile {
            id_number: id,
            ..Default::default()
        };
        let mut record = StudentRecord::join(person, profile);
        fields.apply_to(&mut record, listing::today());
        let (person, profile) = record.clone().split();

        listing::insert(&*self.store, schema::PEOPLE, ENTITY, &key, &person).await?;
        if let Err(err) =
            listing::insert(&*self.store, schema::STUDENT_PROFILES, ENTITY, &key, &profile).await
        {
            if let Err(undo) = self.store.delete(schema::PEOPLE, &key).await {
                warn!(id_number = id, error = %undo, "failed to remove person after profile insert failed");
            }
            return Err(err);
        }
        info!(id_number = id, status = ?record.status, "student created");
        Ok(record.into())
    }

    pub async fn get(&self, id_number: i32) -> ServiceResult<StudentSummary> {
        Ok(self.find(id_number).await?.into())
    }

    /// The student with their house expanded.
    pub async fn get_with_house(&self, id_number: i32) -> ServiceResult<StudentWithHouse> {
        let record = self.find(id_number).await?;
        let house = match record.house.as_deref() {
            Some(name) => {
                let houses = HouseService::new(self.store.clone());
                match houses.find(name).await {
                    Ok(house) => Some(houses.summarize(house).await?),
                    Err(ServiceError::NotFound { .. }) => None,
                    Err(err) => return Err(err),
                }
            }
            None => None,
        };
        Ok(StudentWithHouse::new(record, house))
    }

    pub async fn find(&self, id_number: i32) -> ServiceResult<StudentRecord> {
        listing::require(
            &*self.store,
            schema::STUDENT_RECORDS,
            ENTITY,
            &JsonValue::from(id_number),
        )
        .await
    }

    pub async fn list(
        &self,
        criteria: &StudentCriteria,
        request: &PageRequest,
    ) -> ServiceResult<ListResult<StudentSummary>> {
        let page: ListResult<StudentRecord> =
            listing::fetch_page(&*self.store, Self::catalog(), &criteria.compile(), request)
                .await?;
        Ok(ListResult::new(
            page.rows.into_iter().map(StudentSummary::from).collect(),
            page.total,
        ))
    }

    /// Replace the student's fields. The id number in the input is ignored.
    pub async fn update(
        &self,
        id_number: i32,
        input: StudentInput,
    ) -> ServiceResult<StudentSummary> {
        let fields = self.normalize(StudentInput { id_number, ..input })?;
        let mut record = self.find(id_number).await?;
        let (previous, _) = record.clone().split();
        fields.apply_to(&mut record, listing::today());
        if !record.roles.iter().any(|r| r == ROLE_STUDENT) {
            record.roles.push(ROLE_STUDENT.to_string());
        }

        let key = JsonValue::from(id_number);
        let (person, profile) = record.clone().split();
        listing::replace(&*self.store, schema::PEOPLE, ENTITY, &key, &person).await?;
        if let Err(err) =
            listing::replace(&*self.store, schema::STUDENT_PROFILES, ENTITY, &key, &profile).await
        {
            // The person row must not describe a student the profile disagrees with.
            if let Err(undo) =
                listing::replace(&*self.store, schema::PEOPLE, ENTITY, &key, &previous).await
            {
                warn!(id_number, error = %undo, "failed to restore person after profile update failed");
            }
            return Err(err);
        }
        info!(id_number, status = ?record.status, "student updated");
        Ok(record.into())
    }

    pub async fn delete(&self, id_number: i32) -> ServiceResult<String> {
        let key = JsonValue::from(id_number);
        if !self.store.exists(schema::STUDENT_RECORDS, &key).await? {
            return Err(ServiceError::not_found(ENTITY, id_number));
        }
        self.store.delete(schema::STUDENT_PROFILES, &key).await?;
        let message = listing::remove(&*self.store, schema::PEOPLE, ENTITY, &key).await?;
        info!(id_number, "student deleted");
        Ok(message)
    }

    pub async fn filterables(&self) -> ServiceResult<FacetResult> {
        listing::filterables(&*self.store, Self::catalog()).await
    }

    fn normalize(&self, input: StudentInput) -> Result<StudentFields, ValidationError> {
        let fields = StudentFields {
            id_number: input.id_number,
            first_name: non_blank(input.first_name),
            link_name: non_blank(input.link_name),
            last_name: non_blank(input.last_name),
            email: non_blank(input.email),
            house: non_blank(input.house),
            gender: non_blank(input.gender),
            birthday: non_blank(input.birthday)
                .map(|b| parse_date(&b))
                .transpose()?,
            nationality: non_blank(input.nationality),
            program: non_blank(input.program),
            cohort: input.cohort,
            house_cohort: input.house_cohort,
            experience: input.experience,
            do_group: non_blank(input.do_group),
        };
        self.rules
            .validate_person(
                AccountKind::Student,
                PersonFields {
                    id_number: fields.id_number.into(),
                    first_name: fields.first_name.as_deref(),
                    link_name: fields.link_name.as_deref(),
                    last_name: fields.last_name.as_deref(),
                    email: fields.email.as_deref(),
                },
            )
            .inspect_err(|err| warn!(error = %err, "student input rejected"))?;
        Ok(fields)
    }
}

/// Validated student input.
struct StudentFields {
    id_number: i32,
    first_name: Option<String>,
    link_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    house: Option<String>,
    gender: Option<String>,
    birthday: Option<NaiveDate>,
    nationality: Option<String>,
    program: Option<String>,
    cohort: Option<i32>,
    house_cohort: Option<i32>,
    experience: Option<i32>,
    do_group: Option<String>,
}

impl StudentFields {
    fn apply_to(self, record: &mut StudentRecord, today: NaiveDate) {
        if self.house.is_some() && self.house != record.house {
            record.date_assigned_to_house = Some(today);
        }
        record.house = self.house;
        record.first_name = self.first_name;
        record.link_name = self.link_name;
        record.last_name = self.last_name;
        record.email = self.email;
        record.gender = self.gender;
        record.birthday = self.birthday;
        record.nationality = self.nationality;
        record.program = self.program;
        record.cohort = self.cohort;
        record.house_cohort = self.house_cohort;
        record.experience = self.experience;
        record.do_group = self.do_group;
        record.refresh_status();
    }
}

// Used by the user service to keep a student's profile row from outliving
// its person row.
pub(crate) async fn delete_profile(store: &dyn Store, id_number: i32) -> ServiceResult<bool> {
    Ok(store
        .delete(schema::STUDENT_PROFILES, &JsonValue::from(id_number))
        .await?)
}

