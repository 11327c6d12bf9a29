//! Houses cup point awards and standings.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use super::listing;
use crate::calendar::AcademicCalendar;
use crate::error::ServiceResult;
use crate::filter::{
    Compile, Entity, EntityCatalog, FacetResult, HousesCupPointsCriteria, ListResult,
    PageRequest, Predicate,
};
use crate::models::{
    HouseTotal, HousesCupPoints, HousesCupPointsInput, HousesCupPointsSummary, StudentTotal,
};
use crate::store::{Store, StoreError, schema};
use crate::validate::{AccountKind, ValidationError, check_date, id_number_is_valid, non_blank};

const ENTITY: &str = "houses cup points";

pub struct HousesCupPointsService {
    store: Arc<dyn Store>,
    calendar: Arc<dyn AcademicCalendar>,
}

impl HousesCupPointsService {
    pub fn new(store: Arc<dyn Store>, calendar: Arc<dyn AcademicCalendar>) -> Self {
        Self { store, calendar }
    }

    fn catalog() -> &'static EntityCatalog {
        Entity::HousesCupPoints.catalog()
    }

    /// Record an award. Without a date the award is stamped now.
    pub async fn create(&self, input: HousesCupPointsInput) -> ServiceResult<HousesCupPointsSummary> {
        // Storage keeps microseconds; the key must survive a round trip.
        let date = input.date.unwrap_or_else(Utc::now).trunc_subsecs(6);
        let mut award = HousesCupPoints {
            date,
            student: None,
            assigning_user: None,
            explanation: None,
            house: String::new(),
            points: 0,
            academic_year: 0,
        };
        self.apply(&mut award, input)?;

        let key = date_key(date)?;
        listing::insert(&*self.store, schema::HOUSES_CUP, ENTITY, &key, &award).await?;
        info!(
            date = %award.date,
            house = %award.house,
            points = award.points,
            "houses cup points awarded"
        );
        self.summarize(award).await
    }

    pub async fn get(&self, date: DateTime<Utc>) -> ServiceResult<HousesCupPointsSummary> {
        let award = self.find(date).await?;
        self.summarize(award).await
    }

    pub async fn find(&self, date: DateTime<Utc>) -> ServiceResult<HousesCupPoints> {
        listing::require(&*self.store, schema::HOUSES_CUP, ENTITY, &date_key(date)?).await
    }

    pub async fn list(
        &self,
        criteria: &HousesCupPointsCriteria,
        request: &PageRequest,
    ) -> ServiceResult<ListResult<HousesCupPointsSummary>> {
        let page: ListResult<HousesCupPoints> =
            listing::fetch_page(&*self.store, Self::catalog(), &criteria.compile(), request)
                .await?;
        let mut rows = Vec::with_capacity(page.rows.len());
        for award in page.rows {
            rows.push(self.summarize(award).await?);
        }
        Ok(ListResult::new(rows, page.total))
    }

    /// Replace the award's fields. The date is the key and is kept.
    pub async fn update(
        &self,
        date: DateTime<Utc>,
        input: HousesCupPointsInput,
    ) -> ServiceResult<HousesCupPointsSummary> {
        let mut award = self.find(date).await?;
        self.apply(&mut award, input)?;
        let key = date_key(date)?;
        listing::replace(&*self.store, schema::HOUSES_CUP, ENTITY, &key, &award).await?;
        info!(date = %award.date, points = award.points, "houses cup points updated");
        self.summarize(award).await
    }

    pub async fn delete(&self, date: DateTime<Utc>) -> ServiceResult<String> {
        let message =
            listing::remove(&*self.store, schema::HOUSES_CUP, ENTITY, &date_key(date)?).await?;
        info!(%date, "houses cup points deleted");
        Ok(message)
    }

    pub async fn filterables(&self) -> ServiceResult<FacetResult> {
        listing::filterables(&*self.store, Self::catalog()).await
    }

    /// Total points per house for `academic_year`, defaulting to the current
    /// one. Highest total first.
    pub async fn points_by_house(&self, academic_year: Option<i32>) -> ServiceResult<Vec<HouseTotal>> {
        let year = academic_year.unwrap_or_else(|| self.current_year());
        let awards: Vec<HousesCupPoints> = listing::fetch_all(
            &*self.store,
            Self::catalog(),
            &Predicate::equals("academic_year", year),
        )
        .await?;

        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for award in awards {
            *totals.entry(award.house).or_default() += i64::from(award.points);
        }
        let mut totals: Vec<HouseTotal> = totals
            .into_iter()
            .map(|(house, points)| HouseTotal { house, points })
            .collect();
        totals.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.house.cmp(&b.house)));
        debug!(academic_year = year, houses = totals.len(), "summed points per house");
        Ok(totals)
    }

    /// Total points per student of `house` for `academic_year`, defaulting
    /// to the current one. Awards to no particular student are grouped under
    /// `None`. Highest total first.
    pub async fn points_per_student(
        &self,
        academic_year: Option<i32>,
        house: &str,
    ) -> ServiceResult<Vec<StudentTotal>> {
        let year = academic_year.unwrap_or_else(|| self.current_year());
        let awards: Vec<HousesCupPoints> = listing::fetch_all(
            &*self.store,
            Self::catalog(),
            &Predicate::all([
                Predicate::equals("academic_year", year),
                Predicate::equals("house", house),
            ]),
        )
        .await?;

        let mut totals: BTreeMap<Option<i32>, i64> = BTreeMap::new();
        for award in awards {
            *totals.entry(award.student).or_default() += i64::from(award.points);
        }
        let mut totals: Vec<StudentTotal> = totals
            .into_iter()
            .map(|(student, points)| StudentTotal { student, points })
            .collect();
        totals.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.student.cmp(&b.student)));
        debug!(academic_year = year, house, students = totals.len(), "summed points per student");
        Ok(totals)
    }

    fn current_year(&self) -> i32 {
        self.calendar.academic_year_of(listing::today())
    }

    fn apply(&self, award: &mut HousesCupPoints, input: HousesCupPointsInput) -> ServiceResult<()> {
        let house = non_blank(input.house)
            .ok_or(ValidationError::MissingField("house"))
            .inspect_err(|_| warn!("houses cup points rejected: no house"))?;
        check_date(award.date.date_naive())?;
        for (kind, id) in [
            (AccountKind::Student, input.student),
            (AccountKind::Staff, input.assigning_user),
        ] {
            if let Some(id) = id
                && !id_number_is_valid(id.into())
            {
                return Err(ValidationError::InvalidIdNumber {
                    kind,
                    id: id.into(),
                }
                .into());
            }
        }
        award.student = input.student;
        award.assigning_user = input.assigning_user;
        award.explanation = non_blank(input.explanation);
        award.house = house;
        award.points = input.points;
        award.academic_year = self.calendar.academic_year_of(award.date.date_naive());
        Ok(())
    }

    async fn summarize(&self, award: HousesCupPoints) -> ServiceResult<HousesCupPointsSummary> {
        let student = listing::person_name(&*self.store, award.student).await?;
        let assigning_user = listing::person_name(&*self.store, award.assigning_user).await?;
        Ok(HousesCupPointsSummary::new(award, student, assigning_user))
    }
}

/// The award key as stored: the serialised timestamp.
fn date_key(date: DateTime<Utc>) -> ServiceResult<JsonValue> {
    Ok(serde_json::to_value(date).map_err(StoreError::from)?)
}
