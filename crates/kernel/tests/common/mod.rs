#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Shared fixtures for the integration tests.
//!
//! Every test gets its own [`MemoryStore`]; services are built over it with
//! the same wiring the binary uses.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use maat_kernel::calendar::FixedStartCalendar;
use maat_kernel::models::StudentInput;
use maat_kernel::services::{
    HouseChangeRequestService, HouseService, HousesCupPointsService, StudentService, UserService,
};
use maat_kernel::filter::{ExecutionSpec, Predicate};
use maat_kernel::store::{
    AggregationExecutor, MemoryStore, QueryExecutor, RecordStore, Row, RowPage, Store, StoreError,
    schema,
};
use maat_kernel::validate::ValidationRules;
use maat_test_utils::Payload;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
        }
    }

    fn dyn_store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    pub fn students(&self) -> StudentService {
        StudentService::new(self.dyn_store(), rules())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.dyn_store(), rules())
    }

    pub fn houses(&self) -> HouseService {
        HouseService::new(self.dyn_store())
    }

    pub fn requests(&self) -> HouseChangeRequestService {
        HouseChangeRequestService::new(self.dyn_store())
    }

    pub fn points(&self) -> HousesCupPointsService {
        HousesCupPointsService::new(self.dyn_store(), Arc::new(calendar()))
    }

    /// Create a student from a client payload.
    pub async fn enroll(&self, payload: Payload) {
        let input: StudentInput = input(&payload);
        self.students().create(input).await.unwrap();
    }
}

pub fn rules() -> ValidationRules {
    ValidationRules::new("student.maat.local", "maat.local")
}

/// Academic years start on September 1st.
pub fn calendar() -> FixedStartCalendar {
    FixedStartCalendar::new(9, 1).unwrap()
}

/// Deserialise a payload the way a transport layer would.
pub fn input<T: DeserializeOwned>(payload: &Payload) -> T {
    serde_json::from_value(payload.to_json()).unwrap()
}

/// A [`MemoryStore`] whose `student_profiles` writes can be made to fail,
/// for exercising the services' multi-row write paths.
pub struct FlakyProfiles {
    pub inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyProfiles {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_profile_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self, table: &str) -> Result<(), StoreError> {
        if table == schema::STUDENT_PROFILES && self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for FlakyProfiles {
    async fn execute(
        &self,
        table: &str,
        predicate: &Predicate,
        spec: &ExecutionSpec,
    ) -> Result<RowPage, StoreError> {
        self.inner.execute(table, predicate, spec).await
    }
}

#[async_trait]
impl AggregationExecutor for FlakyProfiles {
    async fn distinct_per_column(
        &self,
        table: &str,
        excluded: &[&str],
    ) -> Result<BTreeMap<String, Vec<JsonValue>>, StoreError> {
        self.inner.distinct_per_column(table, excluded).await
    }
}

#[async_trait]
impl RecordStore for FlakyProfiles {
    async fn get(&self, table: &str, key: &JsonValue) -> Result<Option<Row>, StoreError> {
        self.inner.get(table, key).await
    }

    async fn exists(&self, table: &str, key: &JsonValue) -> Result<bool, StoreError> {
        self.inner.exists(table, key).await
    }

    async fn exists_matching(
        &self,
        table: &str,
        predicate: &Predicate,
    ) -> Result<bool, StoreError> {
        self.inner.exists_matching(table, predicate).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError> {
        self.check(table)?;
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: &str, row: Row) -> Result<bool, StoreError> {
        self.check(table)?;
        self.inner.update(table, row).await
    }

    async fn delete(&self, table: &str, key: &JsonValue) -> Result<bool, StoreError> {
        self.inner.delete(table, key).await
    }
}
