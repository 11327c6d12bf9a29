//! Records, client inputs and projections.
//!
//! Records serialise with snake_case keys, the column names of their storage
//! rows. Inputs and projections use camelCase, the client's vocabulary.

pub mod house;
pub mod house_change_request;
pub mod houses_cup_points;
pub mod person;
pub mod role;
pub mod status;
pub mod student;

pub use house::{House, HouseInput, HouseSummary};
pub use house_change_request::{
    HouseChangeRequest, HouseChangeRequestInput, HouseChangeRequestSettings,
    HouseChangeRequestSummary, RequestChanges, RequestStatus,
};
pub use houses_cup_points::{
    HouseTotal, HousesCupPoints, HousesCupPointsInput, HousesCupPointsSummary, StudentTotal,
};
pub use person::{Person, ROLE_STUDENT, UserInput, UserSummary};
pub use role::{Permissions, Role};
pub use status::{StatusInputs, StudentStatus, derive_status};
pub use student::{StudentInput, StudentProfile, StudentRecord, StudentSummary, StudentWithHouse};
