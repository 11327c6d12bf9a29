//! Entity services.
//!
//! Each service validates input, runs listings through the criteria
//! compiler and paging resolver, and projects stored records into the
//! client-facing summaries. Storage is reached only through [`Store`].
//!
//! [`Store`]: crate::store::Store

pub mod house;
pub mod house_change_request;
pub mod houses_cup_points;
mod listing;
pub mod role;
pub mod student;
pub mod user;

pub use house::HouseService;
pub use house_change_request::HouseChangeRequestService;
pub use houses_cup_points::HousesCupPointsService;
pub use role::{PermissionsService, RoleService};
pub use student::StudentService;
pub use user::UserService;
