//! Role and permission models.

use serde::{Deserialize, Serialize};

/// Role record (table `roles`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub role: String,
    #[serde(default)]
    pub privileges: Vec<String>,
}

/// Permissions granted to a role (table `permissions`).
///
/// The role must exist first; deleting the role deletes this record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}
