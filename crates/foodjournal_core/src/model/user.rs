//! User identity record.
//!
//! Users are created by the registration flow and only referenced by journal
//! entries; the core never mutates them.

use serde::Serialize;

/// Row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Opaque credential string, stored as provided.
    #[serde(skip_serializing)]
    pub password: String,
}
