use diesel::prelude::*;
use jiff_diesel::Timestamp;

/// Account record as stored in `users`
///
/// Not `Serialize`: the password hash and version must never leave the
/// service, so API responses go through `UserResponse`.
#[derive(Debug, Queryable, Selectable, Identifiable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub activated: bool,
    /// Bumped on every successful update; compared by `update_with_version_check`
    pub version: i32,
    pub created_at: Timestamp,
}

/// Insert form for registration; the store fills id, activated, version
/// and created_at
#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}
