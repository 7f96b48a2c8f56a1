//! User lookups for the registration/login collaborators.

use crate::db::{Row, SqlValue, Store};
use crate::model::user::User;
use crate::repo::{RepoError, RepoResult};

/// Repository interface for the `users` table.
pub trait UserRepository {
    /// Inserts a user; a duplicate email fails with a constraint error.
    fn create_user(&self, email: &str, password: &str) -> RepoResult<i64>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

pub struct StoreUserRepository<'store> {
    store: &'store Store,
}

impl<'store> StoreUserRepository<'store> {
    pub fn new(store: &'store Store) -> Self {
        Self { store }
    }
}

impl UserRepository for StoreUserRepository<'_> {
    fn create_user(&self, email: &str, password: &str) -> RepoResult<i64> {
        let result = self.store.execute(
            "INSERT INTO users (email, password) VALUES (?1, ?2);",
            &[SqlValue::from(email), SqlValue::from(password)],
        )?;
        result
            .insert_id
            .ok_or_else(|| RepoError::InvalidData("user insert reported no row id".to_string()))
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let result = self.store.execute(
            "SELECT id, email, password FROM users WHERE email = ?1;",
            &[SqlValue::from(email)],
        )?;
        result.first().map(parse_user_row).transpose()
    }
}

fn parse_user_row(row: &Row) -> RepoResult<User> {
    let id = row
        .get_i64("id")
        .ok_or_else(|| RepoError::InvalidData("missing users.id".to_string()))?;
    Ok(User {
        id,
        email: required_text(row, "email")?,
        password: required_text(row, "password")?,
    })
}

fn required_text(row: &Row, column: &str) -> RepoResult<String> {
    row.get_str(column)
        .map(str::to_string)
        .ok_or_else(|| RepoError::InvalidData(format!("users.{column} is null or not text")))
}
