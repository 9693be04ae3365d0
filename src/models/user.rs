use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account
///
/// The password hash is never serialized, so a `User` can be returned from
/// handlers directly.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    /// Unique identifier for the user (UUID v4 as string)
    id: String,

    /// Login email, unique across users
    email: String,

    /// Display name derived from the email's local part
    username: String,

    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    password_hash: String,

    /// When this user signed up
    created_at: NaiveDateTime,
}

impl User {
    /// Creates a new user from an email and an already hashed password
    ///
    /// The username falls back to the part of the email before the `@`.
    pub fn new(email: String, password_hash: String) -> Self {
        let username = email.split('@').next().unwrap_or_default().to_string();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            username,
            password_hash,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_email(&self) -> String {
        self.email.clone()
    }

    pub fn get_username(&self) -> String {
        self.username.clone()
    }

    pub fn get_password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Gets the signup timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}
