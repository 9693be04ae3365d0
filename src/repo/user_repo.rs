use crate::db::{with_retry, DbPool};
use crate::models::User;
use crate::schema::users;
use anyhow::Result;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, info, instrument};

/// Creates a new user in the database
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `email` - The login email, which must not already be registered
/// * `password_hash` - The hashed password to store
///
/// ### Returns
///
/// A Result containing the newly created User if successful
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The email is already taken (see [`is_unique_violation`])
/// - The database insert operation fails
#[instrument(skip(pool, password_hash), fields(email = %email))]
pub async fn create_user(pool: &DbPool, email: String, password_hash: String) -> Result<User> {
    debug!("Creating new user");

    let mut conn = pool.get()?;
    let user = User::new(email, password_hash);

    with_retry(&mut conn, |c| {
        diesel::insert_into(users::table).values(&user).execute(c)
    })
    .await?;

    info!("Successfully created user with id: {}", user.get_id());

    Ok(user)
}

/// Retrieves a user by ID
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn get_user(pool: &DbPool, user_id: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let user = users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?;

    Ok(user)
}

/// Retrieves a user by email
///
/// ### Returns
///
/// A Result containing an Option with the User if found, or None if no
/// account uses that email
#[instrument(skip(pool), fields(email = %email))]
pub fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    debug!("Looking up user by email");

    let conn = &mut pool.get()?;

    let user = users::table
        .filter(users::email.eq(email))
        .select(User::as_select())
        .first(conn)
        .optional()?;

    Ok(user)
}

/// Returns true when a repository error was caused by a UNIQUE constraint
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<DieselError>(),
        Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
    )
}
