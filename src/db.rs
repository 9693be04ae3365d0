use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError};
use diesel::result::Error as DieselError;
use diesel::sqlite::SqliteConnection;
use tracing::warn;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Number of times a write is retried while SQLite reports the database as locked
const MAX_RETRIES: u32 = 5;

/// Applies per-connection pragmas when r2d2 hands out a fresh connection
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Builds the connection pool for the given SQLite URL
///
/// Every connection has foreign keys enabled, so deleting a user or an
/// image cascades to the rows that reference it.
pub fn init_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
}

/// Runs a write against the connection, retrying with backoff while SQLite is busy
///
/// The closure is re-run from scratch on each attempt, so it must be safe to
/// repeat (a single statement or a whole transaction).
pub async fn with_retry<T, F>(conn: &mut SqliteConnection, mut op: F) -> QueryResult<T>
where
    F: FnMut(&mut SqliteConnection) -> QueryResult<T>,
{
    let mut attempt = 0;
    loop {
        match op(conn) {
            Err(err) if is_busy(&err) && attempt < MAX_RETRIES => {
                attempt += 1;
                let delay = Duration::from_millis(25 * 2u64.pow(attempt));
                warn!(attempt, ?delay, "database busy, retrying write");
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

fn is_busy(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(_, info) => {
            let message = info.message();
            message.contains("database is locked")
                || message.contains("database table is locked")
                || message.contains("busy")
        }
        _ => false,
    }
}
