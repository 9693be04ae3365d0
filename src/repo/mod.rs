/// Repository module
///
/// This module provides the data access layer for the application.
/// It contains functions for interacting with the database: creating and
/// looking up users, recording uploaded images and the edits produced
/// from them, and aggregating per-user statistics.
///
/// The repository pattern abstracts away the details of database access
/// and provides a clean API for the rest of the application to use.

mod user_repo;
mod image_repo;
mod edit_repo;

// Re-export all repository functions
pub use user_repo::*;
pub use image_repo::*;
pub use edit_repo::*;
