/// Data models module
///
/// This module defines the core data structures used throughout the application.
/// It includes database models that map to database tables, as well as methods
/// for creating and manipulating these models.

mod user;
pub use user::User;

mod image;
pub use image::Image;

mod edit;
pub use edit::Edit;

mod edit_type;
pub use edit_type::EditType;
