/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler is responsible for processing a specific type of HTTP request,
/// extracting the necessary data, calling the appropriate repository, storage
/// or editor functions, and returning a properly formatted response.

mod auth_handlers;
mod image_handlers;
mod edit_handlers;
mod dashboard_handlers;
mod health_handlers;

// Re-export all handlers
pub use auth_handlers::*;
pub use image_handlers::*;
pub use edit_handlers::*;
pub use dashboard_handlers::*;
pub use health_handlers::*;
