use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EditType;

/// A processed version of an uploaded image
///
/// Each call to the edit endpoints produces one row; an image can have any
/// number of edits and the listing shows the most recent one.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::edits)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Edit {
    /// Unique identifier for the edit (UUID v4 as string)
    id: String,

    /// The image this edit was produced from
    image_id: String,

    /// Owner of the source image
    user_id: String,

    /// Relative URL of the processed file, e.g. `/static/processed/<uuid>.jpg`
    edited_url: String,

    /// Name of the applied edit type
    edit_type: String,

    /// Strength of the edit, 0 to 100
    intensity: i32,

    /// Short human description of what was requested
    prompt: String,

    /// When the edit finished
    edited_at: NaiveDateTime,
}

impl Edit {
    /// Creates a new edit record
    pub fn new(image_id: String, user_id: String, edited_url: String, edit_type: EditType, intensity: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image_id,
            user_id,
            edited_url,
            edit_type: edit_type.to_string(),
            intensity,
            prompt: format!("{} with intensity {}", edit_type, intensity),
            edited_at: Utc::now().naive_utc(),
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_image_id(&self) -> String {
        self.image_id.clone()
    }

    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    pub fn get_edited_url(&self) -> String {
        self.edited_url.clone()
    }

    pub fn get_edit_type(&self) -> String {
        self.edit_type.clone()
    }

    pub fn get_intensity(&self) -> i32 {
        self.intensity
    }

    pub fn get_prompt(&self) -> String {
        self.prompt.clone()
    }

    /// Name of the processed file inside the processed directory
    pub fn get_stored_filename(&self) -> String {
        self.edited_url.rsplit('/').next().unwrap_or_default().to_string()
    }

    /// Gets the completion timestamp as a DateTime<Utc>
    pub fn get_edited_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.edited_at, Utc)
    }
}
