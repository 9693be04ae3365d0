use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded original image
///
/// This struct maps directly to the `images` table. The file itself lives in
/// the upload directory under `filename`; `original_url` is the path the
/// static file service exposes it at.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::images)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Image {
    /// Unique identifier for the image (UUID v4 as string)
    id: String,

    /// Owner of the image
    user_id: String,

    /// Name of the stored file in the upload directory
    filename: String,

    /// Sanitized name the client uploaded the file under
    original_name: String,

    /// Relative URL of the stored file, e.g. `/static/uploads/cat_1a2b3c4d.png`
    original_url: String,

    /// MIME type detected from the file contents
    content_type: String,

    /// Size of the stored file
    size_bytes: i64,

    /// When the image was uploaded
    uploaded_at: NaiveDateTime,
}

impl Image {
    /// Creates a new image record for a file that has already been stored
    pub fn new(
        user_id: String,
        filename: String,
        original_name: String,
        original_url: String,
        content_type: String,
        size_bytes: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            filename,
            original_name,
            original_url,
            content_type,
            size_bytes,
            uploaded_at: Utc::now().naive_utc(),
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    pub fn get_filename(&self) -> String {
        self.filename.clone()
    }

    pub fn get_original_name(&self) -> String {
        self.original_name.clone()
    }

    pub fn get_original_url(&self) -> String {
        self.original_url.clone()
    }

    pub fn get_content_type(&self) -> String {
        self.content_type.clone()
    }

    pub fn get_size_bytes(&self) -> i64 {
        self.size_bytes
    }

    /// Gets the upload timestamp as a DateTime<Utc>
    pub fn get_uploaded_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.uploaded_at, Utc)
    }
}
