use crate::db::{with_retry, DbPool};
use crate::models::Image;
use crate::schema::{edits, images};
use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Aggregate numbers shown on a user's dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserStats {
    /// Number of uploaded images
    pub total_images: i64,
    /// Number of images with at least one edit
    pub processed_images: i64,
    /// Number of edits across all images
    pub total_edits: i64,
    /// Sum of the stored originals' sizes
    pub storage_bytes: i64,
}

/// Records a newly uploaded image
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `image` - The image record, built after its file was written to disk
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The owner does not exist (foreign key violation)
/// - The database insert operation fails
#[instrument(skip(pool, image), fields(image_id = %image.get_id(), user_id = %image.get_user_id()))]
pub async fn create_image(pool: &DbPool, image: Image) -> Result<Image> {
    debug!("Inserting image record");

    let mut conn = pool.get()?;

    with_retry(&mut conn, |c| {
        diesel::insert_into(images::table).values(&image).execute(c)
    })
    .await?;

    info!("Recorded image {} ({} bytes)", image.get_id(), image.get_size_bytes());

    Ok(image)
}

/// Retrieves an image by ID regardless of owner
#[instrument(skip(pool), fields(image_id = %image_id))]
pub fn get_image(pool: &DbPool, image_id: &str) -> Result<Option<Image>> {
    let conn = &mut pool.get()?;

    let image = images::table
        .find(image_id)
        .select(Image::as_select())
        .first(conn)
        .optional()?;

    Ok(image)
}

/// Retrieves an image only if it belongs to the given user
///
/// ### Returns
///
/// None both when the image does not exist and when someone else owns it,
/// so callers cannot tell which ids belong to other users.
#[instrument(skip(pool), fields(image_id = %image_id, user_id = %user_id))]
pub fn get_image_for_user(pool: &DbPool, image_id: &str, user_id: &str) -> Result<Option<Image>> {
    let image = get_image(pool, image_id)?.filter(|image| image.get_user_id() == user_id);

    if image.is_none() {
        debug!("Image not found for user");
    }

    Ok(image)
}

/// Lists a user's images, newest first
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_images_for_user(pool: &DbPool, user_id: &str) -> Result<Vec<Image>> {
    let conn = &mut pool.get()?;

    let result = images::table
        .filter(images::user_id.eq(user_id))
        .order((images::uploaded_at.desc(), images::id.asc()))
        .select(Image::as_select())
        .load(conn)?;

    debug!("Retrieved {} images", result.len());

    Ok(result)
}

/// Deletes an image and every edit made from it
///
/// Both deletes run in one transaction. The files on disk are not touched;
/// that is the caller's job once the records are gone.
///
/// ### Returns
///
/// true if an image row was removed
#[instrument(skip(pool), fields(image_id = %image_id))]
pub async fn delete_image(pool: &DbPool, image_id: &str) -> Result<bool> {
    let mut conn = pool.get()?;

    let deleted = with_retry(&mut conn, |c| {
        c.transaction(|tx| {
            diesel::delete(edits::table.filter(edits::image_id.eq(image_id))).execute(tx)?;
            diesel::delete(images::table.find(image_id)).execute(tx)
        })
    })
    .await?;

    info!("Deleted {} image rows", deleted);

    Ok(deleted > 0)
}

/// Computes dashboard statistics for a user
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn user_stats(pool: &DbPool, user_id: &str) -> Result<UserStats> {
    let conn = &mut pool.get()?;

    let sizes: Vec<i64> = images::table
        .filter(images::user_id.eq(user_id))
        .select(images::size_bytes)
        .load(conn)?;

    let total_edits: i64 = edits::table
        .filter(edits::user_id.eq(user_id))
        .count()
        .get_result(conn)?;

    let processed_images: i64 = edits::table
        .filter(edits::user_id.eq(user_id))
        .select(diesel::dsl::count_distinct(edits::image_id))
        .first(conn)?;

    Ok(UserStats {
        total_images: sizes.len() as i64,
        processed_images,
        total_edits,
        storage_bytes: sizes.iter().sum(),
    })
}

#[cfg(test)]
mod tests;
