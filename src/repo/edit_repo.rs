use std::collections::HashMap;

use crate::db::{with_retry, DbPool};
use crate::models::Edit;
use crate::schema::edits;
use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Records a finished edit
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The source image no longer exists (foreign key violation)
/// - The database insert operation fails
#[instrument(skip(pool, edit), fields(edit_id = %edit.get_id(), image_id = %edit.get_image_id()))]
pub async fn create_edit(pool: &DbPool, edit: Edit) -> Result<Edit> {
    let mut conn = pool.get()?;

    with_retry(&mut conn, |c| {
        diesel::insert_into(edits::table).values(&edit).execute(c)
    })
    .await?;

    info!("Recorded {} edit {}", edit.get_edit_type(), edit.get_id());

    Ok(edit)
}

/// Returns the most recent edit of an image, if any
#[instrument(skip(pool), fields(image_id = %image_id))]
pub fn latest_edit_for_image(pool: &DbPool, image_id: &str) -> Result<Option<Edit>> {
    let conn = &mut pool.get()?;

    let edit = edits::table
        .filter(edits::image_id.eq(image_id))
        .order((edits::edited_at.desc(), edits::id.desc()))
        .select(Edit::as_select())
        .first(conn)
        .optional()?;

    Ok(edit)
}

/// Lists every edit of an image, newest first
#[instrument(skip(pool), fields(image_id = %image_id))]
pub fn list_edits_for_image(pool: &DbPool, image_id: &str) -> Result<Vec<Edit>> {
    let conn = &mut pool.get()?;

    let result = edits::table
        .filter(edits::image_id.eq(image_id))
        .order((edits::edited_at.desc(), edits::id.desc()))
        .select(Edit::as_select())
        .load(conn)?;

    Ok(result)
}

/// Returns the most recent edit for each of the given images in one query
///
/// Images without edits are absent from the map.
#[instrument(skip(pool, image_ids), fields(count = image_ids.len()))]
pub fn latest_edits_for_images(pool: &DbPool, image_ids: &[String]) -> Result<HashMap<String, Edit>> {
    if image_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let conn = &mut pool.get()?;

    let all: Vec<Edit> = edits::table
        .filter(edits::image_id.eq_any(image_ids))
        .order((edits::edited_at.desc(), edits::id.desc()))
        .select(Edit::as_select())
        .load(conn)?;

    let mut latest = HashMap::new();
    for edit in all {
        // rows arrive newest first, so the first one seen per image wins
        latest.entry(edit.get_image_id()).or_insert(edit);
    }

    debug!("Found edits for {} of {} images", latest.len(), image_ids.len());

    Ok(latest)
}
