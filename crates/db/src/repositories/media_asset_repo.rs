//! Repository for the `media_assets` table.

use signage_core::scheduling::{MediaStatus, ScheduleFields, DEFAULT_DURATION_SECS, DEFAULT_PRIORITY};
use signage_core::types::DbId;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};

use crate::models::media_asset::{CreateMediaAsset, MediaAsset, MediaListFilter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, display_name, original_name, kind, storage_ref, public_url, \
    size_bytes, duration_secs, priority, status, active_from, active_until, \
    created_at, updated_at";

/// Provides CRUD operations for media assets.
pub struct MediaAssetRepo;

impl MediaAssetRepo {
    /// Insert a new media asset with status `active`, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMediaAsset) -> Result<MediaAsset, sqlx::Error> {
        let query = insert_query();
        bind_create(&query, input).fetch_one(pool).await
    }

    /// Insert a batch of media assets within a transaction.
    ///
    /// Either every row is created or none is.
    pub async fn create_many(
        pool: &PgPool,
        inputs: &[CreateMediaAsset],
    ) -> Result<Vec<MediaAsset>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut results = Vec::with_capacity(inputs.len());

        let query = insert_query();
        for input in inputs {
            let row = bind_create(&query, input).fetch_one(&mut *tx).await?;
            results.push(row);
        }

        tx.commit().await?;
        Ok(results)
    }

    /// Find a media asset by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MediaAsset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_assets WHERE id = $1");
        sqlx::query_as::<_, MediaAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List media assets matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &MediaListFilter,
    ) -> Result<Vec<MediaAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM media_assets \
             WHERE ($1::TEXT IS NULL OR kind = $1) \
               AND ($2::TEXT IS NULL OR status = $2) \
               AND ($3::TEXT IS NULL \
                    OR original_name ILIKE '%' || $3 || '%' ESCAPE '\\' \
                    OR display_name ILIKE '%' || $3 || '%' ESCAPE '\\') \
             ORDER BY created_at DESC, id DESC"
        );
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(escape_like);
        sqlx::query_as::<_, MediaAsset>(&query)
            .bind(filter.kind.map(|k| k.as_str()))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(search.as_deref())
            .fetch_all(pool)
            .await
    }

    /// List every media asset in insertion order.
    ///
    /// Playback ordering relies on this order to break priority ties.
    pub async fn list_in_insertion_order(pool: &PgPool) -> Result<Vec<MediaAsset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_assets ORDER BY id");
        sqlx::query_as::<_, MediaAsset>(&query).fetch_all(pool).await
    }

    /// Overwrite the scheduling fields of a media asset.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_schedule(
        pool: &PgPool,
        id: DbId,
        fields: &ScheduleFields,
    ) -> Result<Option<MediaAsset>, sqlx::Error> {
        let query = format!(
            "UPDATE media_assets SET \
                duration_secs = $2, \
                priority = $3, \
                status = $4, \
                active_from = $5, \
                active_until = $6 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaAsset>(&query)
            .bind(id)
            .bind(fields.duration_secs)
            .bind(fields.priority)
            .bind(fields.status.as_str())
            .bind(fields.window.start)
            .bind(fields.window.end)
            .fetch_optional(pool)
            .await
    }

    /// Set the manual status only. The active window is left untouched.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: MediaStatus,
    ) -> Result<Option<MediaAsset>, sqlx::Error> {
        let query = format!(
            "UPDATE media_assets SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaAsset>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Delete a media asset, returning its storage reference so the caller
    /// can release the stored file.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "DELETE FROM media_assets WHERE id = $1 RETURNING storage_ref",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

fn insert_query() -> String {
    format!(
        "INSERT INTO media_assets \
            (display_name, original_name, kind, storage_ref, public_url, size_bytes, \
             duration_secs, priority, status, active_from, active_until) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {COLUMNS}"
    )
}

fn bind_create<'q>(
    query: &'q str,
    input: &'q CreateMediaAsset,
) -> QueryAs<'q, Postgres, MediaAsset, PgArguments> {
    sqlx::query_as::<_, MediaAsset>(query)
        .bind(&input.display_name)
        .bind(&input.original_name)
        .bind(input.kind.as_str())
        .bind(&input.storage_ref)
        .bind(&input.public_url)
        .bind(input.size_bytes)
        .bind(input.duration_secs.unwrap_or(DEFAULT_DURATION_SECS))
        .bind(input.priority.unwrap_or(DEFAULT_PRIORITY))
        .bind(MediaStatus::Active.as_str())
        .bind(input.window.start)
        .bind(input.window.end)
}

/// Escape `LIKE` metacharacters so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_quotes_metacharacters() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
