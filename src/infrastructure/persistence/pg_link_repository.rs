//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{Link, LinkChange, NewLink, OwnerId};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Columns selected for every link read, joined with the owner association.
const LINK_COLUMNS: &str =
    "sl.id, sl.original_url, sl.short_code, sl.click_count, sl.created_at, ul.user_id";

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    original_url: String,
    short_code: String,
    click_count: i64,
    created_at: DateTime<Utc>,
    user_id: i64,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link::new(
            row.id,
            row.original_url,
            row.short_code,
            OwnerId(row.user_id),
            row.click_count,
            row.created_at,
        )
    }
}

/// PostgreSQL repository for links and the `user_links` owner association.
///
/// All values are bound parameters; update column names come from a fixed
/// mapping of [`LinkChange`] variants.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create_with_owner(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent creates for the same (url, owner) pair.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, $2))")
            .bind(&new_link.original_url)
            .bind(new_link.owner_id.get())
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM short_links sl
            JOIN user_links ul ON ul.short_link_id = sl.id
            WHERE sl.original_url = $1 AND ul.user_id = $2
            LIMIT 1
            "#
        ))
        .bind(&new_link.original_url)
        .bind(new_link.owner_id.get())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = existing {
            tx.commit().await?;
            return Ok(row.into());
        }

        let (id, click_count, created_at): (i64, i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO short_links (original_url, short_code)
            VALUES ($1, $2)
            RETURNING id, click_count, created_at
            "#,
        )
        .bind(&new_link.original_url)
        .bind(&new_link.short_code)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_links (short_link_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(new_link.owner_id.get())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Link::new(
            id,
            new_link.original_url,
            new_link.short_code,
            new_link.owner_id,
            click_count,
            created_at,
        ))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM short_links sl
            JOIN user_links ul ON ul.short_link_id = sl.id
            WHERE sl.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn find_by_owner(&self, owner: OwnerId) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM short_links sl
            JOIN user_links ul ON ul.short_link_id = sl.id
            WHERE ul.user_id = $1
            ORDER BY sl.created_at DESC, sl.id DESC
            "#
        ))
        .bind(owner.get())
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn find_by_url_and_owner(
        &self,
        url: &str,
        owner: OwnerId,
    ) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM short_links sl
            JOIN user_links ul ON ul.short_link_id = sl.id
            WHERE sl.original_url = $1 AND ul.user_id = $2
            LIMIT 1
            "#
        ))
        .bind(url)
        .bind(owner.get())
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM short_links sl
            JOIN user_links ul ON ul.short_link_id = sl.id
            WHERE sl.short_code = $1
            "#
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn update_fields(&self, id: i64, changes: Vec<LinkChange>) -> Result<Link, AppError> {
        if changes.is_empty() {
            return Err(AppError::bad_request(
                "No fields to update",
                json!({ "id": id }),
            ));
        }

        let mut query = QueryBuilder::<Postgres>::new("WITH updated AS (UPDATE short_links SET ");

        let mut assignments = query.separated(", ");
        for change in changes {
            match change {
                LinkChange::OriginalUrl(url) => {
                    assignments.push("original_url = ");
                    assignments.push_bind_unseparated(url);
                }
                LinkChange::ShortCode(code) => {
                    assignments.push("short_code = ");
                    assignments.push_bind_unseparated(code);
                }
                LinkChange::ClickCount(count) => {
                    assignments.push("click_count = GREATEST(click_count, ");
                    assignments.push_bind_unseparated(count);
                    assignments.push_unseparated(")");
                }
            }
        }

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(
            " RETURNING id, original_url, short_code, click_count, created_at) \
             SELECT u.id, u.original_url, u.short_code, u.click_count, u.created_at, ul.user_id \
             FROM updated u JOIN user_links ul ON ul.short_link_id = u.id",
        );

        let row = query
            .build_query_as::<LinkRow>()
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Link::from)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))
    }

    async fn increment_clicks(&self, id: i64) -> Result<i64, AppError> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE short_links
            SET click_count = click_count + 1
            WHERE id = $1
            RETURNING click_count
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        count.ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))
    }

    async fn delete_if_owned(&self, id: i64, owner: OwnerId) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let released = sqlx::query(
            r#"
            DELETE FROM user_links
            WHERE short_link_id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner.get())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if released == 0 {
            tx.rollback().await?;
            return Err(AppError::access_denied(
                "Link not found or access denied",
                json!({ "id": id }),
            ));
        }

        sqlx::query("DELETE FROM short_links WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
