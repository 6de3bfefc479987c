use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams, UpdatePostStatusParams,
};
use crate::domain::entities::PostRecord;

use super::super::{PostgresRepositories, map_sqlx_error};
use super::POST_COLUMNS;
use super::types::PostRow;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            user_id,
            content,
            image_url,
            status,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            r#"
            INSERT INTO posts AS p (
                id, user_id, heading, caption, hookline, cta, hashtags, social,
                image_url, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(content.heading)
            .bind(content.caption)
            .bind(content.hookline)
            .bind(content.cta)
            .bind(content.hashtags)
            .bind(content.social)
            .bind(image_url)
            .bind(status)
            .bind(now)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            expected_status,
            content,
            image_url,
            status,
            comment,
        } = params;

        let row = sqlx::query_as::<_, PostRow>(&update_post_sql())
            .bind(id)
            .bind(content.heading)
            .bind(content.caption)
            .bind(content.hookline)
            .bind(content.cta)
            .bind(content.hashtags)
            .bind(content.social)
            .bind(image_url)
            .bind(status)
            .bind(comment)
            .bind(OffsetDateTime::now_utc())
            .bind(expected_status)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(Into::into)
            .ok_or_else(|| RepoError::stale_post(id, expected_status))
    }

    async fn update_post_status(
        &self,
        params: UpdatePostStatusParams,
    ) -> Result<PostRecord, RepoError> {
        let UpdatePostStatusParams {
            id,
            expected_status,
            status,
            comment,
            posted_at,
        } = params;

        let row = sqlx::query_as::<_, PostRow>(&update_post_status_sql())
            .bind(id)
            .bind(status)
            .bind(comment)
            .bind(posted_at)
            .bind(OffsetDateTime::now_utc())
            .bind(expected_status)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(Into::into)
            .ok_or_else(|| RepoError::stale_post(id, expected_status))
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

/// Both updates are compare-and-set on the status read by the caller, so a
/// concurrent transition turns into zero rows instead of a lost update.
fn update_post_sql() -> String {
    format!(
        r#"
        UPDATE posts AS p
           SET heading = $2,
               caption = $3,
               hookline = $4,
               cta = $5,
               hashtags = $6,
               social = $7,
               image_url = $8,
               status = $9,
               comment = $10,
               updated_at = $11
         WHERE p.id = $1 AND p.status = $12
        RETURNING {POST_COLUMNS}
        "#
    )
}

fn update_post_status_sql() -> String {
    format!(
        r#"
        UPDATE posts AS p
           SET status = $2,
               comment = $3,
               posted_at = $4,
               updated_at = $5
         WHERE p.id = $1 AND p.status = $6
        RETURNING {POST_COLUMNS}
        "#
    )
}
