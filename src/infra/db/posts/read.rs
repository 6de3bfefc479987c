use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::application::repos::{PostListScope, PostsRepo, RepoError};
use crate::domain::entities::{PostFilter, PostRecord, PostStatusCounts, PostWithOwner};

use super::super::{PostgresRepositories, map_sqlx_error};
use super::POST_COLUMNS;
use super::types::{PostRow, PostWithOwnerRow, StatusCountRow};

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostFilter,
    ) -> Result<Vec<PostWithOwner>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(", u.username AS owner_username FROM posts p JOIN users u ON u.id = p.user_id WHERE 1=1");

        Self::apply_scope_conditions(&mut qb, scope);
        Self::apply_post_filter(&mut qb, filter);

        qb.push(" ORDER BY p.created_at DESC, p.id DESC");

        let rows = qb
            .build_query_as::<PostWithOwnerRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostWithOwner::from).collect())
    }

    async fn count_posts_by_status(
        &self,
        owner: Option<Uuid>,
    ) -> Result<PostStatusCounts, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT p.status, COUNT(*) AS count FROM posts p WHERE 1=1",
        );
        if let Some(user_id) = owner {
            Self::apply_scope_conditions(&mut qb, PostListScope::Owner(user_id));
        }
        qb.push(" GROUP BY p.status");

        let rows = qb
            .build_query_as::<StatusCountRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut counts = PostStatusCounts::default();
        for row in rows {
            counts.add(row.status, Self::convert_count(row.count)?);
        }
        Ok(counts)
    }
}
