//! Prompt repository
//!
//! Handles prompt CRUD with:
//! - Global original-text uniqueness
//! - Filtered listing by category (the category plus its direct
//!   children) and case-insensitive substring search

use sqlx::{FromRow, PgPool};

use crate::models::{OffsetPage, PromptText};

use super::DbError;

/// Prompt record from database
#[derive(Debug, Clone, FromRow)]
pub struct Prompt {
    pub id: i32,
    pub original_text: String,
    pub chinese_translation: Option<String>,
    pub category_id: i32,
}

/// Partial update payload; absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct PromptChanges {
    pub original_text: Option<PromptText>,
    pub chinese_translation: Option<String>,
    pub category_id: Option<i32>,
}

/// Listing filters
#[derive(Debug, Clone, Default)]
pub struct PromptFilter {
    pub category_id: Option<i32>,
    /// Substring matched case-insensitively against the original text
    /// or the translation.
    pub search: Option<String>,
}

/// Prompt repository
pub struct PromptRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PromptRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a prompt in an existing category.
    pub async fn create(
        &self,
        original_text: PromptText,
        chinese_translation: Option<String>,
        category_id: i32,
    ) -> Result<Prompt, DbError> {
        let category_exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM prompt_categories WHERE id = $1)")
                .bind(category_id)
                .fetch_one(self.pool)
                .await?;
        if !category_exists.0 {
            return Err(DbError::NotFound {
                resource: "category",
                id: category_id.to_string(),
            });
        }

        let taken: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM prompts WHERE original_text = $1)")
                .bind(original_text.as_str())
                .fetch_one(self.pool)
                .await?;
        if taken.0 {
            return Err(DbError::Conflict("original text already exists"));
        }

        let prompt: Prompt = sqlx::query_as(
            r#"
            INSERT INTO prompts (original_text, chinese_translation, category_id)
            VALUES ($1, $2, $3)
            RETURNING id, original_text, chinese_translation, category_id
            "#,
        )
        .bind(original_text.as_str())
        .bind(&chinese_translation)
        .bind(category_id)
        .fetch_one(self.pool)
        .await?;

        Ok(prompt)
    }

    /// Apply a partial update.
    ///
    /// Re-validates original-text uniqueness (excluding self) and
    /// category existence for whichever fields are supplied.
    pub async fn update(&self, id: i32, changes: PromptChanges) -> Result<Prompt, DbError> {
        let current = self.get(id).await?;

        if let Some(text) = &changes.original_text {
            let taken: (bool,) = sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM prompts WHERE original_text = $1 AND id <> $2)",
            )
            .bind(text.as_str())
            .bind(id)
            .fetch_one(self.pool)
            .await?;
            if taken.0 {
                return Err(DbError::Conflict("original text already exists"));
            }
        }

        if let Some(category_id) = changes.category_id {
            let category_exists: (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM prompt_categories WHERE id = $1)")
                    .bind(category_id)
                    .fetch_one(self.pool)
                    .await?;
            if !category_exists.0 {
                return Err(DbError::NotFound {
                    resource: "category",
                    id: category_id.to_string(),
                });
            }
        }

        let original_text = changes
            .original_text
            .map(PromptText::into_string)
            .unwrap_or(current.original_text);
        let chinese_translation = changes.chinese_translation.or(current.chinese_translation);
        let category_id = changes.category_id.unwrap_or(current.category_id);

        let prompt: Prompt = sqlx::query_as(
            r#"
            UPDATE prompts
            SET original_text = $1, chinese_translation = $2, category_id = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING id, original_text, chinese_translation, category_id
            "#,
        )
        .bind(&original_text)
        .bind(&chinese_translation)
        .bind(category_id)
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(prompt)
    }

    /// Get a single prompt by id.
    pub async fn get(&self, id: i32) -> Result<Prompt, DbError> {
        let prompt: Option<Prompt> = sqlx::query_as(
            "SELECT id, original_text, chinese_translation, category_id FROM prompts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        prompt.ok_or_else(|| DbError::NotFound {
            resource: "prompt",
            id: id.to_string(),
        })
    }

    /// Hard-delete a prompt.
    pub async fn delete(&self, id: i32) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "prompt",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// List prompts for one page, returning the page rows and the
    /// total count of ALL prompts in the store.
    ///
    /// The count is intentionally unfiltered; callers build their
    /// pagination links from it. A category filter matches the
    /// category itself plus its direct children, one level only.
    pub async fn list(
        &self,
        filter: &PromptFilter,
        page: OffsetPage,
    ) -> Result<(Vec<Prompt>, i64), DbError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM prompts")
            .fetch_one(self.pool)
            .await?;

        let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "SELECT id, original_text, chinese_translation, category_id FROM prompts WHERE TRUE",
        );

        if let Some(category_id) = filter.category_id {
            let children: Vec<(i32,)> =
                sqlx::query_as("SELECT id FROM prompt_categories WHERE parent_id = $1")
                    .bind(category_id)
                    .fetch_all(self.pool)
                    .await?;

            let mut category_ids: Vec<i32> = vec![category_id];
            category_ids.extend(children.into_iter().map(|(child_id,)| child_id));

            builder
                .push(" AND category_id = ANY(")
                .push_bind(category_ids)
                .push(")");
        }

        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            builder
                .push(" AND (original_text ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR chinese_translation ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let prompts: Vec<Prompt> = builder
            .build_query_as()
            .fetch_all(self.pool)
            .await?;

        Ok((prompts, total))
    }
}
