//! Template repository
//!
//! Named reusable text templates, independent of categories and
//! prompts. Listing is ordered by most recent update.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::models::TemplateName;

use super::DbError;

/// Fixed page size for template listings
pub const TEMPLATE_PAGE_SIZE: i64 = 20;

/// Template record from database
#[derive(Debug, Clone, FromRow)]
pub struct Template {
    pub id: i32,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update payload; absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct TemplateChanges {
    pub name: Option<TemplateName>,
    pub content: Option<String>,
}

/// Template repository
pub struct TemplateRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TemplateRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a template with a unique name.
    pub async fn create(&self, name: TemplateName, content: String) -> Result<Template, DbError> {
        let taken: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM prompt_templates WHERE name = $1)")
                .bind(name.as_str())
                .fetch_one(self.pool)
                .await?;
        if taken.0 {
            return Err(DbError::Conflict("template name already exists"));
        }

        let template: Template = sqlx::query_as(
            r#"
            INSERT INTO prompt_templates (name, content)
            VALUES ($1, $2)
            RETURNING id, name, content, created_at, updated_at
            "#,
        )
        .bind(name.as_str())
        .bind(&content)
        .fetch_one(self.pool)
        .await?;

        Ok(template)
    }

    /// Apply a partial update.
    ///
    /// The uniqueness check only runs when the supplied name differs
    /// from the stored one; an unchanged name skips it.
    pub async fn update(&self, id: i32, changes: TemplateChanges) -> Result<Template, DbError> {
        let current = self.get(id).await?;

        if let Some(name) = &changes.name {
            if name.as_str() != current.name {
                let taken: (bool,) =
                    sqlx::query_as("SELECT EXISTS(SELECT 1 FROM prompt_templates WHERE name = $1)")
                        .bind(name.as_str())
                        .fetch_one(self.pool)
                        .await?;
                if taken.0 {
                    return Err(DbError::Conflict("template name already exists"));
                }
            }
        }

        let name = changes
            .name
            .map(TemplateName::into_string)
            .unwrap_or(current.name);
        let content = changes.content.unwrap_or(current.content);

        let template: Template = sqlx::query_as(
            r#"
            UPDATE prompt_templates
            SET name = $1, content = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING id, name, content, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(&content)
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(template)
    }

    /// Get a single template by id.
    pub async fn get(&self, id: i32) -> Result<Template, DbError> {
        let template: Option<Template> = sqlx::query_as(
            "SELECT id, name, content, created_at, updated_at FROM prompt_templates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        template.ok_or_else(|| DbError::NotFound {
            resource: "template",
            id: id.to_string(),
        })
    }

    /// Delete a template.
    pub async fn delete(&self, id: i32) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM prompt_templates WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "template",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// List one page of templates, most recently updated first.
    ///
    /// Pages are 1-based and TEMPLATE_PAGE_SIZE rows wide; the optional
    /// name filter is a case-insensitive substring match.
    pub async fn list(&self, name: Option<&str>, page: u32) -> Result<Vec<Template>, DbError> {
        let offset = (i64::from(page.max(1)) - 1) * TEMPLATE_PAGE_SIZE;

        let templates: Vec<Template> = match name {
            Some(name) => {
                sqlx::query_as(
                    r#"
                    SELECT id, name, content, created_at, updated_at
                    FROM prompt_templates
                    WHERE name ILIKE $1
                    ORDER BY updated_at DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(format!("%{name}%"))
                .bind(TEMPLATE_PAGE_SIZE)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, name, content, created_at, updated_at
                    FROM prompt_templates
                    ORDER BY updated_at DESC
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(TEMPLATE_PAGE_SIZE)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::testing::{pool, unique};

    // Integration tests - run with DATABASE_URL set:
    // DATABASE_URL=postgres://... cargo test -p sdmagic-server -- --ignored

    fn name(raw: &str) -> TemplateName {
        TemplateName::new(raw).expect("valid template name")
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_name_is_conflict() {
        let pool = pool().await;
        let repo = TemplateRepo::new(&pool);
        let taken = unique("tpl");

        repo.create(name(&taken), "content".into()).await.unwrap();
        let err = repo
            .create(name(&taken), "other content".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rename_collision_is_conflict_but_unchanged_name_passes() {
        let pool = pool().await;
        let repo = TemplateRepo::new(&pool);

        let first = unique("tpl");
        let second = unique("tpl");
        let kept = repo.create(name(&first), "a".into()).await.unwrap();
        repo.create(name(&second), "b".into()).await.unwrap();

        // Colliding rename fails
        let changes = TemplateChanges {
            name: Some(name(&second)),
            ..Default::default()
        };
        let err = repo.update(kept.id, changes).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        // Resubmitting the current name alongside new content succeeds
        let changes = TemplateChanges {
            name: Some(name(&first)),
            content: Some("updated".into()),
        };
        let updated = repo.update(kept.id, changes).await.unwrap();
        assert_eq!(updated.content, "updated");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn delete_missing_is_not_found() {
        let pool = pool().await;
        let repo = TemplateRepo::new(&pool);

        let err = repo.delete(i32::MAX).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn list_orders_by_most_recent_update() {
        let pool = pool().await;
        let repo = TemplateRepo::new(&pool);

        let prefix = unique("tpl");
        let older = repo
            .create(name(&format!("{prefix}-older")), "a".into())
            .await
            .unwrap();
        let newer = repo
            .create(name(&format!("{prefix}-newer")), "b".into())
            .await
            .unwrap();

        // Touch the older one so it becomes the most recently updated
        let changes = TemplateChanges {
            content: Some("a2".into()),
            ..Default::default()
        };
        repo.update(older.id, changes).await.unwrap();

        let templates = repo.list(Some(prefix.as_str()), 1).await.unwrap();
        let ids: Vec<i32> = templates.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }
}
