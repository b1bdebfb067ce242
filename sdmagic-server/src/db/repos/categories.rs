//! Category repository
//!
//! Handles the category tree: name uniqueness, the protected default
//! category, and the transactional delete that reparents prompts.

use std::collections::HashMap;

use sqlx::{FromRow, PgPool};

use crate::models::CategoryName;

/// Category record from database
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
    pub is_default: bool,
}

/// Category with nested children for tree responses
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    Protected(&'static str),
}

/// Category repository
pub struct CategoryRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a category, optionally under a parent.
    ///
    /// The parent must exist and must not be the default category.
    pub async fn create(
        &self,
        name: CategoryName,
        parent_id: Option<i32>,
    ) -> Result<Category, DbError> {
        let taken: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM prompt_categories WHERE name = $1)")
                .bind(name.as_str())
                .fetch_one(self.pool)
                .await?;
        if taken.0 {
            return Err(DbError::Conflict("category name already exists"));
        }

        if let Some(parent_id) = parent_id {
            let parent: Option<Category> = sqlx::query_as(
                "SELECT id, name, parent_id, is_default FROM prompt_categories WHERE id = $1",
            )
            .bind(parent_id)
            .fetch_optional(self.pool)
            .await?;

            let parent = parent.ok_or_else(|| DbError::NotFound {
                resource: "category",
                id: parent_id.to_string(),
            })?;
            if parent.is_default {
                return Err(DbError::Conflict(
                    "cannot create a subcategory under the default category",
                ));
            }
        }

        let category: Category = sqlx::query_as(
            r#"
            INSERT INTO prompt_categories (name, parent_id)
            VALUES ($1, $2)
            RETURNING id, name, parent_id, is_default
            "#,
        )
        .bind(name.as_str())
        .bind(parent_id)
        .fetch_one(self.pool)
        .await?;

        Ok(category)
    }

    /// Rename a category in place.
    ///
    /// The default category cannot be renamed; the new name must not
    /// collide with a different category.
    pub async fn rename(&self, id: i32, name: CategoryName) -> Result<Category, DbError> {
        let current = self.get(id).await?;
        if current.is_default {
            return Err(DbError::Protected("the default category cannot be modified"));
        }

        let taken: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM prompt_categories WHERE name = $1 AND id <> $2)",
        )
        .bind(name.as_str())
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        if taken.0 {
            return Err(DbError::Conflict("category name already exists"));
        }

        let category: Category = sqlx::query_as(
            r#"
            UPDATE prompt_categories
            SET name = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, parent_id, is_default
            "#,
        )
        .bind(name.as_str())
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(category)
    }

    /// Get a single category by id.
    pub async fn get(&self, id: i32) -> Result<Category, DbError> {
        let category: Option<Category> = sqlx::query_as(
            "SELECT id, name, parent_id, is_default FROM prompt_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        category.ok_or_else(|| DbError::NotFound {
            resource: "category",
            id: id.to_string(),
        })
    }

    /// Delete a category, reparenting its prompts.
    ///
    /// In one transaction: prompts owned by the target or its direct
    /// children move to the default category, the child rows are
    /// deleted, then the target row. One level only - grandchildren
    /// keep their parent reference.
    pub async fn delete(&self, id: i32) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let target: Option<Category> = sqlx::query_as(
            "SELECT id, name, parent_id, is_default FROM prompt_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let target = target.ok_or_else(|| DbError::NotFound {
            resource: "category",
            id: id.to_string(),
        })?;
        if target.is_default {
            return Err(DbError::Protected("the default category cannot be deleted"));
        }

        let (default_id,): (i32,) =
            sqlx::query_as("SELECT id FROM prompt_categories WHERE is_default LIMIT 1")
                .fetch_one(&mut *tx)
                .await?;

        let children: Vec<(i32,)> =
            sqlx::query_as("SELECT id FROM prompt_categories WHERE parent_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let mut doomed: Vec<i32> = vec![id];
        doomed.extend(children.into_iter().map(|(child_id,)| child_id));

        // Bulk reassignment before the rows disappear; no prompt may be
        // left referencing a deleted category id.
        sqlx::query(
            "UPDATE prompts SET category_id = $1, updated_at = NOW() WHERE category_id = ANY($2)",
        )
        .bind(default_id)
        .bind(&doomed)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM prompt_categories WHERE parent_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM prompt_categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Load the full category forest rooted at parentless rows.
    ///
    /// All rows come back in one query and are assembled in memory.
    pub async fn tree(&self) -> Result<Vec<CategoryNode>, DbError> {
        let rows: Vec<Category> = sqlx::query_as(
            "SELECT id, name, parent_id, is_default FROM prompt_categories ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(forest_from_rows(rows))
    }
}

/// Assemble nested nodes from flat adjacency rows.
///
/// Rows on a cycle are reachable from no root and are simply omitted.
fn forest_from_rows(rows: Vec<Category>) -> Vec<CategoryNode> {
    let mut by_parent: HashMap<Option<i32>, Vec<Category>> = HashMap::new();
    for row in rows {
        by_parent.entry(row.parent_id).or_default().push(row);
    }
    attach_children(&mut by_parent, None)
}

fn attach_children(
    by_parent: &mut HashMap<Option<i32>, Vec<Category>>,
    parent: Option<i32>,
) -> Vec<CategoryNode> {
    let Some(categories) = by_parent.remove(&parent) else {
        return Vec::new();
    };

    categories
        .into_iter()
        .map(|category| {
            let children = attach_children(by_parent, Some(category.id));
            CategoryNode { category, children }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::testing::{pool, unique};
    use crate::db::repos::PromptRepo;
    use crate::models::PromptText;

    fn category(id: i32, parent_id: Option<i32>) -> Category {
        Category {
            id,
            name: format!("c{id}"),
            parent_id,
            is_default: false,
        }
    }

    #[test]
    fn forest_nests_children_under_roots() {
        let rows = vec![
            category(1, None),
            category(2, Some(1)),
            category(3, Some(1)),
            category(4, Some(2)),
            category(5, None),
        ];

        let forest = forest_from_rows(rows);
        assert_eq!(forest.len(), 2);

        let root = &forest[0];
        assert_eq!(root.category.id, 1);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].category.id, 2);
        assert_eq!(root.children[0].children[0].category.id, 4);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn forest_omits_rows_on_a_cycle() {
        // 1 <-> 2 reference each other; neither is reachable from a root
        let rows = vec![category(1, Some(2)), category(2, Some(1)), category(3, None)];

        let forest = forest_from_rows(rows);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].category.id, 3);
    }

    // Integration tests - run with DATABASE_URL set:
    // DATABASE_URL=postgres://... cargo test -p sdmagic-server -- --ignored

    async fn default_id(pool: &PgPool) -> i32 {
        let (id,): (i32,) =
            sqlx::query_as("SELECT id FROM prompt_categories WHERE is_default LIMIT 1")
                .fetch_one(pool)
                .await
                .expect("default category seeded");
        id
    }

    fn name(raw: &str) -> CategoryName {
        CategoryName::new(raw).expect("valid category name")
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_name_is_conflict() {
        let pool = pool().await;
        let repo = CategoryRepo::new(&pool);
        let taken = unique("cat");

        repo.create(name(&taken), None).await.unwrap();
        let err = repo.create(name(&taken), None).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn no_children_under_default() {
        let pool = pool().await;
        let repo = CategoryRepo::new(&pool);
        let default = default_id(&pool).await;

        let err = repo
            .create(name(&unique("cat")), Some(default))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn missing_parent_is_not_found() {
        let pool = pool().await;
        let repo = CategoryRepo::new(&pool);

        let err = repo
            .create(name(&unique("cat")), Some(i32::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn default_cannot_be_renamed_or_deleted() {
        let pool = pool().await;
        let repo = CategoryRepo::new(&pool);
        let default = default_id(&pool).await;

        let err = repo.rename(default, name(&unique("cat"))).await.unwrap_err();
        assert!(matches!(err, DbError::Protected(_)));

        let err = repo.delete(default).await.unwrap_err();
        assert!(matches!(err, DbError::Protected(_)));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn delete_reparents_prompts_and_removes_children() {
        let pool = pool().await;
        let repo = CategoryRepo::new(&pool);
        let default = default_id(&pool).await;

        // "Art" -> "Portraits" -> one prompt; deleting "Art" moves the
        // prompt to the default category and removes "Portraits".
        let art = repo.create(name(&unique("art")), None).await.unwrap();
        let portraits = repo
            .create(name(&unique("portraits")), Some(art.id))
            .await
            .unwrap();
        let prompt = PromptRepo::new(&pool)
            .create(
                PromptText::new(&unique("prompt")).unwrap(),
                None,
                portraits.id,
            )
            .await
            .unwrap();

        repo.delete(art.id).await.unwrap();

        let moved = PromptRepo::new(&pool).get(prompt.id).await.unwrap();
        assert_eq!(moved.category_id, default);

        let err = repo.get(portraits.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        let err = repo.get(art.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn tree_contains_created_hierarchy() {
        let pool = pool().await;
        let repo = CategoryRepo::new(&pool);

        let root = repo.create(name(&unique("root")), None).await.unwrap();
        let child = repo
            .create(name(&unique("child")), Some(root.id))
            .await
            .unwrap();

        let tree = repo.tree().await.unwrap();
        let node = tree
            .iter()
            .find(|node| node.category.id == root.id)
            .expect("root present in tree");
        assert!(node.children.iter().any(|c| c.category.id == child.id));
    }
}
