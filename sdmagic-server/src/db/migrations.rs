//! Database migrations for the prompt library tables

use sqlx::PgPool;

/// Name given to the default category when none exists yet.
const DEFAULT_CATEGORY_NAME: &str = "Uncategorized";

/// Run all migrations.
///
/// Idempotent: tables and indexes use IF NOT EXISTS, and the default
/// category is only seeded when no row carries the is_default flag.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    // Categories form an adjacency tree. parent_id carries no FK
    // constraint: tree integrity is application policy, and the
    // one-level cascade on delete leaves grandchildren pointing at a
    // removed parent.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prompt_categories (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            parent_id INTEGER,
            is_default BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prompts (
            id SERIAL PRIMARY KEY,
            original_text TEXT NOT NULL UNIQUE,
            chinese_translation TEXT,
            category_id INTEGER NOT NULL REFERENCES prompt_categories(id),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prompt_templates (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;
    seed_default_category(pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}

async fn create_indexes(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_prompt_categories_parent ON prompt_categories(parent_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_prompts_category ON prompts(category_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_prompt_templates_updated ON prompt_templates(updated_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed the protected default category.
///
/// Exactly one category carries is_default at all times; orphaned
/// prompts are reassigned to it when their category is deleted.
async fn seed_default_category(pool: &PgPool) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO prompt_categories (name, is_default)
        SELECT $1, TRUE
        WHERE NOT EXISTS (SELECT 1 FROM prompt_categories WHERE is_default)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(DEFAULT_CATEGORY_NAME)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::info!("Seeded default category '{}'", DEFAULT_CATEGORY_NAME);
    }

    Ok(())
}
