//! Category endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::repos::{Category, CategoryNode, CategoryRepo};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::CategoryName;

/// Create category request
#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub parent_id: Option<i32>,
}

/// Update category request
#[derive(Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: String,
}

/// Category response; `children` is empty on create/update replies and
/// recursively populated on tree listings.
#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
    pub is_default: bool,
    pub children: Vec<CategoryResponse>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            parent_id: category.parent_id,
            is_default: category.is_default,
            children: Vec::new(),
        }
    }
}

impl From<CategoryNode> for CategoryResponse {
    fn from(node: CategoryNode) -> Self {
        Self {
            id: node.category.id,
            name: node.category.name,
            parent_id: node.category.parent_id,
            is_default: node.category.is_default,
            children: node.children.into_iter().map(Self::from).collect(),
        }
    }
}

/// POST /api/categories/ - create a category
async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let name = CategoryName::new(&req.name)?;
    let category = CategoryRepo::new(&state.pool)
        .create(name, req.parent_id)
        .await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// PUT /api/categories/{id} - rename a category
async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let name = CategoryName::new(&req.name)?;
    let category = CategoryRepo::new(&state.pool).rename(id, name).await?;

    Ok(Json(category.into()))
}

/// DELETE /api/categories/{id} - delete a category, reparenting its prompts
async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    CategoryRepo::new(&state.pool).delete(id).await?;

    Ok(Json(json!({"message": "category deleted"})))
}

/// GET /api/categories/ - full category tree
async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let tree = CategoryRepo::new(&state.pool).tree().await?;

    Ok(Json(tree.into_iter().map(CategoryResponse::from).collect()))
}

/// Category routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/categories/", get(list_categories).post(create_category))
        .route(
            "/api/categories/{id}",
            put(update_category).delete(delete_category),
        )
}
