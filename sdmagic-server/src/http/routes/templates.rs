//! Template endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::repos::{Template, TemplateChanges, TemplateRepo};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::TemplateName;

/// Create template request
#[derive(Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub content: String,
}

/// Update template request; absent fields are left untouched.
#[derive(Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

/// Template response
#[derive(Serialize)]
pub struct TemplateResponse {
    pub id: i32,
    pub name: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Template> for TemplateResponse {
    fn from(template: Template) -> Self {
        Self {
            id: template.id,
            name: template.name,
            content: template.content,
            created_at: template.created_at.to_rfc3339(),
            updated_at: template.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the template listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateListParams {
    pub name: Option<String>,
    pub page: Option<u32>,
}

/// POST /api/templates/ - create a template
async fn create_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>), ApiError> {
    let name = TemplateName::new(&req.name)?;
    let template = TemplateRepo::new(&state.pool)
        .create(name, req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(template.into())))
}

/// PUT /api/templates/{id} - partial update
async fn update_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateTemplateRequest>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let changes = TemplateChanges {
        name: req.name.as_deref().map(TemplateName::new).transpose()?,
        content: req.content,
    };
    let template = TemplateRepo::new(&state.pool).update(id, changes).await?;

    Ok(Json(template.into()))
}

/// DELETE /api/templates/{id} - delete a template
async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    TemplateRepo::new(&state.pool).delete(id).await?;

    Ok(Json(json!({"message": "template deleted"})))
}

/// GET /api/templates/ - name search with fixed-size pages
async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TemplateListParams>,
) -> Result<Json<Vec<TemplateResponse>>, ApiError> {
    let page = params.page.unwrap_or(1);
    let templates = TemplateRepo::new(&state.pool)
        .list(params.name.as_deref(), page)
        .await?;

    Ok(Json(
        templates.into_iter().map(TemplateResponse::from).collect(),
    ))
}

/// Template routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/templates/", get(list_templates).post(create_template))
        .route(
            "/api/templates/{id}",
            put(update_template).delete(delete_template),
        )
}
