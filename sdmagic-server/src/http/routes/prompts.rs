//! Prompt endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::repos::{Prompt, PromptChanges, PromptFilter, PromptRepo};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{OffsetPage, PromptText, DEFAULT_LIMIT};

/// Create prompt request
#[derive(Deserialize)]
pub struct CreatePromptRequest {
    pub original_text: String,
    pub chinese_translation: Option<String>,
    pub category_id: i32,
}

/// Update prompt request; absent fields are left untouched.
#[derive(Deserialize)]
pub struct UpdatePromptRequest {
    pub original_text: Option<String>,
    pub chinese_translation: Option<String>,
    pub category_id: Option<i32>,
}

/// Prompt response
#[derive(Serialize)]
pub struct PromptResponse {
    pub id: i32,
    pub original_text: String,
    pub chinese_translation: Option<String>,
    pub category_id: i32,
}

impl From<Prompt> for PromptResponse {
    fn from(prompt: Prompt) -> Self {
        Self {
            id: prompt.id,
            original_text: prompt.original_text,
            chinese_translation: prompt.chinese_translation,
            category_id: prompt.category_id,
        }
    }
}

/// Query parameters accepted by the prompt listing.
///
/// `original_text` and `search` carry the same substring-filter
/// semantics; `chinese_translation` is accepted and echoed into page
/// links but never filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptListParams {
    pub category_id: Option<i32>,
    pub original_text: Option<String>,
    pub chinese_translation: Option<String>,
    pub search: Option<String>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

/// Paginated prompt listing
#[derive(Serialize)]
pub struct PromptListResponse {
    pub results: Vec<PromptResponse>,
    /// Total count of all prompts in the store, regardless of filters.
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// Rebuild the listing URL for a neighboring page window.
///
/// Only explicitly supplied parameters are echoed; `chinese_translation`
/// is included even though the filter logic never reads it.
fn page_link(params: &PromptListParams, page: OffsetPage) -> String {
    let mut link = format!("/api/prompts/?skip={}&limit={}", page.skip, page.limit);

    if let Some(category_id) = params.category_id {
        link.push_str(&format!("&category_id={category_id}"));
    }
    if let Some(original_text) = &params.original_text {
        link.push_str(&format!("&original_text={original_text}"));
    }
    if let Some(chinese_translation) = &params.chinese_translation {
        link.push_str(&format!("&chinese_translation={chinese_translation}"));
    }

    link
}

/// POST /api/prompts/ - create a prompt
async fn create_prompt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePromptRequest>,
) -> Result<(StatusCode, Json<PromptResponse>), ApiError> {
    let text = PromptText::new(&req.original_text)?;
    let prompt = PromptRepo::new(&state.pool)
        .create(text, req.chinese_translation, req.category_id)
        .await?;

    Ok((StatusCode::CREATED, Json(prompt.into())))
}

/// PUT /api/prompts/{id} - partial update
async fn update_prompt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(req): Json<UpdatePromptRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    let changes = PromptChanges {
        original_text: req
            .original_text
            .as_deref()
            .map(PromptText::new)
            .transpose()?,
        chinese_translation: req.chinese_translation,
        category_id: req.category_id,
    };
    let prompt = PromptRepo::new(&state.pool).update(id, changes).await?;

    Ok(Json(prompt.into()))
}

/// DELETE /api/prompts/{id} - hard delete
async fn delete_prompt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    PromptRepo::new(&state.pool).delete(id).await?;

    Ok(Json(json!({"message": "prompt deleted"})))
}

/// GET /api/prompts/ - filtered, paginated listing
async fn list_prompts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PromptListParams>,
) -> Result<Json<PromptListResponse>, ApiError> {
    let page = OffsetPage::new(
        params.skip.unwrap_or(0),
        params.limit.unwrap_or(DEFAULT_LIMIT),
    );
    let filter = PromptFilter {
        category_id: params.category_id,
        search: params.original_text.clone().or_else(|| params.search.clone()),
    };

    let (prompts, count) = PromptRepo::new(&state.pool).list(&filter, page).await?;

    let next = page.next(count).map(|window| page_link(&params, window));
    let previous = page.previous().map(|window| page_link(&params, window));

    Ok(Json(PromptListResponse {
        results: prompts.into_iter().map(PromptResponse::from).collect(),
        count,
        next,
        previous,
    }))
}

/// Prompt routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/prompts/", get(list_prompts).post(create_prompt))
        .route("/api/prompts/{id}", put(update_prompt).delete(delete_prompt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_carries_only_supplied_params() {
        let params = PromptListParams {
            category_id: Some(7),
            ..Default::default()
        };
        let link = page_link(&params, OffsetPage::new(50, 50));
        assert_eq!(link, "/api/prompts/?skip=50&limit=50&category_id=7");
    }

    #[test]
    fn link_echoes_chinese_translation_despite_not_filtering() {
        let params = PromptListParams {
            original_text: Some("castle".into()),
            chinese_translation: Some("城堡".into()),
            ..Default::default()
        };
        let link = page_link(&params, OffsetPage::new(0, 50));
        assert_eq!(
            link,
            "/api/prompts/?skip=0&limit=50&original_text=castle&chinese_translation=城堡"
        );
    }

    #[test]
    fn bare_link_has_window_only() {
        let params = PromptListParams::default();
        let link = page_link(&params, OffsetPage::new(100, 25));
        assert_eq!(link, "/api/prompts/?skip=100&limit=25");
    }
}
