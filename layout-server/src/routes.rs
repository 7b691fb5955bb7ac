//! API route handlers.
//!
//! Every handler validates its input, locks the menu's session, runs one
//! engine operation and answers with JSON. Saves happen in the background
//! flusher unless the client asks for `/save`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use layout_core::{
    DragOutcome, GridPosition, GridSize, LayoutType, ReconcileReport, RenderModel, Section,
    SectionContent, SectionId, SectionKind, StyleTokens, TextAlignment,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::sessions::{record_save_error, Engine};
use crate::validation::{self, ValidationError};
use crate::AppState;

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

/// Partial section content; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    /// Main text.
    pub text: Option<String>,
    /// Secondary line; empty string clears it.
    pub subtitle: Option<String>,
    /// Image reference; empty string clears it.
    pub image_url: Option<String>,
    /// Background color.
    pub background_color: Option<String>,
    /// Text color.
    pub text_color: Option<String>,
    /// Font size in pixels.
    pub font_size: Option<f32>,
    /// Font weight.
    pub font_weight: Option<String>,
    /// Corner radius in pixels.
    pub border_radius: Option<f32>,
    /// Inner padding in pixels.
    pub padding: Option<f32>,
    /// Text alignment.
    pub alignment: Option<TextAlignment>,
}

impl ContentPatch {
    /// Apply the patch on top of `base`.
    #[must_use]
    pub fn apply(self, mut base: SectionContent) -> SectionContent {
        fn clearable(value: String) -> Option<String> {
            (!value.is_empty()).then_some(value)
        }
        if let Some(text) = self.text {
            base.text = text;
        }
        if let Some(subtitle) = self.subtitle {
            base.subtitle = clearable(subtitle);
        }
        if let Some(image_url) = self.image_url {
            base.image_url = clearable(image_url);
        }
        if let Some(color) = self.background_color {
            base.background_color = color;
        }
        if let Some(color) = self.text_color {
            base.text_color = color;
        }
        if let Some(size) = self.font_size {
            base.font_size = size;
        }
        if let Some(weight) = self.font_weight {
            base.font_weight = weight;
        }
        if let Some(radius) = self.border_radius {
            base.border_radius = radius;
        }
        if let Some(padding) = self.padding {
            base.padding = padding;
        }
        if let Some(alignment) = self.alignment {
            base.alignment = alignment;
        }
        base
    }
}

/// Body of `POST /sections`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSectionRequest {
    /// Custom section kind.
    pub kind: SectionKind,
    /// Preferred top-left cell; defaults to the origin.
    #[serde(default)]
    pub position: GridPosition,
    /// Footprint; defaults to one cell.
    #[serde(default)]
    pub size: GridSize,
    /// Content on top of the neutral defaults.
    #[serde(default)]
    pub content: ContentPatch,
    /// Designer label.
    pub title: Option<String>,
}

/// Body of `PATCH /sections/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionRequest {
    /// Content changes.
    pub content: Option<ContentPatch>,
    /// New label; empty string clears it.
    pub title: Option<String>,
    /// Move to the nearest free slot around this cell.
    pub position: Option<GridPosition>,
    /// New footprint.
    pub size: Option<GridSize>,
}

/// Body of `PUT /layout-type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutTypeRequest {
    /// Item arrangement.
    pub layout_type: LayoutType,
    /// Item columns; keeps the current value when absent.
    pub columns: Option<usize>,
}

/// Pointer phase of a drag event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragPhase {
    /// Pointer pressed on a section.
    Down,
    /// Pointer moved.
    Move,
    /// Pointer released.
    Up,
    /// Window lost focus.
    Blur,
}

/// Body of `POST /drag`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragRequest {
    /// Event phase.
    pub phase: DragPhase,
    /// Grabbed section, required for `down`.
    pub section_id: Option<SectionId>,
    /// Pointer X in grid pixels.
    #[serde(default)]
    pub x: f32,
    /// Pointer Y in grid pixels.
    #[serde(default)]
    pub y: f32,
}

/// Body of `POST /duplicate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateRequest {
    /// Key of the copy.
    pub new_menu_key: String,
}

/// A section and the layout version after the change.
#[derive(Debug, Serialize)]
pub struct SectionResponse {
    /// The section as stored.
    pub section: Section,
    /// Layout version.
    pub version: u64,
}

/// Result of a drag event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragResponse {
    /// Whether a drag is still in progress.
    pub dragging: bool,
    /// Snapped position after a move.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPosition>,
    /// Committed move after up/blur.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DragOutcome>,
    /// Layout version.
    pub version: u64,
}

/// Result of an explicit save.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// Whether anything was written.
    pub saved: bool,
    /// Layout version.
    pub version: u64,
}

/// Result of a duplication.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateResponse {
    /// Key of the copy.
    pub menu_key: String,
    /// Sections copied.
    pub sections: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check(kind: &str, result: Result<(), ValidationError>) -> ApiResult<()> {
    result.map_err(|err| {
        metrics::record_validation_failure(kind);
        ApiError::from(err)
    })
}

fn check_patch(patch: ContentPatch, base: SectionContent) -> ApiResult<SectionContent> {
    let content = patch.apply(base);
    check("content", validation::validate_content(&content))?;
    Ok(content)
}

fn section_id(raw: &str) -> ApiResult<SectionId> {
    check("section_id", validation::validate_section_id(raw))?;
    Ok(SectionId::from_string(raw))
}

fn record<T>(operation: &str, result: ApiResult<T>) -> ApiResult<T> {
    metrics::record_operation(operation, result.is_ok());
    result
}

fn section_response(engine: &Engine, id: &SectionId) -> ApiResult<SectionResponse> {
    let section = engine
        .section(id)
        .cloned()
        .ok_or_else(|| layout_core::LayoutError::SectionNotFound(id.clone()))?;
    Ok(SectionResponse {
        section,
        version: engine.layout().version,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Render model of a menu, opening and reconciling its session on first use.
#[tracing::instrument(name = "get_layout", skip(state))]
pub async fn get_layout(
    State(state): State<AppState>,
    Path(menu_key): Path<String>,
) -> ApiResult<Json<RenderModel>> {
    check("menu_key", validation::validate_menu_key(&menu_key))?;
    let handle = state.sessions.session(&menu_key).await?;
    let engine = handle.lock().await;
    Ok(Json(engine.render_model()))
}

/// Re-read the catalog and reconcile structural sections.
#[tracing::instrument(name = "reconcile", skip(state))]
pub async fn reconcile(
    State(state): State<AppState>,
    Path(menu_key): Path<String>,
) -> ApiResult<Json<ReconcileReport>> {
    check("menu_key", validation::validate_menu_key(&menu_key))?;
    let handle = state.sessions.session(&menu_key).await?;
    let mut engine = handle.lock().await;
    let result = engine
        .refresh_catalog(state.sessions.catalog().as_ref())
        .await
        .map_err(ApiError::from);
    let report = record("reconcile", result)?;
    metrics::record_reconcile(report.added.len(), report.pruned.len(), report.unplaced.len());
    Ok(Json(report))
}

/// Add a custom section near the requested cell.
#[tracing::instrument(name = "add_section", skip(state, request), fields(kind = ?request.kind))]
pub async fn add_section(
    State(state): State<AppState>,
    Path(menu_key): Path<String>,
    Json(request): Json<AddSectionRequest>,
) -> ApiResult<(StatusCode, Json<SectionResponse>)> {
    check("menu_key", validation::validate_menu_key(&menu_key))?;
    let content = check_patch(request.content, SectionContent::default())?;
    if let Some(title) = &request.title {
        check("title", validation::validate_title(title))?;
    }

    let handle = state.sessions.session(&menu_key).await?;
    let mut engine = handle.lock().await;
    let result = engine
        .add_section(request.kind, request.position, request.size, content)
        .map_err(ApiError::from);
    let id = record("add_section", result)?;
    if let Some(title) = request.title.filter(|t| !t.is_empty()) {
        engine.set_title(&id, Some(title))?;
    }
    Ok((StatusCode::CREATED, Json(section_response(&engine, &id)?)))
}

/// Edit content, label, position or footprint of a custom section.
#[tracing::instrument(name = "update_section", skip(state, request))]
pub async fn update_section(
    State(state): State<AppState>,
    Path((menu_key, raw_id)): Path<(String, String)>,
    Json(request): Json<UpdateSectionRequest>,
) -> ApiResult<Json<SectionResponse>> {
    check("menu_key", validation::validate_menu_key(&menu_key))?;
    let id = section_id(&raw_id)?;
    if let Some(title) = &request.title {
        check("title", validation::validate_title(title))?;
    }

    let handle = state.sessions.session(&menu_key).await?;
    let mut engine = handle.lock().await;
    let result = apply_update(&mut engine, &id, request);
    record("update_section", result)?;
    Ok(Json(section_response(&engine, &id)?))
}

fn apply_update(
    engine: &mut Engine,
    id: &SectionId,
    request: UpdateSectionRequest,
) -> ApiResult<()> {
    let current = engine
        .section(id)
        .ok_or_else(|| layout_core::LayoutError::SectionNotFound(id.clone()))?;
    if let Some(patch) = request.content {
        let base = current.content.clone().unwrap_or_default();
        let content = check_patch(patch, base)?;
        engine.update_content(id, content)?;
    }
    if let Some(title) = request.title {
        engine.set_title(id, (!title.is_empty()).then_some(title))?;
    }
    if let Some(size) = request.size {
        engine.resize_section(id, size)?;
    }
    if let Some(position) = request.position {
        engine.move_section(id, position)?;
    }
    Ok(())
}

/// Delete a custom section.
#[tracing::instrument(name = "delete_section", skip(state))]
pub async fn delete_section(
    State(state): State<AppState>,
    Path((menu_key, raw_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    check("menu_key", validation::validate_menu_key(&menu_key))?;
    let id = section_id(&raw_id)?;
    let handle = state.sessions.session(&menu_key).await?;
    let mut engine = handle.lock().await;
    let result = engine.delete_section(&id).map_err(ApiError::from);
    record("delete_section", result)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the style tokens and restyle every section.
#[tracing::instrument(name = "set_theme", skip(state, tokens))]
pub async fn set_theme(
    State(state): State<AppState>,
    Path(menu_key): Path<String>,
    Json(tokens): Json<StyleTokens>,
) -> ApiResult<Json<RenderModel>> {
    check("menu_key", validation::validate_menu_key(&menu_key))?;
    for color in [
        &tokens.background_color,
        &tokens.card_color,
        &tokens.text_color,
        &tokens.primary_color,
    ] {
        check("theme", validation::validate_color(color))?;
    }
    if !(tokens.border_radius.is_finite() && tokens.border_radius >= 0.0) {
        check(
            "theme",
            Err(ValidationError::InvalidMeasure("border_radius")),
        )?;
    }

    let handle = state.sessions.session(&menu_key).await?;
    let mut engine = handle.lock().await;
    let result = engine.set_theme(tokens).map_err(ApiError::from);
    record("set_theme", result)?;
    Ok(Json(engine.render_model()))
}

/// Switch between list and grid item layouts.
#[tracing::instrument(name = "set_layout_type", skip(state, request))]
pub async fn set_layout_type(
    State(state): State<AppState>,
    Path(menu_key): Path<String>,
    Json(request): Json<LayoutTypeRequest>,
) -> ApiResult<Json<RenderModel>> {
    check("menu_key", validation::validate_menu_key(&menu_key))?;
    if let Some(columns) = request.columns {
        check("columns", validation::validate_columns(columns))?;
    }

    let handle = state.sessions.session(&menu_key).await?;
    let mut engine = handle.lock().await;
    let columns = request.columns.unwrap_or(engine.layout().columns);
    let result = engine
        .set_layout_type(request.layout_type, columns)
        .and_then(|()| {
            // Item blocks take their new footprint from the reconciler.
            let snapshot = engine.catalog().clone();
            engine.reconcile(snapshot)
        })
        .map_err(ApiError::from);
    record("set_layout_type", result)?;
    Ok(Json(engine.render_model()))
}

/// Feed one pointer event to the drag controller.
#[tracing::instrument(name = "drag", skip(state, request), fields(phase = ?request.phase))]
pub async fn drag(
    State(state): State<AppState>,
    Path(menu_key): Path<String>,
    Json(request): Json<DragRequest>,
) -> ApiResult<Json<DragResponse>> {
    check("menu_key", validation::validate_menu_key(&menu_key))?;
    check("pointer", validation::validate_pointer(request.x, request.y))?;

    let handle = state.sessions.session(&menu_key).await?;
    let mut engine = handle.lock().await;
    let mut response = DragResponse {
        dragging: false,
        position: None,
        outcome: None,
        version: 0,
    };
    match request.phase {
        DragPhase::Down => {
            let raw = request
                .section_id
                .ok_or(ValidationError::MissingField("sectionId"))?;
            let id = section_id(raw.as_str())?;
            let result = engine.pointer_down(&id, request.x, request.y).map_err(ApiError::from);
            record("drag", result)?;
        }
        DragPhase::Move => {
            response.position = engine.pointer_move(request.x, request.y);
        }
        DragPhase::Up => response.outcome = engine.pointer_up()?,
        DragPhase::Blur => response.outcome = engine.blur()?,
    }
    response.dragging = matches!(engine.drag_state(), layout_core::DragState::Dragging(_));
    response.version = engine.layout().version;
    Ok(Json(response))
}

/// Write pending edits now.
#[tracing::instrument(name = "save", skip(state))]
pub async fn save(
    State(state): State<AppState>,
    Path(menu_key): Path<String>,
) -> ApiResult<Json<SaveResponse>> {
    check("menu_key", validation::validate_menu_key(&menu_key))?;
    let handle = state.sessions.session(&menu_key).await?;
    let mut engine = handle.lock().await;
    let saved = match engine.flush().await {
        Ok(saved) => saved,
        Err(err) => {
            record_save_error(&err);
            return Err(err.into());
        }
    };
    if saved {
        metrics::record_save("success");
    }
    Ok(Json(SaveResponse {
        saved,
        version: engine.layout().version,
    }))
}

/// Copy the layout to another menu key.
#[tracing::instrument(name = "duplicate", skip(state, request))]
pub async fn duplicate(
    State(state): State<AppState>,
    Path(menu_key): Path<String>,
    Json(request): Json<DuplicateRequest>,
) -> ApiResult<impl IntoResponse> {
    check("menu_key", validation::validate_menu_key(&menu_key))?;
    check("menu_key", validation::validate_menu_key(&request.new_menu_key))?;

    let handle = state.sessions.session(&menu_key).await?;
    let engine = handle.lock().await;
    let result = engine
        .save_duplicate(&request.new_menu_key)
        .await
        .map_err(ApiError::from);
    let copy = record("duplicate", result)?;
    Ok((
        StatusCode::CREATED,
        Json(DuplicateResponse {
            menu_key: copy.menu_key,
            sections: copy.sections.len(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_patch_applies_over_base() {
        let base = SectionContent::text("Old").with_subtitle("sub");
        let patch: ContentPatch = serde_json::from_str(
            r##"{"text":"New","subtitle":"","backgroundColor":"#000000","alignment":"left"}"##,
        )
        .expect("parse");
        let content = patch.apply(base.clone());
        assert_eq!(content.text, "New");
        assert!(content.subtitle.is_none());
        assert_eq!(content.background_color, "#000000");
        assert_eq!(content.alignment, TextAlignment::Left);
        assert_eq!(content.font_size, base.font_size);
    }

    #[test]
    fn test_add_request_defaults() {
        let request: AddSectionRequest =
            serde_json::from_str(r#"{"kind":"promotion"}"#).expect("parse");
        assert_eq!(request.kind, SectionKind::Promotion);
        assert_eq!(request.position, GridPosition::new(0, 0));
        assert_eq!(request.size, GridSize::new(1, 1));
        assert!(request.content.text.is_none());
    }

    #[test]
    fn test_drag_request_parsing() {
        let request: DragRequest =
            serde_json::from_str(r#"{"phase":"down","sectionId":"abc","x":10.5,"y":3}"#)
                .expect("parse");
        assert_eq!(request.phase, DragPhase::Down);
        assert_eq!(request.section_id, Some(SectionId::from_string("abc")));

        let blur: DragRequest = serde_json::from_str(r#"{"phase":"blur"}"#).expect("parse");
        assert_eq!(blur.phase, DragPhase::Blur);
        assert!(blur.section_id.is_none());
    }
}
