//! Layout persistence: stores, the on-disk document format and debounced saving.
//!
//! ## Document format
//!
//! ```text
//! { layoutType, columns, theme: {...}, menuKey, version,
//!   sections: [ { id, kind, gridPosition: {row, col}, gridSize: {rowSpan, colSpan},
//!                 content?, categoryId?, editable, title? } ] }
//! ```
//!
//! Decoding is lenient: every missing or invalid field falls back to its
//! default on its own, so one bad value never discards the whole layout.
//! Positions are taken verbatim and never inferred from the catalog.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::catalog::CategoryId;
use crate::error::{PersistenceError, PersistenceResult};
use crate::layout::{LayoutConfig, LayoutType, DEFAULT_COLUMNS};
use crate::section::{
    GridPosition, GridSize, Section, SectionContent, SectionId, SectionKind, TextAlignment,
};
use crate::theme::StyleTokens;

// ---------------------------------------------------------------------------
// Document encoding
// ---------------------------------------------------------------------------

/// Persisted form of one section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDocument {
    /// Section identifier.
    pub id: String,
    /// Section kind.
    pub kind: SectionKind,
    /// Top-left cell.
    pub grid_position: GridPosition,
    /// Footprint.
    pub grid_size: GridSize,
    /// Visual payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<SectionContent>,
    /// Linked category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    /// User-editable flag.
    pub editable: bool,
    /// Designer label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl From<&Section> for SectionDocument {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id.to_string(),
            kind: section.kind,
            grid_position: section.position,
            grid_size: section.size,
            content: section.content.clone(),
            category_id: section.category_id.clone(),
            editable: section.editable,
            title: section.title.clone(),
        }
    }
}

/// Persisted form of a layout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    /// Item arrangement.
    pub layout_type: LayoutType,
    /// Item columns.
    pub columns: usize,
    /// Style tokens.
    pub theme: StyleTokens,
    /// Sections in order.
    pub sections: Vec<SectionDocument>,
    /// Owning menu.
    pub menu_key: String,
    /// Save version.
    pub version: u64,
}

impl From<&LayoutConfig> for LayoutDocument {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            layout_type: config.layout_type,
            columns: config.columns,
            theme: config.theme.clone(),
            sections: config.sections.iter().map(SectionDocument::from).collect(),
            menu_key: config.menu_key.clone(),
            version: config.version,
        }
    }
}

impl LayoutDocument {
    /// Encode a layout as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Serialization`] if encoding fails.
    pub fn encode(config: &LayoutConfig) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(&Self::from(config))?)
    }

    /// Decode a stored layout, defaulting field by field.
    ///
    /// `menu_key` is used when the document does not carry one.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Serialization`] for invalid JSON and
    /// [`PersistenceError::MalformedConfig`] if the top level is not an object.
    pub fn decode(json: &str, menu_key: &str) -> PersistenceResult<LayoutConfig> {
        let value: Value = serde_json::from_str(json)?;
        Self::decode_value(&value, menu_key)
    }

    /// Decode an already-parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::MalformedConfig`] if `value` is not an object.
    pub fn decode_value(value: &Value, menu_key: &str) -> PersistenceResult<LayoutConfig> {
        let Some(obj) = value.as_object() else {
            return Err(PersistenceError::MalformedConfig(format!(
                "layout for {menu_key} is not a JSON object"
            )));
        };

        let mut seen = HashSet::new();
        let sections: Vec<Section> = obj
            .get("sections")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|entry| decode_section(entry, &mut seen))
                    .collect()
            })
            .unwrap_or_default();

        Ok(LayoutConfig {
            layout_type: field(obj, "layoutType").unwrap_or_default(),
            columns: field::<usize>(obj, "columns")
                .filter(|c| *c >= 1)
                .unwrap_or(DEFAULT_COLUMNS),
            theme: obj
                .get("theme")
                .and_then(Value::as_object)
                .map(decode_theme)
                .unwrap_or_default(),
            sections,
            menu_key: field(obj, "menuKey").unwrap_or_else(|| menu_key.to_string()),
            version: field(obj, "version").unwrap_or(0),
        })
    }
}

/// Read one field, `None` when missing or of the wrong shape.
fn field<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Option<T> {
    obj.get(key)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

fn decode_theme(obj: &Map<String, Value>) -> StyleTokens {
    let defaults = StyleTokens::default();
    StyleTokens {
        background_color: field(obj, "backgroundColor").unwrap_or(defaults.background_color),
        card_color: field(obj, "cardColor").unwrap_or(defaults.card_color),
        text_color: field(obj, "textColor").unwrap_or(defaults.text_color),
        primary_color: field(obj, "primaryColor").unwrap_or(defaults.primary_color),
        elevation: field(obj, "elevation").unwrap_or(defaults.elevation),
        border_radius: field(obj, "borderRadius").unwrap_or(defaults.border_radius),
    }
}

fn decode_content(obj: &Map<String, Value>) -> SectionContent {
    let defaults = SectionContent::default();
    SectionContent {
        text: field(obj, "text").unwrap_or(defaults.text),
        subtitle: field(obj, "subtitle"),
        image_url: field(obj, "imageUrl"),
        background_color: field(obj, "backgroundColor").unwrap_or(defaults.background_color),
        text_color: field(obj, "textColor").unwrap_or(defaults.text_color),
        font_size: field(obj, "fontSize").unwrap_or(defaults.font_size),
        font_weight: field(obj, "fontWeight").unwrap_or(defaults.font_weight),
        border_radius: field(obj, "borderRadius").unwrap_or(defaults.border_radius),
        padding: field(obj, "padding").unwrap_or(defaults.padding),
        alignment: field::<TextAlignment>(obj, "alignment").unwrap_or(defaults.alignment),
    }
}

fn decode_section(obj: &Map<String, Value>, seen: &mut HashSet<String>) -> Section {
    let id = match field::<String>(obj, "id") {
        Some(id) if !id.is_empty() && !seen.contains(&id) => SectionId::from_string(id),
        Some(id) => {
            tracing::warn!("Section id '{id}' missing or duplicated, assigning a new one");
            SectionId::new()
        }
        None => SectionId::new(),
    };
    seen.insert(id.to_string());

    let kind = field::<SectionKind>(obj, "kind").unwrap_or(SectionKind::Special);
    let position = obj
        .get("gridPosition")
        .and_then(Value::as_object)
        .map(|pos| {
            GridPosition::new(
                field(pos, "row").unwrap_or(0),
                field(pos, "col").unwrap_or(0),
            )
        })
        .unwrap_or_default();
    let size = obj
        .get("gridSize")
        .and_then(Value::as_object)
        .map(|size| {
            GridSize::new(
                field::<usize>(size, "rowSpan").filter(|s| *s >= 1).unwrap_or(1),
                field::<usize>(size, "colSpan").filter(|s| *s >= 1).unwrap_or(1),
            )
        })
        .unwrap_or_default();

    Section {
        id,
        kind,
        position,
        size,
        content: obj
            .get("content")
            .and_then(Value::as_object)
            .map(decode_content),
        category_id: field(obj, "categoryId"),
        editable: field(obj, "editable").unwrap_or_else(|| kind.is_custom()),
        title: field(obj, "title"),
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Durable storage for layouts.
///
/// Saves are optimistically versioned: a layout whose `version` is not newer
/// than the stored one is rejected with [`PersistenceError::VersionConflict`].
#[async_trait]
pub trait LayoutStore: Send + Sync {
    /// Persist a layout under its menu key.
    async fn save(&self, config: &LayoutConfig) -> PersistenceResult<()>;

    /// Load a layout, `None` if the menu has never been saved.
    async fn load(&self, menu_key: &str) -> PersistenceResult<Option<LayoutConfig>>;

    /// Remove a stored layout. Missing layouts are not an error.
    async fn delete(&self, menu_key: &str) -> PersistenceResult<()>;

    /// Menu keys with a stored layout.
    async fn menu_keys(&self) -> PersistenceResult<Vec<String>>;
}

#[async_trait]
impl<S: LayoutStore + ?Sized> LayoutStore for Arc<S> {
    async fn save(&self, config: &LayoutConfig) -> PersistenceResult<()> {
        (**self).save(config).await
    }

    async fn load(&self, menu_key: &str) -> PersistenceResult<Option<LayoutConfig>> {
        (**self).load(menu_key).await
    }

    async fn delete(&self, menu_key: &str) -> PersistenceResult<()> {
        (**self).delete(menu_key).await
    }

    async fn menu_keys(&self) -> PersistenceResult<Vec<String>> {
        (**self).menu_keys().await
    }
}

fn check_version(menu_key: &str, stored: Option<u64>, attempted: u64) -> PersistenceResult<()> {
    match stored {
        Some(stored) if stored >= attempted && !(stored == 0 && attempted == 0) => {
            Err(PersistenceError::VersionConflict {
                menu_key: menu_key.to_string(),
                stored,
                attempted,
            })
        }
        _ => Ok(()),
    }
}

/// In-memory store holding encoded documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryLayoutStore {
    documents: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryLayoutStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored document, for inspection.
    #[must_use]
    pub fn raw(&self, menu_key: &str) -> Option<String> {
        let documents = self
            .documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        documents.get(menu_key).cloned()
    }

    /// Store a raw document as if written by another client.
    pub fn insert_raw(&self, menu_key: &str, json: impl Into<String>) {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        documents.insert(menu_key.to_string(), json.into());
    }
}

#[async_trait]
impl LayoutStore for MemoryLayoutStore {
    async fn save(&self, config: &LayoutConfig) -> PersistenceResult<()> {
        let json = LayoutDocument::encode(config)?;
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let stored = documents
            .get(&config.menu_key)
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .map(|value| value.get("version").and_then(Value::as_u64).unwrap_or(0));
        check_version(&config.menu_key, stored, config.version)?;
        documents.insert(config.menu_key.clone(), json);
        Ok(())
    }

    async fn load(&self, menu_key: &str) -> PersistenceResult<Option<LayoutConfig>> {
        let Some(raw) = self.raw(menu_key) else {
            return Ok(None);
        };
        LayoutDocument::decode(&raw, menu_key).map(Some)
    }

    async fn delete(&self, menu_key: &str) -> PersistenceResult<()> {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        documents.remove(menu_key);
        Ok(())
    }

    async fn menu_keys(&self) -> PersistenceResult<Vec<String>> {
        let documents = self
            .documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut keys: Vec<_> = documents.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Filesystem store writing one JSON document per menu.
#[derive(Debug, Clone)]
pub struct FileLayoutStore {
    data_dir: PathBuf,
}

impl FileLayoutStore {
    /// Create a store rooted at `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Directory holding the layout files.
    #[must_use]
    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }

    fn path_for(&self, menu_key: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.json", sanitize_filename(menu_key)))
    }

    async fn read_raw(&self, menu_key: &str) -> PersistenceResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(menu_key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl LayoutStore for FileLayoutStore {
    async fn save(&self, config: &LayoutConfig) -> PersistenceResult<()> {
        let stored = self
            .read_raw(&config.menu_key)
            .await?
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .map(|value| value.get("version").and_then(Value::as_u64).unwrap_or(0));
        check_version(&config.menu_key, stored, config.version)?;

        let json = LayoutDocument::encode(config)?;
        let path = self.path_for(&config.menu_key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(
            "Wrote layout {} v{} to {}",
            config.menu_key,
            config.version,
            path.display()
        );
        Ok(())
    }

    async fn load(&self, menu_key: &str) -> PersistenceResult<Option<LayoutConfig>> {
        let Some(raw) = self.read_raw(menu_key).await? else {
            return Ok(None);
        };
        LayoutDocument::decode(&raw, menu_key).map(Some)
    }

    async fn delete(&self, menu_key: &str) -> PersistenceResult<()> {
        match tokio::fs::remove_file(self.path_for(menu_key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn menu_keys(&self) -> PersistenceResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Sanitize a menu key for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(menu_key: &str) -> String {
    menu_key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Debounced saving
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct PendingSave {
    config: LayoutConfig,
    deadline: Instant,
}

/// Coalesces bursts of edits into one trailing write.
///
/// Each [`DebouncedSaver::schedule`] replaces the pending snapshot and pushes
/// the deadline out by the window. A failed write keeps the snapshot pending
/// and hands the error back to the caller.
#[derive(Debug)]
pub struct DebouncedSaver<S> {
    store: S,
    window: Duration,
    pending: Option<PendingSave>,
}

impl<S: LayoutStore> DebouncedSaver<S> {
    /// Create a saver over `store` with a trailing `window`.
    pub fn new(store: S, window: Duration) -> Self {
        Self {
            store,
            window,
            pending: None,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Trailing window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Queue a snapshot for saving after the quiet period.
    pub fn schedule(&mut self, config: &LayoutConfig) {
        self.schedule_at(config, Instant::now());
    }

    /// Queue a snapshot as of `now`.
    pub fn schedule_at(&mut self, config: &LayoutConfig, now: Instant) {
        self.pending = Some(PendingSave {
            config: config.clone(),
            deadline: now + self.window,
        });
    }

    /// Whether a snapshot is waiting to be written.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending snapshot becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Whether the pending snapshot is due at `now`.
    pub fn is_due_at(&self, now: Instant) -> bool {
        self.pending.as_ref().is_some_and(|p| p.deadline <= now)
    }

    /// Drop the pending snapshot without writing it.
    pub fn discard(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Write the pending snapshot if its quiet period has elapsed.
    ///
    /// Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the snapshot stays pending.
    pub async fn flush_due(&mut self) -> PersistenceResult<bool> {
        self.flush_due_at(Instant::now()).await
    }

    /// [`DebouncedSaver::flush_due`] as of `now`.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the snapshot stays pending.
    pub async fn flush_due_at(&mut self, now: Instant) -> PersistenceResult<bool> {
        if !self.is_due_at(now) {
            return Ok(false);
        }
        self.flush().await
    }

    /// Write the pending snapshot immediately.
    ///
    /// Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the snapshot stays pending.
    pub async fn flush(&mut self) -> PersistenceResult<bool> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        match self.store.save(&pending.config).await {
            Ok(()) => {
                tracing::info!(
                    "Saved layout {} v{} ({} sections)",
                    pending.config.menu_key,
                    pending.config.version,
                    pending.config.sections.len()
                );
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Failed to save layout {}: {e}", pending.config.menu_key);
                self.pending = Some(pending);
                Err(e)
            }
        }
    }
}
