//! Sections - the rectangular blocks placed on the layout grid.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::CategoryId;

/// Unique identifier for a section within a layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Create a new random section ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic ID of the header section generated for a category.
    #[must_use]
    pub fn category_header(category: &CategoryId) -> Self {
        Self(format!("category-{category}"))
    }

    /// Deterministic ID of the items section generated for a category.
    #[must_use]
    pub fn category_items(category: &CategoryId) -> Self {
        Self(format!("items-{category}"))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a section shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Item listing for one category. Generated.
    Items,
    /// Category header. Generated.
    Category,
    /// Advertisement block.
    Ad,
    /// Promotional block.
    Promotion,
    /// Free-form special block.
    Special,
}

impl SectionKind {
    /// Structural kinds are derived from the catalog by the reconciler.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        matches!(self, Self::Items | Self::Category)
    }

    /// Custom kinds are authored by the user.
    #[must_use]
    pub const fn is_custom(self) -> bool {
        !self.is_structural()
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Category => "category",
            Self::Ad => "ad",
            Self::Promotion => "promotion",
            Self::Special => "special",
        }
    }
}

impl std::str::FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "items" => Ok(Self::Items),
            "category" => Ok(Self::Category),
            "ad" => Ok(Self::Ad),
            "promotion" => Ok(Self::Promotion),
            "special" => Ok(Self::Special),
            other => Err(format!("unknown section kind '{other}'")),
        }
    }
}

/// Top-left cell of a footprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
}

impl GridPosition {
    /// Create a position.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Footprint extent in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSize {
    /// Rows covered, at least 1.
    pub row_span: usize,
    /// Columns covered, at least 1.
    pub col_span: usize,
}

impl GridSize {
    /// Create a footprint size.
    #[must_use]
    pub const fn new(row_span: usize, col_span: usize) -> Self {
        Self { row_span, col_span }
    }

    /// Whether both spans are at least one cell.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.row_span >= 1 && self.col_span >= 1
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl std::fmt::Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.row_span, self.col_span)
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    /// Left aligned.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Right aligned.
    Right,
}

/// Visual payload of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionContent {
    /// Main text.
    pub text: String,
    /// Optional secondary line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Optional image reference (URL or upload key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Background color as hex.
    pub background_color: String,
    /// Text color as hex.
    pub text_color: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// CSS-style font weight ("normal", "bold", "600", ...).
    pub font_weight: String,
    /// Corner radius in pixels.
    pub border_radius: f32,
    /// Inner padding in pixels.
    pub padding: f32,
    /// Text alignment.
    pub alignment: TextAlignment,
}

impl SectionContent {
    /// Content with the given text and neutral styling.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the subtitle.
    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Set the image reference.
    #[must_use]
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

impl Default for SectionContent {
    fn default() -> Self {
        Self {
            text: String::new(),
            subtitle: None,
            image_url: None,
            background_color: "#FFFFFF".to_string(),
            text_color: "#000000".to_string(),
            font_size: 16.0,
            font_weight: "normal".to_string(),
            border_radius: 8.0,
            padding: 12.0,
            alignment: TextAlignment::Center,
        }
    }
}

/// A rectangular block on the layout grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Unique identifier.
    pub id: SectionId,
    /// What the section shows.
    pub kind: SectionKind,
    /// Top-left cell.
    pub position: GridPosition,
    /// Footprint extent.
    pub size: GridSize,
    /// Visual payload; absent for item listings.
    pub content: Option<SectionContent>,
    /// Linked catalog category (structural sections only).
    pub category_id: Option<CategoryId>,
    /// Whether the user may edit, drag or delete this section.
    pub editable: bool,
    /// Optional designer-facing label.
    pub title: Option<String>,
}

impl Section {
    /// Create a user-authored section of a custom kind.
    #[must_use]
    pub fn custom(kind: SectionKind, content: SectionContent) -> Self {
        Self {
            id: SectionId::new(),
            kind,
            position: GridPosition::default(),
            size: GridSize::default(),
            content: Some(content),
            category_id: None,
            editable: true,
            title: None,
        }
    }

    /// Create the generated header section for a category.
    #[must_use]
    pub fn category_header(category: &CategoryId, name: &str) -> Self {
        let content = SectionContent {
            font_size: 20.0,
            font_weight: "bold".to_string(),
            alignment: TextAlignment::Left,
            ..SectionContent::text(name)
        };
        Self {
            id: SectionId::category_header(category),
            kind: SectionKind::Category,
            position: GridPosition::default(),
            size: GridSize::default(),
            content: Some(content),
            category_id: Some(category.clone()),
            editable: false,
            title: Some(name.to_string()),
        }
    }

    /// Create the generated item listing section for a category.
    #[must_use]
    pub fn category_items(category: &CategoryId) -> Self {
        Self {
            id: SectionId::category_items(category),
            kind: SectionKind::Items,
            position: GridPosition::default(),
            size: GridSize::default(),
            content: None,
            category_id: Some(category.clone()),
            editable: false,
            title: None,
        }
    }

    /// Set the position.
    #[must_use]
    pub fn at(mut self, position: GridPosition) -> Self {
        self.position = position;
        self
    }

    /// Set the footprint size.
    #[must_use]
    pub fn with_size(mut self, size: GridSize) -> Self {
        self.size = size;
        self
    }

    /// Set the designer label.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Whether the reconciler owns this section.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        !self.editable
    }

    /// Whether the footprint covers a cell.
    #[must_use]
    pub fn covers(&self, row: usize, col: usize) -> bool {
        row >= self.position.row
            && row < self.position.row.saturating_add(self.size.row_span)
            && col >= self.position.col
            && col < self.position.col.saturating_add(self.size.col_span)
    }

    /// Whether two footprints share at least one cell.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.position.row < other.position.row.saturating_add(other.size.row_span)
            && other.position.row < self.position.row.saturating_add(self.size.row_span)
            && self.position.col < other.position.col.saturating_add(other.size.col_span)
            && other.position.col < self.position.col.saturating_add(self.size.col_span)
    }
}
