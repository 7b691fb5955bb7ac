//! Read-only catalog snapshot consumed by the reconciler and render model.
//!
//! The catalog (categories and their items) is owned by external CRUD
//! collaborators. The engine only ever reads it through [`CatalogProvider`]
//! and treats every read as a fresh, immutable snapshot.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceResult;

/// Identifier of a catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CategoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A menu category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category identifier.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordering hint; lower sorts first.
    #[serde(default)]
    pub sort_order: i32,
}

impl Category {
    /// Create a category.
    #[must_use]
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>, sort_order: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            sort_order,
        }
    }
}

/// A menu item belonging to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Item identifier.
    pub id: String,
    /// Owning category.
    pub category_id: CategoryId,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Price in minor currency units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    /// Optional image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Whether the item is currently offered.
    #[serde(default = "CatalogItem::default_available")]
    pub available: bool,
}

impl CatalogItem {
    /// Create an available item.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        category_id: impl Into<CategoryId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category_id: category_id.into(),
            name: name.into(),
            description: None,
            price: None,
            image_url: None,
            available: true,
        }
    }

    const fn default_available() -> bool {
        true
    }
}

/// An immutable view of a menu's categories and items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    categories: Vec<Category>,
    items: Vec<CatalogItem>,
}

impl CatalogSnapshot {
    /// Build a snapshot. Categories are ordered by `(sort_order, id)`.
    #[must_use]
    pub fn new(mut categories: Vec<Category>, items: Vec<CatalogItem>) -> Self {
        categories.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { categories, items }
    }

    /// Categories in placement order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a category.
    #[must_use]
    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    /// Whether a category exists in this snapshot.
    #[must_use]
    pub fn contains(&self, id: &CategoryId) -> bool {
        self.category(id).is_some()
    }

    /// Items of one category, in catalog order.
    pub fn items_in<'a>(&'a self, id: &'a CategoryId) -> impl Iterator<Item = &'a CatalogItem> {
        self.items.iter().filter(move |item| &item.category_id == id)
    }

    /// Number of items in one category.
    #[must_use]
    pub fn item_count(&self, id: &CategoryId) -> usize {
        self.items_in(id).count()
    }

    /// All items.
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }
}

/// Read-only access to a menu's catalog.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Categories of a menu.
    async fn categories(&self, menu_key: &str) -> PersistenceResult<Vec<Category>>;

    /// Items of a menu.
    async fn items(&self, menu_key: &str) -> PersistenceResult<Vec<CatalogItem>>;

    /// Read both collections into one snapshot.
    async fn snapshot(&self, menu_key: &str) -> PersistenceResult<CatalogSnapshot> {
        let categories = self.categories(menu_key).await?;
        let items = self.items(menu_key).await?;
        Ok(CatalogSnapshot::new(categories, items))
    }
}

/// In-memory catalog keyed by menu.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    menus: Arc<RwLock<HashMap<String, (Vec<Category>, Vec<CatalogItem>)>>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog of one menu.
    pub fn set_menu(&self, menu_key: &str, categories: Vec<Category>, items: Vec<CatalogItem>) {
        let mut menus = self
            .menus
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        menus.insert(menu_key.to_string(), (categories, items));
    }
}

#[async_trait]
impl CatalogProvider for MemoryCatalog {
    async fn categories(&self, menu_key: &str) -> PersistenceResult<Vec<Category>> {
        let menus = self
            .menus
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(menus
            .get(menu_key)
            .map(|(categories, _)| categories.clone())
            .unwrap_or_default())
    }

    async fn items(&self, menu_key: &str) -> PersistenceResult<Vec<CatalogItem>> {
        let menus = self
            .menus
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(menus
            .get(menu_key)
            .map(|(_, items)| items.clone())
            .unwrap_or_default())
    }
}
