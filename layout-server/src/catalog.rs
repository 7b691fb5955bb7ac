//! Catalog read from JSON files next to the stored layouts.
//!
//! `<data_dir>/catalog/<menu_key>.json` holds `{ "categories": [...], "items": [...] }`.
//! A menu without a file has an empty catalog.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use layout_core::{
    CatalogItem, CatalogProvider, CatalogSnapshot, Category, PersistenceError, PersistenceResult,
};
use serde::{Deserialize, Serialize};

/// On-disk catalog document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Menu categories.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Menu items.
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

/// [`CatalogProvider`] backed by one JSON file per menu.
#[derive(Debug, Clone)]
pub struct FileCatalogProvider {
    dir: PathBuf,
}

impl FileCatalogProvider {
    /// Read catalogs from `<data_dir>/catalog`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join("catalog"),
        }
    }

    /// Directory holding the catalog files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, menu_key: &str) -> PathBuf {
        let safe: String = menu_key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    async fn read(&self, menu_key: &str) -> PersistenceResult<CatalogFile> {
        let path = self.path_for(menu_key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No catalog file for {menu_key} at {}", path.display());
                return Ok(CatalogFile::default());
            }
            Err(e) => return Err(PersistenceError::Io(e)),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write a menu's catalog file, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] or [`PersistenceError::Serialization`].
    pub async fn write(&self, menu_key: &str, catalog: &CatalogFile) -> PersistenceResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(catalog)?;
        tokio::fs::write(self.path_for(menu_key), json).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for FileCatalogProvider {
    async fn categories(&self, menu_key: &str) -> PersistenceResult<Vec<Category>> {
        Ok(self.read(menu_key).await?.categories)
    }

    async fn items(&self, menu_key: &str) -> PersistenceResult<Vec<CatalogItem>> {
        Ok(self.read(menu_key).await?.items)
    }

    async fn snapshot(&self, menu_key: &str) -> PersistenceResult<CatalogSnapshot> {
        let file = self.read(menu_key).await?;
        Ok(CatalogSnapshot::new(file.categories, file.items))
    }
}
