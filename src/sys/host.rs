use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::store::{read_ron, write_ron};
use crate::layout_engine::StoreError;
use crate::model::{PixelSize, WidgetId};

/// Resolved widget content. Rendering it is up to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHandle {
    pub id: WidgetId,
    pub provider: String,
}

/// What the layout engine needs from whoever owns widget content.
pub trait WidgetHostAdapter {
    /// Smallest size the content can be drawn at, in pixels.
    fn minimum_content_size(&self, id: WidgetId) -> PixelSize;

    /// `None` means the provider is gone (e.g. its app was uninstalled).
    fn resolve_content(&self, id: WidgetId) -> Option<ContentHandle>;
}

impl<T: WidgetHostAdapter + ?Sized> WidgetHostAdapter for &T {
    fn minimum_content_size(&self, id: WidgetId) -> PixelSize { (**self).minimum_content_size(id) }

    fn resolve_content(&self, id: WidgetId) -> Option<ContentHandle> {
        (**self).resolve_content(id)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProviderEntry {
    pub provider: String,
    /// Minimum content width in density-independent pixels.
    #[serde(default)]
    pub min_width_dp: f64,
    #[serde(default)]
    pub min_height_dp: f64,
}

/// Widget IDs bound to content providers, persisted as RON.
#[derive(Debug)]
pub struct ProviderRegistry {
    entries: BTreeMap<WidgetId, ProviderEntry>,
    density: f64,
    path: Option<PathBuf>,
}

impl ProviderRegistry {
    pub fn in_memory(density: f64) -> Self {
        Self {
            entries: BTreeMap::new(),
            density,
            path: None,
        }
    }

    pub fn open(path: impl Into<PathBuf>, density: f64) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = read_ron(&path)?.unwrap_or_default();
        Ok(Self { entries, density, path: Some(path) })
    }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn density(&self) -> f64 { self.density }

    pub fn get(&self, id: WidgetId) -> Option<&ProviderEntry> { self.entries.get(&id) }

    pub fn iter(&self) -> impl Iterator<Item = (WidgetId, &ProviderEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn next_id(&self) -> WidgetId {
        self.entries.keys().next_back().map_or(WidgetId::new(1), |last| {
            WidgetId::new(last.get().saturating_add(1))
        })
    }

    /// Binds a fresh widget ID to `entry`.
    pub fn allocate(&mut self, entry: ProviderEntry) -> Result<WidgetId, StoreError> {
        let id = self.next_id();
        info!(%id, provider = %entry.provider, "allocated widget id");
        self.entries.insert(id, entry);
        self.flush()?;
        Ok(id)
    }

    pub fn bind(&mut self, id: WidgetId, entry: ProviderEntry) -> Result<(), StoreError> {
        self.entries.insert(id, entry);
        self.flush()
    }

    /// Returns whether an entry was removed.
    pub fn unregister(&mut self, id: WidgetId) -> Result<bool, StoreError> {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            debug!(%id, "unregistered provider");
            self.flush()?;
        }
        Ok(removed)
    }

    fn flush(&self) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => write_ron(path, &self.entries),
            None => Ok(()),
        }
    }
}

impl WidgetHostAdapter for ProviderRegistry {
    fn minimum_content_size(&self, id: WidgetId) -> PixelSize {
        self.entries.get(&id).map_or(PixelSize::default(), |entry| {
            PixelSize::new(entry.min_width_dp * self.density, entry.min_height_dp * self.density)
        })
    }

    fn resolve_content(&self, id: WidgetId) -> Option<ContentHandle> {
        self.entries.get(&id).map(|entry| ContentHandle {
            id,
            provider: entry.provider.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn clock() -> ProviderEntry {
        ProviderEntry {
            provider: "com.example.clock/.ClockWidget".to_string(),
            min_width_dp: 40.0,
            min_height_dp: 30.0,
        }
    }

    #[test]
    fn allocates_sequential_ids() {
        let mut registry = ProviderRegistry::in_memory(1.0);
        assert_eq!(registry.allocate(clock()).unwrap(), WidgetId::new(1));
        assert_eq!(registry.allocate(clock()).unwrap(), WidgetId::new(2));
        registry.bind(WidgetId::new(10), clock()).unwrap();
        assert_eq!(registry.next_id(), WidgetId::new(11));
    }

    #[test]
    fn minimum_size_scales_with_density() {
        let mut registry = ProviderRegistry::in_memory(2.0);
        let id = registry.allocate(clock()).unwrap();
        assert_eq!(registry.minimum_content_size(id), PixelSize::new(80.0, 60.0));
        assert_eq!(
            registry.minimum_content_size(WidgetId::new(99)),
            PixelSize::new(0.0, 0.0)
        );
    }

    #[test]
    fn unregistered_content_no_longer_resolves() {
        let mut registry = ProviderRegistry::in_memory(1.0);
        let id = registry.allocate(clock()).unwrap();
        assert_eq!(
            registry.resolve_content(id),
            Some(ContentHandle {
                id,
                provider: "com.example.clock/.ClockWidget".to_string()
            })
        );

        assert!(registry.unregister(id).unwrap());
        assert!(!registry.unregister(id).unwrap());
        assert_eq!(registry.resolve_content(id), None);
    }

    #[test]
    fn file_registry_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.ron");
        let id = {
            let mut registry = ProviderRegistry::open(&path, 1.5).unwrap();
            registry.allocate(clock()).unwrap()
        };

        let registry = ProviderRegistry::open(&path, 1.5).unwrap();
        assert_eq!(registry.get(id), Some(&clock()));
        assert_eq!(registry.iter().count(), 1);
    }
}
