//! Durable widget placements.
//!
//! The on-disk document mirrors a flat preferences file: four integer keys
//! per widget (`{id}_x`, `{id}_y`, `{id}_width`, `{id}_height`) and one
//! string-set key, `widget_list`, naming the live widgets.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::layout_engine::StoreError;
use crate::model::{CellRect, WidgetId};

pub const WIDGET_LIST_KEY: &str = "widget_list";

pub trait LayoutStore {
    fn list_widget_ids(&self) -> Result<BTreeSet<WidgetId>, StoreError>;

    fn load_rect(&self, id: WidgetId) -> Result<Option<CellRect>, StoreError>;

    fn save_rect(&mut self, id: WidgetId, rect: CellRect) -> Result<(), StoreError>;

    /// Forgets the widget entirely: its ID and its placement keys.
    fn remove_widget(&mut self, id: WidgetId) -> Result<(), StoreError>;

    /// Adds the ID to the live set without a placement.
    fn register_widget(&mut self, id: WidgetId) -> Result<(), StoreError>;
}

/// Where accepted placements are written.
pub trait CommitSink {
    fn commit(&mut self, id: WidgetId, rect: CellRect) -> Result<(), StoreError>;
}

impl<S: LayoutStore + ?Sized> CommitSink for S {
    fn commit(&mut self, id: WidgetId, rect: CellRect) -> Result<(), StoreError> {
        self.save_rect(id, rect)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrefValue {
    Int(i64),
    StringSet(BTreeSet<String>),
}

/// Key-value layout store, in memory or backed by a RON file.
///
/// File-backed stores rewrite the whole document on every mutation. A
/// failed write leaves the in-memory document updated.
#[derive(Debug, Default)]
pub struct PrefsLayoutStore {
    prefs: BTreeMap<String, PrefValue>,
    path: Option<PathBuf>,
}

fn key_x(id: WidgetId) -> String { format!("{id}_x") }
fn key_y(id: WidgetId) -> String { format!("{id}_y") }
fn key_width(id: WidgetId) -> String { format!("{id}_width") }
fn key_height(id: WidgetId) -> String { format!("{id}_height") }

impl PrefsLayoutStore {
    pub fn in_memory() -> Self { Self::default() }

    /// Opens (or starts) the document at `path`. A missing file is an empty
    /// store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let prefs = read_ron(&path)?.unwrap_or_default();
        debug!(?path, "opened layout store");
        Ok(Self { prefs, path: Some(path) })
    }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn get(&self, key: &str) -> Option<&PrefValue> { self.prefs.get(key) }

    /// Raw write, bypassing the widget helpers.
    pub fn put(&mut self, key: impl Into<String>, value: PrefValue) -> Result<(), StoreError> {
        self.prefs.insert(key.into(), value);
        self.flush()
    }

    fn get_int(&self, key: &str) -> Option<i32> {
        match self.prefs.get(key)? {
            PrefValue::Int(v) => Some((*v).clamp(i32::MIN as i64, i32::MAX as i64) as i32),
            other => {
                warn!(key, ?other, "expected an integer preference");
                None
            }
        }
    }

    fn id_strings(&self) -> BTreeSet<String> {
        match self.prefs.get(WIDGET_LIST_KEY) {
            Some(PrefValue::StringSet(ids)) => ids.clone(),
            Some(other) => {
                warn!(?other, "widget list is not a string set; treating as empty");
                BTreeSet::new()
            }
            None => BTreeSet::new(),
        }
    }

    fn set_id_strings(&mut self, ids: BTreeSet<String>) {
        self.prefs.insert(WIDGET_LIST_KEY.to_string(), PrefValue::StringSet(ids));
    }

    fn flush(&self) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => write_ron(path, &self.prefs),
            None => Ok(()),
        }
    }
}

impl LayoutStore for PrefsLayoutStore {
    fn list_widget_ids(&self) -> Result<BTreeSet<WidgetId>, StoreError> {
        Ok(self
            .id_strings()
            .iter()
            .filter_map(|raw| match raw.parse::<WidgetId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(raw, "skipping malformed widget id");
                    None
                }
            })
            .collect())
    }

    fn load_rect(&self, id: WidgetId) -> Result<Option<CellRect>, StoreError> {
        let (Some(x), Some(y), Some(width), Some(height)) = (
            self.get_int(&key_x(id)),
            self.get_int(&key_y(id)),
            self.get_int(&key_width(id)),
            self.get_int(&key_height(id)),
        ) else {
            return Ok(None);
        };
        Ok(Some(CellRect::new(x, y, width, height)))
    }

    fn save_rect(&mut self, id: WidgetId, rect: CellRect) -> Result<(), StoreError> {
        trace!(%id, %rect, "saving placement");
        self.prefs.insert(key_x(id), PrefValue::Int(rect.cell_x.into()));
        self.prefs.insert(key_y(id), PrefValue::Int(rect.cell_y.into()));
        self.prefs.insert(key_width(id), PrefValue::Int(rect.cell_width.into()));
        self.prefs.insert(key_height(id), PrefValue::Int(rect.cell_height.into()));
        self.flush()
    }

    fn remove_widget(&mut self, id: WidgetId) -> Result<(), StoreError> {
        debug!(%id, "removing widget from store");
        let mut ids = self.id_strings();
        ids.retain(|raw| raw.parse::<WidgetId>().map_or(true, |parsed| parsed != id));
        self.set_id_strings(ids);
        for key in [key_x(id), key_y(id), key_width(id), key_height(id)] {
            self.prefs.remove(&key);
        }
        self.flush()
    }

    fn register_widget(&mut self, id: WidgetId) -> Result<(), StoreError> {
        let mut ids = self.id_strings();
        if ids.insert(id.to_string()) {
            debug!(%id, "registered widget");
        }
        self.set_id_strings(ids);
        self.flush()
    }
}

pub(crate) fn read_ron<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let buf = match std::fs::read_to_string(path) {
        Ok(buf) => buf,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
    };
    ron::from_str(&buf)
        .map(Some)
        .map_err(|source| StoreError::Parse { path: path.to_path_buf(), source })
}

/// Writes `value` next to `path` and renames it into place.
pub(crate) fn write_ron<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?;
    let io_err = |source| StoreError::Io { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let tmp = path.with_extension("ron.tmp");
    std::fs::write(&tmp, text.as_bytes()).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)
}
