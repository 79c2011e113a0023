use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

use crate::domain::player::ParticipantStatistics;
use crate::domain::table::Location;
use crate::domain::PlayerId;
use crate::infra::ports::StatsSink;

/// Ошибки хранилища.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Битый JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Абстракция хранения якорей столов.
///
/// Формат: список `(region, x, y, z)`.
pub trait AnchorStore: Send + Sync {
    fn load_anchors(&self) -> Result<Vec<Location>, StorageError>;

    /// Перезаписать весь список.
    fn save_anchors(&self, anchors: &[Location]) -> Result<(), StorageError>;
}

/// Простая in-memory реализация для тестов и локального запуска.
#[derive(Debug, Default)]
pub struct InMemoryAnchorStore {
    anchors: Mutex<Vec<Location>>,
}

impl InMemoryAnchorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchors(anchors: Vec<Location>) -> Self {
        Self {
            anchors: Mutex::new(anchors),
        }
    }

    pub fn snapshot(&self) -> Vec<Location> {
        self.anchors.lock().clone()
    }
}

impl AnchorStore for InMemoryAnchorStore {
    fn load_anchors(&self) -> Result<Vec<Location>, StorageError> {
        Ok(self.anchors.lock().clone())
    }

    fn save_anchors(&self, anchors: &[Location]) -> Result<(), StorageError> {
        *self.anchors.lock() = anchors.to_vec();
        Ok(())
    }
}

/// Якоря в JSON-файле: `[["world", 1.0, 64.0, -3.5], ...]`.
#[derive(Debug, Clone)]
pub struct JsonAnchorStore {
    path: PathBuf,
}

impl JsonAnchorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AnchorStore for JsonAnchorStore {
    fn load_anchors(&self) -> Result<Vec<Location>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        let triples: Vec<(String, f64, f64, f64)> = serde_json::from_str(&raw)?;
        Ok(triples
            .into_iter()
            .map(|(region, x, y, z)| Location { region, x, y, z })
            .collect())
    }

    fn save_anchors(&self, anchors: &[Location]) -> Result<(), StorageError> {
        let triples: Vec<(&str, f64, f64, f64)> = anchors
            .iter()
            .map(|a| (a.region.as_str(), a.x, a.y, a.z))
            .collect();
        write_atomically(&self.path, &serde_json::to_string_pretty(&triples)?)
    }
}

/// Статистика игроков в JSON-файле, ключ: id игрока.
///
/// `save` пишет только в кэш; на диск уходит по `flush`
/// (хост зовёт его периодически и на shutdown).
#[derive(Debug)]
pub struct JsonStatsStore {
    path: PathBuf,
    cache: Mutex<StatsCache>,
}

#[derive(Debug, Default)]
struct StatsCache {
    entries: HashMap<PlayerId, ParticipantStatistics>,
    dirty: bool,
}

impl JsonStatsStore {
    /// Открыть файл (или начать с пустой статистики, если файла ещё нет).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            cache: Mutex::new(StatsCache {
                entries,
                dirty: false,
            }),
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.lock().dirty
    }
}

impl StatsSink for JsonStatsStore {
    fn load(&self, player_id: PlayerId) -> ParticipantStatistics {
        self.cache
            .lock()
            .entries
            .get(&player_id)
            .cloned()
            .unwrap_or_default()
    }

    fn save(&self, player_id: PlayerId, stats: &ParticipantStatistics) {
        let mut cache = self.cache.lock();
        cache.entries.insert(player_id, stats.clone());
        cache.dirty = true;
    }

    fn flush(&self) -> Result<(), StorageError> {
        let mut cache = self.cache.lock();
        if !cache.dirty {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&cache.entries)?;
        write_atomically(&self.path, &json)?;
        cache.dirty = false;
        tracing::debug!(players = cache.entries.len(), "stats flushed");
        Ok(())
    }
}

/// Записать во временный файл рядом и переименовать.
fn write_atomically(path: &Path, contents: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
