//! Конфигурация движка: стол, тайминги, пути хранилищ. Формат: TOML.
//!
//! ```toml
//! [table]
//! max_seats = 5
//! min_bet = 10
//! max_bet = 10000
//! hit_soft_17 = false
//! max_join_distance = 10.0
//!
//! [timing]
//! bet_cooldown_ms = 1000
//! auto_start_delay_ms = 5000
//! reset_delay_ms = 3000
//!
//! [storage]
//! anchors_path = "tables.json"
//! stats_path = "stats.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::table::{TableConfig, MAX_SEATS_LIMIT};
use crate::time_ctrl::TimingConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Не удалось прочитать конфиг {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Битый TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Некорректное значение {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Где лежат якоря столов и статистика игроков.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub anchors_path: PathBuf,
    pub stats_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            anchors_path: PathBuf::from("tables.json"),
            stats_path: PathBuf::from("stats.json"),
        }
    }
}

/// Полный конфиг движка. Любая секция может отсутствовать: берутся значения по умолчанию.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub table: TableConfig,
    pub timing: TimingConfig,
    pub storage: StorageConfig,
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::info!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.table;
        if t.max_seats == 0 || t.max_seats > MAX_SEATS_LIMIT {
            return Err(ConfigError::Invalid {
                field: "table.max_seats",
                reason: format!("должно быть от 1 до {MAX_SEATS_LIMIT}, а не {}", t.max_seats),
            });
        }
        if t.min_bet.is_zero() {
            return Err(ConfigError::Invalid {
                field: "table.min_bet",
                reason: "должна быть больше нуля".to_string(),
            });
        }
        if t.min_bet > t.max_bet {
            return Err(ConfigError::Invalid {
                field: "table.max_bet",
                reason: format!("меньше минимальной ставки ({} < {})", t.max_bet, t.min_bet),
            });
        }
        if t.max_join_distance.is_nan() || t.max_join_distance < 0.0 {
            return Err(ConfigError::Invalid {
                field: "table.max_join_distance",
                reason: format!("должна быть неотрицательной, а не {}", t.max_join_distance),
            });
        }
        Ok(())
    }
}
