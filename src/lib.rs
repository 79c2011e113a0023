//! Движок многопользовательского блэкджека для общего виртуального мира.
//!
//! Игроки подходят к столу, ставят через внешний кошелёк хоста и по очереди ходят
//! (hit / stand / double down) против дилера; хост рендерит карты и эффекты.
//!
//! Слои:
//! - `domain`: карты, руки, фишки, столы, статистика;
//! - `eval`: стоимость руки, правило дилера, исход и выплата;
//! - `engine`: сессия стола, леджер ставок, реестр столов;
//! - `infra`: внешние интерфейсы и их реализации (память, JSON, tokio);
//! - `time_ctrl`: часы и отменяемые таймеры;
//! - `api`: команды / запросы / DTO поверх реестра;
//! - `config`: конфиг движка в TOML.

pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod eval;
pub mod infra;
pub mod time_ctrl;

pub use config::{ConfigError, EngineConfig, StorageConfig};
pub use engine::{Collaborators, TableRegistry, TableSession};
