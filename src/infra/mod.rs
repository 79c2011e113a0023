//! Инфраструктурный слой вокруг движка блэкджека:
//! - внешние интерфейсы (леджер, статистика, презентация, хост);
//! - in-memory реализации для тестов и симуляций;
//! - хранение якорей столов и статистики в JSON;
//! - RNG-реализации для шуза;
//! - хост на tokio;
//! - генерация ID.

pub mod host;
pub mod ids;
pub mod memory;
pub mod persistence;
pub mod ports;
pub mod rng;

pub use host::TokioHost;
pub use ids::*;
pub use memory::*;
pub use persistence::*;
pub use ports::*;
pub use rng::*;
