//! Внешний API движка блэкджека.
//!
//! Здесь описываются:
//! - команды (commands.rs): всё, что меняет состояние (стол, посадка, ставка, ход);
//! - запросы (queries.rs): только чтение;
//! - DTO (dto.rs): удобные структуры для клиента;
//! - ошибки (errors.rs): то, что видит клиент.
//!
//! Разбор чат-команд сюда не входит: хост сам собирает `Command` и вызывает `execute`.

pub mod commands;
pub mod dto;
pub mod errors;
pub mod queries;

pub use commands::*;
pub use dto::*;
pub use errors::*;
pub use queries::*;
