use serde::{Deserialize, Serialize};

use crate::domain::{PlayerId, TableId};
use crate::engine::{EngineError, ErrorKind, RegistryError};

/// Ошибки внешнего API (то, что отдаём клиенту).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApiError {
    /// Неправильные входные данные (сумма ставки, номер места).
    BadRequest(String),

    /// Стол не найден.
    TableNotFound(TableId),

    /// Игрок не сидит ни за одним столом.
    PlayerNotAtTable(PlayerId),

    /// Команда не может быть выполнена в текущем состоянии.
    InvalidCommand(String),

    /// Внешний леджер отказал (недостаточно средств, списание не прошло).
    LedgerFailure(String),

    /// Нет свободного места / нет стола рядом.
    Unavailable(String),

    /// Внутренняя ошибка сервера.
    Internal(String),
}

impl ApiError {
    fn from_kind(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::Validation => ApiError::BadRequest(message),
            ErrorKind::Precondition => ApiError::InvalidCommand(message),
            ErrorKind::ExternalOperation => ApiError::LedgerFailure(message),
            ErrorKind::ResourceExhaustion => ApiError::Unavailable(message),
            ErrorKind::InternalInvariant => ApiError::Internal(message),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::from_kind(err.kind(), err.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::TableNotFound(id) => ApiError::TableNotFound(id),
            RegistryError::NotAtTable(p) => ApiError::PlayerNotAtTable(p),
            RegistryError::Engine(e) => ApiError::from(e),
            RegistryError::Storage(e) => ApiError::Internal(e.to_string()),
            other => ApiError::from_kind(other.kind(), other.to_string()),
        }
    }
}
