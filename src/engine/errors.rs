use crate::domain::{Chips, PlayerId, SeatIndex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Категория ошибки. Всё, кроме `InternalInvariant`,: штатный отказ:
/// состояние не изменено, причина возвращается вызывающему.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorKind {
    /// Плохие входные данные (сумма ставки, номер места).
    Validation,
    /// Действие невозможно в текущем состоянии (не твой ход, стол полон...).
    Precondition,
    /// Внешний леджер вернул отказ.
    ExternalOperation,
    /// Нет свободного места / нет стола рядом.
    ResourceExhaustion,
    /// Сломан внутренний инвариант: раунд прерывается.
    InternalInvariant,
}

/// Ошибки леджера ставок.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WagerError {
    #[error("Ставка {amount} вне лимитов стола [{min}, {max}]")]
    InvalidAmount { amount: Chips, min: Chips, max: Chips },

    #[error("Ставку можно менять не чаще раза в кулдаун (осталось {remaining_ms} мс)")]
    CooldownActive { remaining_ms: u64 },

    #[error("Недостаточно средств: нужно {required}")]
    InsufficientFunds { required: Chips },

    #[error("Внешний леджер отказал в операции: {0}")]
    OperationFailed(LedgerOp),

    #[error("Ставка уже равна {0}")]
    AlreadySet(Chips),

    #[error("Нет запомненной ставки для повтора")]
    NothingToRepeat,

    #[error("Нет открытой ставки у игрока {0}")]
    NoOpenWager(PlayerId),
}

/// Операция внешнего леджера (для сообщений об ошибках и логов).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerOp {
    Debit,
    Credit,
}

impl std::fmt::Display for LedgerOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerOp::Debit => write!(f, "debit"),
            LedgerOp::Credit => write!(f, "credit"),
        }
    }
}

/// Почему нельзя удвоиться.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DoubleDownRejection {
    /// Дабл только на первых двух картах.
    NotFirstTwoCards,
    /// Уже удваивался в этом раунде.
    AlreadyDoubled,
}

/// Ошибки стола (сессии).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Место {0} не существует за столом")]
    InvalidSeat(SeatIndex),

    #[error("Игрок {0} уже сидит за столом")]
    AlreadySeated(PlayerId),

    #[error("Стол полон")]
    TableFull,

    #[error("Раунд уже идёт")]
    GameInProgress,

    #[error("Раунд не идёт")]
    NoGameInProgress,

    #[error("Игрок слишком далеко от стола ({distance:.1} > {max:.1})")]
    TooFar { distance: f64, max: f64 },

    #[error("Игрок {0} не в том регионе или его позиция неизвестна")]
    PositionUnknown(PlayerId),

    #[error("Место {0} занято")]
    SeatTaken(SeatIndex),

    #[error("Нет свободных мест")]
    NoFreeSeat,

    #[error("Игрок {0} не сидит за этим столом")]
    PlayerNotAtTable(PlayerId),

    #[error("За столом никого нет")]
    NoPlayers,

    #[error("Без ставки: {0:?}")]
    MissingWagers(Vec<PlayerId>),

    #[error("Сейчас не ход игрока с id={0}")]
    NotPlayersTurn(PlayerId),

    #[error("Дабл невозможен: {0:?}")]
    DoubleDownNotAllowed(DoubleDownRejection),

    #[error(transparent)]
    Wager(#[from] WagerError),

    #[error("Стол закрыт")]
    TableClosed,

    #[error("Внутренняя ошибка: {0}")]
    Internal(&'static str),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidSeat(_) => ErrorKind::Validation,
            EngineError::SeatTaken(_) | EngineError::NoFreeSeat => ErrorKind::ResourceExhaustion,
            EngineError::Wager(w) => match w {
                WagerError::InvalidAmount { .. } => ErrorKind::Validation,
                WagerError::InsufficientFunds { .. } | WagerError::OperationFailed(_) => {
                    ErrorKind::ExternalOperation
                }
                _ => ErrorKind::Precondition,
            },
            EngineError::Internal(_) => ErrorKind::InternalInvariant,
            _ => ErrorKind::Precondition,
        }
    }
}
