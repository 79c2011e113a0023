//! Движок блэкджека: рассадка, ставки, очередь ходов, раздача, расчёт.
//!
//! Высокоуровневые объекты: `TableSession` (один стол) и `TableRegistry` (все столы).
//! Основные операции:
//!   - `add_participant` / `remove_participant` – посадка и уход
//!   - `place_wager` – ставка через `WagerLedger`
//!   - `start_game` – раздача
//!   - `hit` / `stand` / `double_down` – ходы; после последнего хода идёт расчёт

pub mod actions;
pub mod errors;
pub mod game_loop;
pub mod hand_history;
pub mod notify;
pub mod player_index;
pub mod positions;
pub mod session;
pub mod settlement;
pub mod shoe;
pub mod table_registry;
pub mod validation;
pub mod wager_ledger;

pub use actions::{PlayerAction, PlayerActionKind};
pub use errors::{DoubleDownRejection, EngineError, ErrorKind, LedgerOp, WagerError};
pub use game_loop::{ActionOutcome, RoundEngine, TurnStatus};
pub use hand_history::{RoundEvent, RoundEventKind, RoundHistory};
pub use notify::{PresentationEvent, TableMessage};
pub use player_index::PlayerIndex;
pub use session::{
    ActionReport, Departure, LeaveReport, SessionContext, TableSession, TableSnapshot,
    WagerDisposition,
};
pub use shoe::Shoe;
pub use table_registry::{Collaborators, RegistryError, RngFactory, TableRegistry};
pub use wager_ledger::{RefundReport, SettledWager, Wager, WagerChange, WagerLedger};

use crate::domain::card::Card;

/// RNG интерфейс для engine.
/// Реализации: в infra (обёртки над `rand` и подтасовка для тестов).
pub trait RandomSource {
    fn shuffle(&mut self, cards: &mut [Card]);
}
