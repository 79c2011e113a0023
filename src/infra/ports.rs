//! Внешние интерфейсы, которые потребляет движок.
//!
//! Все вызовы синхронные. Леджер сообщает об отказе через `false`,
//! а не паникой или Result: повторов нет, отказ сразу уходит игроку.

use std::time::Duration;

use crate::domain::chips::Chips;
use crate::domain::hand::Hand;
use crate::domain::player::ParticipantStatistics;
use crate::domain::table::Location;
use crate::domain::{PlayerId, SeatIndex, TableId};
use crate::engine::actions::PlayerActionKind;
use crate::engine::notify::TableMessage;
use crate::infra::persistence::StorageError;
use crate::time_ctrl::CancelToken;

/// Внешний кошелёк игроков (экономика хоста).
pub trait CurrencyLedger: Send + Sync {
    fn has_at_least(&self, player_id: PlayerId, amount: Chips) -> bool;

    /// Списать. false: списание не прошло, баланс не изменился.
    fn debit(&self, player_id: PlayerId, amount: Chips) -> bool;

    /// Зачислить. false: зачисление не прошло.
    fn credit(&self, player_id: PlayerId, amount: Chips) -> bool;

    fn balance(&self, player_id: PlayerId) -> Chips;
}

/// Хранилище статистики игроков.
///
/// Реализация может писать на диск пачками (по `flush`), а не на каждый `save`.
pub trait StatsSink: Send + Sync {
    /// Загрузить статистику. Нет записи: пустая статистика.
    fn load(&self, player_id: PlayerId) -> ParticipantStatistics;

    fn save(&self, player_id: PlayerId, stats: &ParticipantStatistics);

    /// Сбросить накопленное на диск.
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Рендер карт, эффекты, чат. Fire-and-forget: ничего не возвращает и не блокирует движок.
pub trait PresentationPort: Send + Sync {
    fn on_hand_changed(&self, table_id: TableId, player_id: PlayerId, hand: &Hand, value: u8);

    fn on_dealer_hand_changed(&self, table_id: TableId, hand: &Hand, reveal_hole_card: bool);

    /// `player_id == None`: ходов больше нет (расчёт или очистка).
    fn on_turn_changed(
        &self,
        table_id: TableId,
        player_id: Option<PlayerId>,
        actions: &[PlayerActionKind],
    );

    fn on_table_message(&self, table_id: TableId, message: &TableMessage);

    fn on_seat_assigned(&self, table_id: TableId, player_id: PlayerId, seat: SeatIndex);
}

/// Задача для хоста.
pub type HostTask = Box<dyn FnOnce() + Send + 'static>;

/// Мир хоста: позиции игроков, однопоточный кооперативный main loop и отложенные задачи.
pub trait SpatialHost: Send + Sync {
    /// Текущая позиция игрока. None: игрок офлайн.
    fn current_position(&self, player_id: PlayerId) -> Option<Location>;

    /// Выполнить задачу на main loop хоста (там, где можно трогать рендер).
    fn schedule_on_main_loop(&self, task: HostTask);

    /// Выполнить задачу через `delay`, если токен к тому моменту не отменён.
    fn schedule_delayed(&self, task: HostTask, delay: Duration, token: CancelToken);
}

/// Презентация, которая ничего не делает (сервер без рендера, тесты).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresentation;

impl PresentationPort for NullPresentation {
    fn on_hand_changed(&self, _table_id: TableId, _player_id: PlayerId, _hand: &Hand, _value: u8) {}

    fn on_dealer_hand_changed(&self, _table_id: TableId, _hand: &Hand, _reveal_hole_card: bool) {}

    fn on_turn_changed(
        &self,
        _table_id: TableId,
        _player_id: Option<PlayerId>,
        _actions: &[PlayerActionKind],
    ) {
    }

    fn on_table_message(&self, _table_id: TableId, _message: &TableMessage) {}

    fn on_seat_assigned(&self, _table_id: TableId, _player_id: PlayerId, _seat: SeatIndex) {}
}
