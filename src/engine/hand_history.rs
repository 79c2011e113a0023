use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::chips::Chips;
use crate::domain::hand::Outcome;
use crate::domain::{PlayerId, TableId};
use crate::engine::actions::PlayerActionKind;

/// Тип события в раунде.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum RoundEventKind {
    /// Новый раунд начался.
    RoundStarted {
        table_id: TableId,
        round: u64,
    },

    /// Игрок получил карту (раздача или добор).
    CardDealt {
        player_id: PlayerId,
        card: Card,
    },

    /// Дилер получил карту. `hole`: закрытая вторая карта.
    DealerCardDealt {
        card: Card,
        hole: bool,
    },

    /// Действие игрока.
    PlayerActed {
        player_id: PlayerId,
        action: PlayerActionKind,
        hand_value: u8,
    },

    /// Ход перешёл к игроку.
    TurnChanged {
        player_id: PlayerId,
    },

    /// Игрок ушёл посреди раунда.
    PlayerRemoved {
        player_id: PlayerId,
    },

    /// Расчёт по игроку.
    PlayerSettled {
        player_id: PlayerId,
        outcome: Outcome,
        payout: Chips,
    },

    /// Раунд прерван из-за нарушения инварианта.
    RoundAborted {
        reason: String,
    },

    /// Раунд завершён.
    RoundFinished {
        table_id: TableId,
        round: u64,
    },
}

/// Событие в раунде с порядковым номером.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoundEvent {
    pub index: u32,
    pub kind: RoundEventKind,
}

/// Полная история раунда.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RoundHistory {
    pub events: Vec<RoundEvent>,
}

impl RoundHistory {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, kind: RoundEventKind) {
        let idx = self.events.len() as u32;
        self.events.push(RoundEvent { index: idx, kind });
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Сколько карт ушло игрокам и дилеру за раунд.
    pub fn cards_dealt(&self) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    RoundEventKind::CardDealt { .. } | RoundEventKind::DealerCardDealt { .. }
                )
            })
            .count()
    }
}
