use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::chips::Chips;
use crate::domain::hand::{Hand, Outcome, RoundSummary};
use crate::domain::table::{Location, TablePhase};
use crate::domain::{PlayerId, TableId};
use crate::engine::WagerDisposition;

/// DTO места за столом.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SeatDto {
    pub seat_index: u8,
    pub player_id: PlayerId,
    pub wager: Chips,
    pub cards: Vec<Card>,
    pub hand_value: u8,
    /// Ход в этом раунде закончен.
    pub finished: bool,
    pub doubled: bool,
}

/// DTO стола.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TableViewDto {
    pub table_id: TableId,
    pub anchor: Location,
    pub phase: TablePhase,
    pub round: u64,
    pub max_seats: u8,
    pub min_bet: Chips,
    pub max_bet: Chips,
    pub seats: Vec<SeatDto>,
    /// Открытые карты дилера. Пока раунд идёт, закрытая карта сюда не попадает.
    pub dealer_cards: Vec<Card>,
    pub dealer_hole_hidden: bool,
    /// Сумма только по открытым картам.
    pub dealer_value: u8,
    pub current_turn: Option<PlayerId>,
    pub shoe_remaining: usize,
}

/// Краткое представление стола для лобби.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TableListItemDto {
    pub table_id: TableId,
    pub anchor: Location,
    pub phase: TablePhase,
    pub seated: usize,
    pub max_seats: u8,
}

/// Результат одного игрока в раунде.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundResultDto {
    pub player_id: PlayerId,
    pub outcome: Outcome,
    pub stake: Chips,
    pub payout: Chips,
    pub payout_failed: bool,
}

/// Итог раунда (для истории и клиента).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundSummaryDto {
    pub table_id: TableId,
    pub round: u64,
    pub dealer_cards: Vec<Card>,
    pub dealer_value: u8,
    pub results: Vec<RoundResultDto>,
    pub aborted: bool,
}

impl From<&RoundSummary> for RoundSummaryDto {
    fn from(summary: &RoundSummary) -> Self {
        Self {
            table_id: summary.table_id,
            round: summary.round,
            dealer_cards: summary.dealer_hand.cards().to_vec(),
            dealer_value: crate::eval::compute_value(&summary.dealer_hand),
            results: summary
                .results
                .iter()
                .map(|r| RoundResultDto {
                    player_id: r.player_id,
                    outcome: r.outcome,
                    stake: r.stake,
                    payout: r.payout,
                    payout_failed: r.payout_failed,
                })
                .collect(),
            aborted: summary.aborted,
        }
    }
}

/// Ответ API на команду.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum CommandResponse {
    TableCreated {
        table_id: TableId,
    },
    TableRemoved {
        table_id: TableId,
        unseated: Vec<PlayerId>,
    },
    Seated {
        table_id: TableId,
        seat_index: u8,
    },
    Left {
        table_id: TableId,
        wager: WagerDisposition,
        round: Option<RoundSummaryDto>,
    },
    WagerSet {
        previous: Chips,
        current: Chips,
    },
    RoundStarted {
        table_id: TableId,
        round: u64,
    },
    Acted {
        hand_value: u8,
        turn_finished: bool,
        /// Заполнено, если действие закрыло раунд.
        round: Option<RoundSummaryDto>,
    },
}

/// Видимая часть руки дилера: пока раунд идёт, вторая (закрытая) карта скрыта.
pub fn visible_dealer_cards(hand: &Hand, phase: TablePhase) -> (Vec<Card>, bool) {
    if phase == TablePhase::InProgress && hand.len() >= 2 {
        (hand.cards()[..1].to_vec(), true)
    } else {
        (hand.cards().to_vec(), false)
    }
}
