//! Уведомления для презентации (рендер карт, чат, кнопки).
//!
//! Сессия копит события внутри критической секции и отдаёт их хосту
//! на main loop уже после снятия блокировки.

use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::hand::{Hand, Outcome};
use crate::domain::player::LeaveReason;
use crate::domain::{PlayerId, SeatIndex, TableId};
use crate::engine::actions::PlayerActionKind;
use crate::infra::ports::PresentationPort;

/// Сообщение стола, которое видят все рядом стоящие игроки.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum TableMessage {
    PlayerJoined { player_id: PlayerId, seat: SeatIndex },
    PlayerLeft { player_id: PlayerId, reason: LeaveReason },
    WagerPlaced { player_id: PlayerId, amount: Chips },
    RoundStarted { round: u64 },
    /// Авто-старт не состоялся: у этих игроков нет ставки.
    WaitingForWagers { missing: Vec<PlayerId> },
    PlayerBusted { player_id: PlayerId },
    PlayerDoubled { player_id: PlayerId, wager: Chips },
    Settled { player_id: PlayerId, outcome: Outcome, payout: Chips },
    PayoutFailed { player_id: PlayerId },
    RoundAborted,
    TableReset,
}

/// Одно уведомление презентации.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum PresentationEvent {
    HandChanged {
        table_id: TableId,
        player_id: PlayerId,
        hand: Hand,
        value: u8,
    },
    DealerHandChanged {
        table_id: TableId,
        hand: Hand,
        reveal_hole_card: bool,
    },
    TurnChanged {
        table_id: TableId,
        player_id: Option<PlayerId>,
        actions: Vec<PlayerActionKind>,
    },
    TableMessage {
        table_id: TableId,
        message: TableMessage,
    },
    SeatAssigned {
        table_id: TableId,
        player_id: PlayerId,
        seat: SeatIndex,
    },
}

/// Отдать событие в порт презентации.
pub fn dispatch(port: &dyn PresentationPort, event: &PresentationEvent) {
    match event {
        PresentationEvent::HandChanged {
            table_id,
            player_id,
            hand,
            value,
        } => port.on_hand_changed(*table_id, *player_id, hand, *value),
        PresentationEvent::DealerHandChanged {
            table_id,
            hand,
            reveal_hole_card,
        } => port.on_dealer_hand_changed(*table_id, hand, *reveal_hole_card),
        PresentationEvent::TurnChanged {
            table_id,
            player_id,
            actions,
        } => port.on_turn_changed(*table_id, *player_id, actions),
        PresentationEvent::TableMessage { table_id, message } => {
            port.on_table_message(*table_id, message)
        }
        PresentationEvent::SeatAssigned {
            table_id,
            player_id,
            seat,
        } => port.on_seat_assigned(*table_id, *player_id, *seat),
    }
}
