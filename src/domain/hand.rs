use core::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::chips::Chips;
use crate::domain::{PlayerId, TableId};

/// Рука: упорядоченный список карт, в течение раунда только растёт.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{card}")?;
        }
        Ok(())
    }
}

/// Исход руки игрока против дилера.
/// Правила определения и коэффициенты выплат: в `eval::outcome`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Outcome {
    PlayerBust,
    PlayerBlackjack,
    DealerBlackjack,
    DealerBust,
    PlayerWin,
    DealerWin,
    Push,
}

/// Результат конкретного игрока в раунде.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerRoundResult {
    pub player_id: PlayerId,
    pub hand: Hand,
    pub outcome: Outcome,
    /// Ставка, которая участвовала в расчёте (с учётом дабла).
    pub stake: Chips,
    /// Сколько зачислено обратно игроку (ставка × коэффициент).
    pub payout: Chips,
    /// Внешний леджер отказал в зачислении: ставка осталась открытой.
    pub payout_failed: bool,
}

/// Краткое описание завершённого раунда. Удобно для истории и презентации.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundSummary {
    pub table_id: TableId,
    pub round: u64,
    pub dealer_hand: Hand,
    pub results: Vec<PlayerRoundResult>,
    /// Раунд был прерван из-за нарушения внутреннего инварианта.
    pub aborted: bool,
}

impl RoundSummary {
    pub fn result_for(&self, player_id: PlayerId) -> Option<&PlayerRoundResult> {
        self.results.iter().find(|r| r.player_id == player_id)
    }
}
