use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;

/// Почему игрок покидает стол.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LeaveReason {
    /// Сам ушёл (команда leave).
    Voluntary,
    /// Отключился от хоста.
    Disconnected,
    /// Отошёл от стола дальше допустимой дистанции.
    MovedAway,
    /// Стол удалён администратором.
    TableRemoved,
}

/// Накопленная статистика игрока. Хранится во внешнем `StatsSink`
/// по стабильному id игрока.
///
/// Серия (`current_streak`): > 0: серия побед, < 0: серия поражений.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStatistics {
    pub hands_won: u32,
    pub hands_lost: u32,
    pub hands_pushed: u32,
    pub blackjacks: u32,
    pub busts: u32,
    pub current_streak: i32,
    pub best_streak: i32,
    pub total_winnings: Chips,
    #[serde(default)]
    pub total_losses: Chips,
}

impl ParticipantStatistics {
    pub fn hands_played(&self) -> u32 {
        self.hands_won + self.hands_lost + self.hands_pushed
    }

    /// Победа: серия поражений обнуляется, затем +1.
    pub fn record_win(&mut self, net_winnings: Chips) {
        self.hands_won += 1;
        self.current_streak = self.current_streak.max(0) + 1;
        self.best_streak = self.best_streak.max(self.current_streak);
        self.total_winnings += net_winnings;
    }

    /// Поражение: серия побед обнуляется, затем −1.
    pub fn record_loss(&mut self, lost_stake: Chips) {
        self.hands_lost += 1;
        self.current_streak = self.current_streak.min(0) - 1;
        self.total_losses += lost_stake;
    }

    /// Пуш серию не трогает.
    pub fn record_push(&mut self) {
        self.hands_pushed += 1;
    }
}
