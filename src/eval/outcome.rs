use crate::domain::chips::Chips;
use crate::domain::hand::{Hand, Outcome};

use super::evaluator::{compute_value, is_blackjack, is_busted};

impl Outcome {
    /// Коэффициент выплаты к исходной ставке в виде дроби `(num, den)`.
    fn payout_ratio(self) -> (u64, u64) {
        match self {
            Outcome::PlayerWin | Outcome::DealerBust => (2, 1),
            Outcome::PlayerBlackjack => (5, 2),
            Outcome::Push => (1, 1),
            Outcome::PlayerBust | Outcome::DealerBlackjack | Outcome::DealerWin => (0, 1),
        }
    }

    /// Коэффициент выплаты: 2.0 / 2.5 / 1.0 / 0.0.
    pub fn multiplier(self) -> f64 {
        let (num, den) = self.payout_ratio();
        num as f64 / den as f64
    }

    /// Сколько зачислить игроку по итогам: ставка × коэффициент (вниз до целого).
    pub fn payout(self, stake: Chips) -> Chips {
        let (num, den) = self.payout_ratio();
        stake.mul_ratio(num, den)
    }

    pub fn is_player_win(self) -> bool {
        matches!(
            self,
            Outcome::PlayerWin | Outcome::PlayerBlackjack | Outcome::DealerBust
        )
    }

    pub fn is_player_loss(self) -> bool {
        matches!(
            self,
            Outcome::PlayerBust | Outcome::DealerBlackjack | Outcome::DealerWin
        )
    }
}

/// Исход руки игрока против руки дилера.
///
/// Порядок проверок важен:
/// 1. перебор игрока (даже если дилер тоже перебрал);
/// 2. блэкджек у обоих: пуш;
/// 3. блэкджек только у игрока;
/// 4. блэкджек только у дилера;
/// 5. перебор дилера;
/// 6. сравнение сумм.
pub fn determine_outcome(player: &Hand, dealer: &Hand) -> Outcome {
    if is_busted(player) {
        return Outcome::PlayerBust;
    }

    match (is_blackjack(player), is_blackjack(dealer)) {
        (true, true) => return Outcome::Push,
        (true, false) => return Outcome::PlayerBlackjack,
        (false, true) => return Outcome::DealerBlackjack,
        (false, false) => {}
    }

    if is_busted(dealer) {
        return Outcome::DealerBust;
    }

    let p = compute_value(player);
    let d = compute_value(dealer);
    match p.cmp(&d) {
        std::cmp::Ordering::Greater => Outcome::PlayerWin,
        std::cmp::Ordering::Less => Outcome::DealerWin,
        std::cmp::Ordering::Equal => Outcome::Push,
    }
}
