use crate::domain::card::Card;
use crate::domain::hand::Hand;

/// Блэкджек.
pub const BLACKJACK: u8 = 21;

/// Порог, до которого дилер обязан добирать.
pub const DEALER_STAND_THRESHOLD: u8 = 17;

/// Стоимость руки вместе с количеством тузов, которые всё ещё считаются за 11.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandValue {
    pub total: u8,
    pub soft_aces: u8,
}

impl HandValue {
    /// Посчитать стоимость набора карт.
    ///
    /// Все тузы сначала идут за 11; пока сумма > 21 и есть туз за 11,
    /// понижаем один туз до 1 (−10).
    pub fn of(cards: &[Card]) -> Self {
        // u32, чтобы длинная рука не переполнила u8 до понижения тузов.
        let mut total: u32 = 0;
        let mut soft_aces: u8 = 0;

        for card in cards {
            total += card.value() as u32;
            if card.rank.is_ace() {
                soft_aces += 1;
            }
        }

        while total > BLACKJACK as u32 && soft_aces > 0 {
            total -= 10;
            soft_aces -= 1;
        }

        Self {
            total: u8::try_from(total).unwrap_or(u8::MAX),
            soft_aces,
        }
    }

    pub fn is_soft(&self) -> bool {
        self.soft_aces > 0
    }
}

/// Итоговая стоимость руки.
pub fn compute_value(hand: &Hand) -> u8 {
    HandValue::of(hand.cards()).total
}

/// Блэкджек: ровно две карты и 21.
pub fn is_blackjack(hand: &Hand) -> bool {
    hand.len() == 2 && compute_value(hand) == BLACKJACK
}

/// Перебор: больше 21.
pub fn is_busted(hand: &Hand) -> bool {
    compute_value(hand) > BLACKJACK
}

/// Мягкая рука: хотя бы один туз сейчас считается за 11.
/// Общее правило для любого числа карт и тузов.
pub fn is_soft(hand: &Hand) -> bool {
    HandValue::of(hand.cards()).is_soft()
}

/// Должен ли дилер брать ещё карту.
///
/// Берёт, пока < 17. На 17 берёт только при `hit_soft_17` и мягкой руке.
pub fn dealer_should_hit(hand: &Hand, hit_soft_17: bool) -> bool {
    let value = HandValue::of(hand.cards());
    if value.total < DEALER_STAND_THRESHOLD {
        return true;
    }
    value.total == DEALER_STAND_THRESHOLD && hit_soft_17 && value.is_soft()
}
