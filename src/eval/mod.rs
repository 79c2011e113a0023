//! Оценка рук блэкджека: стоимость руки, блэкджек/перебор/мягкая рука,
//! правило добора дилера и исход против дилера.
//!
//! Основные функции:
//!   `compute_value(hand) -> u8`
//!   `determine_outcome(player, dealer) -> Outcome`

pub mod evaluator;
pub mod outcome;

pub use evaluator::{compute_value, dealer_should_hit, is_blackjack, is_busted, is_soft, HandValue};
pub use outcome::determine_outcome;
