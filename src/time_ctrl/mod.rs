// src/time_ctrl/mod.rs
//! Вспомогательный модуль времени.
//!
//! Здесь собираем:
//! - часы (`Clock`) для кулдауна ставок;
//! - отменяемые таймеры стола (`TimerSet`, `CancelToken`, `TimerKey`);
//! - тайминги движка (`TimingConfig`).
//!
//! Таймера на ход нет: ход открыт, пока игрок не походит или не отключится.

pub mod clock;
pub mod timers;

pub use clock::{Clock, ManualClock, SystemClock};
pub use timers::{CancelToken, TimerKey, TimerKind, TimerSet};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Задержки и окна, которые видит игрок.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Минимальный интервал между изменениями ставки одного игрока.
    pub bet_cooldown_ms: u64,
    /// Задержка авто-старта после первой ставки.
    pub auto_start_delay_ms: u64,
    /// Сколько держать финальную руку дилера на столе перед очисткой.
    pub reset_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            bet_cooldown_ms: 1_000,
            auto_start_delay_ms: 5_000,
            reset_delay_ms: 3_000,
        }
    }
}

impl TimingConfig {
    pub fn bet_cooldown(&self) -> Duration {
        Duration::from_millis(self.bet_cooldown_ms)
    }

    pub fn auto_start_delay(&self) -> Duration {
        Duration::from_millis(self.auto_start_delay_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}
