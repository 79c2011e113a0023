// src/time_ctrl/clock.rs
//! Источник времени для кулдауна ставок.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Монотонные часы. Движок не зовёт `Instant::now()` напрямую,
/// чтобы в тестах время можно было двигать руками.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Обычные системные часы.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Часы, которые идут только по команде `advance`.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Сдвинуть время вперёд.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}
