// src/time_ctrl/timers.rs
//! Отменяемые таймеры с ключом: авто-старт после первой ставки и очистка стола после расчёта.
//!
//! Сам таймер крутит хост (`SpatialHost::schedule_delayed`), здесь только
//! токены отмены и учёт «какой таймер сейчас взведён».

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::TableId;

/// Какой именно отложенный эффект.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Проверка «все поставили: стартуем раунд».
    AutoStart,
    /// Очистка рук после расчёта.
    Reset,
}

/// Идентификатор таймера: стол + вид.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub table_id: TableId,
    pub kind: TimerKind,
}

/// Токен отмены. Клонируется в задачу; задача проверяет его перед запуском.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Взведённый таймер: токен + «поколение», чтобы сработавшая задача
/// могла проверить, что её не перевзвели заново.
#[derive(Clone, Debug)]
struct ArmedTimer {
    token: CancelToken,
    generation: u64,
}

/// Набор таймеров одного стола.
#[derive(Debug, Default)]
pub struct TimerSet {
    armed: HashMap<TimerKey, ArmedTimer>,
    next_generation: u64,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Взвести таймер. Предыдущий таймер с тем же ключом отменяется.
    /// Возвращает токен для хоста и поколение для проверки при срабатывании.
    pub fn arm(&mut self, key: TimerKey) -> (CancelToken, u64) {
        if let Some(prev) = self.armed.remove(&key) {
            prev.token.cancel();
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        let token = CancelToken::new();
        self.armed.insert(
            key,
            ArmedTimer {
                token: token.clone(),
                generation,
            },
        );
        (token, generation)
    }

    /// Задача сработала: снимаем таймер, если это всё ещё то же поколение.
    /// false: таймер отменён или перевзведён, задача устарела.
    pub fn fire(&mut self, key: TimerKey, generation: u64) -> bool {
        match self.armed.get(&key) {
            Some(t) if t.generation == generation && !t.token.is_cancelled() => {
                self.armed.remove(&key);
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self, key: TimerKey) {
        if let Some(t) = self.armed.remove(&key) {
            t.token.cancel();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, t) in self.armed.drain() {
            t.token.cancel();
        }
    }

    pub fn is_armed(&self, key: TimerKey) -> bool {
        self.armed.contains_key(&key)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }
}
