use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::{PlayerId, TableId};

/// Индекс места за столом (0..max_seats-1).
pub type SeatIndex = u8;

/// Верхняя граница количества мест за столом.
pub const MAX_SEATS_LIMIT: u8 = 8;

/// Точка в мире хоста: регион + координаты.
/// Якорь стола хранится в таком же виде: `(region, x, y, z)`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub region: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(region: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            region: region.into(),
            x,
            y,
            z,
        }
    }

    /// Евклидово расстояние. None, если точки в разных регионах.
    pub fn distance_to(&self, other: &Location) -> Option<f64> {
        if self.region != other.region {
            return None;
        }
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        Some((dx * dx + dy * dy + dz * dz).sqrt())
    }
}

/// Конфиг стола: места, лимиты ставок, правило дилера, дистанция посадки.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TableConfig {
    /// Максимальное количество мест за столом (1–8).
    pub max_seats: u8,
    pub min_bet: Chips,
    pub max_bet: Chips,
    /// Дилер добирает на мягких 17.
    pub hit_soft_17: bool,
    /// Максимальная дистанция от якоря стола, с которой можно сесть / остаться за столом.
    pub max_join_distance: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_seats: 5,
            min_bet: Chips(10),
            max_bet: Chips(10_000),
            hit_soft_17: false,
            max_join_distance: 10.0,
        }
    }
}

impl TableConfig {
    pub fn accepts_bet(&self, amount: Chips) -> bool {
        amount >= self.min_bet && amount <= self.max_bet
    }
}

/// Фаза стола.
///
/// `Idle → InProgress → Settling → ResetPending → Idle`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TablePhase {
    /// Игра не идёт, можно садиться и ставить.
    Idle,
    /// Раунд идёт: игроки ходят по очереди.
    InProgress,
    /// Все походили, дилер добирает и идёт расчёт.
    Settling,
    /// Расчёт окончен, ждём отложенной очистки рук.
    ResetPending,
}

impl TablePhase {
    pub fn is_mid_game(self) -> bool {
        matches!(self, TablePhase::InProgress | TablePhase::Settling)
    }
}

/// Основное состояние стола: рассадка и фаза.
/// Карты и очередь ходов: в `engine::game_loop::RoundEngine`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub id: TableId,
    pub anchor: Location,
    pub config: TableConfig,

    /// Места за столом: индекс вектора = SeatIndex.
    /// None – место пустое.
    pub seats: Vec<Option<PlayerId>>,

    pub phase: TablePhase,
}

impl Table {
    /// Создать пустой стол с заданной конфигурацией.
    pub fn new(id: TableId, anchor: Location, config: TableConfig) -> Self {
        let seats = vec![None; config.max_seats as usize];
        Self {
            id,
            anchor,
            config,
            seats,
            phase: TablePhase::Idle,
        }
    }

    pub fn max_seats(&self) -> u8 {
        self.config.max_seats
    }

    pub fn seated_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.seated_count() >= self.max_seats() as usize
    }

    pub fn is_seat_empty(&self, index: SeatIndex) -> bool {
        self.seats
            .get(index as usize)
            .map(|s| s.is_none())
            .unwrap_or(true)
    }

    pub fn seat_of(&self, player_id: PlayerId) -> Option<SeatIndex> {
        self.seats
            .iter()
            .position(|s| *s == Some(player_id))
            .map(|idx| idx as SeatIndex)
    }

    pub fn is_seated(&self, player_id: PlayerId) -> bool {
        self.seat_of(player_id).is_some()
    }

    /// Игроки в порядке мест.
    pub fn seated_players(&self) -> Vec<PlayerId> {
        self.seats.iter().flatten().copied().collect()
    }
}
