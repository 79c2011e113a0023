use std::collections::HashSet;

use crate::domain::{PlayerId, SeatIndex, Table};

/// Самое младшее свободное место.
pub fn lowest_free_seat(table: &Table) -> Option<SeatIndex> {
    table
        .seats
        .iter()
        .position(|s| s.is_none())
        .map(|idx| idx as SeatIndex)
}

/// Результат поиска следующего хода.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnScan {
    /// Ход переходит к этому игроку.
    Next(PlayerId),
    /// Все в очереди уже закончили.
    AllFinished,
}

/// Найти следующего незакончившего игрока после `start_idx` по кругу.
///
/// Делаем не больше `turn_order.len()` проб. Сам `start_idx` проверяется последним,
/// так что игрок, который ещё не закончил, может остаться при ходе.
pub fn next_unfinished(
    turn_order: &[PlayerId],
    start_idx: usize,
    finished: &HashSet<PlayerId>,
) -> TurnScan {
    let len = turn_order.len();
    if len == 0 {
        return TurnScan::AllFinished;
    }

    for probe in 1..=len {
        let idx = (start_idx + probe) % len;
        let player_id = turn_order[idx];
        if !finished.contains(&player_id) {
            return TurnScan::Next(player_id);
        }
    }

    TurnScan::AllFinished
}
