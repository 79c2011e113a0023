use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::{PlayerId, TableId};

/// Индекс «игрок → стол».
///
/// Пишут в него только пути посадки/снятия сессии. `try_claim` атомарен,
/// поэтому игрок никогда не числится за двумя столами сразу.
#[derive(Debug, Default)]
pub struct PlayerIndex {
    seats: RwLock<HashMap<PlayerId, TableId>>,
}

impl PlayerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Закрепить игрока за столом. false: он уже числится за каким-то столом.
    pub(crate) fn try_claim(&self, player_id: PlayerId, table_id: TableId) -> bool {
        let mut seats = self.seats.write();
        if seats.contains_key(&player_id) {
            return false;
        }
        seats.insert(player_id, table_id);
        true
    }

    /// Снять запись, только если игрок числится именно за этим столом.
    pub(crate) fn release(&self, player_id: PlayerId, table_id: TableId) -> bool {
        let mut seats = self.seats.write();
        match seats.get(&player_id) {
            Some(&t) if t == table_id => {
                seats.remove(&player_id);
                true
            }
            _ => false,
        }
    }

    pub fn table_of(&self, player_id: PlayerId) -> Option<TableId> {
        self.seats.read().get(&player_id).copied()
    }

    pub fn len(&self) -> usize {
        self.seats.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.read().is_empty()
    }
}
