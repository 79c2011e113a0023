use serde::{Deserialize, Serialize};

use crate::domain::player::ParticipantStatistics;
use crate::domain::table::Location;
use crate::domain::{PlayerId, TableId};
use crate::engine::{TableRegistry, TableSnapshot};
use crate::eval::{compute_value, HandValue};

use super::dto::{visible_dealer_cards, SeatDto, TableListItemDto, TableViewDto};
use super::errors::ApiError;

/// Запросы "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Query {
    /// Получить состояние стола.
    GetTable { table_id: TableId },

    /// Список столов (для лобби).
    ListTables,

    /// Ближайший стол к точке в пределах дистанции посадки.
    FindNearest { position: Location },

    /// За каким столом сидит игрок.
    PlayerTable { player_id: PlayerId },

    /// Статистика игрока.
    PlayerStats { player_id: PlayerId },
}

/// Результат запроса "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum QueryResponse {
    Table(TableViewDto),
    Tables(Vec<TableListItemDto>),
    Nearest(Option<TableId>),
    PlayerTable(Option<TableId>),
    Stats(ParticipantStatistics),
}

/// Выполнить запрос к реестру.
pub fn query(registry: &TableRegistry, query: Query) -> Result<QueryResponse, ApiError> {
    match query {
        Query::GetTable { table_id } => {
            let session = registry
                .session(table_id)
                .ok_or(ApiError::TableNotFound(table_id))?;
            Ok(QueryResponse::Table(build_table_view(&session.snapshot())))
        }
        Query::ListTables => {
            let items = registry
                .table_ids()
                .into_iter()
                .filter_map(|id| registry.session(id))
                .map(|s| {
                    let snapshot = s.snapshot();
                    TableListItemDto {
                        table_id: snapshot.table.id,
                        anchor: snapshot.table.anchor.clone(),
                        phase: snapshot.table.phase,
                        seated: snapshot.table.seated_count(),
                        max_seats: snapshot.table.max_seats(),
                    }
                })
                .collect();
            Ok(QueryResponse::Tables(items))
        }
        Query::FindNearest { position } => {
            Ok(QueryResponse::Nearest(registry.find_nearest(&position, None)))
        }
        Query::PlayerTable { player_id } => Ok(QueryResponse::PlayerTable(registry.table_of(player_id))),
        Query::PlayerStats { player_id } => Ok(QueryResponse::Stats(registry.stats().load(player_id))),
    }
}

/// Сформировать DTO стола из снимка сессии.
pub fn build_table_view(snapshot: &TableSnapshot) -> TableViewDto {
    let table = &snapshot.table;

    let seats = table
        .seats
        .iter()
        .enumerate()
        .filter_map(|(idx, seat)| seat.map(|p| (idx as u8, p)))
        .map(|(seat_index, player_id)| {
            let hand = snapshot.hands.get(&player_id).cloned().unwrap_or_default();
            SeatDto {
                seat_index,
                player_id,
                wager: snapshot.wagers.get(&player_id).copied().unwrap_or_default(),
                hand_value: compute_value(&hand),
                cards: hand.cards().to_vec(),
                finished: snapshot.finished.contains(&player_id),
                doubled: snapshot.doubled.contains(&player_id),
            }
        })
        .collect();

    let (dealer_cards, dealer_hole_hidden) = visible_dealer_cards(&snapshot.dealer_hand, table.phase);
    let dealer_value = HandValue::of(&dealer_cards).total;

    TableViewDto {
        table_id: table.id,
        anchor: table.anchor.clone(),
        phase: table.phase,
        round: snapshot.round,
        max_seats: table.config.max_seats,
        min_bet: table.config.min_bet,
        max_bet: table.config.max_bet,
        seats,
        dealer_cards,
        dealer_hole_hidden,
        dealer_value,
        current_turn: snapshot.current_turn,
        shoe_remaining: snapshot.shoe_remaining,
    }
}
