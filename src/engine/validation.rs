use crate::domain::{PlayerId, Table, TablePhase};
use crate::engine::actions::PlayerActionKind;
use crate::engine::errors::{DoubleDownRejection, EngineError};
use crate::engine::game_loop::RoundEngine;

/// Проверка, что сейчас ход именно этого игрока.
pub fn validate_turn(table: &Table, round: &RoundEngine, player_id: PlayerId) -> Result<(), EngineError> {
    if table.phase != TablePhase::InProgress {
        return Err(EngineError::NoGameInProgress);
    }
    if !table.is_seated(player_id) {
        return Err(EngineError::PlayerNotAtTable(player_id));
    }
    if round.current_turn != Some(player_id) {
        return Err(EngineError::NotPlayersTurn(player_id));
    }
    Ok(())
}

/// Дабл: ход игрока, ровно две карты, ещё не удваивался.
/// Хватает ли денег: проверяет уже леджер ставок.
pub fn validate_double_down(
    table: &Table,
    round: &RoundEngine,
    player_id: PlayerId,
) -> Result<(), EngineError> {
    validate_turn(table, round, player_id)?;

    if round.doubled.contains(&player_id) {
        return Err(EngineError::DoubleDownNotAllowed(
            DoubleDownRejection::AlreadyDoubled,
        ));
    }
    let cards = round.hand(player_id).map(|h| h.len()).unwrap_or(0);
    if cards != 2 {
        return Err(EngineError::DoubleDownNotAllowed(
            DoubleDownRejection::NotFirstTwoCards,
        ));
    }
    Ok(())
}

/// Какие кнопки показать игроку, чей сейчас ход.
pub fn available_actions(round: &RoundEngine, player_id: PlayerId) -> Vec<PlayerActionKind> {
    let mut actions = vec![PlayerActionKind::Hit, PlayerActionKind::Stand];
    let two_cards = round.hand(player_id).map(|h| h.len() == 2).unwrap_or(false);
    if two_cards && !round.doubled.contains(&player_id) {
        actions.push(PlayerActionKind::DoubleDown);
    }
    actions
}
