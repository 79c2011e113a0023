use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::player::LeaveReason;
use crate::domain::table::Location;
use crate::domain::{PlayerId, SeatIndex, TableId};
use crate::engine::actions::PlayerAction;
use crate::engine::TableRegistry;

use super::dto::{CommandResponse, RoundSummaryDto};
use super::errors::ApiError;

/// Команда верхнего уровня: всё, что меняет состояние.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Command {
    /// Создать стол с якорем в точке.
    CreateTable(CreateTableCommand),

    /// Удалить стол (всех игроков снимаем).
    RemoveTable { table_id: TableId },

    /// Операция игрока.
    PlayerCommand(PlayerCommand),

    /// Запустить раунд вручную (не дожидаясь авто-старта).
    StartGame { table_id: TableId },
}

/// Команда создания стола.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CreateTableCommand {
    pub anchor: Location,
}

/// Команды конкретного игрока.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum PlayerCommand {
    /// Сесть. `table_id == None`: за ближайший стол.
    Join(JoinCommand),

    /// Встать из-за стола.
    Leave { player_id: PlayerId },

    /// Поставить / изменить ставку.
    PlaceWager { player_id: PlayerId, amount: Chips },

    /// Повторить последнюю ставку.
    RepeatWager { player_id: PlayerId },

    /// Hit / Stand / DoubleDown.
    Action(PlayerAction),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JoinCommand {
    pub player_id: PlayerId,
    pub table_id: Option<TableId>,
    pub seat_index: Option<SeatIndex>,
}

/// Выполнить команду над реестром.
pub fn execute(registry: &TableRegistry, command: Command) -> Result<CommandResponse, ApiError> {
    match command {
        Command::CreateTable(cmd) => {
            let table_id = registry.create(cmd.anchor)?;
            Ok(CommandResponse::TableCreated { table_id })
        }
        Command::RemoveTable { table_id } => {
            let reports = registry.remove(table_id)?;
            Ok(CommandResponse::TableRemoved {
                table_id,
                unseated: reports.iter().map(|r| r.departure.player_id).collect(),
            })
        }
        Command::StartGame { table_id } => {
            let round = registry.start_game(table_id)?;
            Ok(CommandResponse::RoundStarted { table_id, round })
        }
        Command::PlayerCommand(cmd) => execute_player_command(registry, cmd),
    }
}

fn execute_player_command(
    registry: &TableRegistry,
    command: PlayerCommand,
) -> Result<CommandResponse, ApiError> {
    match command {
        PlayerCommand::Join(JoinCommand {
            player_id,
            table_id,
            seat_index,
        }) => {
            let (table_id, seat_index) = match table_id {
                Some(table_id) => (table_id, registry.join(player_id, table_id, seat_index)?),
                None => registry.join_nearest(player_id, seat_index)?,
            };
            Ok(CommandResponse::Seated {
                table_id,
                seat_index,
            })
        }
        PlayerCommand::Leave { player_id } => {
            let report = registry.leave(player_id, LeaveReason::Voluntary)?;
            Ok(CommandResponse::Left {
                table_id: report.table_id,
                wager: report.wager,
                round: report.departure.summary.as_ref().map(RoundSummaryDto::from),
            })
        }
        PlayerCommand::PlaceWager { player_id, amount } => {
            let change = registry.place_wager(player_id, amount)?;
            Ok(CommandResponse::WagerSet {
                previous: change.previous,
                current: change.current,
            })
        }
        PlayerCommand::RepeatWager { player_id } => {
            let change = registry.repeat_wager(player_id)?;
            Ok(CommandResponse::WagerSet {
                previous: change.previous,
                current: change.current,
            })
        }
        PlayerCommand::Action(action) => {
            let report = registry.act(action.player_id, action.kind)?;
            Ok(CommandResponse::Acted {
                hand_value: report.outcome.hand_value,
                turn_finished: report.outcome.player_finished,
                round: report.summary.as_ref().map(RoundSummaryDto::from),
            })
        }
    }
}
