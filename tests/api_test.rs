// tests/api_test.rs
//
// Внешний API поверх реестра:
//
//  1) Полный цикл командами: стол, посадка, ставка, старт, ход, уход, удаление.
//  2) GetTable прячет закрытую карту дилера, пока раунд идёт.
//  3) Лобби, поиск ближайшего стола, статистика игрока.
//  4) Отображение ошибок движка и реестра в ошибки API.
//  5) ApiError и команды сериализуются в JSON и обратно.

use std::sync::Arc;

use blackjack_engine::api::{
    build_table_view, execute, query, ApiError, Command, CommandResponse, CreateTableCommand,
    JoinCommand, PlayerCommand, Query, QueryResponse,
};
use blackjack_engine::config::EngineConfig;
use blackjack_engine::domain::{Card, Chips, Location, Outcome, TableId, TablePhase};
use blackjack_engine::engine::{
    Collaborators, EngineError, PlayerAction, PlayerActionKind, RandomSource, TableRegistry,
    WagerDisposition,
};
use blackjack_engine::infra::{InMemoryLedger, ManualHost, PresetRng};

fn cards(list: &str) -> Vec<Card> {
    list.split_whitespace()
        .map(|c| c.parse::<Card>().expect("valid card"))
        .collect()
}

fn spot() -> Location {
    Location::new("world", 0.0, 64.0, 0.0)
}

struct Fixture {
    registry: TableRegistry,
    currency: Arc<InMemoryLedger>,
    host: Arc<ManualHost>,
}

fn fixture(deck: &str) -> Fixture {
    let currency = Arc::new(InMemoryLedger::new());
    let host = Arc::new(ManualHost::new());
    let top = cards(deck);
    let collab = Collaborators::new(currency.clone(), host.clone()).with_rng(Arc::new(
        move |_: TableId| Box::new(PresetRng::new(top.clone())) as Box<dyn RandomSource + Send>,
    ));
    Fixture {
        registry: TableRegistry::new(&EngineConfig::default(), collab),
        currency,
        host,
    }
}

impl Fixture {
    fn run(&self, command: Command) -> Result<CommandResponse, ApiError> {
        execute(&self.registry, command)
    }

    fn create_table(&self) -> TableId {
        match self
            .run(Command::CreateTable(CreateTableCommand { anchor: spot() }))
            .unwrap()
        {
            CommandResponse::TableCreated { table_id } => table_id,
            other => panic!("unexpected response {other:?}"),
        }
    }

    fn table_view(&self, table_id: TableId) -> blackjack_engine::api::TableViewDto {
        match query(&self.registry, Query::GetTable { table_id }).unwrap() {
            QueryResponse::Table(view) => view,
            other => panic!("unexpected response {other:?}"),
        }
    }
}

fn join(player_id: u64, table_id: Option<TableId>) -> Command {
    Command::PlayerCommand(PlayerCommand::Join(JoinCommand {
        player_id,
        table_id,
        seat_index: None,
    }))
}

fn act(player_id: u64, kind: PlayerActionKind) -> Command {
    Command::PlayerCommand(PlayerCommand::Action(PlayerAction::new(player_id, kind)))
}

#[test]
fn full_flow_through_commands() {
    let f = fixture("Th 9h Td 7d");
    let table_id = f.create_table();
    f.currency.deposit(1, Chips(1_000));
    f.host.set_position(1, spot());

    assert_eq!(
        f.run(join(1, None)).unwrap(),
        CommandResponse::Seated {
            table_id,
            seat_index: 0
        }
    );

    assert_eq!(
        f.run(Command::PlayerCommand(PlayerCommand::PlaceWager {
            player_id: 1,
            amount: Chips(100),
        }))
        .unwrap(),
        CommandResponse::WagerSet {
            previous: Chips::ZERO,
            current: Chips(100),
        }
    );

    assert_eq!(
        f.run(Command::StartGame { table_id }).unwrap(),
        CommandResponse::RoundStarted { table_id, round: 1 }
    );

    let round = match f.run(act(1, PlayerActionKind::Stand)).unwrap() {
        CommandResponse::Acted {
            hand_value,
            turn_finished,
            round: Some(round),
        } => {
            assert_eq!(hand_value, 19);
            assert!(turn_finished);
            round
        }
        other => panic!("expected settled round, got {other:?}"),
    };
    assert_eq!(round.dealer_value, 17);
    assert_eq!(round.results[0].outcome, Outcome::PlayerWin);
    assert_eq!(round.results[0].payout, Chips(200));
    assert_eq!(f.currency.net_debit(1), -100);

    match query(&f.registry, Query::PlayerStats { player_id: 1 }).unwrap() {
        QueryResponse::Stats(stats) => {
            assert_eq!(stats.hands_won, 1);
            assert_eq!(stats.total_winnings, Chips(100));
        }
        other => panic!("unexpected response {other:?}"),
    }

    let response = f
        .run(Command::PlayerCommand(PlayerCommand::Leave { player_id: 1 }))
        .unwrap();
    assert_eq!(
        response,
        CommandResponse::Left {
            table_id,
            wager: WagerDisposition::NoWager,
            round: None,
        }
    );

    assert_eq!(
        f.run(Command::RemoveTable { table_id }).unwrap(),
        CommandResponse::TableRemoved {
            table_id,
            unseated: vec![],
        }
    );
    assert_eq!(
        query(&f.registry, Query::ListTables).unwrap(),
        QueryResponse::Tables(vec![])
    );
}

#[test]
fn table_view_hides_hole_card_while_in_progress() {
    let f = fixture("Th 9h Td 7d");
    let table_id = f.create_table();
    f.currency.deposit(1, Chips(1_000));
    f.host.set_position(1, spot());
    f.run(join(1, Some(table_id))).unwrap();
    f.run(Command::PlayerCommand(PlayerCommand::PlaceWager {
        player_id: 1,
        amount: Chips(100),
    }))
    .unwrap();
    f.run(Command::StartGame { table_id }).unwrap();

    let view = f.table_view(table_id);
    assert_eq!(view.phase, TablePhase::InProgress);
    assert_eq!(view.dealer_cards, cards("Td"));
    assert!(view.dealer_hole_hidden);
    assert_eq!(view.dealer_value, 10);
    assert_eq!(view.current_turn, Some(1));
    assert_eq!(view.seats.len(), 1);
    assert_eq!(view.seats[0].cards, cards("Th 9h"));
    assert_eq!(view.seats[0].hand_value, 19);
    assert_eq!(view.seats[0].wager, Chips(100));
    assert!(!view.seats[0].finished);

    f.run(act(1, PlayerActionKind::Stand)).unwrap();

    let view = f.table_view(table_id);
    assert_eq!(view.phase, TablePhase::ResetPending);
    assert_eq!(view.dealer_cards, cards("Td 7d"));
    assert!(!view.dealer_hole_hidden);
    assert_eq!(view.dealer_value, 17);

    // Тот же вид собирается напрямую из снимка.
    let snapshot = f.registry.session(table_id).unwrap().snapshot();
    assert_eq!(build_table_view(&snapshot), view);
}

#[test]
fn lobby_and_lookup_queries() {
    let f = fixture("");
    let table_id = f.create_table();
    f.host.set_position(4, spot());
    f.run(join(4, None)).unwrap();

    match query(&f.registry, Query::ListTables).unwrap() {
        QueryResponse::Tables(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].table_id, table_id);
            assert_eq!(items[0].seated, 1);
            assert_eq!(items[0].max_seats, 5);
            assert_eq!(items[0].phase, TablePhase::Idle);
        }
        other => panic!("unexpected response {other:?}"),
    }

    assert_eq!(
        query(
            &f.registry,
            Query::FindNearest {
                position: Location::new("world", 2.0, 64.0, 0.0)
            }
        )
        .unwrap(),
        QueryResponse::Nearest(Some(table_id))
    );
    assert_eq!(
        query(&f.registry, Query::PlayerTable { player_id: 4 }).unwrap(),
        QueryResponse::PlayerTable(Some(table_id))
    );
    assert_eq!(
        query(&f.registry, Query::PlayerTable { player_id: 5 }).unwrap(),
        QueryResponse::PlayerTable(None)
    );
}

#[test]
fn errors_map_to_api_errors() {
    let f = fixture("");
    let table_id = f.create_table();

    assert_eq!(
        query(&f.registry, Query::GetTable { table_id: 77 }).unwrap_err(),
        ApiError::TableNotFound(77)
    );
    assert_eq!(
        f.run(Command::StartGame { table_id: 77 }).unwrap_err(),
        ApiError::TableNotFound(77)
    );
    assert_eq!(
        f.run(act(9, PlayerActionKind::Hit)).unwrap_err(),
        ApiError::PlayerNotAtTable(9)
    );

    // Дубликат якоря: команда невозможна в текущем состоянии.
    assert!(matches!(
        f.run(Command::CreateTable(CreateTableCommand { anchor: spot() })),
        Err(ApiError::InvalidCommand(_))
    ));

    f.host.set_position(1, spot());
    f.run(join(1, Some(table_id))).unwrap();

    // Ставка вне лимитов: плохой запрос.
    assert!(matches!(
        f.run(Command::PlayerCommand(PlayerCommand::PlaceWager {
            player_id: 1,
            amount: Chips(1),
        })),
        Err(ApiError::BadRequest(_))
    ));

    // Денег нет: отказ леджера.
    assert!(matches!(
        f.run(Command::PlayerCommand(PlayerCommand::PlaceWager {
            player_id: 1,
            amount: Chips(100),
        })),
        Err(ApiError::LedgerFailure(_))
    ));

    // Мест нет: запрошенное место занято.
    f.host.set_position(2, spot());
    assert!(matches!(
        f.run(Command::PlayerCommand(PlayerCommand::Join(JoinCommand {
            player_id: 2,
            table_id: Some(table_id),
            seat_index: Some(0),
        }))),
        Err(ApiError::Unavailable(_))
    ));

    assert_eq!(
        ApiError::from(EngineError::Internal("broken")),
        ApiError::Internal("Внутренняя ошибка: broken".to_string())
    );
}

#[test]
fn api_types_roundtrip_through_json() {
    let errors = vec![
        ApiError::BadRequest("amount".into()),
        ApiError::TableNotFound(3),
        ApiError::PlayerNotAtTable(4),
        ApiError::LedgerFailure("debit".into()),
    ];
    let json = serde_json::to_string(&errors).unwrap();
    let back: Vec<ApiError> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, errors);

    let command = act(1, PlayerActionKind::DoubleDown);
    let json = serde_json::to_string(&command).unwrap();
    let back: Command = serde_json::from_str(&json).unwrap();
    assert_eq!(back, command);
}
