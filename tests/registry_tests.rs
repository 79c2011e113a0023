// tests/registry_tests.rs
//
// Реестр столов:
//
//  1) Создание: уникальность якоря, запись якорей, отказ хранилища.
//  2) Поиск ближайшего стола (только свой регион, в пределах дистанции).
//  3) Удаление стола: возврат или форфейт ставок, очистка индекса игроков.
//  4) Восстановление столов из сохранённых якорей.
//  5) Маршрутизация событий хоста: перемещение, отключение.
//  6) Остановка: возврат ставок и закрытие столов, кроме столов посреди раунда;
//     ставки игроков без стола тоже возвращаются.
//  7) Файловые хранилища из [storage]: якоря и статистика переживают перезапуск.

use std::io;
use std::sync::Arc;

use blackjack_engine::config::EngineConfig;
use blackjack_engine::domain::{Chips, LeaveReason, Location, PlayerId, TablePhase};
use blackjack_engine::engine::{
    Collaborators, EngineError, ErrorKind, PlayerActionKind, RegistryError, TableMessage,
    TableRegistry, WagerDisposition,
};
use blackjack_engine::infra::{
    AnchorStore, CurrencyLedger, InMemoryAnchorStore, InMemoryLedger, JsonStatsStore, ManualHost,
    RecordingPresentation, StatsSink, StorageError,
};

fn at(x: f64) -> Location {
    Location::new("world", x, 64.0, 0.0)
}

struct Fixture {
    registry: TableRegistry,
    currency: Arc<InMemoryLedger>,
    host: Arc<ManualHost>,
    anchors: Arc<InMemoryAnchorStore>,
    presentation: Arc<RecordingPresentation>,
}

fn fixture_with_anchors(anchors: Arc<InMemoryAnchorStore>) -> Fixture {
    let currency = Arc::new(InMemoryLedger::new());
    let host = Arc::new(ManualHost::new());
    let presentation = Arc::new(RecordingPresentation::new());
    let collab = Collaborators::new(currency.clone(), host.clone())
        .with_anchors(anchors.clone())
        .with_presentation(presentation.clone());
    Fixture {
        registry: TableRegistry::new(&EngineConfig::default(), collab),
        currency,
        host,
        anchors,
        presentation,
    }
}

fn fixture() -> Fixture {
    fixture_with_anchors(Arc::new(InMemoryAnchorStore::new()))
}

impl Fixture {
    fn seat_at(&self, player: PlayerId, position: Location) {
        self.currency.deposit(player, Chips(1_000));
        self.host.set_position(player, position);
        self.registry.join_nearest(player, None).unwrap();
    }
}

/// Хранилище, которое всегда отказывает.
struct BrokenAnchors;

impl AnchorStore for BrokenAnchors {
    fn load_anchors(&self) -> Result<Vec<Location>, StorageError> {
        Err(StorageError::Io(io::Error::new(io::ErrorKind::Other, "disk gone")))
    }

    fn save_anchors(&self, _anchors: &[Location]) -> Result<(), StorageError> {
        Err(StorageError::Io(io::Error::new(io::ErrorKind::Other, "disk gone")))
    }
}

#[test]
fn create_rejects_duplicate_anchor_and_persists() {
    let f = fixture();
    let t1 = f.registry.create(at(0.0)).unwrap();
    let t2 = f.registry.create(at(30.0)).unwrap();
    assert_ne!(t1, t2);

    let err = f.registry.create(at(0.0)).unwrap_err();
    assert!(matches!(err, RegistryError::TableExists(ref a) if *a == at(0.0)));
    assert_eq!(err.kind(), ErrorKind::Precondition);

    assert_eq!(f.anchors.snapshot(), vec![at(0.0), at(30.0)]);
    assert_eq!(f.registry.table_ids(), vec![t1, t2]);
}

#[test]
fn failed_anchor_write_creates_nothing() {
    let currency = Arc::new(InMemoryLedger::new());
    let collab = Collaborators::in_memory(currency).with_anchors(Arc::new(BrokenAnchors));
    let registry = TableRegistry::new(&EngineConfig::default(), collab);

    let err = registry.create(at(0.0)).unwrap_err();
    assert!(matches!(err, RegistryError::Storage(_)));
    assert_eq!(err.kind(), ErrorKind::ExternalOperation);
    assert!(registry.is_empty());
    assert!(matches!(registry.restore(), Err(RegistryError::Storage(_))));
}

#[test]
fn find_nearest_same_region_within_range() {
    let f = fixture();
    let near = f.registry.create(at(0.0)).unwrap();
    let far = f.registry.create(at(6.0)).unwrap();

    assert_eq!(f.registry.find_nearest(&at(1.0), None), Some(near));
    assert_eq!(f.registry.find_nearest(&at(4.0), None), Some(far));
    assert_eq!(f.registry.find_nearest(&at(50.0), None), None);
    assert_eq!(f.registry.find_nearest(&at(50.0), Some(100.0)), Some(far));

    let elsewhere = Location::new("nether", 0.0, 64.0, 0.0);
    assert_eq!(f.registry.find_nearest(&elsewhere, Some(1_000.0)), None);
}

#[test]
fn join_nearest_and_its_rejections() {
    let f = fixture();
    let table = f.registry.create(at(0.0)).unwrap();

    f.host.set_position(1, at(3.0));
    assert_eq!(f.registry.join_nearest(1, None).unwrap(), (table, 0));
    assert_eq!(f.registry.table_of(1), Some(table));

    assert!(matches!(
        f.registry.join_nearest(2, None).unwrap_err(),
        RegistryError::PositionUnknown(2)
    ));

    f.host.set_position(3, at(500.0));
    let err = f.registry.join_nearest(3, None).unwrap_err();
    assert!(matches!(err, RegistryError::NoTableInRange));
    assert_eq!(err.kind(), ErrorKind::ResourceExhaustion);
}

#[test]
fn player_sits_at_one_table_only() {
    let f = fixture();
    let t1 = f.registry.create(at(0.0)).unwrap();
    let t2 = f.registry.create(at(5.0)).unwrap();
    f.host.set_position(1, at(2.0));

    f.registry.join(1, t1, None).unwrap();
    let err = f.registry.join(1, t2, None).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Engine(EngineError::AlreadySeated(1))
    ));
    assert_eq!(f.registry.table_of(1), Some(t1));
    assert_eq!(f.registry.index().len(), 1);
}

#[test]
fn remove_idle_table_refunds_wagers() {
    let f = fixture();
    let table = f.registry.create(at(0.0)).unwrap();
    f.seat_at(1, at(0.0));
    f.registry.place_wager(1, Chips(100)).unwrap();

    let reports = f.registry.remove(table).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].wager, WagerDisposition::Refunded(Chips(100)));
    assert_eq!(f.currency.balance(1), Chips(1_000));

    assert!(f.registry.is_empty());
    assert!(f.registry.index().is_empty());
    assert!(f.anchors.snapshot().is_empty());
    assert!(f
        .presentation
        .messages()
        .contains(&TableMessage::PlayerLeft {
            player_id: 1,
            reason: LeaveReason::TableRemoved,
        }));

    assert!(matches!(
        f.registry.remove(table).unwrap_err(),
        RegistryError::TableNotFound(id) if id == table
    ));
}

#[test]
fn remove_mid_round_forfeits_and_cancels_timers() {
    let f = fixture();
    let table = f.registry.create(at(0.0)).unwrap();
    f.seat_at(1, at(0.0));
    f.seat_at(2, at(0.0));
    f.registry.place_wager(1, Chips(100)).unwrap();
    f.registry.place_wager(2, Chips(100)).unwrap();
    f.registry.start_game(table).unwrap();

    let session = f.registry.session(table).unwrap();
    let reports = f.registry.remove_at(&at(0.0)).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].wager, WagerDisposition::Forfeited(Chips(100)));
    assert_eq!(f.currency.balance(1), Chips(900));
    assert_eq!(f.currency.balance(2), Chips(900));

    assert!(session.is_closed());
    assert_eq!(f.host.pending_delayed(), 0);
    assert!(matches!(
        session.start_game().unwrap_err(),
        EngineError::TableClosed
    ));
    assert!(matches!(
        f.registry.remove_at(&at(0.0)).unwrap_err(),
        RegistryError::NoTableAt(_)
    ));
}

#[test]
fn restore_recreates_saved_tables_once() {
    let anchors = Arc::new(InMemoryAnchorStore::with_anchors(vec![at(0.0), at(40.0)]));
    let f = fixture_with_anchors(anchors);

    assert_eq!(f.registry.restore().unwrap(), 2);
    assert_eq!(f.registry.len(), 2);
    assert_eq!(f.registry.restore().unwrap(), 0);

    let table = f.registry.find_nearest(&at(41.0), None).unwrap();
    assert_eq!(f.registry.session(table).unwrap().anchor(), &at(40.0));
}

#[test]
fn moving_away_unseats_player() {
    let f = fixture();
    let table = f.registry.create(at(0.0)).unwrap();
    f.seat_at(1, at(0.0));
    f.registry.place_wager(1, Chips(100)).unwrap();

    // Внутри дистанции: ничего.
    f.host.set_position(1, at(9.0));
    assert!(f.registry.on_player_moved(1).unwrap().is_none());

    f.host.set_position(1, at(11.0));
    let report = f.registry.on_player_moved(1).unwrap().expect("moved away");
    assert_eq!(report.table_id, table);
    assert_eq!(report.wager, WagerDisposition::Refunded(Chips(100)));
    assert_eq!(f.registry.table_of(1), None);
    assert!(f
        .presentation
        .messages()
        .contains(&TableMessage::PlayerLeft {
            player_id: 1,
            reason: LeaveReason::MovedAway,
        }));

    // Не сидит: событие игнорируется.
    assert!(f.registry.on_player_moved(1).unwrap().is_none());
    assert!(f.registry.on_disconnect(1).is_none());
}

#[test]
fn going_offline_counts_as_moving_away() {
    let f = fixture();
    f.registry.create(at(0.0)).unwrap();
    f.seat_at(1, at(0.0));

    f.host.remove_position(1);
    assert!(f.registry.on_player_moved(1).unwrap().is_some());
}

#[test]
fn leave_requires_a_seat() {
    let f = fixture();
    assert!(matches!(
        f.registry.leave(5, LeaveReason::Voluntary).unwrap_err(),
        RegistryError::NotAtTable(5)
    ));
    assert!(matches!(
        f.registry.place_wager(5, Chips(100)).unwrap_err(),
        RegistryError::NotAtTable(5)
    ));
}

#[test]
fn shutdown_refunds_idle_tables_only() {
    let f = fixture();
    let idle = f.registry.create(at(0.0)).unwrap();
    let busy = f.registry.create(at(100.0)).unwrap();

    f.seat_at(1, at(0.0));
    f.registry.place_wager(1, Chips(100)).unwrap();
    f.seat_at(2, at(100.0));
    f.registry.place_wager(2, Chips(100)).unwrap();
    f.registry.start_game(busy).unwrap();

    assert_eq!(f.registry.table_of(1), Some(idle));
    assert_eq!(
        f.registry.session(busy).unwrap().phase(),
        TablePhase::InProgress
    );

    let report = f.registry.shutdown();
    assert_eq!(report.refunded, vec![(1, Chips(100))]);
    assert_eq!(report.skipped, vec![2]);
    assert!(report.failed.is_empty());

    assert_eq!(f.currency.balance(1), Chips(1_000));
    assert_eq!(f.registry.ledger().wager_of(2), Chips(100));
    assert_eq!(f.host.pending_delayed(), 0);

    // Стол вне раунда закрыт: поздний старт или ставка уже не проходят.
    assert!(f.registry.session(idle).unwrap().is_closed());
    let err = f.registry.start_game(idle).unwrap_err();
    assert!(matches!(err, RegistryError::Engine(EngineError::TableClosed)));
    let err = f.registry.place_wager(1, Chips(100)).unwrap_err();
    assert!(matches!(err, RegistryError::Engine(EngineError::TableClosed)));
    assert_eq!(f.currency.balance(1), Chips(1_000));

    // Таймеры сняты, но стол посреди раунда открыт: раунд можно доиграть.
    assert!(!f.registry.session(busy).unwrap().is_closed());
    let report = f.registry.act(2, PlayerActionKind::Stand).unwrap();
    assert!(report.summary.is_some());
}

#[test]
fn shutdown_returns_stake_left_by_failed_refund() {
    let f = fixture();
    f.registry.create(at(0.0)).unwrap();
    f.seat_at(1, at(0.0));
    f.registry.place_wager(1, Chips(100)).unwrap();

    f.currency.set_fail_credits(true);
    let report = f.registry.leave(1, LeaveReason::Voluntary).unwrap();
    assert_eq!(report.wager, WagerDisposition::RefundFailed(Chips(100)));
    assert_eq!(f.registry.table_of(1), None);
    f.currency.set_fail_credits(false);

    // Игрок уже ни за каким столом, ставка возвращается напрямую из леджера.
    let report = f.registry.shutdown();
    assert_eq!(report.refunded, vec![(1, Chips(100))]);
    assert!(report.skipped.is_empty());
    assert_eq!(f.currency.balance(1), Chips(1_000));
    assert_eq!(f.registry.ledger().total_escrowed(), Chips::ZERO);
}

#[test]
fn file_storage_from_config_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EngineConfig::default();
    config.storage.anchors_path = dir.path().join("tables.json");
    config.storage.stats_path = dir.path().join("stats.json");

    let currency = Arc::new(InMemoryLedger::new());
    let host = Arc::new(ManualHost::new());
    let collab = Collaborators::from_config(&config, currency.clone(), host.clone()).unwrap();
    let registry = TableRegistry::new(&config, collab);

    let table = registry.create(at(0.0)).unwrap();
    registry.create(at(50.0)).unwrap();
    currency.deposit(1, Chips(1_000));
    host.set_position(1, at(0.0));
    registry.join(1, table, None).unwrap();
    registry.place_wager(1, Chips(100)).unwrap();
    registry.start_game(table).unwrap();

    let session = registry.session(table).unwrap();
    while let Some(player) = session.current_turn() {
        registry.act(player, PlayerActionKind::Stand).unwrap();
    }
    assert!(session.last_summary().is_some());

    // Статистика уходит на диск только на shutdown.
    assert!(!config.storage.stats_path.exists());
    registry.shutdown();

    let stats = JsonStatsStore::open(&config.storage.stats_path).unwrap();
    assert_eq!(stats.load(1).hands_played(), 1);

    let restarted = TableRegistry::new(
        &config,
        Collaborators::from_config(&config, currency, host).unwrap(),
    );
    assert_eq!(restarted.restore().unwrap(), 2);
    assert_eq!(restarted.stats().load(1).hands_played(), 1);
    assert!(restarted.find_nearest(&at(50.0), None).is_some());
}
