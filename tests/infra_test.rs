// tests/infra_test.rs
//
// Инфраструктура:
//
//  1) JSON-хранилища статистики и якорей (через временную директорию).
//  2) RNG: детерминированный по seed, подтасованный порядок карт.
//  3) Шуз: 52 карты, пересборка на пустом, подсказка о перетасовке.
//  4) Хост на tokio: main loop и отменяемые отложенные задачи.
//  5) Конфиг движка: TOML, значения по умолчанию, проверки.
//  6) Генератор id столов.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use blackjack_engine::config::{ConfigError, EngineConfig};
use blackjack_engine::domain::{Card, Chips, Location, ParticipantStatistics};
use blackjack_engine::engine::{RandomSource, Shoe};
use blackjack_engine::infra::{
    AnchorStore, DeterministicRng, IdGenerator, JsonAnchorStore, JsonStatsStore, PresetRng,
    SpatialHost, StatsSink, TokioHost,
};
use blackjack_engine::time_ctrl::CancelToken;

fn cards(list: &str) -> Vec<Card> {
    list.split_whitespace()
        .map(|c| c.parse::<Card>().expect("valid card"))
        .collect()
}

// ---------- хранилища ----------

#[test]
fn json_stats_store_flushes_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");

    let store = JsonStatsStore::open(&path).unwrap();
    assert_eq!(store.load(7), ParticipantStatistics::default());
    assert!(!store.is_dirty());

    let mut stats = ParticipantStatistics::default();
    stats.record_win(Chips(150));
    stats.blackjacks = 1;
    store.save(7, &stats);

    assert!(store.is_dirty());
    assert!(!path.exists());

    store.flush().unwrap();
    assert!(!store.is_dirty());
    assert!(path.exists());

    let reopened = JsonStatsStore::open(&path).unwrap();
    assert_eq!(reopened.load(7), stats);
    assert_eq!(reopened.load(8), ParticipantStatistics::default());
}

#[test]
fn json_stats_store_rejects_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(JsonStatsStore::open(&path).is_err());
}

#[test]
fn json_anchor_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tables.json");
    let store = JsonAnchorStore::new(&path);

    assert!(store.load_anchors().unwrap().is_empty());

    let anchors = vec![
        Location::new("world", 1.0, 64.0, -3.5),
        Location::new("nether", 0.0, 32.0, 8.0),
    ];
    store.save_anchors(&anchors).unwrap();
    assert_eq!(store.load_anchors().unwrap(), anchors);

    // На диске: список кортежей (region, x, y, z).
    let raw = std::fs::read_to_string(&path).unwrap();
    let triples: Vec<(String, f64, f64, f64)> = serde_json::from_str(&raw).unwrap();
    assert_eq!(triples[0], ("world".to_string(), 1.0, 64.0, -3.5));

    store.save_anchors(&anchors[1..]).unwrap();
    assert_eq!(store.load_anchors().unwrap(), anchors[1..].to_vec());
}

// ---------- RNG и шуз ----------

#[test]
fn deterministic_rng_repeats_with_same_seed() {
    let mut a = DeterministicRng::from_seed(42);
    let mut b = DeterministicRng::from_seed(42);
    let mut c = DeterministicRng::from_seed(43);

    let base = blackjack_engine::domain::Deck::standard_52().cards;
    let (mut x, mut y, mut z) = (base.clone(), base.clone(), base.clone());
    a.shuffle(&mut x);
    b.shuffle(&mut y);
    c.shuffle(&mut z);

    assert_eq!(x, y);
    assert_ne!(x, z);
    assert_ne!(x, base);
}

#[test]
fn preset_rng_puts_cards_on_top_in_order() {
    let mut shoe = Shoe::new(Box::new(PresetRng::new(cards("Ah Kd 7c"))));

    assert_eq!(shoe.draw(), "Ah".parse().unwrap());
    assert_eq!(shoe.draw(), "Kd".parse().unwrap());
    assert_eq!(shoe.draw(), "7c".parse().unwrap());
    assert_eq!(shoe.remaining(), 49);

    // Каждая пересборка снова кладёт их сверху.
    shoe.initialize();
    assert_eq!(shoe.draw(), "Ah".parse().unwrap());
}

#[test]
fn shoe_reshuffles_when_exhausted() {
    let mut shoe = Shoe::new(Box::new(PresetRng::default()));
    assert_eq!(shoe.remaining(), 52);
    assert!(!shoe.needs_reshuffle());

    let mut drawn = Vec::new();
    for _ in 0..43 {
        drawn.push(shoe.draw());
    }
    assert_eq!(shoe.remaining(), 9);
    assert!(shoe.needs_reshuffle());

    for _ in 0..9 {
        drawn.push(shoe.draw());
    }
    drawn.sort_by_key(|c| (c.suit as u8, c.rank as u8));
    drawn.dedup();
    assert_eq!(drawn.len(), 52);
    assert_eq!(shoe.remaining(), 0);

    // Пустой шуз пересобирается молча.
    shoe.draw();
    assert_eq!(shoe.remaining(), 51);
}

#[test]
fn table_ids_are_sequential() {
    let ids = IdGenerator::new();
    assert_eq!(ids.next_table_id(), 1);
    assert_eq!(ids.next_table_id(), 2);
}

// ---------- хост на tokio ----------

#[tokio::test]
async fn tokio_host_runs_main_loop_tasks_in_order() {
    let host = TokioHost::spawn(tokio::runtime::Handle::current());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    for i in 0..3 {
        let tx = tx.clone();
        host.schedule_on_main_loop(Box::new(move || {
            let _ = tx.send(i);
        }));
    }

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(rx.recv().await.unwrap());
    }
    assert_eq!(seen, vec![0, 1, 2]);
}

#[tokio::test]
async fn tokio_host_skips_cancelled_delayed_tasks() {
    let host = TokioHost::spawn(tokio::runtime::Handle::current());
    let fired = Arc::new(AtomicBool::new(false));
    let cancelled = Arc::new(AtomicBool::new(false));

    let token = CancelToken::new();
    let flag = fired.clone();
    host.schedule_delayed(
        Box::new(move || flag.store(true, Ordering::SeqCst)),
        Duration::from_millis(10),
        CancelToken::new(),
    );
    let flag = cancelled.clone();
    host.schedule_delayed(
        Box::new(move || flag.store(true, Ordering::SeqCst)),
        Duration::from_millis(10),
        token.clone(),
    );
    token.cancel();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fired.load(Ordering::SeqCst));
    assert!(!cancelled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn tokio_host_tracks_positions() {
    let host = TokioHost::spawn(tokio::runtime::Handle::current());
    assert_eq!(host.current_position(1), None);

    host.set_position(1, Location::new("world", 1.0, 2.0, 3.0));
    assert_eq!(
        host.current_position(1),
        Some(Location::new("world", 1.0, 2.0, 3.0))
    );

    host.remove_position(1);
    assert_eq!(host.current_position(1), None);
}

// ---------- конфиг ----------

#[test]
fn config_defaults_fill_missing_sections() {
    let config = EngineConfig::from_toml_str(
        r#"
        [table]
        max_seats = 7
        min_bet = 50
        hit_soft_17 = true
        "#,
    )
    .unwrap();

    assert_eq!(config.table.max_seats, 7);
    assert_eq!(config.table.min_bet, Chips(50));
    assert_eq!(config.table.max_bet, Chips(10_000));
    assert!(config.table.hit_soft_17);
    assert_eq!(config.timing.bet_cooldown_ms, 1_000);
    assert_eq!(config.timing.auto_start_delay(), Duration::from_secs(5));
    assert_eq!(config.timing.reset_delay(), Duration::from_secs(3));
    assert_eq!(
        config.storage.anchors_path,
        std::path::PathBuf::from("tables.json")
    );

    assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
}

#[test]
fn config_rejects_invalid_values() {
    let cases = [
        ("[table]\nmax_seats = 9", "table.max_seats"),
        ("[table]\nmax_seats = 0", "table.max_seats"),
        ("[table]\nmin_bet = 0", "table.min_bet"),
        ("[table]\nmin_bet = 500\nmax_bet = 100", "table.max_bet"),
        ("[table]\nmax_join_distance = -1.0", "table.max_join_distance"),
    ];

    for (raw, expected) in cases {
        match EngineConfig::from_toml_str(raw) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected, "{raw}"),
            other => panic!("{raw}: expected Invalid, got {other:?}"),
        }
    }

    assert!(matches!(
        EngineConfig::from_toml_str("[table\nmax_seats = 5"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(
        &path,
        "[timing]\nbet_cooldown_ms = 250\n\n[storage]\nstats_path = \"data/stats.json\"\n",
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.timing.bet_cooldown(), Duration::from_millis(250));
    assert_eq!(
        config.storage.stats_path,
        std::path::PathBuf::from("data/stats.json")
    );

    assert!(matches!(
        EngineConfig::load(dir.path().join("missing.toml")),
        Err(ConfigError::Io { .. })
    ));
}
