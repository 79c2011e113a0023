use std::env;
use std::fs;
use std::sync::Arc;
use std::thread;

use blackjack_engine::config::EngineConfig;
use blackjack_engine::domain::chips::Chips;
use blackjack_engine::domain::table::Location;
use blackjack_engine::domain::{PlayerId, TableId};
use blackjack_engine::engine::{Collaborators, PlayerActionKind, TableRegistry};
use blackjack_engine::eval::compute_value;
use blackjack_engine::infra::{DeterministicRng, InMemoryLedger, ManualHost};
use tracing_subscriber::EnvFilter;

// Параметры нагрузки: можно смело крутить.
const NUM_TABLES: usize = 32; // сколько столов
const PLAYERS_PER_TABLE: usize = 5; // игроков за столом
const ROUNDS_PER_TABLE: u32 = 200; // сколько раундов на стол
const WORKERS: usize = 8; // потоков-«клиентов»
const START_BALANCE: u64 = 1_000_000;
const BET: u64 = 100;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("blackjack_stress_test: стартуем стресс-тест движка блэкджека…");

    // Конфиг: первый аргумент или значения по умолчанию.
    let mut config = match env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("[STRESS] ОШИБКА конфига: {e}");
                return;
            }
        },
        None => EngineConfig::default(),
    };
    config.timing.bet_cooldown_ms = 0;

    // Хранилища: свой каталог на каждый прогон, чтобы якоря прошлых прогонов не мешали.
    let run_dir = env::temp_dir().join(format!("blackjack_stress_{}", std::process::id()));
    if let Err(e) = fs::create_dir_all(&run_dir) {
        eprintln!("[STRESS] ОШИБКА каталога {}: {e}", run_dir.display());
        return;
    }
    config.storage.anchors_path = run_dir.join("tables.json");
    config.storage.stats_path = run_dir.join("stats.json");

    let ledger = Arc::new(InMemoryLedger::new());
    let host = Arc::new(ManualHost::new());
    let collab = match Collaborators::from_config(&config, ledger.clone(), host.clone()) {
        Ok(c) => c.with_rng(Arc::new(|table_id: TableId| {
            Box::new(DeterministicRng::from_seed(table_id))
                as Box<dyn blackjack_engine::engine::RandomSource + Send>
        })),
        Err(e) => {
            eprintln!("[STRESS] ОШИБКА хранилища: {e}");
            return;
        }
    };
    let registry = TableRegistry::new(&config, collab.clone());

    // 1. Создаём столы и рассаживаем игроков.
    let mut tables: Vec<(TableId, Vec<PlayerId>)> = Vec::with_capacity(NUM_TABLES);
    let mut next_player: PlayerId = 1;
    for t in 0..NUM_TABLES {
        let anchor = Location::new("stress", t as f64 * 100.0, 64.0, 0.0);
        let table_id = match registry.create(anchor.clone()) {
            Ok(id) => id,
            Err(e) => {
                eprintln!("[STRESS] ОШИБКА create: {e}");
                return;
            }
        };

        let mut players = Vec::with_capacity(PLAYERS_PER_TABLE);
        for _ in 0..PLAYERS_PER_TABLE {
            let pid = next_player;
            next_player += 1;
            ledger.deposit(pid, Chips(START_BALANCE));
            host.set_position(pid, anchor.clone());
            if let Err(e) = registry.join(pid, table_id, None) {
                eprintln!("[STRESS][table_id={table_id}] ОШИБКА join: {e}");
                continue;
            }
            players.push(pid);
        }
        tables.push((table_id, players));
    }

    let initial_total = ledger.total_balance();
    println!(
        "[STRESS] Создано {} столов, по {} игроков, по {} раундов на стол, {} потоков.",
        NUM_TABLES, PLAYERS_PER_TABLE, ROUNDS_PER_TABLE, WORKERS
    );

    // 2. Гоним раунды по всем столам из нескольких потоков.
    let totals: Vec<RunStats> = thread::scope(|scope| {
        let registry = &registry;
        let handles: Vec<_> = tables
            .chunks(NUM_TABLES.div_ceil(WORKERS))
            .map(|chunk| {
                scope.spawn(move || {
                    let mut stats = RunStats::default();
                    for (table_id, players) in chunk {
                        for _ in 0..ROUNDS_PER_TABLE {
                            play_single_round(registry, *table_id, players, &mut stats);
                        }
                    }
                    stats
                })
            })
            .collect();
        handles
            .into_iter()
            .filter_map(|h| h.join().ok())
            .collect()
    });

    host.run_delayed();
    let refunds = registry.shutdown();

    let mut total = RunStats::default();
    for s in totals {
        total.rounds += s.rounds;
        total.errors += s.errors;
        total.actions += s.actions;
        total.payouts += s.payouts;
    }

    // Якоря пережили прогон: новый реестр поднимает те же столы.
    let restored = TableRegistry::new(&config, collab).restore().unwrap_or_else(|e| {
        eprintln!("[STRESS] ОШИБКА restore: {e}");
        0
    });

    let final_total = ledger.total_balance();
    let house_net = initial_total.0 as i128 - final_total.0 as i128;

    println!();
    println!("=========== STRESS TEST SUMMARY ===========");
    println!("Всего сыграно раундов: {}", total.rounds);
    println!("Действий игроков: {}", total.actions);
    println!("Выплачено игрокам: {}", total.payouts);
    println!("Ошибок: {}", total.errors);
    println!("Возвратов на shutdown: {}", refunds.refunded.len());
    println!("Нетто казино: {}", house_net);
    println!("Столов восстановлено из {}: {}", run_dir.display(), restored);
    println!("В эскроу после shutdown: {}", registry.ledger().total_escrowed());
    println!("===========================================");
    println!("blackjack_stress_test: завершено.");
}

#[derive(Default)]
struct RunStats {
    rounds: u64,
    actions: u64,
    payouts: u64,
    errors: u64,
}

/// Один раунд: ставки, раздача, простая бот-логика, расчёт.
fn play_single_round(registry: &TableRegistry, table_id: TableId, players: &[PlayerId], stats: &mut RunStats) {
    const MAX_STEPS: u32 = 100;

    for &pid in players {
        if let Err(e) = registry.place_wager(pid, Chips(BET)) {
            eprintln!("[STRESS][table_id={table_id}] ОШИБКА ставки игрока {pid}: {e}");
            stats.errors += 1;
            return;
        }
    }

    if let Err(e) = registry.start_game(table_id) {
        eprintln!("[STRESS][table_id={table_id}] ОШИБКА start_game: {e}");
        stats.errors += 1;
        return;
    }

    let Some(session) = registry.session(table_id) else {
        stats.errors += 1;
        return;
    };

    for _ in 0..MAX_STEPS {
        let Some(pid) = session.current_turn() else {
            break;
        };

        let snapshot = session.snapshot();
        let hand = snapshot.hands.get(&pid).cloned().unwrap_or_default();
        let value = compute_value(&hand);
        let kind = if hand.len() == 2 && (value == 10 || value == 11) {
            PlayerActionKind::DoubleDown
        } else if value < 17 {
            PlayerActionKind::Hit
        } else {
            PlayerActionKind::Stand
        };

        match registry.act(pid, kind) {
            Ok(report) => {
                stats.actions += 1;
                if let Some(summary) = report.summary {
                    stats.rounds += 1;
                    stats.payouts += summary.results.iter().map(|r| r.payout.0).sum::<u64>();
                }
            }
            Err(e) => {
                eprintln!("[STRESS][table_id={table_id}] ОШИБКА хода игрока {pid}: {e}");
                stats.errors += 1;
                return;
            }
        }
    }
}
