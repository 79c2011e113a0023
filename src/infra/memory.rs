//! In-memory реализации внешних интерфейсов: для тестов, симуляций и локального запуска.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::chips::Chips;
use crate::domain::hand::Hand;
use crate::domain::player::ParticipantStatistics;
use crate::domain::table::Location;
use crate::domain::{PlayerId, SeatIndex, TableId};
use crate::engine::actions::PlayerActionKind;
use crate::engine::notify::{PresentationEvent, TableMessage};
use crate::infra::ports::{CurrencyLedger, HostTask, PresentationPort, SpatialHost, StatsSink};
use crate::time_ctrl::CancelToken;

#[derive(Clone, Copy, Debug, Default)]
struct Account {
    balance: Chips,
    debited: Chips,
    credited: Chips,
}

/// Кошелёк в памяти. Умеет «ломаться» по флагу, чтобы проверять откаты.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: Mutex<HashMap<PlayerId, Account>>,
    fail_debits: AtomicBool,
    fail_credits: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Положить деньги на счёт (не считается в debited/credited).
    pub fn deposit(&self, player_id: PlayerId, amount: Chips) {
        self.accounts.lock().entry(player_id).or_default().balance += amount;
    }

    pub fn set_fail_debits(&self, fail: bool) {
        self.fail_debits.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_credits(&self, fail: bool) {
        self.fail_credits.store(fail, Ordering::SeqCst);
    }

    /// Сколько движок списал минус сколько зачислил.
    pub fn net_debit(&self, player_id: PlayerId) -> i128 {
        self.accounts
            .lock()
            .get(&player_id)
            .map(|a| a.debited.0 as i128 - a.credited.0 as i128)
            .unwrap_or(0)
    }

    pub fn total_balance(&self) -> Chips {
        self.accounts
            .lock()
            .values()
            .fold(Chips::ZERO, |acc, a| acc + a.balance)
    }
}

impl CurrencyLedger for InMemoryLedger {
    fn has_at_least(&self, player_id: PlayerId, amount: Chips) -> bool {
        self.balance(player_id) >= amount
    }

    fn debit(&self, player_id: PlayerId, amount: Chips) -> bool {
        if self.fail_debits.load(Ordering::SeqCst) {
            return false;
        }
        let mut accounts = self.accounts.lock();
        let account = accounts.entry(player_id).or_default();
        if account.balance < amount {
            return false;
        }
        account.balance -= amount;
        account.debited += amount;
        true
    }

    fn credit(&self, player_id: PlayerId, amount: Chips) -> bool {
        if self.fail_credits.load(Ordering::SeqCst) {
            return false;
        }
        let mut accounts = self.accounts.lock();
        let account = accounts.entry(player_id).or_default();
        account.balance += amount;
        account.credited += amount;
        true
    }

    fn balance(&self, player_id: PlayerId) -> Chips {
        self.accounts
            .lock()
            .get(&player_id)
            .map(|a| a.balance)
            .unwrap_or(Chips::ZERO)
    }
}

/// Статистика в памяти.
#[derive(Debug, Default)]
pub struct InMemoryStatsStore {
    entries: Mutex<HashMap<PlayerId, ParticipantStatistics>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsSink for InMemoryStatsStore {
    fn load(&self, player_id: PlayerId) -> ParticipantStatistics {
        self.entries
            .lock()
            .get(&player_id)
            .cloned()
            .unwrap_or_default()
    }

    fn save(&self, player_id: PlayerId, stats: &ParticipantStatistics) {
        self.entries.lock().insert(player_id, stats.clone());
    }
}

/// Презентация, которая просто записывает все уведомления.
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    events: Mutex<Vec<PresentationEvent>>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PresentationEvent> {
        self.events.lock().clone()
    }

    /// Только сообщения стола.
    pub fn messages(&self) -> Vec<TableMessage> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::TableMessage { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, event: PresentationEvent) {
        self.events.lock().push(event);
    }
}

impl PresentationPort for RecordingPresentation {
    fn on_hand_changed(&self, table_id: TableId, player_id: PlayerId, hand: &Hand, value: u8) {
        self.record(PresentationEvent::HandChanged {
            table_id,
            player_id,
            hand: hand.clone(),
            value,
        });
    }

    fn on_dealer_hand_changed(&self, table_id: TableId, hand: &Hand, reveal_hole_card: bool) {
        self.record(PresentationEvent::DealerHandChanged {
            table_id,
            hand: hand.clone(),
            reveal_hole_card,
        });
    }

    fn on_turn_changed(
        &self,
        table_id: TableId,
        player_id: Option<PlayerId>,
        actions: &[PlayerActionKind],
    ) {
        self.record(PresentationEvent::TurnChanged {
            table_id,
            player_id,
            actions: actions.to_vec(),
        });
    }

    fn on_table_message(&self, table_id: TableId, message: &TableMessage) {
        self.record(PresentationEvent::TableMessage {
            table_id,
            message: message.clone(),
        });
    }

    fn on_seat_assigned(&self, table_id: TableId, player_id: PlayerId, seat: SeatIndex) {
        self.record(PresentationEvent::SeatAssigned {
            table_id,
            player_id,
            seat,
        });
    }
}

struct DelayedTask {
    task: HostTask,
    delay: Duration,
    token: CancelToken,
}

/// Хост для тестов: main loop выполняет задачу сразу в вызывающем потоке,
/// отложенные задачи копятся, пока тест не вызовет `run_delayed`.
#[derive(Default)]
pub struct ManualHost {
    positions: Mutex<HashMap<PlayerId, Location>>,
    delayed: Mutex<Vec<DelayedTask>>,
    main_loop_runs: AtomicUsize,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&self, player_id: PlayerId, location: Location) {
        self.positions.lock().insert(player_id, location);
    }

    pub fn remove_position(&self, player_id: PlayerId) {
        self.positions.lock().remove(&player_id);
    }

    /// Сколько задач прошло через main loop.
    pub fn main_loop_runs(&self) -> usize {
        self.main_loop_runs.load(Ordering::SeqCst)
    }

    /// Отложенные задачи, которые ещё не отменены.
    pub fn pending_delayed(&self) -> usize {
        self.delayed
            .lock()
            .iter()
            .filter(|d| !d.token.is_cancelled())
            .count()
    }

    /// Задержки неотменённых задач (в порядке постановки).
    pub fn pending_delays(&self) -> Vec<Duration> {
        self.delayed
            .lock()
            .iter()
            .filter(|d| !d.token.is_cancelled())
            .map(|d| d.delay)
            .collect()
    }

    /// «Промотать время»: выполнить все накопленные неотменённые задачи.
    /// Задачи, поставленные во время прогона, ждут следующего вызова.
    pub fn run_delayed(&self) -> usize {
        let batch: Vec<DelayedTask> = std::mem::take(&mut *self.delayed.lock());
        let mut ran = 0;
        for d in batch {
            if d.token.is_cancelled() {
                continue;
            }
            (d.task)();
            ran += 1;
        }
        ran
    }
}

impl SpatialHost for ManualHost {
    fn current_position(&self, player_id: PlayerId) -> Option<Location> {
        self.positions.lock().get(&player_id).cloned()
    }

    fn schedule_on_main_loop(&self, task: HostTask) {
        self.main_loop_runs.fetch_add(1, Ordering::SeqCst);
        task();
    }

    fn schedule_delayed(&self, task: HostTask, delay: Duration, token: CancelToken) {
        self.delayed.lock().push(DelayedTask { task, delay, token });
    }
}
