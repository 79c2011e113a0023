//! Сессия одного стола: рассадка, очередь ходов, раздача и расчёт.
//!
//! Всё мутирующее состояние стола лежит под одним мьютексом, каждая операция:
//! одна критическая секция. Уведомления для презентации и взведённые таймеры
//! копятся внутри секции и уходят хосту уже после снятия блокировки.
//!
//! Порядок блокировок: сессия → (индекс игроков | леджер ставок).

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::hand::{Hand, RoundSummary};
use crate::domain::player::LeaveReason;
use crate::domain::table::{Location, SeatIndex, Table, TableConfig, TablePhase};
use crate::domain::{PlayerId, TableId};
use crate::engine::actions::PlayerActionKind;
use crate::engine::errors::{EngineError, ErrorKind};
use crate::engine::game_loop::{self, ActionOutcome, RoundEngine};
use crate::engine::hand_history::{RoundEventKind, RoundHistory};
use crate::engine::notify::{dispatch, PresentationEvent, TableMessage};
use crate::engine::player_index::PlayerIndex;
use crate::engine::settlement::settle_round;
use crate::engine::shoe::Shoe;
use crate::engine::validation::{available_actions, validate_double_down};
use crate::engine::wager_ledger::{RefundReport, WagerChange, WagerLedger};
use crate::engine::RandomSource;
use crate::eval::{compute_value, is_busted};
use crate::infra::ports::{PresentationPort, SpatialHost, StatsSink};
use crate::time_ctrl::{CancelToken, TimerKey, TimerKind, TimerSet, TimingConfig};

/// Общие зависимости всех сессий реестра.
#[derive(Clone)]
pub struct SessionContext {
    pub ledger: Arc<WagerLedger>,
    pub index: Arc<PlayerIndex>,
    pub stats: Arc<dyn StatsSink>,
    pub presentation: Arc<dyn PresentationPort>,
    pub host: Arc<dyn SpatialHost>,
    pub timing: TimingConfig,
}

/// Что стало с открытой ставкой ушедшего игрока.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum WagerDisposition {
    NoWager,
    /// Стол не посреди раунда: ставка возвращена.
    Refunded(Chips),
    /// Возврат не прошёл: ставка осталась открытой, вернётся на shutdown.
    RefundFailed(Chips),
    /// Ушёл посреди раунда: ставка сгорела.
    Forfeited(Chips),
}

/// Результат снятия игрока с места.
#[derive(Clone, Debug, PartialEq)]
pub struct Departure {
    pub player_id: PlayerId,
    pub seat: SeatIndex,
    /// Фаза стола в момент ухода. По ней решается возврат или форфейт ставки.
    pub phase_at_removal: TablePhase,
    /// Уход закончил раунд (последний игрок или последний незакончивший).
    pub summary: Option<RoundSummary>,
}

/// Уход игрока вместе с судьбой его ставки.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaveReport {
    pub table_id: TableId,
    pub departure: Departure,
    pub wager: WagerDisposition,
}

/// Результат действия игрока.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionReport {
    pub action: PlayerActionKind,
    pub outcome: ActionOutcome,
    /// Действие было последним в раунде: вот расчёт.
    pub summary: Option<RoundSummary>,
}

/// Снимок состояния стола (для запросов и тестов).
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TableSnapshot {
    pub table: Table,
    pub round: u64,
    pub hands: BTreeMap<PlayerId, Hand>,
    pub dealer_hand: Hand,
    pub turn_order: Vec<PlayerId>,
    pub current_turn: Option<PlayerId>,
    pub finished: Vec<PlayerId>,
    pub doubled: Vec<PlayerId>,
    pub wagers: BTreeMap<PlayerId, Chips>,
    pub shoe_remaining: usize,
    pub armed_timers: usize,
    pub last_summary: Option<RoundSummary>,
}

struct SessionState {
    table: Table,
    round: RoundEngine,
    timers: TimerSet,
    closed: bool,
    last_summary: Option<RoundSummary>,
}

struct PendingTimer {
    kind: TimerKind,
    token: CancelToken,
    generation: u64,
    delay: Duration,
}

/// Побочные эффекты операции, которые выполняются после снятия блокировки.
#[derive(Default)]
struct Effects {
    events: Vec<PresentationEvent>,
    timers: Vec<PendingTimer>,
}

impl Effects {
    fn message(&mut self, table_id: TableId, message: TableMessage) {
        self.events
            .push(PresentationEvent::TableMessage { table_id, message });
    }
}

pub struct TableSession {
    id: TableId,
    anchor: Location,
    config: TableConfig,
    state: Mutex<SessionState>,
    ctx: SessionContext,
    this: Weak<TableSession>,
}

impl TableSession {
    pub fn new(
        id: TableId,
        anchor: Location,
        config: TableConfig,
        ctx: SessionContext,
        rng: Box<dyn RandomSource + Send>,
    ) -> Arc<Self> {
        let table = Table::new(id, anchor.clone(), config.clone());
        let round = RoundEngine::new(id, Shoe::new(rng));
        Arc::new_cyclic(|this| Self {
            id,
            anchor,
            config,
            state: Mutex::new(SessionState {
                table,
                round,
                timers: TimerSet::new(),
                closed: false,
                last_summary: None,
            }),
            ctx,
            this: this.clone(),
        })
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn anchor(&self) -> &Location {
        &self.anchor
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn phase(&self) -> TablePhase {
        self.state.lock().table.phase
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn seated_players(&self) -> Vec<PlayerId> {
        self.state.lock().table.seated_players()
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.state.lock().table.is_seated(player_id)
    }

    pub fn current_turn(&self) -> Option<PlayerId> {
        self.state.lock().round.current_turn
    }

    pub fn history(&self) -> RoundHistory {
        self.state.lock().round.history.clone()
    }

    pub fn last_summary(&self) -> Option<RoundSummary> {
        self.state.lock().last_summary.clone()
    }

    /// Расстояние от игрока до якоря. None: игрок офлайн или в другом регионе.
    pub fn distance_of(&self, player_id: PlayerId) -> Option<f64> {
        self.ctx
            .host
            .current_position(player_id)
            .and_then(|pos| self.anchor.distance_to(&pos))
    }

    pub fn snapshot(&self) -> TableSnapshot {
        let state = self.state.lock();
        let round = &state.round;

        let mut finished: Vec<PlayerId> = round.finished.iter().copied().collect();
        finished.sort_unstable();
        let mut doubled: Vec<PlayerId> = round.doubled.iter().copied().collect();
        doubled.sort_unstable();

        let wagers = state
            .table
            .seated_players()
            .into_iter()
            .map(|p| (p, self.ctx.ledger.wager_of(p)))
            .collect();

        TableSnapshot {
            table: state.table.clone(),
            round: round.round,
            hands: round.hands.clone(),
            dealer_hand: round.dealer_hand.clone(),
            turn_order: round.turn_order.clone(),
            current_turn: round.current_turn,
            finished,
            doubled,
            wagers,
            shoe_remaining: round.shoe.remaining(),
            armed_timers: state.timers.armed_count(),
            last_summary: state.last_summary.clone(),
        }
    }

    // ---------- операции ----------

    /// Посадить игрока. `desired_seat == None`: самое младшее свободное место.
    pub fn add_participant(
        &self,
        player_id: PlayerId,
        desired_seat: Option<SeatIndex>,
    ) -> Result<SeatIndex, EngineError> {
        self.with_state(|state, fx| self.add_locked(state, fx, player_id, desired_seat))
    }

    /// Снять игрока с места. Ставку не трогает: это решает вызывающий по `phase_at_removal`.
    pub fn remove_participant(
        &self,
        player_id: PlayerId,
        reason: LeaveReason,
    ) -> Result<Departure, EngineError> {
        self.with_state(|state, fx| self.remove_locked(state, fx, player_id, reason))
    }

    /// Снять игрока и в той же критической секции разобраться с его ставкой:
    /// посреди раунда: форфейт, иначе: возврат.
    pub fn leave(&self, player_id: PlayerId, reason: LeaveReason) -> Result<LeaveReport, EngineError> {
        self.with_state(|state, fx| self.leave_locked(state, fx, player_id, reason))
    }

    pub fn place_wager(&self, player_id: PlayerId, amount: Chips) -> Result<WagerChange, EngineError> {
        self.with_state(|state, fx| self.wager_locked(state, fx, player_id, Some(amount)))
    }

    /// Повторить последнюю ставку игрока.
    pub fn repeat_wager(&self, player_id: PlayerId) -> Result<WagerChange, EngineError> {
        self.with_state(|state, fx| self.wager_locked(state, fx, player_id, None))
    }

    /// Начать раунд. Из `ResetPending` стол сначала очищается.
    /// Возвращает номер раунда.
    pub fn start_game(&self) -> Result<u64, EngineError> {
        self.with_state(|state, fx| self.start_locked(state, fx))
    }

    pub fn hit(&self, player_id: PlayerId) -> Result<ActionReport, EngineError> {
        self.act(player_id, PlayerActionKind::Hit)
    }

    pub fn stand(&self, player_id: PlayerId) -> Result<ActionReport, EngineError> {
        self.act(player_id, PlayerActionKind::Stand)
    }

    pub fn double_down(&self, player_id: PlayerId) -> Result<ActionReport, EngineError> {
        self.act(player_id, PlayerActionKind::DoubleDown)
    }

    pub fn act(&self, player_id: PlayerId, kind: PlayerActionKind) -> Result<ActionReport, EngineError> {
        self.with_state(|state, fx| self.act_locked(state, fx, player_id, kind))
    }

    /// Срабатывание отложенной задачи. Устаревшие (отменённые, перевзведённые) игнорируются.
    pub fn on_timer(&self, kind: TimerKind, generation: u64) {
        let result = self.with_state(|state, fx| {
            if !state.timers.fire(self.timer_key(kind), generation) {
                tracing::debug!(table = self.id, ?kind, generation, "stale timer ignored");
                return Ok(());
            }
            match kind {
                TimerKind::AutoStart => self.auto_start_locked(state, fx),
                TimerKind::Reset => {
                    if state.table.phase != TablePhase::ResetPending {
                        return Ok(());
                    }
                    self.reset_locked(state, fx);
                    self.rearm_if_ready(state, fx);
                    Ok(())
                }
            }
        });

        match result {
            Ok(()) | Err(EngineError::TableClosed) => {}
            Err(e) => tracing::warn!(table = self.id, ?kind, error = %e, "timer task failed"),
        }
    }

    /// Закрыть стол: снять всех (возврат/форфейт по фазе), отменить таймеры.
    /// Повторный вызов ничего не делает.
    pub fn close(&self) -> Vec<LeaveReport> {
        self.with_state(|state, fx| {
            let mut reports = Vec::new();
            for player_id in state.table.seated_players() {
                match self.leave_locked(state, fx, player_id, LeaveReason::TableRemoved) {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        tracing::warn!(table = self.id, player = player_id, error = %e, "failed to unseat on close")
                    }
                }
            }
            state.timers.cancel_all();
            state.closed = true;
            tracing::info!(table = self.id, unseated = reports.len(), "table closed");
            Ok(reports)
        })
        .unwrap_or_default()
    }

    /// Остановка стола. Таймеры снимаются всегда.
    ///
    /// Стол вне раунда возвращает открытые ставки и закрывается в той же
    /// критической секции, так что поздний `start_game` уже не раздаст карты.
    /// Стол посреди раунда ставки не трогает (они в `skipped`) и остаётся
    /// открытым, чтобы раунд доиграли и рассчитали.
    pub fn shutdown(&self) -> RefundReport {
        self.with_state(|state, _fx| {
            state.timers.cancel_all();

            let ledger = &self.ctx.ledger;
            let mut report = RefundReport::default();
            let staked: Vec<PlayerId> = state
                .table
                .seated_players()
                .into_iter()
                .filter(|&p| !ledger.wager_of(p).is_zero())
                .collect();

            if state.table.phase.is_mid_game() {
                report.skipped = staked;
                return Ok(report);
            }

            for player_id in staked {
                match ledger.refund(player_id) {
                    Ok(amount) => report.refunded.push((player_id, amount)),
                    Err(e) => {
                        tracing::warn!(table = self.id, player = player_id, error = %e, "refund failed on shutdown");
                        report.failed.push(player_id);
                    }
                }
            }
            state.closed = true;
            tracing::info!(table = self.id, refunded = report.refunded.len(), "table shut down");
            Ok(report)
        })
        .unwrap_or_default()
    }

    // ---------- внутренности ----------

    fn with_state<T>(
        &self,
        op: impl FnOnce(&mut SessionState, &mut Effects) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut fx = Effects::default();
        let result = {
            let mut state = self.state.lock();
            if state.closed {
                Err(EngineError::TableClosed)
            } else {
                op(&mut *state, &mut fx)
            }
        };
        self.flush(fx);
        result
    }

    /// Отдать накопленное хосту. Вызывается строго без блокировки состояния.
    fn flush(&self, fx: Effects) {
        let Effects { events, timers } = fx;

        if !events.is_empty() {
            let port = Arc::clone(&self.ctx.presentation);
            self.ctx.host.schedule_on_main_loop(Box::new(move || {
                for event in &events {
                    dispatch(port.as_ref(), event);
                }
            }));
        }

        for timer in timers {
            let session = self.this.clone();
            let PendingTimer {
                kind,
                token,
                generation,
                delay,
            } = timer;
            self.ctx.host.schedule_delayed(
                Box::new(move || {
                    if let Some(session) = session.upgrade() {
                        session.on_timer(kind, generation);
                    }
                }),
                delay,
                token,
            );
        }
    }

    fn timer_key(&self, kind: TimerKind) -> TimerKey {
        TimerKey {
            table_id: self.id,
            kind,
        }
    }

    fn arm(&self, state: &mut SessionState, fx: &mut Effects, kind: TimerKind, delay: Duration) {
        let (token, generation) = state.timers.arm(self.timer_key(kind));
        tracing::debug!(table = self.id, ?kind, generation, delay_ms = delay.as_millis() as u64, "timer armed");
        fx.timers.push(PendingTimer {
            kind,
            token,
            generation,
            delay,
        });
    }

    fn check_distance(&self, player_id: PlayerId) -> Result<(), EngineError> {
        let distance = self
            .distance_of(player_id)
            .ok_or(EngineError::PositionUnknown(player_id))?;
        let max = self.config.max_join_distance;
        if distance > max {
            return Err(EngineError::TooFar { distance, max });
        }
        Ok(())
    }

    fn add_locked(
        &self,
        state: &mut SessionState,
        fx: &mut Effects,
        player_id: PlayerId,
        desired_seat: Option<SeatIndex>,
    ) -> Result<SeatIndex, EngineError> {
        if state.table.is_seated(player_id) || self.ctx.index.table_of(player_id).is_some() {
            return Err(EngineError::AlreadySeated(player_id));
        }
        if state.table.is_full() {
            return Err(EngineError::TableFull);
        }
        if state.table.phase.is_mid_game() {
            return Err(EngineError::GameInProgress);
        }
        self.check_distance(player_id)?;
        let seat = game_loop::choose_seat(&state.table, desired_seat)?;

        if !self.ctx.index.try_claim(player_id, self.id) {
            return Err(EngineError::AlreadySeated(player_id));
        }
        if let Err(e) = game_loop::seat_player(&mut state.table, &mut state.round, player_id, seat) {
            self.ctx.index.release(player_id, self.id);
            return Err(e);
        }

        tracing::info!(table = self.id, player = player_id, seat, "player seated");
        fx.events.push(PresentationEvent::SeatAssigned {
            table_id: self.id,
            player_id,
            seat,
        });
        fx.message(self.id, TableMessage::PlayerJoined { player_id, seat });
        Ok(seat)
    }

    fn remove_locked(
        &self,
        state: &mut SessionState,
        fx: &mut Effects,
        player_id: PlayerId,
        reason: LeaveReason,
    ) -> Result<Departure, EngineError> {
        let phase_at_removal = state.table.phase;
        let unseated = game_loop::unseat_player(&mut state.table, &mut state.round, player_id)?;
        self.ctx.index.release(player_id, self.id);

        tracing::info!(table = self.id, player = player_id, ?reason, "player left");
        fx.message(self.id, TableMessage::PlayerLeft { player_id, reason });

        let mut summary = None;
        if unseated.in_round {
            // Уход на своём ходу = неявный stand.
            let advanced = if unseated.was_current {
                game_loop::advance_turn(&mut state.table, &mut state.round).map(|_| ())
            } else {
                Ok(())
            };
            summary = match advanced {
                Ok(()) => self.after_turn_change(state, fx),
                Err(e) => Some(self.abort_locked(state, fx, &e)),
            };
        } else if state.table.seated_count() == 0 {
            state.timers.cancel(self.timer_key(TimerKind::AutoStart));
        }

        Ok(Departure {
            player_id,
            seat: unseated.seat,
            phase_at_removal,
            summary,
        })
    }

    fn leave_locked(
        &self,
        state: &mut SessionState,
        fx: &mut Effects,
        player_id: PlayerId,
        reason: LeaveReason,
    ) -> Result<LeaveReport, EngineError> {
        let departure = self.remove_locked(state, fx, player_id, reason)?;
        let ledger = &self.ctx.ledger;

        let wager = if departure.phase_at_removal == TablePhase::InProgress {
            match ledger.remove_participant(player_id) {
                Some(w) if !w.amount.is_zero() => {
                    tracing::warn!(table = self.id, player = player_id, amount = w.amount.0, "wager forfeited");
                    WagerDisposition::Forfeited(w.amount)
                }
                _ => WagerDisposition::NoWager,
            }
        } else {
            let open = ledger.wager_of(player_id);
            match ledger.refund(player_id) {
                Ok(amount) if amount.is_zero() => WagerDisposition::NoWager,
                Ok(amount) => WagerDisposition::Refunded(amount),
                Err(_) => {
                    ledger.remove_remembered(player_id);
                    WagerDisposition::RefundFailed(open)
                }
            }
        };

        Ok(LeaveReport {
            table_id: self.id,
            departure,
            wager,
        })
    }

    fn wager_locked(
        &self,
        state: &mut SessionState,
        fx: &mut Effects,
        player_id: PlayerId,
        amount: Option<Chips>,
    ) -> Result<WagerChange, EngineError> {
        if !state.table.is_seated(player_id) {
            return Err(EngineError::PlayerNotAtTable(player_id));
        }
        if state.table.phase.is_mid_game() {
            return Err(EngineError::GameInProgress);
        }

        let change = match amount {
            Some(amount) => self.ctx.ledger.set_wager(player_id, amount, &self.config)?,
            None => self.ctx.ledger.repeat_wager(player_id, &self.config)?,
        };
        fx.message(
            self.id,
            TableMessage::WagerPlaced {
                player_id,
                amount: change.current,
            },
        );

        let auto_start = self.timer_key(TimerKind::AutoStart);
        if change.first_bet && !state.timers.is_armed(auto_start) {
            self.arm(state, fx, TimerKind::AutoStart, self.ctx.timing.auto_start_delay());
        }
        Ok(change)
    }

    fn start_locked(&self, state: &mut SessionState, fx: &mut Effects) -> Result<u64, EngineError> {
        if state.table.phase.is_mid_game() {
            return Err(EngineError::GameInProgress);
        }

        let ledger = &self.ctx.ledger;
        if state.table.phase == TablePhase::ResetPending {
            game_loop::check_ready(&state.table, |p| ledger.wager_of(p))?;
            state.timers.cancel(self.timer_key(TimerKind::Reset));
            self.reset_locked(state, fx);
        }

        game_loop::start_round(&mut state.table, &mut state.round, |p| ledger.wager_of(p))?;
        state.timers.cancel(self.timer_key(TimerKind::AutoStart));

        let round = state.round.round;
        tracing::info!(
            table = self.id,
            round,
            players = state.round.turn_order.len(),
            "round started"
        );

        fx.message(self.id, TableMessage::RoundStarted { round });
        for (&player_id, hand) in &state.round.hands {
            fx.events.push(PresentationEvent::HandChanged {
                table_id: self.id,
                player_id,
                hand: hand.clone(),
                value: compute_value(hand),
            });
        }
        fx.events.push(PresentationEvent::DealerHandChanged {
            table_id: self.id,
            hand: state.round.dealer_hand.clone(),
            reveal_hole_card: false,
        });
        self.notify_turn(state, fx);
        Ok(round)
    }

    fn act_locked(
        &self,
        state: &mut SessionState,
        fx: &mut Effects,
        player_id: PlayerId,
        kind: PlayerActionKind,
    ) -> Result<ActionReport, EngineError> {
        let result = match kind {
            PlayerActionKind::Hit => game_loop::hit(&mut state.table, &mut state.round, player_id),
            PlayerActionKind::Stand => game_loop::stand(&mut state.table, &mut state.round, player_id),
            PlayerActionKind::DoubleDown => {
                validate_double_down(&state.table, &state.round, player_id)?;
                let wager = self.ctx.ledger.double_wager(player_id)?;
                fx.message(self.id, TableMessage::PlayerDoubled { player_id, wager });
                game_loop::double_down(&mut state.table, &mut state.round, player_id)
            }
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) if e.kind() == ErrorKind::InternalInvariant => {
                self.abort_locked(state, fx, &e);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(
            table = self.id,
            player = player_id,
            action = ?kind,
            value = outcome.hand_value,
            "player acted"
        );

        if let Some(hand) = state.round.hand(player_id) {
            fx.events.push(PresentationEvent::HandChanged {
                table_id: self.id,
                player_id,
                hand: hand.clone(),
                value: outcome.hand_value,
            });
        }
        if state.round.hand(player_id).map(is_busted).unwrap_or(false) {
            fx.message(self.id, TableMessage::PlayerBusted { player_id });
        }

        let summary = self.after_turn_change(state, fx);
        Ok(ActionReport {
            action: kind,
            outcome,
            summary,
        })
    }

    /// После смены очереди: рассчитать раунд, если все закончили, иначе показать, чей ход.
    fn after_turn_change(&self, state: &mut SessionState, fx: &mut Effects) -> Option<RoundSummary> {
        if state.table.phase == TablePhase::InProgress && state.table.seated_count() == 0 {
            tracing::info!(table = self.id, "last player left mid-round, forcing settlement");
            game_loop::begin_settling(&mut state.table, &mut state.round);
        }

        match state.table.phase {
            TablePhase::Settling => Some(self.settle_locked(state, fx, false)),
            TablePhase::InProgress => {
                self.notify_turn(state, fx);
                None
            }
            _ => None,
        }
    }

    fn notify_turn(&self, state: &SessionState, fx: &mut Effects) {
        let player_id = state.round.current_turn;
        let actions = player_id
            .map(|p| available_actions(&state.round, p))
            .unwrap_or_default();
        fx.events.push(PresentationEvent::TurnChanged {
            table_id: self.id,
            player_id,
            actions,
        });
    }

    /// Сломан внутренний инвариант: прерываем раунд и рассчитываем текущие руки.
    fn abort_locked(&self, state: &mut SessionState, fx: &mut Effects, error: &EngineError) -> RoundSummary {
        tracing::error!(
            table = self.id,
            round = state.round.round,
            error = %error,
            "internal invariant violated, aborting round"
        );
        state.round.history.push(RoundEventKind::RoundAborted {
            reason: error.to_string(),
        });
        fx.message(self.id, TableMessage::RoundAborted);
        game_loop::begin_settling(&mut state.table, &mut state.round);
        self.settle_locked(state, fx, true)
    }

    fn settle_locked(&self, state: &mut SessionState, fx: &mut Effects, aborted: bool) -> RoundSummary {
        let summary = settle_round(
            &mut state.table,
            &mut state.round,
            &self.ctx.ledger,
            self.ctx.stats.as_ref(),
            aborted,
        );

        fx.events.push(PresentationEvent::DealerHandChanged {
            table_id: self.id,
            hand: summary.dealer_hand.clone(),
            reveal_hole_card: true,
        });
        fx.events.push(PresentationEvent::TurnChanged {
            table_id: self.id,
            player_id: None,
            actions: Vec::new(),
        });
        for result in &summary.results {
            fx.message(
                self.id,
                TableMessage::Settled {
                    player_id: result.player_id,
                    outcome: result.outcome,
                    payout: result.payout,
                },
            );
            if result.payout_failed {
                fx.message(
                    self.id,
                    TableMessage::PayoutFailed {
                        player_id: result.player_id,
                    },
                );
            }
        }

        self.arm(state, fx, TimerKind::Reset, self.ctx.timing.reset_delay());
        state.last_summary = Some(summary.clone());
        summary
    }

    fn reset_locked(&self, state: &mut SessionState, fx: &mut Effects) {
        game_loop::reset_round(&mut state.table, &mut state.round);
        tracing::debug!(table = self.id, "table reset");

        fx.message(self.id, TableMessage::TableReset);
        fx.events.push(PresentationEvent::DealerHandChanged {
            table_id: self.id,
            hand: Hand::new(),
            reveal_hole_card: false,
        });
        for player_id in state.table.seated_players() {
            fx.events.push(PresentationEvent::HandChanged {
                table_id: self.id,
                player_id,
                hand: Hand::new(),
                value: 0,
            });
        }
    }

    fn auto_start_locked(&self, state: &mut SessionState, fx: &mut Effects) -> Result<(), EngineError> {
        if state.table.phase != TablePhase::Idle {
            tracing::debug!(table = self.id, phase = ?state.table.phase, "auto-start skipped");
            return Ok(());
        }

        let ledger = &self.ctx.ledger;
        match game_loop::check_ready(&state.table, |p| ledger.wager_of(p)) {
            Ok(_) => self.start_locked(state, fx).map(|_| ()),
            Err(EngineError::MissingWagers(missing)) => {
                fx.message(self.id, TableMessage::WaitingForWagers { missing });
                Ok(())
            }
            Err(EngineError::NoPlayers) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// После очистки: если у всех сидящих уже есть ставка, снова взводим авто-старт.
    fn rearm_if_ready(&self, state: &mut SessionState, fx: &mut Effects) {
        let ledger = &self.ctx.ledger;
        if game_loop::check_ready(&state.table, |p| ledger.wager_of(p)).is_ok() {
            self.arm(state, fx, TimerKind::AutoStart, self.ctx.timing.auto_start_delay());
        }
    }
}

impl std::fmt::Debug for TableSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSession")
            .field("id", &self.id)
            .field("anchor", &self.anchor)
            .finish()
    }
}
