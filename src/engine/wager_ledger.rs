use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::domain::chips::Chips;
use crate::domain::hand::Outcome;
use crate::domain::table::TableConfig;
use crate::domain::PlayerId;
use crate::engine::errors::{LedgerOp, WagerError};
use crate::infra::ports::CurrencyLedger;
use crate::time_ctrl::Clock;

/// Ставка игрока.
///
/// `amount` всегда равен тому, что реально списано с внешнего леджера
/// и ещё не возвращено.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Wager {
    pub amount: Chips,
    /// Последняя поставленная сумма, для «повторить ставку».
    pub remembered: Chips,
    pub last_mutation: Option<Instant>,
}

/// Что изменилось после `set_wager`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WagerChange {
    pub previous: Chips,
    pub current: Chips,
    /// Первая ненулевая ставка игрока (повод взвести авто-старт).
    pub first_bet: bool,
}

/// Итог расчёта одной ставки.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettledWager {
    pub stake: Chips,
    pub payout: Chips,
    /// false: леджер не принял зачисление, ставка осталась открытой.
    pub credited: bool,
}

/// Итог массового возврата ставок.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefundReport {
    pub refunded: Vec<(PlayerId, Chips)>,
    pub failed: Vec<PlayerId>,
    /// Пропущены: их стол посреди раунда.
    pub skipped: Vec<PlayerId>,
}

/// Учёт ставок поверх внешнего леджера.
///
/// Любая мутация идёт по схеме «сначала внешний вызов, потом коммит»:
/// если леджер ответил отказом, состояние ставки не меняется.
pub struct WagerLedger {
    currency: Arc<dyn CurrencyLedger>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    wagers: Mutex<HashMap<PlayerId, Wager>>,
}

impl WagerLedger {
    pub fn new(currency: Arc<dyn CurrencyLedger>, clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            currency,
            clock,
            cooldown,
            wagers: Mutex::new(HashMap::new()),
        }
    }

    pub fn currency(&self) -> &Arc<dyn CurrencyLedger> {
        &self.currency
    }

    /// Поставить / изменить ставку.
    pub fn set_wager(
        &self,
        player_id: PlayerId,
        amount: Chips,
        config: &TableConfig,
    ) -> Result<WagerChange, WagerError> {
        if !config.accepts_bet(amount) {
            return Err(WagerError::InvalidAmount {
                amount,
                min: config.min_bet,
                max: config.max_bet,
            });
        }

        let now = self.clock.now();
        let mut wagers = self.wagers.lock();
        let current = wagers.get(&player_id).copied().unwrap_or_default();

        if let Some(last) = current.last_mutation {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                let remaining = self.cooldown - elapsed;
                return Err(WagerError::CooldownActive {
                    remaining_ms: remaining.as_millis() as u64,
                });
            }
        }

        // Баланс сверяется с полной суммой ставки, а не с разницей.
        if !self.currency.has_at_least(player_id, amount) {
            return Err(WagerError::InsufficientFunds { required: amount });
        }

        if amount == current.amount {
            return Err(WagerError::AlreadySet(amount));
        }

        if amount > current.amount {
            let delta = amount - current.amount;
            if !self.currency.debit(player_id, delta) {
                tracing::warn!(player = player_id, amount = delta.0, "wager debit rejected");
                return Err(WagerError::OperationFailed(LedgerOp::Debit));
            }
        } else {
            let delta = current.amount - amount;
            if !self.currency.credit(player_id, delta) {
                tracing::warn!(player = player_id, amount = delta.0, "wager credit rejected");
                return Err(WagerError::OperationFailed(LedgerOp::Credit));
            }
        }

        wagers.insert(
            player_id,
            Wager {
                amount,
                remembered: amount,
                last_mutation: Some(now),
            },
        );

        tracing::debug!(player = player_id, from = current.amount.0, to = amount.0, "wager set");

        Ok(WagerChange {
            previous: current.amount,
            current: amount,
            first_bet: current.amount.is_zero(),
        })
    }

    /// Повторить последнюю ставку.
    pub fn repeat_wager(
        &self,
        player_id: PlayerId,
        config: &TableConfig,
    ) -> Result<WagerChange, WagerError> {
        let remembered = self.remembered_of(player_id);
        if remembered.is_zero() {
            return Err(WagerError::NothingToRepeat);
        }
        self.set_wager(player_id, remembered, config)
    }

    /// Удвоить открытую ставку (дабл). Лимиты и кулдаун здесь не действуют.
    /// Возвращает новую сумму ставки.
    pub fn double_wager(&self, player_id: PlayerId) -> Result<Chips, WagerError> {
        let mut wagers = self.wagers.lock();
        let wager = match wagers.get_mut(&player_id) {
            Some(w) if !w.amount.is_zero() => w,
            _ => return Err(WagerError::NoOpenWager(player_id)),
        };

        let extra = wager.amount;
        if !self.currency.has_at_least(player_id, extra) {
            return Err(WagerError::InsufficientFunds { required: extra });
        }
        if !self.currency.debit(player_id, extra) {
            tracing::warn!(player = player_id, amount = extra.0, "double-down debit rejected");
            return Err(WagerError::OperationFailed(LedgerOp::Debit));
        }

        wager.amount += extra;
        Ok(wager.amount)
    }

    /// Рассчитать ставку по исходу: зачислить ставка × коэффициент и закрыть её.
    /// Коэффициент 0 ничего не зачисляет: ставка уже списана при ставке.
    pub fn settle(&self, player_id: PlayerId, outcome: Outcome) -> SettledWager {
        let mut wagers = self.wagers.lock();
        let stake = wagers.get(&player_id).map(|w| w.amount).unwrap_or_default();
        let payout = outcome.payout(stake);

        if !payout.is_zero() && !self.currency.credit(player_id, payout) {
            tracing::error!(
                player = player_id,
                stake = stake.0,
                payout = payout.0,
                "payout credit rejected, stake stays open"
            );
            return SettledWager {
                stake,
                payout,
                credited: false,
            };
        }

        if let Some(w) = wagers.get_mut(&player_id) {
            w.amount = Chips::ZERO;
        }

        SettledWager {
            stake,
            payout,
            credited: true,
        }
    }

    /// Вернуть ставку целиком и забыть игрока.
    /// При отказе леджера ставка остаётся как была.
    pub fn refund(&self, player_id: PlayerId) -> Result<Chips, WagerError> {
        let mut wagers = self.wagers.lock();
        let amount = wagers.get(&player_id).map(|w| w.amount).unwrap_or_default();

        if !amount.is_zero() && !self.currency.credit(player_id, amount) {
            tracing::warn!(player = player_id, amount = amount.0, "refund credit rejected");
            return Err(WagerError::OperationFailed(LedgerOp::Credit));
        }

        wagers.remove(&player_id);
        Ok(amount)
    }

    /// Вернуть все открытые ставки, кроме тех, для кого `skip` вернул true
    /// (на shutdown: игроки, чьи ставки разбирает их стол).
    pub fn refund_all(&self, skip: impl Fn(PlayerId) -> bool) -> RefundReport {
        let players: Vec<PlayerId> = {
            let wagers = self.wagers.lock();
            wagers
                .iter()
                .filter(|(_, w)| !w.amount.is_zero())
                .map(|(p, _)| *p)
                .collect()
        };

        let mut report = RefundReport::default();
        for player_id in players {
            if skip(player_id) {
                report.skipped.push(player_id);
                continue;
            }
            match self.refund(player_id) {
                Ok(amount) => report.refunded.push((player_id, amount)),
                Err(_) => report.failed.push(player_id),
            }
        }

        if !report.failed.is_empty() || !report.skipped.is_empty() {
            tracing::warn!(
                failed = report.failed.len(),
                skipped = report.skipped.len(),
                "not every wager was refunded"
            );
        }
        report
    }

    /// Стереть всё по игроку без возврата денег (форфейт).
    pub fn remove_participant(&self, player_id: PlayerId) -> Option<Wager> {
        self.wagers.lock().remove(&player_id)
    }

    /// Забыть только запомненную ставку.
    pub fn remove_remembered(&self, player_id: PlayerId) {
        if let Some(w) = self.wagers.lock().get_mut(&player_id) {
            w.remembered = Chips::ZERO;
        }
    }

    pub fn get(&self, player_id: PlayerId) -> Option<Wager> {
        self.wagers.lock().get(&player_id).copied()
    }

    pub fn wager_of(&self, player_id: PlayerId) -> Chips {
        self.get(player_id).map(|w| w.amount).unwrap_or_default()
    }

    pub fn remembered_of(&self, player_id: PlayerId) -> Chips {
        self.get(player_id).map(|w| w.remembered).unwrap_or_default()
    }

    /// Сколько всего денег сейчас в эскроу.
    pub fn total_escrowed(&self) -> Chips {
        self.wagers
            .lock()
            .values()
            .fold(Chips::ZERO, |acc, w| acc + w.amount)
    }
}
