//! Расчёт раунда: добор дилера, исходы, выплаты через леджер ставок, статистика.

use crate::domain::hand::{PlayerRoundResult, RoundSummary};
use crate::domain::table::{Table, TablePhase};
use crate::engine::game_loop::{play_dealer, RoundEngine};
use crate::engine::hand_history::RoundEventKind;
use crate::engine::wager_ledger::WagerLedger;
use crate::eval::{determine_outcome, is_blackjack, is_busted};
use crate::infra::ports::StatsSink;

/// Рассчитать раунд. Стол должен быть в `Settling`; на выходе: `ResetPending`.
///
/// Рассчитываются только те из очереди ходов, кто всё ещё сидит за столом:
/// ушедшие посреди раунда считаются уже снятыми.
pub fn settle_round(
    table: &mut Table,
    round: &mut RoundEngine,
    ledger: &WagerLedger,
    stats: &dyn StatsSink,
    aborted: bool,
) -> RoundSummary {
    let dealer_draws = play_dealer(table, round);
    tracing::debug!(
        table = table.id,
        round = round.round,
        draws = dealer_draws.len(),
        "dealer finished drawing"
    );

    let dealer_hand = round.dealer_hand.clone();
    let participants: Vec<_> = round
        .turn_order
        .iter()
        .copied()
        .filter(|&p| table.is_seated(p))
        .collect();

    let mut results = Vec::with_capacity(participants.len());
    for player_id in participants {
        let hand = round.hand(player_id).cloned().unwrap_or_default();
        let outcome = determine_outcome(&hand, &dealer_hand);
        let settled = ledger.settle(player_id, outcome);

        let mut player_stats = stats.load(player_id);
        if outcome.is_player_win() {
            player_stats.record_win(settled.payout.saturating_sub(settled.stake));
        } else if outcome.is_player_loss() {
            player_stats.record_loss(settled.stake);
        } else {
            player_stats.record_push();
        }
        if is_blackjack(&hand) {
            player_stats.blackjacks += 1;
        }
        if is_busted(&hand) {
            player_stats.busts += 1;
        }
        stats.save(player_id, &player_stats);

        round.history.push(RoundEventKind::PlayerSettled {
            player_id,
            outcome,
            payout: settled.payout,
        });

        results.push(PlayerRoundResult {
            player_id,
            hand,
            outcome,
            stake: settled.stake,
            payout: settled.payout,
            payout_failed: !settled.credited,
        });
    }

    round.history.push(RoundEventKind::RoundFinished {
        table_id: table.id,
        round: round.round,
    });
    table.phase = TablePhase::ResetPending;

    tracing::info!(
        table = table.id,
        round = round.round,
        settled = results.len(),
        aborted,
        "round settled"
    );

    RoundSummary {
        table_id: table.id,
        round: round.round,
        dealer_hand,
        results,
        aborted,
    }
}
