use std::collections::{BTreeMap, HashSet};

use crate::domain::card::Card;
use crate::domain::chips::Chips;
use crate::domain::hand::Hand;
use crate::domain::table::{SeatIndex, Table, TablePhase};
use crate::domain::{PlayerId, TableId};
use crate::engine::actions::PlayerActionKind;
use crate::engine::errors::EngineError;
use crate::engine::hand_history::{RoundEventKind, RoundHistory};
use crate::engine::positions::{lowest_free_seat, next_unfinished, TurnScan};
use crate::engine::shoe::Shoe;
use crate::engine::validation::validate_turn;
use crate::eval::evaluator::BLACKJACK;
use crate::eval::{compute_value, dealer_should_hit};

/// Состояние очереди ходов после действия.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnStatus {
    /// Кто-то ещё должен ходить (`current_turn` выставлен).
    Ongoing,
    /// Все закончили: стол перешёл в `Settling`.
    AllFinished,
}

/// Что произошло после действия игрока.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Карта, которую взял игрок (None для stand).
    pub card: Option<Card>,
    pub hand_value: u8,
    /// Ход игрока закончен (stand, перебор, 21, дабл).
    pub player_finished: bool,
    pub status: TurnStatus,
}

/// Что произошло при снятии игрока с места.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unseated {
    pub seat: SeatIndex,
    /// Игрок был в очереди текущего раунда.
    pub in_round: bool,
    /// И как раз был его ход.
    pub was_current: bool,
}

/// Внутреннее состояние раунда: руки, шуз, очередь ходов.
pub struct RoundEngine {
    pub table_id: TableId,
    /// Номер раунда за этим столом (растёт на каждом старте).
    pub round: u64,
    /// Руки всех сидящих игроков. Ключи = сидящие игроки.
    pub hands: BTreeMap<PlayerId, Hand>,
    pub dealer_hand: Hand,
    /// Снимок порядка мест на момент раздачи.
    pub turn_order: Vec<PlayerId>,
    pub current_turn: Option<PlayerId>,
    pub finished: HashSet<PlayerId>,
    pub doubled: HashSet<PlayerId>,
    pub shoe: Shoe,
    pub history: RoundHistory,
}

impl RoundEngine {
    pub fn new(table_id: TableId, shoe: Shoe) -> Self {
        Self {
            table_id,
            round: 0,
            hands: BTreeMap::new(),
            dealer_hand: Hand::new(),
            turn_order: Vec::new(),
            current_turn: None,
            finished: HashSet::new(),
            doubled: HashSet::new(),
            shoe,
            history: RoundHistory::new(),
        }
    }

    pub fn hand(&self, player_id: PlayerId) -> Option<&Hand> {
        self.hands.get(&player_id)
    }

    pub fn is_finished(&self, player_id: PlayerId) -> bool {
        self.finished.contains(&player_id)
    }

    fn draw_for(&mut self, player_id: PlayerId) -> Result<(Card, u8), EngineError> {
        let card = self.shoe.draw();
        let hand = self
            .hands
            .get_mut(&player_id)
            .ok_or(EngineError::Internal("seated player has no hand"))?;
        hand.push(card);
        let value = compute_value(hand);
        self.history.push(RoundEventKind::CardDealt { player_id, card });
        Ok((card, value))
    }

    fn draw_for_dealer(&mut self, hole: bool) -> Card {
        let card = self.shoe.draw();
        self.dealer_hand.push(card);
        self.history.push(RoundEventKind::DealerCardDealt { card, hole });
        card
    }
}

/// Выбрать место: запрошенное (если свободно) или самое младшее свободное.
pub fn choose_seat(table: &Table, desired: Option<SeatIndex>) -> Result<SeatIndex, EngineError> {
    match desired {
        Some(seat) => {
            if seat >= table.max_seats() {
                return Err(EngineError::InvalidSeat(seat));
            }
            if !table.is_seat_empty(seat) {
                return Err(EngineError::SeatTaken(seat));
            }
            Ok(seat)
        }
        None => lowest_free_seat(table).ok_or(EngineError::NoFreeSeat),
    }
}

/// Посадить игрока на выбранное место и завести ему пустую руку.
pub fn seat_player(
    table: &mut Table,
    round: &mut RoundEngine,
    player_id: PlayerId,
    seat: SeatIndex,
) -> Result<(), EngineError> {
    let slot = table
        .seats
        .get_mut(seat as usize)
        .ok_or(EngineError::InvalidSeat(seat))?;
    if slot.is_some() {
        return Err(EngineError::SeatTaken(seat));
    }
    *slot = Some(player_id);
    round.hands.insert(player_id, Hand::new());
    Ok(())
}

/// Снять игрока с места. Если он был в очереди раунда: помечаем закончившим,
/// чтобы поиск хода его пропускал. Продвижение хода: забота вызывающего.
pub fn unseat_player(
    table: &mut Table,
    round: &mut RoundEngine,
    player_id: PlayerId,
) -> Result<Unseated, EngineError> {
    let seat = table
        .seat_of(player_id)
        .ok_or(EngineError::PlayerNotAtTable(player_id))?;

    table.seats[seat as usize] = None;
    round.hands.remove(&player_id);
    round.doubled.remove(&player_id);

    let in_round = table.phase == TablePhase::InProgress && round.turn_order.contains(&player_id);
    let was_current = in_round && round.current_turn == Some(player_id);
    if in_round {
        round.finished.insert(player_id);
        round.history.push(RoundEventKind::PlayerRemoved { player_id });
    }

    Ok(Unseated {
        seat,
        in_round,
        was_current,
    })
}

/// Кто-то сидит и у всех есть ставка. Возвращает игроков в порядке мест.
pub fn check_ready(
    table: &Table,
    wager_of: impl Fn(PlayerId) -> Chips,
) -> Result<Vec<PlayerId>, EngineError> {
    let seated = table.seated_players();
    if seated.is_empty() {
        return Err(EngineError::NoPlayers);
    }

    let missing: Vec<PlayerId> = seated
        .iter()
        .copied()
        .filter(|&p| wager_of(p).is_zero())
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::MissingWagers(missing));
    }
    Ok(seated)
}

/// Старт нового раунда:
/// - свежий шуз;
/// - по 2 карты каждому сидящему в порядке мест, затем 2 дилеру (вторая закрыта);
/// - снимок очереди ходов, первый ход: первому по месту.
pub fn start_round(
    table: &mut Table,
    round: &mut RoundEngine,
    wager_of: impl Fn(PlayerId) -> Chips,
) -> Result<(), EngineError> {
    if table.phase != TablePhase::Idle {
        return Err(EngineError::GameInProgress);
    }

    let seated = check_ready(table, wager_of)?;

    round.round += 1;
    round.history.clear();
    round.history.push(RoundEventKind::RoundStarted {
        table_id: table.id,
        round: round.round,
    });

    round.shoe.initialize();
    round.hands.clear();
    round.dealer_hand.clear();
    round.finished.clear();
    round.doubled.clear();

    for &player_id in &seated {
        round.hands.insert(player_id, Hand::new());
        round.draw_for(player_id)?;
        round.draw_for(player_id)?;
    }
    round.draw_for_dealer(false);
    round.draw_for_dealer(true);

    round.current_turn = seated.first().copied();
    round.turn_order = seated;
    if let Some(player_id) = round.current_turn {
        round.history.push(RoundEventKind::TurnChanged { player_id });
    }

    table.phase = TablePhase::InProgress;
    Ok(())
}

/// Hit: взять карту. На переборе или 21 ход игрока заканчивается.
pub fn hit(
    table: &mut Table,
    round: &mut RoundEngine,
    player_id: PlayerId,
) -> Result<ActionOutcome, EngineError> {
    validate_turn(table, round, player_id)?;

    let (card, hand_value) = round.draw_for(player_id)?;
    round.history.push(RoundEventKind::PlayerActed {
        player_id,
        action: PlayerActionKind::Hit,
        hand_value,
    });

    if hand_value >= BLACKJACK {
        round.finished.insert(player_id);
        let status = advance_turn(table, round)?;
        return Ok(ActionOutcome {
            card: Some(card),
            hand_value,
            player_finished: true,
            status,
        });
    }

    Ok(ActionOutcome {
        card: Some(card),
        hand_value,
        player_finished: false,
        status: TurnStatus::Ongoing,
    })
}

/// Stand: закончить ход.
pub fn stand(
    table: &mut Table,
    round: &mut RoundEngine,
    player_id: PlayerId,
) -> Result<ActionOutcome, EngineError> {
    validate_turn(table, round, player_id)?;

    let hand_value = round.hand(player_id).map(compute_value).unwrap_or(0);
    round.finished.insert(player_id);
    round.history.push(RoundEventKind::PlayerActed {
        player_id,
        action: PlayerActionKind::Stand,
        hand_value,
    });

    let status = advance_turn(table, round)?;
    Ok(ActionOutcome {
        card: None,
        hand_value,
        player_finished: true,
        status,
    })
}

/// Карточная часть дабла: ровно одна карта и ход закончен, даже при переборе.
/// Проверки и удвоение ставки делает сессия до вызова.
pub fn double_down(
    table: &mut Table,
    round: &mut RoundEngine,
    player_id: PlayerId,
) -> Result<ActionOutcome, EngineError> {
    validate_turn(table, round, player_id)?;

    round.doubled.insert(player_id);
    let (card, hand_value) = round.draw_for(player_id)?;
    round.finished.insert(player_id);
    round.history.push(RoundEventKind::PlayerActed {
        player_id,
        action: PlayerActionKind::DoubleDown,
        hand_value,
    });

    let status = advance_turn(table, round)?;
    Ok(ActionOutcome {
        card: Some(card),
        hand_value,
        player_finished: true,
        status,
    })
}

/// Передать ход следующему незакончившему игроку (по кругу, не больше |turn_order| проб).
/// Если закончили все: стол уходит в `Settling`, `current_turn` сбрасывается.
pub fn advance_turn(table: &mut Table, round: &mut RoundEngine) -> Result<TurnStatus, EngineError> {
    if table.phase != TablePhase::InProgress {
        return Err(EngineError::NoGameInProgress);
    }

    let start_idx = match round.current_turn {
        Some(current) => round
            .turn_order
            .iter()
            .position(|&p| p == current)
            .ok_or(EngineError::Internal("current turn is not in turn order"))?,
        // Сканируем с начала очереди.
        None => round.turn_order.len().saturating_sub(1),
    };

    match next_unfinished(&round.turn_order, start_idx, &round.finished) {
        TurnScan::Next(player_id) => {
            round.current_turn = Some(player_id);
            round.history.push(RoundEventKind::TurnChanged { player_id });
            Ok(TurnStatus::Ongoing)
        }
        TurnScan::AllFinished => {
            begin_settling(table, round);
            Ok(TurnStatus::AllFinished)
        }
    }
}

/// Перевести стол в `Settling` немедленно (все походили, ушёл последний игрок, сломан инвариант).
pub fn begin_settling(table: &mut Table, round: &mut RoundEngine) {
    round.current_turn = None;
    table.phase = TablePhase::Settling;
}

/// Дилер добирает по правилу стола. Возвращает взятые карты.
pub fn play_dealer(table: &Table, round: &mut RoundEngine) -> Vec<Card> {
    let mut drawn = Vec::new();
    while dealer_should_hit(&round.dealer_hand, table.config.hit_soft_17) {
        drawn.push(round.draw_for_dealer(false));
    }
    drawn
}

/// Отложенная очистка после расчёта: пустые руки, свежий шуз, `Idle`.
pub fn reset_round(table: &mut Table, round: &mut RoundEngine) {
    round.hands = table
        .seated_players()
        .into_iter()
        .map(|p| (p, Hand::new()))
        .collect();
    round.dealer_hand.clear();
    round.turn_order.clear();
    round.current_turn = None;
    round.finished.clear();
    round.doubled.clear();
    round.shoe.initialize();
    table.phase = TablePhase::Idle;
}
