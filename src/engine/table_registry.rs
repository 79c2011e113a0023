// src/engine/table_registry.rs

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::domain::chips::Chips;
use crate::domain::player::LeaveReason;
use crate::domain::table::{Location, SeatIndex, TableConfig};
use crate::domain::{PlayerId, TableId};
use crate::engine::actions::PlayerActionKind;
use crate::engine::errors::{EngineError, ErrorKind};
use crate::engine::player_index::PlayerIndex;
use crate::engine::session::{ActionReport, LeaveReport, SessionContext, TableSession};
use crate::engine::wager_ledger::{RefundReport, WagerChange, WagerLedger};
use crate::engine::RandomSource;
use crate::infra::ids::IdGenerator;
use crate::infra::memory::{InMemoryStatsStore, ManualHost};
use crate::infra::persistence::{
    AnchorStore, InMemoryAnchorStore, JsonAnchorStore, JsonStatsStore, StorageError,
};
use crate::infra::ports::{CurrencyLedger, NullPresentation, PresentationPort, SpatialHost, StatsSink};
use crate::infra::rng::SystemRng;
use crate::time_ctrl::{Clock, SystemClock, TimingConfig};

/// Фабрика RNG для шуза нового стола.
pub type RngFactory = Arc<dyn Fn(TableId) -> Box<dyn RandomSource + Send> + Send + Sync>;

/// Ошибки уровня реестра столов (над сессией одного стола).
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Стол с якорем {0:?} уже существует")]
    TableExists(Location),

    #[error("Стол {0} не найден")]
    TableNotFound(TableId),

    #[error("Игрок {0} не сидит ни за одним столом")]
    NotAtTable(PlayerId),

    #[error("Нет стола с якорем {0:?}")]
    NoTableAt(Location),

    #[error("Рядом нет стола")]
    NoTableInRange,

    #[error("Позиция игрока {0} неизвестна")]
    PositionUnknown(PlayerId),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::TableExists(_)
            | RegistryError::TableNotFound(_)
            | RegistryError::NoTableAt(_)
            | RegistryError::NotAtTable(_)
            | RegistryError::PositionUnknown(_) => ErrorKind::Precondition,
            RegistryError::NoTableInRange => ErrorKind::ResourceExhaustion,
            RegistryError::Engine(e) => e.kind(),
            RegistryError::Storage(_) => ErrorKind::ExternalOperation,
        }
    }
}

/// Внешние зависимости реестра.
#[derive(Clone)]
pub struct Collaborators {
    pub currency: Arc<dyn CurrencyLedger>,
    pub stats: Arc<dyn StatsSink>,
    pub presentation: Arc<dyn PresentationPort>,
    pub host: Arc<dyn SpatialHost>,
    pub clock: Arc<dyn Clock>,
    pub anchors: Arc<dyn AnchorStore>,
    pub rng_factory: RngFactory,
}

impl Collaborators {
    /// Кошелёк и хост обязательны; остальное: in-memory / системное по умолчанию.
    pub fn new(currency: Arc<dyn CurrencyLedger>, host: Arc<dyn SpatialHost>) -> Self {
        Self {
            currency,
            stats: Arc::new(InMemoryStatsStore::new()),
            presentation: Arc::new(NullPresentation),
            host,
            clock: Arc::new(SystemClock),
            anchors: Arc::new(InMemoryAnchorStore::new()),
            rng_factory: Arc::new(|_: TableId| Box::new(SystemRng) as Box<dyn RandomSource + Send>),
        }
    }

    /// Якоря и статистика в JSON-файлах из `[storage]`, остальное как в `new`.
    /// Файл статистики читается сразу; если его ещё нет, статистика пустая.
    pub fn from_config(
        config: &EngineConfig,
        currency: Arc<dyn CurrencyLedger>,
        host: Arc<dyn SpatialHost>,
    ) -> Result<Self, StorageError> {
        let storage = &config.storage;
        let stats = JsonStatsStore::open(&storage.stats_path)?;
        tracing::info!(
            anchors = %storage.anchors_path.display(),
            stats = %storage.stats_path.display(),
            "file storage opened"
        );
        Ok(Self::new(currency, host)
            .with_anchors(Arc::new(JsonAnchorStore::new(&storage.anchors_path)))
            .with_stats(Arc::new(stats)))
    }

    /// Всё в памяти, хост ручной. Для тестов и симуляций.
    pub fn in_memory(currency: Arc<dyn CurrencyLedger>) -> Self {
        Self::new(currency, Arc::new(ManualHost::new()))
    }

    pub fn with_stats(mut self, stats: Arc<dyn StatsSink>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_presentation(mut self, presentation: Arc<dyn PresentationPort>) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_anchors(mut self, anchors: Arc<dyn AnchorStore>) -> Self {
        self.anchors = anchors;
        self
    }

    pub fn with_rng(mut self, rng_factory: RngFactory) -> Self {
        self.rng_factory = rng_factory;
        self
    }
}

/// Реестр столов:
/// - владеет всеми сессиями по TableId;
/// - держит индекс «игрок → стол» (пишут в него только сессии);
/// - маршрутизирует внешние события в нужную сессию.
///
/// Собственные блокировки реестра никогда не держатся во время вызова в сессию.
pub struct TableRegistry {
    table_config: TableConfig,
    timing: TimingConfig,
    tables: RwLock<HashMap<TableId, Arc<TableSession>>>,
    /// Сериализует create/remove вместе с записью якорей.
    mutation: Mutex<()>,
    ids: IdGenerator,
    index: Arc<PlayerIndex>,
    ledger: Arc<WagerLedger>,
    collab: Collaborators,
}

impl TableRegistry {
    pub fn new(config: &EngineConfig, collab: Collaborators) -> Self {
        let ledger = Arc::new(WagerLedger::new(
            Arc::clone(&collab.currency),
            Arc::clone(&collab.clock),
            config.timing.bet_cooldown(),
        ));
        Self {
            table_config: config.table.clone(),
            timing: config.timing.clone(),
            tables: RwLock::new(HashMap::new()),
            mutation: Mutex::new(()),
            ids: IdGenerator::new(),
            index: Arc::new(PlayerIndex::new()),
            ledger,
            collab,
        }
    }

    pub fn ledger(&self) -> &Arc<WagerLedger> {
        &self.ledger
    }

    pub fn index(&self) -> &Arc<PlayerIndex> {
        &self.index
    }

    pub fn table_config(&self) -> &TableConfig {
        &self.table_config
    }

    pub fn stats(&self) -> &Arc<dyn StatsSink> {
        &self.collab.stats
    }

    /// Поднять столы из сохранённых якорей. Возвращает, сколько столов создано.
    pub fn restore(&self) -> Result<usize, RegistryError> {
        let _guard = self.mutation.lock();
        let anchors = self.collab.anchors.load_anchors()?;

        let mut restored = 0;
        for anchor in anchors {
            if self.find_by_anchor(&anchor).is_some() {
                continue;
            }
            self.insert_session(anchor);
            restored += 1;
        }
        tracing::info!(tables = restored, "tables restored from storage");
        Ok(restored)
    }

    /// Создать стол. Якорь должен отличаться от всех существующих (точное совпадение).
    pub fn create(&self, anchor: Location) -> Result<TableId, RegistryError> {
        let _guard = self.mutation.lock();
        if self.find_by_anchor(&anchor).is_some() {
            return Err(RegistryError::TableExists(anchor));
        }

        let mut anchors = self.anchors();
        anchors.push(anchor.clone());
        self.collab.anchors.save_anchors(&anchors)?;

        let id = self.insert_session(anchor);
        tracing::info!(table = id, "table created");
        Ok(id)
    }

    /// Удалить стол: снять всех игроков (возврат/форфейт по фазе), отменить таймеры,
    /// стереть якорь из хранилища.
    pub fn remove(&self, table_id: TableId) -> Result<Vec<LeaveReport>, RegistryError> {
        let _guard = self.mutation.lock();
        if !self.tables.read().contains_key(&table_id) {
            return Err(RegistryError::TableNotFound(table_id));
        }

        let remaining: Vec<Location> = self
            .sorted_sessions()
            .into_iter()
            .filter(|s| s.id() != table_id)
            .map(|s| s.anchor().clone())
            .collect();
        self.collab.anchors.save_anchors(&remaining)?;

        let session = self
            .tables
            .write()
            .remove(&table_id)
            .ok_or(RegistryError::TableNotFound(table_id))?;
        let reports = session.close();
        tracing::info!(table = table_id, unseated = reports.len(), "table removed");
        Ok(reports)
    }

    /// Удалить стол по якорю.
    pub fn remove_at(&self, anchor: &Location) -> Result<Vec<LeaveReport>, RegistryError> {
        let table_id = self
            .find_by_anchor(anchor)
            .ok_or_else(|| RegistryError::NoTableAt(anchor.clone()))?;
        self.remove(table_id)
    }

    /// Ближайший стол в том же регионе не дальше `within`
    /// (по умолчанию: дистанция посадки из конфига).
    pub fn find_nearest(&self, position: &Location, within: Option<f64>) -> Option<TableId> {
        let within = within.unwrap_or(self.table_config.max_join_distance);
        self.tables
            .read()
            .values()
            .filter_map(|s| s.anchor().distance_to(position).map(|d| (s.id(), d)))
            .filter(|&(_, d)| d <= within)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }

    pub fn session(&self, table_id: TableId) -> Option<Arc<TableSession>> {
        self.tables.read().get(&table_id).cloned()
    }

    pub fn table_of(&self, player_id: PlayerId) -> Option<TableId> {
        self.index.table_of(player_id)
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    // ---------- маршрутизация ----------

    pub fn join(
        &self,
        player_id: PlayerId,
        table_id: TableId,
        seat: Option<SeatIndex>,
    ) -> Result<SeatIndex, RegistryError> {
        let session = self
            .session(table_id)
            .ok_or(RegistryError::TableNotFound(table_id))?;
        Ok(session.add_participant(player_id, seat)?)
    }

    /// Сесть за ближайший стол.
    pub fn join_nearest(
        &self,
        player_id: PlayerId,
        seat: Option<SeatIndex>,
    ) -> Result<(TableId, SeatIndex), RegistryError> {
        let position = self
            .collab
            .host
            .current_position(player_id)
            .ok_or(RegistryError::PositionUnknown(player_id))?;
        let table_id = self
            .find_nearest(&position, None)
            .ok_or(RegistryError::NoTableInRange)?;
        let seat = self.join(player_id, table_id, seat)?;
        Ok((table_id, seat))
    }

    pub fn leave(&self, player_id: PlayerId, reason: LeaveReason) -> Result<LeaveReport, RegistryError> {
        let session = self.session_of(player_id)?;
        Ok(session.leave(player_id, reason)?)
    }

    pub fn place_wager(&self, player_id: PlayerId, amount: Chips) -> Result<WagerChange, RegistryError> {
        Ok(self.session_of(player_id)?.place_wager(player_id, amount)?)
    }

    pub fn repeat_wager(&self, player_id: PlayerId) -> Result<WagerChange, RegistryError> {
        Ok(self.session_of(player_id)?.repeat_wager(player_id)?)
    }

    pub fn start_game(&self, table_id: TableId) -> Result<u64, RegistryError> {
        let session = self
            .session(table_id)
            .ok_or(RegistryError::TableNotFound(table_id))?;
        Ok(session.start_game()?)
    }

    pub fn act(&self, player_id: PlayerId, kind: PlayerActionKind) -> Result<ActionReport, RegistryError> {
        Ok(self.session_of(player_id)?.act(player_id, kind)?)
    }

    /// Хост сообщил о перемещении игрока. Ушёл дальше дистанции посадки
    /// (или в другой регион): снимаем с места.
    pub fn on_player_moved(&self, player_id: PlayerId) -> Result<Option<LeaveReport>, RegistryError> {
        let session = match self.session_of(player_id) {
            Ok(s) => s,
            Err(RegistryError::NotAtTable(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let in_range = session
            .distance_of(player_id)
            .map(|d| d <= session.config().max_join_distance)
            .unwrap_or(false);
        if in_range {
            return Ok(None);
        }

        tracing::debug!(table = session.id(), player = player_id, "player moved out of range");
        Ok(Some(session.leave(player_id, LeaveReason::MovedAway)?))
    }

    /// Игрок отключился: на своём ходу это неявный stand.
    pub fn on_disconnect(&self, player_id: PlayerId) -> Option<LeaveReport> {
        match self.leave(player_id, LeaveReason::Disconnected) {
            Ok(report) => Some(report),
            Err(RegistryError::NotAtTable(_)) => None,
            Err(e) => {
                tracing::warn!(player = player_id, error = %e, "failed to unseat disconnected player");
                None
            }
        }
    }

    /// Остановка: каждая сессия снимает таймеры, возвращает ставки и закрывается,
    /// если она не посреди раунда; затем возвращаются ставки игроков, которые
    /// уже ни за каким столом не сидят; статистика сбрасывается на диск.
    ///
    /// Ставки столов посреди раунда не возвращаются: такой стол остаётся открытым
    /// и доигрывает раунд.
    pub fn shutdown(&self) -> RefundReport {
        let sessions = self.sorted_sessions();
        let mut report = RefundReport::default();
        for session in &sessions {
            let part = session.shutdown();
            report.refunded.extend(part.refunded);
            report.failed.extend(part.failed);
            report.skipped.extend(part.skipped);
        }

        // Ставки без стола: всех, кто ещё сидит, уже разобрала их сессия.
        let orphans = self
            .ledger
            .refund_all(|player_id| self.index.table_of(player_id).is_some());
        report.refunded.extend(orphans.refunded);
        report.failed.extend(orphans.failed);

        if let Err(e) = self.collab.stats.flush() {
            tracing::error!(error = %e, "failed to flush statistics on shutdown");
        }

        tracing::info!(
            tables = sessions.len(),
            refunded = report.refunded.len(),
            skipped = report.skipped.len(),
            "registry shut down"
        );
        report
    }

    // ---------- внутренности ----------

    fn session_of(&self, player_id: PlayerId) -> Result<Arc<TableSession>, RegistryError> {
        self.index
            .table_of(player_id)
            .and_then(|t| self.session(t))
            .ok_or(RegistryError::NotAtTable(player_id))
    }

    fn find_by_anchor(&self, anchor: &Location) -> Option<TableId> {
        self.tables
            .read()
            .values()
            .find(|s| s.anchor() == anchor)
            .map(|s| s.id())
    }

    fn sorted_sessions(&self) -> Vec<Arc<TableSession>> {
        let mut sessions: Vec<Arc<TableSession>> = self.tables.read().values().cloned().collect();
        sessions.sort_by_key(|s| s.id());
        sessions
    }

    fn anchors(&self) -> Vec<Location> {
        self.sorted_sessions()
            .into_iter()
            .map(|s| s.anchor().clone())
            .collect()
    }

    fn insert_session(&self, anchor: Location) -> TableId {
        let id = self.ids.next_table_id();
        let ctx = SessionContext {
            ledger: Arc::clone(&self.ledger),
            index: Arc::clone(&self.index),
            stats: Arc::clone(&self.collab.stats),
            presentation: Arc::clone(&self.collab.presentation),
            host: Arc::clone(&self.collab.host),
            timing: self.timing.clone(),
        };
        let rng = (self.collab.rng_factory)(id);
        let session = TableSession::new(id, anchor, self.table_config.clone(), ctx, rng);
        self.tables.write().insert(id, session);
        id
    }
}
