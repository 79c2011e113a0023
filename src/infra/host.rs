//! Хост на tokio: однопоточный кооперативный main loop (одна задача, читающая канал)
//! и отменяемые отложенные задачи.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::domain::table::Location;
use crate::domain::PlayerId;
use crate::infra::ports::{HostTask, SpatialHost};
use crate::time_ctrl::CancelToken;

pub struct TokioHost {
    handle: Handle,
    main_loop: mpsc::UnboundedSender<HostTask>,
    positions: RwLock<HashMap<PlayerId, Location>>,
}

impl TokioHost {
    /// Запустить main loop на переданном рантайме.
    pub fn spawn(handle: Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<HostTask>();
        handle.spawn(async move {
            while let Some(task) = rx.recv().await {
                task();
            }
            tracing::debug!("host main loop stopped");
        });
        Self {
            handle,
            main_loop: tx,
            positions: RwLock::new(HashMap::new()),
        }
    }

    /// Хост сообщает новую позицию игрока.
    pub fn set_position(&self, player_id: PlayerId, location: Location) {
        self.positions.write().insert(player_id, location);
    }

    pub fn remove_position(&self, player_id: PlayerId) {
        self.positions.write().remove(&player_id);
    }
}

impl SpatialHost for TokioHost {
    fn current_position(&self, player_id: PlayerId) -> Option<Location> {
        self.positions.read().get(&player_id).cloned()
    }

    fn schedule_on_main_loop(&self, task: HostTask) {
        if self.main_loop.send(task).is_err() {
            tracing::warn!("host main loop is gone, presentation task dropped");
        }
    }

    fn schedule_delayed(&self, task: HostTask, delay: Duration, token: CancelToken) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if token.is_cancelled() {
                return;
            }
            task();
        });
    }
}
