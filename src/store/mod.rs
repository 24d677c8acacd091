mod error;
mod mutations;
mod placement;
mod queries;

pub use error::StoreError;

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, OwnedRwLockWriteGuard, RwLock};
use tracing::info;
use ulid::Ulid;

use crate::calendar::DEFAULT_MINUTES_PER_PIXEL;
use crate::layout::LayoutConfig;
use crate::model::*;
use crate::notify::ChangeHub;
use crate::observability::{RESOURCES_ACTIVE, WAL_FLUSH_BATCH_SIZE, WAL_FLUSH_DURATION_SECONDS};
use crate::wal::Wal;

pub type SharedResourceState = Arc<RwLock<ResourceState>>;

// ── Group-commit writer ──────────────────────────────────

pub(super) enum WalCommand {
    Append {
        change: Change,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        changes: Vec<Change>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

type PendingAppend = (Change, oneshot::Sender<io::Result<()>>);

/// Owns the change log. Appends that queue up while a flush is in progress
/// are written together and share one fsync.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let WalCommand::Append { change, response } = cmd else {
            handle_control(&mut wal, cmd);
            continue;
        };

        let mut batch = vec![(change, response)];
        let mut deferred = None;
        while let Ok(next) = rx.try_recv() {
            match next {
                WalCommand::Append { change, response } => batch.push((change, response)),
                other => {
                    deferred = Some(other);
                    break;
                }
            }
        }

        commit_batch(&mut wal, batch);
        if let Some(cmd) = deferred {
            handle_control(&mut wal, cmd);
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: Vec<PendingAppend>) {
    metrics::histogram!(WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let started = Instant::now();
    let result = write_batch(wal, &batch);
    metrics::histogram!(WAL_FLUSH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    for (_, tx) in batch {
        let reply = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(reply);
    }
}

fn write_batch(wal: &mut Wal, batch: &[PendingAppend]) -> io::Result<()> {
    let appended = batch
        .iter()
        .try_for_each(|(change, _)| wal.append_buffered(change));
    // Flush even after a failed append so partial bytes are not carried
    // into the next batch.
    let flushed = wal.flush_sync();
    appended.and(flushed)
}

fn handle_control(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { changes, response } => {
            let result = Wal::write_compact_file(wal.path(), &changes)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

// ── Change application ───────────────────────────────────

/// Resources whose rows a change touches.
fn touched_resources(change: &Change) -> Vec<Ulid> {
    match change {
        Change::ResourceCreated { id, .. }
        | Change::ResourceRenamed { id, .. }
        | Change::ResourceDeleted { id } => vec![*id],
        Change::EventCreated { event } => vec![event.resource_id],
        Change::EventUpdated {
            previous_resource_id,
            event,
        } if *previous_resource_id != event.resource_id => {
            vec![*previous_resource_id, event.resource_id]
        }
        Change::EventUpdated { event, .. } => vec![event.resource_id],
        Change::EventDeleted { resource_id, .. } => vec![*resource_id],
    }
}

/// Apply the part of `change` that concerns `rs` (caller holds the lock).
fn apply_to_resource(rs: &mut ResourceState, change: &Change) {
    match change {
        Change::ResourceRenamed { name, .. } => rs.name = name.clone(),
        Change::EventCreated { event } => {
            if event.resource_id == rs.id {
                rs.insert_event(event.clone());
            }
        }
        Change::EventUpdated {
            previous_resource_id,
            event,
        } => {
            if event.resource_id == rs.id {
                rs.replace_event(event.clone());
            } else if *previous_resource_id == rs.id {
                rs.remove_event(event.id);
            }
        }
        Change::EventDeleted { id, .. } => {
            rs.remove_event(*id);
        }
        // Created/Deleted are handled at the map level, not here
        Change::ResourceCreated { .. } | Change::ResourceDeleted { .. } => {}
    }
}

fn replay_change(resources: &mut HashMap<Ulid, ResourceState>, change: &Change) {
    match change {
        Change::ResourceCreated { id, name } => {
            resources.insert(*id, ResourceState::new(*id, name.clone()));
        }
        Change::ResourceDeleted { id } => {
            resources.remove(id);
        }
        other => {
            for rid in touched_resources(other) {
                if let Some(rs) = resources.get_mut(&rid) {
                    apply_to_resource(rs, other);
                }
            }
        }
    }
}

/// Persistent calendar state: resources, their events, and the change log.
pub struct Store {
    resources: DashMap<Ulid, SharedResourceState>,
    /// Reverse lookup: event id → resource id.
    event_index: DashMap<Ulid, Ulid>,
    wal_tx: mpsc::Sender<WalCommand>,
    notify: Arc<ChangeHub>,
    layout: LayoutConfig,
    minutes_per_pixel: f64,
    /// Shared by every mutation, exclusive during compaction, so no change
    /// is appended between the snapshot and the file swap.
    commit_gate: RwLock<()>,
}

impl Store {
    /// Replay the change log at `wal_path` and start the writer task.
    /// Must be called inside a tokio runtime.
    pub fn open(wal_path: PathBuf, notify: Arc<ChangeHub>, layout: LayoutConfig) -> io::Result<Self> {
        let changes = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let mut replayed: HashMap<Ulid, ResourceState> = HashMap::new();
        for change in &changes {
            replay_change(&mut replayed, change);
        }

        let store = Self {
            resources: DashMap::new(),
            event_index: DashMap::new(),
            wal_tx,
            notify,
            layout,
            minutes_per_pixel: DEFAULT_MINUTES_PER_PIXEL,
            commit_gate: RwLock::new(()),
        };
        let mut event_count = 0usize;
        for (id, rs) in replayed {
            for event in &rs.events {
                store.event_index.insert(event.id, id);
            }
            event_count += rs.events.len();
            store.resources.insert(id, Arc::new(RwLock::new(rs)));
        }

        metrics::gauge!(RESOURCES_ACTIVE).set(store.resources.len() as f64);
        info!(
            path = %wal_path.display(),
            changes = changes.len(),
            resources = store.resources.len(),
            events = event_count,
            "store opened"
        );
        Ok(store)
    }

    /// Minutes a horizontal drag of one pixel moves an event's times.
    pub fn with_minutes_per_pixel(mut self, minutes_per_pixel: f64) -> Self {
        self.minutes_per_pixel = minutes_per_pixel;
        self
    }

    pub fn notify(&self) -> &Arc<ChangeHub> {
        &self.notify
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn get_resource(&self, id: &Ulid) -> Option<SharedResourceState> {
        self.resources.get(id).map(|e| e.value().clone())
    }

    pub fn get_resource_for_event(&self, event_id: &Ulid) -> Option<Ulid> {
        self.event_index.get(event_id).map(|e| *e.value())
    }

    async fn wal_append(&self, change: &Change) -> Result<(), StoreError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                change: change.clone(),
                response: tx,
            })
            .await
            .map_err(|_| StoreError::WalError("writer shut down".into()))?;
        rx.await
            .map_err(|_| StoreError::WalError("writer dropped response".into()))?
            .map_err(|e| StoreError::WalError(e.to_string()))
    }

    /// Log, apply to every locked row, index and notify.
    pub(super) async fn persist_and_apply(
        &self,
        targets: &mut [&mut ResourceState],
        change: &Change,
    ) -> Result<(), StoreError> {
        self.wal_append(change).await?;
        for rs in targets.iter_mut() {
            apply_to_resource(rs, change);
        }
        match change {
            Change::EventCreated { event } | Change::EventUpdated { event, .. } => {
                self.event_index.insert(event.id, event.resource_id);
            }
            Change::EventDeleted { id, .. } => {
                self.event_index.remove(id);
            }
            _ => {}
        }
        for rid in touched_resources(change) {
            self.notify.send(rid, change);
        }
        Ok(())
    }

    /// Take the row's write lock and confirm it is still the row stored
    /// under `id`. A row removed while the caller waited is `NotFound`.
    pub(super) async fn lock_live(&self, id: Ulid) -> Result<OwnedRwLockWriteGuard<ResourceState>, StoreError> {
        let rs = self.get_resource(&id).ok_or(StoreError::NotFound(id))?;
        let guard = rs.clone().write_owned().await;
        if !self.is_live(id, &rs) {
            return Err(StoreError::NotFound(id));
        }
        Ok(guard)
    }

    fn is_live(&self, id: Ulid, rs: &SharedResourceState) -> bool {
        self.resources
            .get(&id)
            .is_some_and(|current| Arc::ptr_eq(current.value(), rs))
    }

    /// Lookup event → resource, then take that row's write lock.
    pub(super) async fn resolve_event_write(
        &self,
        event_id: &Ulid,
    ) -> Result<(Ulid, OwnedRwLockWriteGuard<ResourceState>), StoreError> {
        let resource_id = self
            .get_resource_for_event(event_id)
            .ok_or(StoreError::NotFound(*event_id))?;
        Ok((resource_id, self.lock_live(resource_id).await?))
    }

    /// Write-lock two distinct live rows in id order. Guards come back as
    /// `(a, b)`.
    pub(super) async fn lock_pair(
        &self,
        a: Ulid,
        b: Ulid,
    ) -> Result<(OwnedRwLockWriteGuard<ResourceState>, OwnedRwLockWriteGuard<ResourceState>), StoreError> {
        if a < b {
            let ga = self.lock_live(a).await?;
            let gb = self.lock_live(b).await?;
            Ok((ga, gb))
        } else {
            let gb = self.lock_live(b).await?;
            let ga = self.lock_live(a).await?;
            Ok((ga, gb))
        }
    }
}
