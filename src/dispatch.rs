use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::model::{CalendarEvent, EventDraft, MoveRequest};
use crate::observability::{command_label, COMMANDS_TOTAL, COMMAND_DURATION_SECONDS};
use crate::store::{Store, StoreError};

const QUEUE_CAPACITY: usize = 1024;

/// A state change requested by the UI. One JSON object per command, tagged
/// by `op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateResource {
        #[serde(default)]
        id: Option<Ulid>,
        name: String,
    },
    RenameResource {
        id: Ulid,
        name: String,
    },
    DeleteResource {
        id: Ulid,
    },
    CreateEvent {
        #[serde(default)]
        id: Option<Ulid>,
        #[serde(flatten)]
        draft: EventDraft,
    },
    UpdateEvent {
        id: Ulid,
        #[serde(flatten)]
        draft: EventDraft,
    },
    /// Drag-and-drop onto a cell.
    ProposeMove {
        id: Ulid,
        #[serde(flatten)]
        to: MoveRequest,
    },
    DeleteEvent {
        id: Ulid,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Resource(Ulid),
    Event(CalendarEvent),
    Deleted(Ulid),
}

struct Envelope {
    command: Command,
    response: oneshot::Sender<Result<Outcome, StoreError>>,
}

/// Handle to the single task that applies commands. Clones share the queue;
/// commands are applied one at a time in arrival order.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Envelope>,
}

impl Dispatcher {
    /// Start the consumer task. Must be called inside a tokio runtime.
    pub fn spawn(store: Arc<Store>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(dispatch_loop(store, rx));
        Self { tx }
    }

    pub async fn submit(&self, command: Command) -> Result<Outcome, StoreError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(Envelope { command, response: tx })
            .await
            .map_err(|_| StoreError::WalError("dispatcher shut down".into()))?;
        rx.await
            .map_err(|_| StoreError::WalError("dispatcher dropped response".into()))?
    }
}

async fn dispatch_loop(store: Arc<Store>, mut rx: mpsc::Receiver<Envelope>) {
    while let Some(Envelope { command, response }) = rx.recv().await {
        let label = command_label(&command);
        let started = Instant::now();
        let result = apply(&store, command).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(COMMANDS_TOTAL, "command" => label, "status" => status).increment(1);
        metrics::histogram!(COMMAND_DURATION_SECONDS, "command" => label)
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(_) => debug!(command = label, "command applied"),
            Err(e) => warn!(command = label, error = %e, "command rejected"),
        }

        // Caller may have gone away; the change is committed either way.
        let _ = response.send(result);
    }
    debug!("command queue closed");
}

async fn apply(store: &Store, command: Command) -> Result<Outcome, StoreError> {
    match command {
        Command::CreateResource { id, name } => {
            let id = id.unwrap_or_else(Ulid::new);
            store.create_resource(id, name).await?;
            Ok(Outcome::Resource(id))
        }
        Command::RenameResource { id, name } => {
            store.rename_resource(id, name).await?;
            Ok(Outcome::Resource(id))
        }
        Command::DeleteResource { id } => {
            store.delete_resource(id).await?;
            Ok(Outcome::Deleted(id))
        }
        Command::CreateEvent { id, draft } => {
            let id = id.unwrap_or_else(Ulid::new);
            store.create_event(id, draft).await.map(Outcome::Event)
        }
        Command::UpdateEvent { id, draft } => store.update_event(id, draft).await.map(Outcome::Event),
        Command::ProposeMove { id, to } => store.move_event(id, to).await.map(Outcome::Event),
        Command::DeleteEvent { id } => {
            store.delete_event(id).await?;
            Ok(Outcome::Deleted(id))
        }
    }
}
