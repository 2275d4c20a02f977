//! Unsaved form drafts.
//!
//! [`DraftStore`] keeps one JSON file per form. [`DraftAutosaver`] sits in
//! front of it on its own task and only writes a form once updates for it
//! have been quiet for the configured delay, so a burst of keystrokes costs
//! one write. Drafts are local convenience state with no coordination across
//! processes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};

use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, form: &str) -> Result<PathBuf, ServiceError> {
        let valid = !form.is_empty()
            && form.len() <= 64
            && form
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ServiceError::invalid_field(
                "form",
                "draft name may only use letters, digits, '-' and '_'",
            ));
        }
        Ok(self.dir.join(format!("{}.json", form)))
    }

    pub async fn save(&self, form: &str, draft: &Value) -> Result<(), ServiceError> {
        let path = self.path_for(form)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, serde_json::to_vec(draft)?).await?;
        debug!(form, "Draft saved");
        Ok(())
    }

    pub async fn load(&self, form: &str) -> Result<Option<Value>, ServiceError> {
        let path = self.path_for(form)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the draft; a missing draft is not an error.
    pub async fn discard(&self, form: &str) -> Result<(), ServiceError> {
        let path = self.path_for(form)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

enum DraftCommand {
    Update { form: String, draft: Value },
    Peek {
        form: String,
        reply: oneshot::Sender<Option<Value>>,
    },
    Discard {
        form: String,
        reply: oneshot::Sender<Result<(), ServiceError>>,
    },
    Flush(oneshot::Sender<()>),
}

/// Debounced writer in front of a [`DraftStore`].
#[derive(Clone)]
pub struct DraftAutosaver {
    store: Arc<DraftStore>,
    tx: mpsc::UnboundedSender<DraftCommand>,
    task: Arc<JoinHandle<()>>,
}

impl DraftAutosaver {
    pub fn spawn(store: Arc<DraftStore>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(store.clone(), delay, rx));
        Self {
            store,
            tx,
            task: Arc::new(task),
        }
    }

    fn stopped() -> ServiceError {
        ServiceError::InternalError("draft autosave task is not running".to_string())
    }

    /// Validates the form name and schedules the write.
    pub fn update(&self, form: &str, draft: Value) -> Result<(), ServiceError> {
        self.store.path_for(form)?;
        self.tx
            .send(DraftCommand::Update {
                form: form.to_string(),
                draft,
            })
            .map_err(|_| Self::stopped())
    }

    /// Latest draft, including one still waiting for its quiet period.
    pub async fn load(&self, form: &str) -> Result<Option<Value>, ServiceError> {
        self.store.path_for(form)?;
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(DraftCommand::Peek {
                form: form.to_string(),
                reply,
            })
            .map_err(|_| Self::stopped())?;
        match rx.await.map_err(|_| Self::stopped())? {
            Some(draft) => Ok(Some(draft)),
            None => self.store.load(form).await,
        }
    }

    /// Drops any pending write and deletes the stored draft.
    pub async fn discard(&self, form: &str) -> Result<(), ServiceError> {
        self.store.path_for(form)?;
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(DraftCommand::Discard {
                form: form.to_string(),
                reply,
            })
            .map_err(|_| Self::stopped())?;
        rx.await.map_err(|_| Self::stopped())?
    }

    /// Writes every pending draft now.
    pub async fn flush(&self) -> Result<(), ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(DraftCommand::Flush(reply))
            .map_err(|_| Self::stopped())?;
        rx.await.map_err(|_| Self::stopped())
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

async fn write_draft(store: &DraftStore, form: &str, draft: &Value) {
    if let Err(e) = store.save(form, draft).await {
        error!(form, "Failed to write draft: {}", e);
    }
}

async fn run(
    store: Arc<DraftStore>,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<DraftCommand>,
) {
    info!(delay_ms = delay.as_millis() as u64, "Draft autosave started");
    let mut pending: HashMap<String, (Value, Instant)> = HashMap::new();

    loop {
        let next_due = pending.values().map(|(_, due)| *due).min();

        tokio::select! {
            command = rx.recv() => match command {
                Some(DraftCommand::Update { form, draft }) => {
                    pending.insert(form, (draft, Instant::now() + delay));
                }
                Some(DraftCommand::Peek { form, reply }) => {
                    let _ = reply.send(pending.get(&form).map(|(draft, _)| draft.clone()));
                }
                Some(DraftCommand::Discard { form, reply }) => {
                    pending.remove(&form);
                    let _ = reply.send(store.discard(&form).await);
                }
                Some(DraftCommand::Flush(reply)) => {
                    for (form, (draft, _)) in pending.drain() {
                        write_draft(&store, &form, &draft).await;
                    }
                    let _ = reply.send(());
                }
                None => break,
            },
            _ = sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                let now = Instant::now();
                let due: Vec<String> = pending
                    .iter()
                    .filter(|(_, (_, at))| *at <= now)
                    .map(|(form, _)| form.clone())
                    .collect();
                for form in due {
                    if let Some((draft, _)) = pending.remove(&form) {
                        write_draft(&store, &form, &draft).await;
                    }
                }
            }
        }
    }

    for (form, (draft, _)) in pending.drain() {
        write_draft(&store, &form, &draft).await;
    }
    info!("Draft autosave stopped");
}
