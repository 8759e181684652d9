//! Debounced encoding for continuous text input
//!
//! Each keystroke pushes the newest payload into a `watch` channel. The
//! worker waits until input has been quiet for the debounce window and
//! then encodes only the newest value; values overwritten in the meantime
//! are never encoded.

use super::form::EncodedForm;
use super::service::ShareService;
use crate::payload::SharedPayload;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Quiet period after the last edit before encoding
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Wait for the next burst of changes to settle and return the newest value.
///
/// Returns `None` once the sender is gone and nothing is pending. A burst
/// cut short by the sender closing still yields its newest value.
pub async fn next_settled<T: Clone>(rx: &mut watch::Receiver<T>, window: Duration) -> Option<T> {
    rx.changed().await.ok()?;

    loop {
        match tokio::time::timeout(window, rx.changed()).await {
            // Quiet for a full window
            Err(_) => break,
            // A newer value restarts the window
            Ok(Ok(())) => continue,
            Ok(Err(_)) => break,
        }
    }

    Some(rx.borrow_and_update().clone())
}

/// Background encoder fed by text edits
pub struct DebouncedEncoder {
    input: watch::Sender<SharedPayload>,
    output: watch::Receiver<Option<EncodedForm>>,
    task: JoinHandle<()>,
}

impl DebouncedEncoder {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(service: Arc<ShareService>, window: Duration) -> Self {
        let (input, mut edits) = watch::channel(SharedPayload::default());
        let (results, output) = watch::channel(None);

        let task = tokio::spawn(async move {
            while let Some(payload) = next_settled(&mut edits, window).await {
                let form = service.encode(&payload).await;
                debug!(wire_len = form.len(), encrypted = form.is_encrypted(), "Debounced encode");
                if results.send(Some(form)).is_err() {
                    break;
                }
            }
        });

        Self {
            input,
            output,
            task,
        }
    }

    /// Replace the pending payload with the newest edit
    pub fn push(&self, payload: SharedPayload) {
        self.input.send_replace(payload);
    }

    /// Receiver of encoded results; starts with the latest result marked seen
    pub fn subscribe(&self) -> watch::Receiver<Option<EncodedForm>> {
        self.output.clone()
    }

    /// Most recent encode result, if any
    pub fn latest(&self) -> Option<EncodedForm> {
        self.output.borrow().clone()
    }

    /// Stop accepting edits, flush a pending burst and wait for the worker
    pub async fn close(self) -> Option<EncodedForm> {
        let Self {
            input,
            output,
            task,
        } = self;
        drop(input);
        // A panicked worker simply leaves the last published result
        let _ = task.await;
        let latest = output.borrow().clone();
        latest
    }
}
