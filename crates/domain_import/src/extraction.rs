//! Extraction coordination
//!
//! Each slot's extraction runs as its own tokio task: the two slots are
//! concurrent and unordered, and one slot failing never touches the other.
//! A task only ever reports through the event channel.
//!
//! Phases per slot:
//!
//! 1. submit: slot goes `processing` at 30%
//! 2. await: 80% once the service answered
//! 3. finalize: `extracted` at 100%, or `error` at 0% with a message
//!
//! Replacing or removing a slot aborts its task and the ticket change makes
//! any event already in the channel stale. Aborting does not guarantee the
//! HTTP call itself is cancelled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use core_kernel::{ImportSessionId, OperationMetadata};
use domain_member::{ExtractedMemberRecord, SourceRole};

use crate::error::ImportError;
use crate::events::{ExtractionEvent, PROGRESS_ANSWERED, PROGRESS_SUBMITTED};
use crate::ports::{ExtractionPort, ExtractionRequest, ExtractionResponse};
use crate::slot::UploadSlot;

/// Spawns and tracks per-slot extraction tasks
pub struct ExtractionCoordinator {
    port: Arc<dyn ExtractionPort>,
    timeout: Duration,
    events: mpsc::UnboundedSender<ExtractionEvent>,
    tasks: HashMap<SourceRole, JoinHandle<()>>,
}

impl ExtractionCoordinator {
    /// Creates a coordinator and the receiving end of its event channel
    pub fn new(
        port: Arc<dyn ExtractionPort>,
        timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ExtractionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let coordinator = Self {
            port,
            timeout,
            events,
            tasks: HashMap::new(),
        };
        (coordinator, receiver)
    }

    /// Starts extraction for a freshly accepted slot
    ///
    /// Must be called from within a tokio runtime.
    pub fn process_slot(&mut self, slot: &mut UploadSlot, session_id: ImportSessionId) {
        self.cancel(slot.role);

        let role = slot.role;
        let ticket = slot.ticket;
        slot.mark_processing(PROGRESS_SUBMITTED);
        let _ = self.events.send(ExtractionEvent::Progress {
            role,
            ticket,
            progress: PROGRESS_SUBMITTED,
        });

        let request = ExtractionRequest {
            role,
            file_name: slot.file.name.clone(),
            content_type: slot.file.content_type.clone(),
            file_bytes: slot.file.bytes.clone(),
        };
        let metadata = OperationMetadata::with_correlation_id(session_id.to_string())
            .with_context("role", role.as_str())
            .with_context("ticket", ticket.to_string());

        tracing::info!(%session_id, %role, ticket, file = %slot.file.name, "Extraction submitted");

        let handle = tokio::spawn(run_extraction(
            self.port.clone(),
            request,
            metadata,
            self.timeout,
            ticket,
            self.events.clone(),
        ));
        self.tasks.insert(role, handle);
    }

    /// Aborts the slot's task, if any
    pub fn cancel(&mut self, role: SourceRole) {
        if let Some(handle) = self.tasks.remove(&role) {
            if !handle.is_finished() {
                tracing::debug!(%role, "Aborting in-flight extraction");
            }
            handle.abort();
        }
    }

    pub fn is_running(&self, role: SourceRole) -> bool {
        self.tasks.get(&role).is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ExtractionCoordinator {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for ExtractionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionCoordinator")
            .field("timeout", &self.timeout)
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

async fn run_extraction(
    port: Arc<dyn ExtractionPort>,
    request: ExtractionRequest,
    metadata: OperationMetadata,
    timeout: Duration,
    ticket: u64,
    events: mpsc::UnboundedSender<ExtractionEvent>,
) {
    let role = request.role;
    let answer = tokio::time::timeout(timeout, port.extract(request, Some(metadata))).await;

    let outcome = match answer {
        Err(_) => Err(ImportError::extraction(
            role,
            format!("extraction timed out after {}s", timeout.as_secs()),
        )),
        Ok(Err(err)) => Err(ImportError::extraction(role, err.to_string())),
        Ok(Ok(response)) => {
            let _ = events.send(ExtractionEvent::Progress {
                role,
                ticket,
                progress: PROGRESS_ANSWERED,
            });
            interpret_response(role, response)
        }
    };

    let event = match outcome {
        Ok(record) => ExtractionEvent::SlotReady {
            role,
            ticket,
            record: Box::new(record),
        },
        Err(err) => {
            tracing::warn!(%role, ticket, error = %err, "Extraction failed");
            ExtractionEvent::failed(role, ticket, err)
        }
    };

    // A closed channel means the wizard is gone; nothing left to report to.
    let _ = events.send(event);
}

/// Maps a service answer to a record or a slot-local extraction error
pub fn interpret_response(
    role: SourceRole,
    response: ExtractionResponse,
) -> Result<ExtractedMemberRecord, ImportError> {
    match response {
        ExtractionResponse {
            success: true,
            data: Some(record),
            ..
        } => Ok(record),
        ExtractionResponse { success: true, .. } => Err(ImportError::extraction(
            role,
            "extraction service returned no data",
        )),
        ExtractionResponse { error, .. } => Err(ImportError::extraction(
            role,
            error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "extraction service reported failure".to_string()),
        )),
    }
}
