//! Per-flow request orchestration.
//!
//! Each user-facing flow (editing, generation) owns one session: a small
//! state machine that validates inputs, dispatches the external call, and
//! folds the outcome back into exactly one observable phase. Sessions are
//! single-owner and single-flight: while a call is pending the submit
//! control is rejected, and a completion for a superseded submission is
//! discarded by epoch comparison.

use crate::error::Result;
use crate::image::{EditRequest, GenerateRequest, ImageArtifact, ImageService, SelectedFile};

/// Validation message for the edit flow.
pub const EDIT_VALIDATION_MESSAGE: &str = "Please upload an image and provide an edit prompt.";

/// Validation message for the generation flow.
pub const GENERATE_VALIDATION_MESSAGE: &str = "Please provide a prompt to generate an image.";

/// The observable state of a flow.
///
/// Exactly one variant is active at any point; a new submission clears the
/// previous `Success`/`Failure` before dispatching.
#[derive(Debug, Clone)]
pub enum Phase {
    /// No operation started or inputs changed since the last one.
    Idle,
    /// Inputs are being checked; transient within a submit call.
    Validating,
    /// An external call is in flight; the submit control is disabled.
    Loading,
    /// The external call resolved with an image.
    Success(ImageArtifact),
    /// Validation or the external call failed; holds the display message.
    Failure(String),
}

impl Default for Phase {
    fn default() -> Self {
        Self::Idle
    }
}

impl Phase {
    /// Returns true while an external call is pending.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the resulting image, if the flow succeeded.
    pub fn artifact(&self) -> Option<&ImageArtifact> {
        match self {
            Self::Success(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// Returns the display message, if the flow failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure(message) => Some(message),
            _ => None,
        }
    }
}

/// Handle tying an in-flight call to the submission that started it.
///
/// A ticket from a superseded submission no longer matches the session's
/// epoch and its completion is silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
}

/// Orchestrates the image-editing flow.
#[derive(Debug, Default)]
pub struct EditSession {
    file: Option<SelectedFile>,
    prompt: String,
    phase: Phase,
    epoch: u64,
}

impl EditSession {
    /// Creates an idle session with no inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Returns the currently selected file, if any.
    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    /// Selects a source image, replacing any previous selection.
    ///
    /// Clears a previously displayed result or error but does not start
    /// anything by itself.
    pub fn select_file(&mut self, file: SelectedFile) {
        self.file = Some(file);
        self.clear_outcome();
    }

    /// Updates the edit instruction, clearing any displayed result or error.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
        self.clear_outcome();
    }

    /// Attempts to start an edit operation.
    ///
    /// Returns `None` without touching state while a call is already in
    /// flight. Otherwise runs validation: missing file or blank instruction
    /// lands in [`Phase::Failure`] with [`EDIT_VALIDATION_MESSAGE`] and no
    /// external call is made. Valid input moves the session to
    /// [`Phase::Loading`] and yields the request to dispatch plus the ticket
    /// for [`finish`](Self::finish).
    pub fn submit(&mut self) -> Option<(Ticket, EditRequest)> {
        if self.phase.is_loading() {
            return None;
        }
        self.phase = Phase::Validating;

        let file = match self.file {
            Some(ref file) if !self.prompt.trim().is_empty() => file,
            _ => {
                self.phase = Phase::Failure(EDIT_VALIDATION_MESSAGE.into());
                return None;
            }
        };

        let request = EditRequest::from_file(file, self.prompt.clone());
        self.epoch += 1;
        self.phase = Phase::Loading;
        Some((Ticket { epoch: self.epoch }, request))
    }

    /// Delivers the outcome of a dispatched call.
    ///
    /// Stale completions (ticket from a superseded submission, or a session
    /// that was reset while the call was in flight) are discarded.
    pub fn finish(&mut self, ticket: Ticket, outcome: Result<ImageArtifact>) {
        finish_phase(&mut self.phase, self.epoch, ticket, outcome);
    }

    /// Runs one full submit/dispatch/finish cycle against a service.
    pub async fn run(&mut self, service: &dyn ImageService) -> &Phase {
        if let Some((ticket, request)) = self.submit() {
            let outcome = service.edit(&request).await;
            self.finish(ticket, outcome);
        }
        &self.phase
    }

    /// Abandons the session's current work and inputs.
    ///
    /// A call still in flight keeps running, but its completion no longer
    /// matches the epoch and is dropped.
    pub fn reset(&mut self) {
        self.file = None;
        self.prompt.clear();
        self.phase = Phase::Idle;
        self.epoch += 1;
    }

    fn clear_outcome(&mut self) {
        if matches!(self.phase, Phase::Success(_) | Phase::Failure(_)) {
            self.phase = Phase::Idle;
        }
    }
}

/// Orchestrates the text-to-image generation flow.
#[derive(Debug, Default)]
pub struct GenerateSession {
    prompt: String,
    phase: Phase,
    epoch: u64,
}

impl GenerateSession {
    /// Creates an idle session with no prompt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Updates the prompt, clearing any displayed result or error.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
        if matches!(self.phase, Phase::Success(_) | Phase::Failure(_)) {
            self.phase = Phase::Idle;
        }
    }

    /// Attempts to start a generation.
    ///
    /// Same contract as [`EditSession::submit`]: `None` while loading, a
    /// blank prompt fails validation with [`GENERATE_VALIDATION_MESSAGE`]
    /// and issues no external call.
    pub fn submit(&mut self) -> Option<(Ticket, GenerateRequest)> {
        if self.phase.is_loading() {
            return None;
        }
        self.phase = Phase::Validating;

        if self.prompt.trim().is_empty() {
            self.phase = Phase::Failure(GENERATE_VALIDATION_MESSAGE.into());
            return None;
        }

        let request = GenerateRequest::new(self.prompt.clone());
        self.epoch += 1;
        self.phase = Phase::Loading;
        Some((Ticket { epoch: self.epoch }, request))
    }

    /// Delivers the outcome of a dispatched call, discarding stale ones.
    pub fn finish(&mut self, ticket: Ticket, outcome: Result<ImageArtifact>) {
        finish_phase(&mut self.phase, self.epoch, ticket, outcome);
    }

    /// Runs one full submit/dispatch/finish cycle against a service.
    pub async fn run(&mut self, service: &dyn ImageService) -> &Phase {
        if let Some((ticket, request)) = self.submit() {
            let outcome = service.generate(&request).await;
            self.finish(ticket, outcome);
        }
        &self.phase
    }

    /// Abandons the session's current work and prompt.
    pub fn reset(&mut self) {
        self.prompt.clear();
        self.phase = Phase::Idle;
        self.epoch += 1;
    }
}

fn finish_phase(phase: &mut Phase, epoch: u64, ticket: Ticket, outcome: Result<ImageArtifact>) {
    if ticket.epoch != epoch || !phase.is_loading() {
        tracing::debug!(
            ticket_epoch = ticket.epoch,
            session_epoch = epoch,
            "discarding stale completion"
        );
        return;
    }
    *phase = match outcome {
        Ok(artifact) => Phase::Success(artifact),
        Err(err) => Phase::Failure(err.display_message()),
    };
}
