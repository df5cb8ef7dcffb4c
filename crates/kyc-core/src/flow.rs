//! Step flow controller
//!
//! Drives a case through the fixed wizard order, tracks per-slot upload state,
//! gates forward movement on upload success and reconciles with the progress
//! the server reports. Local completions are optimistic: the next successful
//! [`StepFlow::apply_progress`] replaces them wholesale.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{KycError, KycResult};
use crate::models::{DocumentSlot, ProgressResponse, StepId, UploadState, UploadStatus};

#[derive(Debug, Clone, Serialize)]
pub struct StepFlow {
    current: StepId,
    completed: BTreeSet<StepId>,
    uploads: BTreeMap<DocumentSlot, UploadState>,
}

/// One row of the progress sidebar.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub id: StepId,
    pub title: &'static str,
    pub description: &'static str,
    pub is_current: bool,
    pub is_complete: bool,
}

impl Default for StepFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl StepFlow {
    pub fn new() -> Self {
        Self {
            current: StepId::first(),
            completed: BTreeSet::new(),
            uploads: DocumentSlot::ALL
                .iter()
                .map(|slot| (*slot, UploadState::empty(*slot)))
                .collect(),
        }
    }

    pub fn current(&self) -> StepId {
        self.current
    }

    pub fn completed(&self) -> &BTreeSet<StepId> {
        &self.completed
    }

    pub fn is_current(&self, step: StepId) -> bool {
        self.current == step
    }

    pub fn is_complete(&self, step: StepId) -> bool {
        self.completed.contains(&step)
    }

    pub fn is_submitted(&self) -> bool {
        self.current == StepId::Submitted
    }

    /// Once submitted, the review data can no longer change.
    pub fn is_read_only(&self) -> bool {
        self.is_submitted()
    }

    /// Move to the next step. Review only moves on through a confirmed submission.
    pub fn advance(&mut self) -> StepId {
        if matches!(self.current, StepId::Review | StepId::Submitted) {
            return self.current;
        }
        if let Some(next) = self.current.next() {
            tracing::debug!(from = %self.current, to = %next, "Advancing step");
            self.current = next;
        }
        self.current
    }

    /// Move to the previous step. There is no way back out of `submitted`.
    pub fn retreat(&mut self) -> StepId {
        if self.is_submitted() {
            return self.current;
        }
        if let Some(previous) = self.current.previous() {
            tracing::debug!(from = %self.current, to = %previous, "Retreating step");
            self.current = previous;
        }
        self.current
    }

    /// Record `step` as done. Idempotent.
    pub fn mark_complete(&mut self, step: StepId) {
        self.completed.insert(step);
    }

    /// Optimistic completion callback: mark `step` done and move past it.
    pub fn complete_step(&mut self, step: StepId) -> KycResult<StepId> {
        if self.is_read_only() {
            return Err(KycError::ReadOnly);
        }
        if matches!(step, StepId::Review | StepId::Submitted) {
            return Err(KycError::InvalidInput(
                "Review is completed by submitting the KYC details".to_string(),
            ));
        }
        if !self.can_proceed(step) {
            return Err(KycError::StepIncomplete(step.to_string()));
        }

        self.mark_complete(step);
        if let Some(next) = step.next() {
            self.current = next;
        }
        Ok(self.current)
    }

    /// Enter `submitted` after the server accepted the review.
    pub fn confirm_submission(&mut self) {
        self.completed.insert(StepId::Review);
        self.completed.insert(StepId::Submitted);
        self.current = StepId::Submitted;
    }

    /// Replace local state with the server's view of the case.
    pub fn apply_progress(&mut self, progress: &ProgressResponse) {
        let was_submitted = self.is_submitted();

        if let Some(current) = progress.current() {
            self.current = current;
        } else if !progress.current_step.is_empty() {
            tracing::debug!(
                current_step = %progress.current_step,
                "Ignoring unmapped current step from server"
            );
        }
        self.completed = progress.completed();

        if progress.is_submitted() || was_submitted {
            self.completed.insert(StepId::Submitted);
            self.current = StepId::Submitted;
        }
    }

    /// Whether the "Next" control of `step` is enabled.
    pub fn can_proceed(&self, step: StepId) -> bool {
        DocumentSlot::for_step(step)
            .iter()
            .all(|slot| self.upload(*slot).is_success())
    }

    pub fn upload(&self, slot: DocumentSlot) -> &UploadState {
        &self.uploads[&slot]
    }

    pub fn uploads(&self) -> &BTreeMap<DocumentSlot, UploadState> {
        &self.uploads
    }

    pub fn select_file(
        &mut self,
        slot: DocumentSlot,
        file_name: impl Into<String>,
        preview: Option<String>,
    ) -> KycResult<()> {
        let state = self.upload_mut(slot)?;
        state.file_name = Some(file_name.into());
        state.preview = preview;
        state.status = UploadStatus::Pending;
        state.error = None;
        Ok(())
    }

    pub fn mark_uploading(&mut self, slot: DocumentSlot) -> KycResult<()> {
        let state = self.upload_mut(slot)?;
        state.status = UploadStatus::Uploading;
        state.error = None;
        Ok(())
    }

    pub fn mark_uploaded(&mut self, slot: DocumentSlot) -> KycResult<()> {
        let state = self.upload_mut(slot)?;
        state.status = UploadStatus::Success;
        state.error = None;
        Ok(())
    }

    pub fn mark_failed(&mut self, slot: DocumentSlot, error: impl Into<String>) -> KycResult<()> {
        let state = self.upload_mut(slot)?;
        state.status = UploadStatus::Error;
        state.error = Some(error.into());
        Ok(())
    }

    /// Clear a slot so the customer can pick a different file.
    pub fn reset_upload(&mut self, slot: DocumentSlot) -> KycResult<()> {
        let state = self.upload_mut(slot)?;
        *state = UploadState::empty(slot);
        Ok(())
    }

    /// (successful uploads, total slots)
    pub fn upload_summary(&self) -> (usize, usize) {
        let done = self.uploads.values().filter(|u| u.is_success()).count();
        (done, self.uploads.len())
    }

    pub fn step_views(&self) -> Vec<StepView> {
        StepId::ORDER
            .iter()
            .map(|id| {
                let info = id.info();
                StepView {
                    id: *id,
                    title: info.title,
                    description: info.description,
                    is_current: self.is_current(*id),
                    is_complete: self.is_complete(*id),
                }
            })
            .collect()
    }

    fn upload_mut(&mut self, slot: DocumentSlot) -> KycResult<&mut UploadState> {
        if self.is_read_only() {
            return Err(KycError::ReadOnly);
        }
        self.uploads
            .get_mut(&slot)
            .ok_or_else(|| KycError::Internal(format!("Missing upload slot {}", slot)))
    }
}
