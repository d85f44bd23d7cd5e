//! The multi-step intake form as a state machine.
//!
//! A [`FormSession`] walks through the five [`FormStep`]s. Moving forward
//! validates the current step; moving back never does. On the last step a
//! successful advance starts a submission, which must be completed before
//! navigation is possible again.
//!
//! Event-driven callers use the two halves directly:
//! [`FormSession::advance`] / [`FormSession::begin_submission`] when the user
//! presses a button, and [`FormSession::complete_submission`] when the store
//! responds. [`FormSession::next`] and [`FormSession::submit`] run both halves
//! against a [`RecordStore`] in one call.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{EnergyRecord, NewEnergyRecord, Session, UserId};
use crate::store::{RecordStore, StoreError};

use super::draft::{ApplianceId, DraftEdit, EnergyRecordDraft};
use super::step::{FormStep, StepStatus};
use super::validation::{ValidationError, validate_step};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("Navigation is disabled while the form is being submitted")]
    Busy,

    #[error("No submission is in progress")]
    NoSubmissionInFlight,

    #[error("The form can only be submitted from the {} step, not {}", FormStep::LAST.title(), .0.title())]
    NotOnLastStep(FormStep),

    #[error("The form has already been submitted")]
    AlreadySubmitted,

    #[error("Failed to save energy data: {0}")]
    Store(#[from] StoreError),
}

/// A record handed out for upserting; the form is gated until it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    record: NewEnergyRecord,
}

impl PendingSubmission {
    pub fn record(&self) -> &NewEnergyRecord {
        &self.record
    }

    pub fn into_record(self) -> NewEnergyRecord {
        self.record
    }
}

/// What a successful [`FormSession::advance`] asks the caller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    Moved(FormStep),
    Submit(PendingSubmission),
}

/// Outcome of [`FormSession::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(FormStep),
    Submitted(EnergyRecord),
}

#[derive(Debug, Clone, Default)]
pub struct FormSession {
    draft: EnergyRecordDraft,
    step: FormStep,
    submission_in_flight: bool,
    submitted: Option<EnergyRecord>,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously stored record so it can be updated.
    pub fn from_record(record: &EnergyRecord) -> Self {
        Self {
            draft: EnergyRecordDraft::from_record(record),
            ..Self::default()
        }
    }

    pub fn draft(&self) -> &EnergyRecordDraft {
        &self.draft
    }

    pub fn current_step(&self) -> FormStep {
        self.step
    }

    pub fn is_submitting(&self) -> bool {
        self.submission_in_flight
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    /// The stored record once the form reached its terminal state.
    pub fn submitted_record(&self) -> Option<&EnergyRecord> {
        self.submitted.as_ref()
    }

    pub fn can_go_back(&self) -> bool {
        !self.submission_in_flight && self.submitted.is_none() && self.step.previous().is_some()
    }

    pub fn progress(&self) -> Vec<(FormStep, StepStatus)> {
        FormStep::ALL
            .into_iter()
            .map(|step| {
                let status = if self.submitted.is_some() || step < self.step {
                    StepStatus::Completed
                } else if step == self.step {
                    StepStatus::Current
                } else {
                    StepStatus::Upcoming
                };
                (step, status)
            })
            .collect()
    }

    /// Replace the working copy with the result of one edit.
    pub fn edit(
        &mut self,
        edit: DraftEdit,
    ) {
        self.draft = self.draft.apply(edit);
    }

    /// Append a blank appliance row and return its identifier.
    pub fn add_appliance(&mut self) -> ApplianceId {
        let id = self.draft.peek_next_appliance_id();
        self.edit(DraftEdit::AddAppliance);
        id
    }

    fn ensure_navigable(&self) -> Result<(), FormError> {
        if self.submission_in_flight {
            return Err(FormError::Busy);
        }
        if self.submitted.is_some() {
            return Err(FormError::AlreadySubmitted);
        }
        Ok(())
    }

    /// Validate the current step and move forward, or start a submission on
    /// the last step.
    pub fn advance(
        &mut self,
        user_id: &UserId,
    ) -> Result<NextAction, FormError> {
        self.ensure_navigable()?;
        if let Err(err) = validate_step(self.step, &self.draft) {
            debug!(step = self.step.title(), field = err.field.label(), "step incomplete");
            return Err(err.into());
        }

        match self.step.next() {
            Some(next) => {
                self.step = next;
                debug!(step = next.title(), "moved to next step");
                Ok(NextAction::Moved(next))
            }
            None => self.begin_submission(user_id).map(NextAction::Submit),
        }
    }

    /// Step back one section. A no-op on the first step.
    pub fn previous(&mut self) -> Result<FormStep, FormError> {
        self.ensure_navigable()?;
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        Ok(self.step)
    }

    /// Build the record to upsert and close the submission gate.
    ///
    /// Fails with [`FormError::SubmissionInFlight`] when a submission has
    /// already been started and not completed.
    pub fn begin_submission(
        &mut self,
        user_id: &UserId,
    ) -> Result<PendingSubmission, FormError> {
        if self.submission_in_flight {
            return Err(FormError::SubmissionInFlight);
        }
        if self.submitted.is_some() {
            return Err(FormError::AlreadySubmitted);
        }
        if !self.step.is_last() {
            return Err(FormError::NotOnLastStep(self.step));
        }

        let record = self.draft.to_new_record(user_id.clone())?;
        self.submission_in_flight = true;
        debug!(user_id = %user_id, "submission started");
        Ok(PendingSubmission { record })
    }

    /// Reopen the gate with the store's answer.
    ///
    /// On failure the form stays on the last step with the draft intact so
    /// the user can retry.
    pub fn complete_submission(
        &mut self,
        result: Result<EnergyRecord, StoreError>,
    ) -> Result<EnergyRecord, FormError> {
        if !self.submission_in_flight {
            return Err(FormError::NoSubmissionInFlight);
        }
        self.submission_in_flight = false;

        match result {
            Ok(record) => {
                info!(user_id = %record.user_id, "energy data saved");
                self.submitted = Some(record.clone());
                Ok(record)
            }
            Err(err) => {
                warn!(error = %err, "error saving energy data");
                Err(err.into())
            }
        }
    }

    /// Upsert the draft through `store` and record the outcome.
    pub async fn submit<S>(
        &mut self,
        store: &S,
        session: &Session,
    ) -> Result<EnergyRecord, FormError>
    where
        S: RecordStore + ?Sized,
    {
        let pending = self.begin_submission(&session.user_id)?;
        let result = store.upsert_record(session, pending.into_record()).await;
        self.complete_submission(result)
    }

    /// Move forward, submitting through `store` when on the last step.
    pub async fn next<S>(
        &mut self,
        store: &S,
        session: &Session,
    ) -> Result<Advance, FormError>
    where
        S: RecordStore + ?Sized,
    {
        match self.advance(&session.user_id)? {
            NextAction::Moved(step) => Ok(Advance::Moved(step)),
            NextAction::Submit(pending) => {
                let result = store.upsert_record(session, pending.into_record()).await;
                self.complete_submission(result).map(Advance::Submitted)
            }
        }
    }

    /// Go back to the first step to update the information, keeping the draft.
    pub fn reopen(&mut self) -> Result<(), FormError> {
        if self.submission_in_flight {
            return Err(FormError::Busy);
        }
        self.submitted = None;
        self.step = FormStep::FIRST;
        Ok(())
    }
}
