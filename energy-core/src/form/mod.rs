//! The multi-step energy intake form.

pub mod draft;
pub mod session;
pub mod step;
pub mod validation;

pub use draft::{ApplianceDraft, ApplianceField, ApplianceId, DraftEdit, EnergyRecordDraft};
pub use session::{Advance, FormError, FormSession, NextAction, PendingSubmission};
pub use step::{FormStep, StepStatus};
pub use validation::{MissingField, ValidationError, missing_fields, validate_step};
