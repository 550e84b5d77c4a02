use candid::{CandidType, Deserialize, Principal};
use serde::Serialize;
use thiserror::Error;

use crate::types::{Cycles, WizardId};

/// Every way a presale operation can fail. A failed operation commits nothing.
#[derive(CandidType, Deserialize, Serialize, Error, Clone, Debug, PartialEq, Eq)]
pub enum PresaleError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Sale window: {0}")]
    WindowError(String),

    #[error("Wizard {0} not found")]
    NotFound(WizardId),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Wizard {0} already exists")]
    AlreadyExists(WizardId),

    #[error("Wizard {0} already has an affinity")]
    AlreadyAssigned(WizardId),

    #[error("Insufficient payment: required {required}, provided {provided}")]
    InsufficientPayment { required: Cycles, provided: Cycles },

    #[error("Receiver {0} rejected wizard {1}")]
    ReceiverRejected(Principal, WizardId),

    #[error("Value transfer failed: {0}")]
    TransferFailed(String),

    #[error("Presale has been destroyed")]
    Terminated,
}
