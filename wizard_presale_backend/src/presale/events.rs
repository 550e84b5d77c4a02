use candid::{CandidType, Deserialize, Principal};
use serde::Serialize;

use crate::types::{Affinity, Cycles, WizardId};

/// Audit trail entry. Only committed operations produce these.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: u64,
    pub event: PresaleEvent,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum PresaleEvent {
    WizardConjured { id: WizardId, owner: Principal, affinity: Affinity, power: u128 },
    AffinityAssigned { id: WizardId, affinity: Affinity },
    StartTimeSet { previous: u64, start: u64 },
    GatekeeperSet { gatekeeper: Principal },
    WizardAbsorbed { id: WizardId, owner: Principal, power: u128, value: Cycles },
    PresaleDestroyed { payee: Principal, amount: Cycles },
}
