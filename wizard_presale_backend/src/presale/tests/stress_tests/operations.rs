use crate::error::PresaleError;
use crate::types::{Affinity, Cycles, WizardId};

#[derive(Debug, Clone, PartialEq)]
pub enum OpResult {
    Success,
    Failed(PresaleError),
}

impl OpResult {
    pub fn is_success(&self) -> bool {
        matches!(self, OpResult::Success)
    }
}

#[derive(Debug, Clone)]
pub enum Operation {
    Conjure { user: u8, affinities: Vec<Affinity>, overpay: Cycles, rejects: bool },
    ConjureExclusive { id: WizardId, owner: u8, payment: Cycles },
    ConjureExclusiveMulti { ids: Vec<WizardId>, owner: u8, powers: Vec<u128>, underpay: bool },
    SetAffinity { caller: u8, id: WizardId, affinity: Affinity },
    Absorb { ids: Vec<WizardId>, payout_fails: bool },
    SetGatekeeper,
    Postpone { delay: u64 },
    AdvanceTime { secs: u64 },
    Destroy,
}
