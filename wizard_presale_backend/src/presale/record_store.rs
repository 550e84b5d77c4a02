use candid::{CandidType, Deserialize, Principal};
use std::collections::BTreeMap;

use crate::error::PresaleError;
use crate::types::{Affinity, WizardId, WizardRecord, MAX_POWER};

/// Live wizards plus the per-owner counts a non-fungible ledger keeps.
#[derive(CandidType, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: BTreeMap<WizardId, WizardRecord>,
    owner_counts: BTreeMap<Principal, u64>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        id: WizardId,
        owner: Principal,
        power: u128,
        affinity: Affinity,
    ) -> Result<(), PresaleError> {
        if self.records.contains_key(&id) {
            return Err(PresaleError::AlreadyExists(id));
        }
        if owner == Principal::anonymous() {
            return Err(PresaleError::Validation("Owner cannot be the anonymous principal".to_string()));
        }
        if power == 0 {
            return Err(PresaleError::Validation("Power must be positive".to_string()));
        }
        if power >= MAX_POWER {
            return Err(PresaleError::Validation(format!("Power {} exceeds 2^88", power)));
        }

        self.insert(WizardRecord { id, owner, power, affinity });
        Ok(())
    }

    pub fn query(&self, id: WizardId) -> Result<&WizardRecord, PresaleError> {
        self.records.get(&id).ok_or(PresaleError::NotFound(id))
    }

    /// Burns the record. Ownership passes to nobody.
    pub fn destroy(&mut self, id: WizardId) -> Result<WizardRecord, PresaleError> {
        let record = self.records.remove(&id).ok_or(PresaleError::NotFound(id))?;

        if let Some(count) = self.owner_counts.get_mut(&record.owner) {
            *count -= 1;
            if *count == 0 {
                self.owner_counts.remove(&record.owner);
            }
        }
        Ok(record)
    }

    pub fn owner_of(&self, id: WizardId) -> Option<Principal> {
        self.records.get(&id).map(|r| r.owner)
    }

    pub fn balance_of(&self, owner: Principal) -> u64 {
        self.owner_counts.get(&owner).copied().unwrap_or(0)
    }

    /// Live wizards.
    pub fn count(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = &WizardRecord> {
        self.records.values()
    }

    pub(crate) fn set_affinity(&mut self, id: WizardId, affinity: Affinity) -> Result<Affinity, PresaleError> {
        let record = self.records.get_mut(&id).ok_or(PresaleError::NotFound(id))?;
        Ok(std::mem::replace(&mut record.affinity, affinity))
    }

    /// Puts a burned record back exactly as it was. Only the journal calls this.
    pub(crate) fn restore(&mut self, record: WizardRecord) {
        self.insert(record);
    }

    fn insert(&mut self, record: WizardRecord) {
        *self.owner_counts.entry(record.owner).or_insert(0) += 1;
        self.records.insert(record.id, record);
    }

    #[cfg(test)]
    pub(crate) fn owner_count_total(&self) -> u64 {
        self.owner_counts.values().sum()
    }
}
