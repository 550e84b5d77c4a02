use candid::Principal;

use super::events::{AuditEntry, PresaleEvent};
use super::Presale;
use crate::error::PresaleError;
use crate::types::{Affinity, Cycles, WizardId, WizardRecord};

enum Undo {
    Created(WizardId),
    Destroyed(WizardRecord),
    NextId(WizardId),
    ElementalCost(Cycles),
    Affinity(WizardId, Affinity),
    Held(Cycles),
    Terminated,
}

/// Exclusive mutation window over the presale.
///
/// Every change goes through here and is journaled. Dropping the transaction
/// without committing replays the journal backwards, so an early `?` return
/// anywhere in an operation leaves the presale exactly as it was found.
/// Events are buffered and reach the audit log only on commit.
pub(crate) struct Transaction<'a> {
    presale: &'a mut Presale,
    now: u64,
    undo: Vec<Undo>,
    events: Vec<PresaleEvent>,
    committed: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(presale: &'a mut Presale, now: u64) -> Self {
        Self {
            presale,
            now,
            undo: Vec::new(),
            events: Vec::new(),
            committed: false,
        }
    }

    /// Takes the next sequential public id.
    pub(crate) fn allocate_id(&mut self) -> Result<WizardId, PresaleError> {
        let id = self.presale.next_id;
        let next = id
            .checked_add(1)
            .ok_or_else(|| PresaleError::Validation("Wizard id space exhausted".to_string()))?;
        self.undo.push(Undo::NextId(id));
        self.presale.next_id = next;
        Ok(id)
    }

    /// Price for one unit of `affinity`. Elemental sales advance the curve.
    pub(crate) fn charge(&mut self, affinity: Affinity) -> Cycles {
        if affinity.is_elemental() {
            self.undo.push(Undo::ElementalCost(self.presale.prices.elemental_cost));
            self.presale.prices.advance_elemental()
        } else {
            self.presale.prices.neutral_cost
        }
    }

    pub(crate) fn create(
        &mut self,
        id: WizardId,
        owner: Principal,
        power: u128,
        affinity: Affinity,
    ) -> Result<(), PresaleError> {
        self.presale.store.create(id, owner, power, affinity)?;
        self.undo.push(Undo::Created(id));
        self.events.push(PresaleEvent::WizardConjured { id, owner, affinity, power });
        Ok(())
    }

    pub(crate) fn destroy(&mut self, id: WizardId) -> Result<WizardRecord, PresaleError> {
        let record = self.presale.store.destroy(id)?;
        self.undo.push(Undo::Destroyed(record.clone()));
        Ok(record)
    }

    pub(crate) fn assign_affinity(&mut self, id: WizardId, affinity: Affinity) -> Result<(), PresaleError> {
        let previous = self.presale.store.set_affinity(id, affinity)?;
        self.undo.push(Undo::Affinity(id, previous));
        self.events.push(PresaleEvent::AffinityAssigned { id, affinity });
        Ok(())
    }

    pub(crate) fn credit(&mut self, amount: Cycles) -> Result<(), PresaleError> {
        let held = self
            .presale
            .held
            .checked_add(amount)
            .ok_or_else(|| PresaleError::Validation("Held value overflow".to_string()))?;
        self.undo.push(Undo::Held(self.presale.held));
        self.presale.held = held;
        Ok(())
    }

    pub(crate) fn debit(&mut self, amount: Cycles) -> Result<(), PresaleError> {
        let held = self.presale.held.checked_sub(amount).ok_or_else(|| {
            PresaleError::TransferFailed(format!(
                "presale holds {} but owes {}",
                self.presale.held, amount
            ))
        })?;
        self.undo.push(Undo::Held(self.presale.held));
        self.presale.held = held;
        Ok(())
    }

    pub(crate) fn terminate(&mut self) {
        if !self.presale.terminated {
            self.undo.push(Undo::Terminated);
            self.presale.terminated = true;
        }
    }

    pub(crate) fn emit(&mut self, event: PresaleEvent) {
        self.events.push(event);
    }

    /// Ends phase one. A sealed transaction can only commit or roll back.
    pub(crate) fn seal(self) -> Sealed<'a> {
        Sealed { tx: self }
    }

    fn rollback(&mut self) {
        while let Some(step) = self.undo.pop() {
            match step {
                Undo::Created(id) => {
                    let _ = self.presale.store.destroy(id);
                }
                Undo::Destroyed(record) => self.presale.store.restore(record),
                Undo::NextId(id) => self.presale.next_id = id,
                Undo::ElementalCost(cost) => self.presale.prices.elemental_cost = cost,
                Undo::Affinity(id, previous) => {
                    let _ = self.presale.store.set_affinity(id, previous);
                }
                Undo::Held(held) => self.presale.held = held,
                Undo::Terminated => self.presale.terminated = false,
            }
        }
        self.events.clear();
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

/// Phase two: internal state is final while external effects run.
pub(crate) struct Sealed<'a> {
    tx: Transaction<'a>,
}

impl Sealed<'_> {
    pub(crate) fn commit(mut self) {
        let now = self.tx.now;
        let events = std::mem::take(&mut self.tx.events);
        self.tx
            .presale
            .audit_log
            .extend(events.into_iter().map(|event| AuditEntry { timestamp: now, event }));
        self.tx.committed = true;
    }
}
