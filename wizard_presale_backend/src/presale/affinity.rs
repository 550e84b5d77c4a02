use super::journal::Transaction;
use super::{CallContext, Presale};
use crate::error::PresaleError;
use crate::types::{Affinity, WizardId};

impl Presale {
    /// One-time affinity choice for a wizard minted without one.
    ///
    /// Checks run in a fixed order: the new value, the record, its current
    /// affinity, then ownership. A second call on the same id therefore fails
    /// with `AlreadyAssigned` whoever makes it.
    pub fn set_affinity(&mut self, ctx: &CallContext, id: WizardId, affinity: Affinity) -> Result<(), PresaleError> {
        self.require_live()?;
        if !affinity.is_set() {
            return Err(PresaleError::Validation("New affinity must not be NotSet".to_string()));
        }

        let record = self.store.query(id)?;
        if record.affinity.is_set() {
            return Err(PresaleError::AlreadyAssigned(id));
        }
        if record.owner != ctx.caller {
            return Err(PresaleError::Unauthorized(format!("Caller does not own wizard {}", id)));
        }

        let mut tx = Transaction::begin(self, ctx.now);
        tx.assign_affinity(id, affinity)?;
        tx.seal().commit();
        Ok(())
    }
}
