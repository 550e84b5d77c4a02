use super::journal::Transaction;
use super::price_ledger::power_to_cost;
use super::{CallContext, Gate, Presale, PresaleEvent, Settlement};
use crate::error::PresaleError;
use crate::types::{AbsorbedWizards, Cycles, WizardId, WizardInfo};

impl Presale {
    /// Burns one wizard and pays its paid-in value to the gatekeeper.
    pub fn absorb_wizard(
        &mut self,
        ctx: &CallContext,
        id: WizardId,
        settlement: &mut impl Settlement,
    ) -> Result<WizardInfo, PresaleError> {
        let absorbed = self.absorb(ctx, &[id], settlement)?;
        Ok(WizardInfo {
            owner: absorbed.owners[0],
            power: absorbed.powers[0],
            affinity: absorbed.affinities[0],
        })
    }

    /// Burns every listed wizard with one aggregate payout. A single unknown
    /// or repeated id fails the whole batch.
    pub fn absorb_wizard_multi(
        &mut self,
        ctx: &CallContext,
        ids: &[WizardId],
        settlement: &mut impl Settlement,
    ) -> Result<AbsorbedWizards, PresaleError> {
        self.absorb(ctx, ids, settlement)
    }

    fn absorb(
        &mut self,
        ctx: &CallContext,
        ids: &[WizardId],
        settlement: &mut impl Settlement,
    ) -> Result<AbsorbedWizards, PresaleError> {
        self.require_live()?;
        self.access.authorize(Gate::Gatekeeper, ctx.caller, ctx.now)?;

        let mut tx = Transaction::begin(self, ctx.now);
        let mut absorbed = AbsorbedWizards::default();
        let mut total: Cycles = 0;
        for &id in ids {
            let record = tx.destroy(id)?;
            let value = power_to_cost(record.power);
            tx.emit(PresaleEvent::WizardAbsorbed { id, owner: record.owner, power: record.power, value });
            total = total
                .checked_add(value)
                .ok_or_else(|| PresaleError::Validation("Absorbed value overflow".to_string()))?;

            absorbed.owners.push(record.owner);
            absorbed.powers.push(record.power);
            absorbed.affinities.push(record.affinity);
        }
        tx.debit(total)?;

        let sealed = tx.seal();
        if total > 0 {
            settlement.transfer(ctx.caller, total).map_err(PresaleError::TransferFailed)?;
        }
        sealed.commit();
        Ok(absorbed)
    }
}
