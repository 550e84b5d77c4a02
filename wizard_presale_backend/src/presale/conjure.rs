use candid::Principal;

use super::journal::Transaction;
use super::price_ledger::{cost_to_power, power_to_cost};
use super::{CallContext, Gate, Presale, Settlement};
use crate::error::PresaleError;
use crate::types::{Affinity, Cycles, WizardId};

impl Presale {
    /// Public mint of one wizard for the caller during the sale.
    pub fn conjure_wizard(
        &mut self,
        ctx: &CallContext,
        affinity: Affinity,
        settlement: &mut impl Settlement,
    ) -> Result<WizardId, PresaleError> {
        let ids = self.conjure_public(ctx, &[affinity], settlement)?;
        Ok(ids[0])
    }

    /// Public mint of one wizard per affinity, all or nothing.
    pub fn conjure_wizard_multi(
        &mut self,
        ctx: &CallContext,
        affinities: &[Affinity],
        settlement: &mut impl Settlement,
    ) -> Result<Vec<WizardId>, PresaleError> {
        self.conjure_public(ctx, affinities, settlement)
    }

    /// Guildmaster mint into the reserved id range. Power is bought with the
    /// whole attached payment; nothing is refunded.
    pub fn conjure_exclusive_wizard(
        &mut self,
        ctx: &CallContext,
        id: WizardId,
        owner: Principal,
        affinity: Affinity,
    ) -> Result<WizardId, PresaleError> {
        self.require_live()?;
        self.access.authorize(Gate::Guildmaster, ctx.caller, ctx.now)?;
        self.require_exclusive_id(id)?;

        let mut tx = Transaction::begin(self, ctx.now);
        tx.create(id, owner, cost_to_power(ctx.payment), affinity)?;
        tx.credit(ctx.payment)?;
        tx.seal().commit();
        Ok(id)
    }

    /// Guildmaster batch mint with explicit powers. Requires
    /// `payment >= Σ power_to_cost(power_i)`; overpayment is kept.
    pub fn conjure_exclusive_wizard_multi(
        &mut self,
        ctx: &CallContext,
        ids: &[WizardId],
        owners: &[Principal],
        powers: &[u128],
        affinities: &[Affinity],
    ) -> Result<Vec<WizardId>, PresaleError> {
        self.require_live()?;
        self.access.authorize(Gate::Guildmaster, ctx.caller, ctx.now)?;

        let n = ids.len();
        if owners.len() != n || powers.len() != n || affinities.len() != n {
            return Err(PresaleError::Validation(format!(
                "Array lengths differ: ids {}, owners {}, powers {}, affinities {}",
                n,
                owners.len(),
                powers.len(),
                affinities.len()
            )));
        }
        for &id in ids {
            self.require_exclusive_id(id)?;
        }

        let mut tx = Transaction::begin(self, ctx.now);
        let mut required: Cycles = 0;
        for i in 0..n {
            tx.create(ids[i], owners[i], powers[i], affinities[i])?;
            // create() bounds power below 2^88, so the cost fits
            required = required
                .checked_add(power_to_cost(powers[i]))
                .ok_or_else(|| PresaleError::Validation("Batch cost overflow".to_string()))?;
        }
        if ctx.payment < required {
            return Err(PresaleError::InsufficientPayment { required, provided: ctx.payment });
        }
        tx.credit(ctx.payment)?;
        tx.seal().commit();
        Ok(ids.to_vec())
    }

    fn conjure_public(
        &mut self,
        ctx: &CallContext,
        affinities: &[Affinity],
        settlement: &mut impl Settlement,
    ) -> Result<Vec<WizardId>, PresaleError> {
        self.require_live()?;
        self.access.authorize(Gate::DuringSale, ctx.caller, ctx.now)?;
        if let Some(bad) = affinities.iter().find(|a| !a.is_set()) {
            return Err(PresaleError::Validation(format!("Cannot conjure a wizard with affinity {:?}", bad)));
        }
        let refund_fee = self.refund_fee;

        // Phase 1: ids, prices and records, all journaled
        let mut tx = Transaction::begin(self, ctx.now);
        let mut ids = Vec::with_capacity(affinities.len());
        let mut total: Cycles = 0;
        for &affinity in affinities {
            let id = tx.allocate_id()?;
            let price = tx.charge(affinity);
            tx.create(id, ctx.caller, cost_to_power(price), affinity)?;
            total = total
                .checked_add(price)
                .ok_or_else(|| PresaleError::Validation("Batch cost overflow".to_string()))?;
            ids.push(id);
        }

        if ctx.payment < total {
            return Err(PresaleError::InsufficientPayment { required: total, provided: ctx.payment });
        }
        let change = ctx.payment - total;
        let refund = if change > refund_fee { change } else { 0 };
        tx.credit(ctx.payment - refund)?;

        // Phase 2: acceptance checks, then the single refund
        let sealed = tx.seal();
        for &id in &ids {
            if !settlement.accepts_wizard(ctx.caller, id) {
                return Err(PresaleError::ReceiverRejected(ctx.caller, id));
            }
        }
        if refund > 0 {
            settlement.refund(ctx.caller, refund).map_err(PresaleError::TransferFailed)?;
        }
        sealed.commit();
        Ok(ids)
    }
}
