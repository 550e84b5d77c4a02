//! Presale core: the wizard registry, its pricing and its state machine.
//!
//! Everything here is synchronous and host-agnostic. The whole presale is one
//! value, [`Presale`], passed by reference into every operation; the canister
//! layer owns the single instance. Each mutating operation follows the same
//! two phases:
//!
//! 1. authorize at entry, then mutate through a journaled [`Transaction`]
//!    until internal state is final;
//! 2. seal the transaction, run external effects through [`Settlement`]
//!    (acceptance checks first, then at most one value movement), and commit.
//!
//! A failure at any point drops the transaction, which reverts every change.

pub mod absorption;
pub mod access;
pub mod affinity;
pub mod conjure;
pub mod events;
mod journal;
pub mod price_ledger;
pub mod record_store;
pub mod settlement;

#[cfg(test)]
pub(crate) mod tests;

use candid::{CandidType, Deserialize, Principal};

pub use access::{AccessController, Denial, Gate};
pub use events::{AuditEntry, PresaleEvent};
pub use price_ledger::{cost_to_power, next_elemental_cost, power_to_cost, PriceLedger};
pub use record_store::RecordStore;
pub use settlement::Settlement;

use crate::error::PresaleError;
use crate::types::{
    Affinity, Cycles, InitArgs, SaleConfigView, WizardId, WizardInfo, DEFAULT_REFUND_FEE,
    MAX_PAGINATION_LIMIT, SCALE,
};
use journal::Transaction;

/// Caller identity, current time (seconds) and attached payment for one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Principal,
    pub now: u64,
    pub payment: Cycles,
}

impl CallContext {
    pub fn new(caller: Principal, now: u64) -> Self {
        Self { caller, now, payment: 0 }
    }

    pub fn paying(mut self, payment: Cycles) -> Self {
        self.payment = payment;
        self
    }
}

#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Presale {
    access: AccessController,
    prices: PriceLedger,
    max_exclusive_id: WizardId,
    next_id: WizardId,
    refund_fee: Cycles,
    held: Cycles,
    terminated: bool,
    store: RecordStore,
    audit_log: Vec<AuditEntry>,
}

impl Presale {
    pub fn new(guildmaster: Principal, args: &InitArgs) -> Result<Self, PresaleError> {
        if guildmaster == Principal::anonymous() {
            return Err(PresaleError::Validation("Guildmaster cannot be the anonymous principal".to_string()));
        }
        if args.starting_cost < SCALE {
            return Err(PresaleError::Validation(format!(
                "Starting cost {} buys no power (minimum {})",
                args.starting_cost, SCALE
            )));
        }
        if args.sale_duration == 0 {
            return Err(PresaleError::Validation("Sale duration must be positive".to_string()));
        }
        let next_id = args
            .max_exclusive_id
            .checked_add(1)
            .ok_or_else(|| PresaleError::Validation("Exclusive id cap leaves no public ids".to_string()))?;

        Ok(Self {
            access: AccessController::new(guildmaster, args.sale_start, args.sale_duration),
            prices: PriceLedger::new(args.starting_cost, args.increment_rate),
            max_exclusive_id: args.max_exclusive_id,
            next_id,
            refund_fee: args.refund_fee.unwrap_or(DEFAULT_REFUND_FEE),
            held: 0,
            terminated: false,
            store: RecordStore::new(),
            audit_log: Vec::new(),
        })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn get_wizard(&self, id: WizardId) -> Result<WizardInfo, PresaleError> {
        self.store.query(id).map(WizardInfo::from)
    }

    pub fn is_during_sale(&self, now: u64) -> bool {
        self.access.is_during_sale(now)
    }

    pub fn owner_of(&self, id: WizardId) -> Option<Principal> {
        self.store.owner_of(id)
    }

    pub fn balance_of(&self, owner: Principal) -> u64 {
        self.store.balance_of(owner)
    }

    pub fn config(&self) -> SaleConfigView {
        SaleConfigView {
            guildmaster: self.access.guildmaster(),
            gatekeeper: self.access.gatekeeper(),
            sale_start: self.access.sale_start(),
            sale_duration: self.access.sale_duration(),
            neutral_cost: self.prices.neutral_cost(),
            elemental_cost: self.prices.elemental_cost(),
            increment_rate: self.prices.increment_rate(),
            max_exclusive_id: self.max_exclusive_id,
            next_id: self.next_id,
            refund_fee: self.refund_fee,
            held: self.held,
            terminated: self.terminated,
        }
    }

    pub fn guildmaster(&self) -> Principal {
        self.access.guildmaster()
    }

    pub fn elemental_cost(&self) -> Cycles {
        self.prices.elemental_cost()
    }

    pub fn next_id(&self) -> WizardId {
        self.next_id
    }

    pub fn held(&self) -> Cycles {
        self.held
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Price the next buyer of `affinity` would pay.
    pub fn quote(&self, affinity: Affinity) -> Cycles {
        self.prices.quote(affinity)
    }

    pub fn wizard_count(&self) -> u64 {
        self.store.count()
    }

    /// What absorbing every live wizard would pay out.
    pub fn owed_to_live_wizards(&self) -> Cycles {
        self.store
            .iter()
            .fold(0, |total: Cycles, r| total.saturating_add(power_to_cost(r.power)))
    }

    /// One page of the audit log, at most `MAX_PAGINATION_LIMIT` long.
    /// An offset the host cannot address is past the end.
    pub fn events(&self, offset: u64, limit: u64) -> Vec<AuditEntry> {
        let Ok(offset) = usize::try_from(offset) else {
            return Vec::new();
        };
        let limit = limit.min(MAX_PAGINATION_LIMIT) as usize;
        self.audit_log.iter().skip(offset).take(limit).cloned().collect()
    }

    pub fn event_count(&self) -> u64 {
        self.audit_log.len() as u64
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    pub fn set_gatekeeper(&mut self, ctx: &CallContext, gatekeeper: Principal) -> Result<(), PresaleError> {
        self.require_live()?;
        self.access.authorize(Gate::Guildmaster, ctx.caller, ctx.now)?;

        self.access.assign_gatekeeper(gatekeeper)?;
        self.record(ctx.now, PresaleEvent::GatekeeperSet { gatekeeper });
        Ok(())
    }

    pub fn postpone_sale(&mut self, ctx: &CallContext, new_start: u64) -> Result<(), PresaleError> {
        self.require_live()?;
        self.access.authorize(Gate::Guildmaster, ctx.caller, ctx.now)?;

        let previous = self.access.postpone(ctx.now, new_start)?;
        self.record(ctx.now, PresaleEvent::StartTimeSet { previous, start: new_start });
        Ok(())
    }

    /// Ends the presale for good and sends everything it holds to the guildmaster.
    pub fn destroy(&mut self, ctx: &CallContext, settlement: &mut impl Settlement) -> Result<Cycles, PresaleError> {
        let guildmaster = self.access.guildmaster();
        self.destroy_into(ctx, guildmaster, settlement)
    }

    /// [`Presale::destroy`], paying the held value to `payee` instead. Lets a
    /// guildmaster that cannot hold value itself name a wallet to sweep into.
    pub fn destroy_into(
        &mut self,
        ctx: &CallContext,
        payee: Principal,
        settlement: &mut impl Settlement,
    ) -> Result<Cycles, PresaleError> {
        self.require_live()?;
        self.access.authorize(Gate::Guildmaster, ctx.caller, ctx.now)?;
        if payee == Principal::anonymous() {
            return Err(PresaleError::Validation("Payee cannot be the anonymous principal".to_string()));
        }

        let amount = self.held;

        let mut tx = Transaction::begin(self, ctx.now);
        tx.debit(amount)?;
        tx.terminate();
        tx.emit(PresaleEvent::PresaleDestroyed { payee, amount });

        let sealed = tx.seal();
        if amount > 0 {
            settlement.transfer(payee, amount).map_err(PresaleError::TransferFailed)?;
        }
        sealed.commit();
        Ok(amount)
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn require_live(&self) -> Result<(), PresaleError> {
        if self.terminated {
            return Err(PresaleError::Terminated);
        }
        Ok(())
    }

    fn require_exclusive_id(&self, id: WizardId) -> Result<(), PresaleError> {
        if id == 0 || id > self.max_exclusive_id {
            return Err(PresaleError::Validation(format!(
                "Exclusive id {} outside 1..={}",
                id, self.max_exclusive_id
            )));
        }
        Ok(())
    }

    fn record(&mut self, now: u64, event: PresaleEvent) {
        self.audit_log.push(AuditEntry { timestamp: now, event });
    }
}
