//! Cycles settlement for the presale.
//!
//! Refunds never leave the canister: the unaccepted part of the attached
//! cycles goes back to the caller with the reply. Outbound payouts are sent
//! with `deposit_cycles` from a zero-delay timer, so they run only after the
//! operation that owes them has committed. A deposit that fails is parked per
//! recipient until the recipient retries it.

use candid::Principal;
use ic_cdk::management_canister::{deposit_cycles, DepositCyclesArgs};
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;
use std::time::Duration;

use crate::error::PresaleError;
use crate::guard::OperationGuard;
use crate::memory_ids::{PENDING_PAYOUTS_MEMORY_ID, WIZARD_RECEIVERS_MEMORY_ID};
use crate::presale::Settlement;
use crate::types::{Cycles, PendingPayout, WizardId};
use crate::{Memory, MEMORY_MANAGER};

thread_local! {
    /// Canisters that opted in to holding wizards, with their registration time
    static WIZARD_RECEIVERS: RefCell<StableBTreeMap<Principal, u64, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(WIZARD_RECEIVERS_MEMORY_ID)))
        )
    );

    static PENDING_PAYOUTS: RefCell<StableBTreeMap<Principal, PendingPayout, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(PENDING_PAYOUTS_MEMORY_ID)))
        )
    );
}

// =============================================================================
// PRINCIPAL CLASSES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrincipalKind {
    Anonymous,
    /// Self-authenticating: an end user's key
    User,
    /// Opaque id assigned by the subnet
    Canister,
    Other,
}

pub fn classify(principal: &Principal) -> PrincipalKind {
    if *principal == Principal::anonymous() {
        return PrincipalKind::Anonymous;
    }
    match principal.as_slice().last() {
        Some(0x02) => PrincipalKind::User,
        Some(0x01) => PrincipalKind::Canister,
        _ => PrincipalKind::Other,
    }
}

/// Roles that get paid (gatekeeper, destroy payee) must be able to hold
/// cycles, and only canisters can.
pub fn require_cycles_recipient(principal: Principal, role: &str) -> Result<(), PresaleError> {
    match classify(&principal) {
        PrincipalKind::Canister => Ok(()),
        kind => Err(PresaleError::Validation(format!(
            "{} {} ({:?}) cannot receive cycles",
            role, principal, kind
        ))),
    }
}

// =============================================================================
// SETTLEMENT
// =============================================================================

/// Settlement for one update call.
///
/// Nothing here touches the outside world until [`CanisterSettlement::finish`],
/// which the endpoint calls only after the presale committed. Dropping an
/// unfinished settlement accepts nothing, and the IC returns the caller's
/// cycles in full.
pub struct CanisterSettlement {
    caller: Principal,
    available: Cycles,
    refunded: Cycles,
    payouts: Vec<(Principal, Cycles)>,
}

impl CanisterSettlement {
    pub fn new(caller: Principal, available: Cycles) -> Self {
        Self {
            caller,
            available,
            refunded: 0,
            payouts: Vec::new(),
        }
    }

    /// Accepts what the presale kept and dispatches owed payouts.
    pub fn finish(self) -> Cycles {
        let keep = self.available - self.refunded;
        let accepted = if keep > 0 { ic_cdk::api::msg_cycles_accept(keep) } else { 0 };
        if accepted < keep {
            ic_cdk::println!("CRITICAL: accepted {} of {} cycles from {}", accepted, keep, self.caller);
        }
        for (to, amount) in self.payouts {
            schedule_payout(to, amount);
        }
        accepted
    }
}

impl Settlement for CanisterSettlement {
    fn accepts_wizard(&mut self, recipient: Principal, _id: WizardId) -> bool {
        match classify(&recipient) {
            PrincipalKind::User => true,
            PrincipalKind::Canister => is_wizard_receiver(recipient),
            PrincipalKind::Anonymous | PrincipalKind::Other => false,
        }
    }

    fn refund(&mut self, to: Principal, amount: Cycles) -> Result<(), String> {
        if to != self.caller {
            return Err(format!("Refunds only return to the caller, not {}", to));
        }
        let refunded = self
            .refunded
            .checked_add(amount)
            .filter(|total| *total <= self.available)
            .ok_or_else(|| format!("Refund {} exceeds attached {}", amount, self.available))?;
        self.refunded = refunded;
        Ok(())
    }

    fn transfer(&mut self, to: Principal, amount: Cycles) -> Result<(), String> {
        match classify(&to) {
            PrincipalKind::Canister => {
                self.payouts.push((to, amount));
                Ok(())
            }
            kind => Err(format!("{} ({:?}) cannot receive cycles", to, kind)),
        }
    }
}

// =============================================================================
// DELIVERY
// =============================================================================

fn schedule_payout(to: Principal, amount: Cycles) {
    let created_at = ic_cdk::api::time();
    ic_cdk_timers::set_timer(Duration::ZERO, async move {
        let _ = deliver(to, amount, created_at).await;
    });
}

async fn deliver(to: Principal, amount: Cycles, created_at: u64) -> Result<(), String> {
    match deposit_cycles(&DepositCyclesArgs { canister_id: to }, amount).await {
        Ok(()) => {
            ic_cdk::println!("Payout: deposited {} cycles into {}", amount, to);
            Ok(())
        }
        Err(e) => {
            let error = format!("{:?}", e);
            ic_cdk::println!("Payout: deposit of {} cycles into {} failed: {}", amount, to, error);
            park_payout(to, amount, created_at, error.clone());
            Err(error)
        }
    }
}

/// Adds to whatever is already parked for `to`, keeping the oldest timestamp.
fn park_payout(to: Principal, amount: Cycles, created_at: u64, error: String) {
    PENDING_PAYOUTS.with(|p| {
        let mut map = p.borrow_mut();
        let payout = match map.get(&to) {
            Some(existing) => PendingPayout {
                amount: existing.amount.saturating_add(amount),
                created_at: existing.created_at.min(created_at),
                last_error: Some(error),
            },
            None => PendingPayout { amount, created_at, last_error: Some(error) },
        };
        map.insert(to, payout);
    });
}

/// Re-sends everything parked for the caller.
pub async fn retry_payout() -> Result<Cycles, String> {
    let caller = ic_cdk::api::msg_caller();
    let _guard = OperationGuard::new(caller)?;

    // Taken out before the await; a failed deposit parks it again
    let pending = PENDING_PAYOUTS
        .with(|p| p.borrow_mut().remove(&caller))
        .ok_or("No pending payout")?;

    deliver(caller, pending.amount, pending.created_at).await?;
    Ok(pending.amount)
}

pub fn get_pending_payout(recipient: Principal) -> Option<PendingPayout> {
    PENDING_PAYOUTS.with(|p| p.borrow().get(&recipient))
}

pub(crate) fn list_pending_payouts(offset: usize, limit: usize) -> Vec<(Principal, PendingPayout)> {
    PENDING_PAYOUTS.with(|p| {
        let map = p.borrow();
        map.keys()
            .skip(offset)
            .take(limit)
            .filter_map(|recipient| map.get(&recipient).map(|payout| (recipient, payout)))
            .collect()
    })
}

pub(crate) fn pending_payouts_total() -> Cycles {
    PENDING_PAYOUTS.with(|p| p.borrow().values().fold(0, |total: Cycles, v| total.saturating_add(v.amount)))
}

// =============================================================================
// RECEIVER REGISTRY
// =============================================================================

pub fn register_wizard_receiver() -> Result<(), String> {
    let caller = ic_cdk::api::msg_caller();
    if classify(&caller) != PrincipalKind::Canister {
        return Err("Only canisters register as wizard receivers".to_string());
    }
    WIZARD_RECEIVERS.with(|r| r.borrow_mut().insert(caller, ic_cdk::api::time()));
    ic_cdk::println!("Receiver registered: {}", caller);
    Ok(())
}

pub fn unregister_wizard_receiver() -> bool {
    let caller = ic_cdk::api::msg_caller();
    WIZARD_RECEIVERS.with(|r| r.borrow_mut().remove(&caller)).is_some()
}

pub fn is_wizard_receiver(principal: Principal) -> bool {
    WIZARD_RECEIVERS.with(|r| r.borrow().contains_key(&principal))
}
