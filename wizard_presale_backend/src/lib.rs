//! Wizard Presale Backend
//!
//! Registry and pricing engine for wizards sold before the permanent wizard
//! system goes live. Three classes of wizard are sold:
//! - Neutral: unlimited, fixed price
//! - Elemental (Fire, Wind, Water): unlimited, price rises with every sale
//! - Exclusive: capped id range, issued by the guildmaster
//!
//! Payment is the cycles attached to the call. The gatekeeper later absorbs
//! each wizard into the successor system and receives its paid-in value.

use candid::Principal;
use ic_cdk::{init, post_upgrade, pre_upgrade, query, update};
use ic_stable_structures::memory_manager::{MemoryManager, VirtualMemory};
use ic_stable_structures::DefaultMemoryImpl;
use std::cell::RefCell;

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod error;
pub mod presale;
pub mod types;
mod admin_query;
mod guard;
mod memory_ids;
mod payouts;
mod state;

pub use error::PresaleError;
pub use presale::{AuditEntry, CallContext, Presale, PresaleEvent};
pub use types::*;

use payouts::CanisterSettlement;

// ============================================================================
// MEMORY MANAGEMENT
// ============================================================================

pub type Memory = VirtualMemory<DefaultMemoryImpl>;

thread_local! {
    pub static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> =
        RefCell::new(MemoryManager::init(DefaultMemoryImpl::default()));
}

// ============================================================================
// LIFECYCLE HOOKS
// ============================================================================

#[init]
fn init(args: InitArgs) {
    let guildmaster = ic_cdk::api::msg_caller();
    match Presale::new(guildmaster, &args) {
        Ok(presale) => state::install(presale),
        Err(e) => ic_cdk::trap(&format!("Invalid presale configuration: {}", e)),
    }
    ic_cdk::println!(
        "Wizard Presale Initialized - guildmaster {}, sale {}+{}s, exclusive ids 1..={}",
        guildmaster, args.sale_start, args.sale_duration, args.max_exclusive_id
    );
}

#[pre_upgrade]
fn pre_upgrade() {
    let wizards = state::save();
    ic_cdk::println!("Pre-upgrade: saved presale with {} live wizards", wizards);
}

#[post_upgrade]
fn post_upgrade() {
    match state::restore() {
        Some(wizards) => ic_cdk::println!("Post-upgrade: restored presale with {} live wizards", wizards),
        None => ic_cdk::trap("CRITICAL: no presale state in stable memory"),
    }
}

// ============================================================================
// CALL PLUMBING
// ============================================================================

fn now_secs() -> u64 {
    ic_cdk::api::time() / NANOS_PER_SECOND
}

/// Payable calls see the attached cycles as their payment; the rest see none,
/// so anything attached to them is returned untouched.
fn context(payable: bool) -> CallContext {
    let ctx = CallContext::new(ic_cdk::api::msg_caller(), now_secs());
    if payable {
        ctx.paying(ic_cdk::api::msg_cycles_available())
    } else {
        ctx
    }
}

/// Runs `op` against the presale and settles only if it committed.
fn settled<T>(
    payable: bool,
    op: impl FnOnce(&mut Presale, &CallContext, &mut CanisterSettlement) -> Result<T, PresaleError>,
) -> Result<T, PresaleError> {
    let ctx = context(payable);
    let mut settlement = CanisterSettlement::new(ctx.caller, ctx.payment);
    let result = state::mutate(|presale| op(presale, &ctx, &mut settlement));
    if result.is_ok() {
        settlement.finish();
    }
    result
}

// ============================================================================
// CONJURING (PAYABLE)
// ============================================================================

#[update]
fn conjure_wizard(affinity: Affinity) -> Result<WizardId, PresaleError> {
    let id = settled(true, |p, ctx, s| p.conjure_wizard(ctx, affinity, s))?;
    ic_cdk::println!("Conjured wizard {} ({:?})", id, affinity);
    Ok(id)
}

#[update]
fn conjure_wizard_multi(affinities: Vec<Affinity>) -> Result<Vec<WizardId>, PresaleError> {
    let ids = settled(true, |p, ctx, s| p.conjure_wizard_multi(ctx, &affinities, s))?;
    ic_cdk::println!("Conjured {} wizards: {:?}", ids.len(), ids);
    Ok(ids)
}

#[update]
fn conjure_exclusive_wizard(id: WizardId, owner: Principal, affinity: Affinity) -> Result<WizardId, PresaleError> {
    let id = settled(true, |p, ctx, _| p.conjure_exclusive_wizard(ctx, id, owner, affinity))?;
    ic_cdk::println!("Conjured exclusive wizard {} for {}", id, owner);
    Ok(id)
}

#[update]
fn conjure_exclusive_wizard_multi(
    ids: Vec<WizardId>,
    owners: Vec<Principal>,
    powers: Vec<u128>,
    affinities: Vec<Affinity>,
) -> Result<Vec<WizardId>, PresaleError> {
    let ids = settled(true, |p, ctx, _| {
        p.conjure_exclusive_wizard_multi(ctx, &ids, &owners, &powers, &affinities)
    })?;
    ic_cdk::println!("Conjured {} exclusive wizards", ids.len());
    Ok(ids)
}

// ============================================================================
// OWNER AND GATEKEEPER
// ============================================================================

#[update]
fn set_affinity(id: WizardId, affinity: Affinity) -> Result<(), PresaleError> {
    settled(false, |p, ctx, _| p.set_affinity(ctx, id, affinity))
}

#[update]
fn absorb_wizard(id: WizardId) -> Result<WizardInfo, PresaleError> {
    let info = settled(false, |p, ctx, s| p.absorb_wizard(ctx, id, s))?;
    ic_cdk::println!("Absorbed wizard {} (power {})", id, info.power);
    Ok(info)
}

#[update]
fn absorb_wizard_multi(ids: Vec<WizardId>) -> Result<AbsorbedWizards, PresaleError> {
    let absorbed = settled(false, |p, ctx, s| p.absorb_wizard_multi(ctx, &ids, s))?;
    ic_cdk::println!("Absorbed {} wizards", absorbed.owners.len());
    Ok(absorbed)
}

// ============================================================================
// GUILDMASTER ADMINISTRATION
// ============================================================================

#[update]
fn set_gatekeeper(gatekeeper: Principal) -> Result<(), PresaleError> {
    // Absorption pays the gatekeeper, and the slot is one-shot
    payouts::require_cycles_recipient(gatekeeper, "Gatekeeper")?;
    settled(false, |p, ctx, _| p.set_gatekeeper(ctx, gatekeeper))?;
    ic_cdk::println!("Gatekeeper set to {}", gatekeeper);
    Ok(())
}

#[update]
fn postpone_sale(new_start: u64) -> Result<(), PresaleError> {
    settled(false, |p, ctx, _| p.postpone_sale(ctx, new_start))?;
    ic_cdk::println!("Sale postponed to {}", new_start);
    Ok(())
}

/// Without a payee the held value goes to the guildmaster, which then has
/// to be a canister.
#[update]
fn destroy(payee: Option<Principal>) -> Result<Cycles, PresaleError> {
    let payee = match payee {
        Some(payee) => {
            payouts::require_cycles_recipient(payee, "Payee")?;
            payee
        }
        None => state::read(|p| p.guildmaster()),
    };
    let amount = settled(false, |p, ctx, s| p.destroy_into(ctx, payee, s))?;
    ic_cdk::println!("Presale destroyed, {} cycles sent to {}", amount, payee);
    Ok(amount)
}

// ============================================================================
// QUERIES
// ============================================================================

#[query]
fn get_wizard(id: WizardId) -> Result<WizardInfo, PresaleError> {
    state::read(|p| p.get_wizard(id))
}

#[query]
fn is_during_sale() -> bool {
    state::read(|p| p.is_during_sale(now_secs()))
}

#[query]
fn cost_to_power(cost: Cycles) -> u128 {
    presale::cost_to_power(cost)
}

#[query]
fn power_to_cost(power: u128) -> Cycles {
    presale::power_to_cost(power)
}

#[query]
fn get_sale_config() -> SaleConfigView {
    state::read(|p| p.config())
}

#[query]
fn quote(affinity: Affinity) -> Cycles {
    state::read(|p| p.quote(affinity))
}

#[query]
fn get_elemental_cost() -> Cycles {
    state::read(|p| p.elemental_cost())
}

#[query]
fn get_next_wizard_id() -> WizardId {
    state::read(|p| p.next_id())
}

#[query]
fn owner_of(id: WizardId) -> Option<Principal> {
    state::read(|p| p.owner_of(id))
}

#[query]
fn balance_of(owner: Principal) -> u64 {
    state::read(|p| p.balance_of(owner))
}

#[query]
fn get_events(offset: u64, limit: u64) -> Vec<AuditEntry> {
    state::read(|p| p.events(offset, limit))
}

// ============================================================================
// RECEIVERS AND PAYOUTS
// ============================================================================

#[update]
fn register_wizard_receiver() -> Result<(), String> {
    payouts::register_wizard_receiver()
}

#[update]
fn unregister_wizard_receiver() -> bool {
    payouts::unregister_wizard_receiver()
}

#[query]
fn is_wizard_receiver(principal: Principal) -> bool {
    payouts::is_wizard_receiver(principal)
}

#[update]
async fn retry_payout() -> Result<Cycles, String> {
    payouts::retry_payout().await
}

#[query]
fn get_my_pending_payout() -> Option<PendingPayout> {
    payouts::get_pending_payout(ic_cdk::api::msg_caller())
}

// ============================================================================
// ADMIN
// ============================================================================

#[query]
fn admin_health_check() -> Result<HealthCheck, String> {
    admin_query::admin_health_check()
}

#[query]
fn admin_get_pending_payouts(offset: u64, limit: u64) -> Result<Vec<PendingPayoutInfo>, String> {
    admin_query::get_pending_payouts(offset, limit)
}

#[update]
fn admin_clear_guard(principal: Principal) -> Result<bool, String> {
    admin_query::clear_stuck_guard(principal)
}

#[query]
fn admin_has_active_guard(principal: Principal) -> Result<bool, String> {
    admin_query::has_active_guard(principal)
}

ic_cdk::export_candid!();
