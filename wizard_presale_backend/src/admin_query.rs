use candid::Principal;

use crate::guard;
use crate::payouts;
use crate::state;
use crate::types::{HealthCheck, PendingPayoutInfo, MAX_PAGINATION_LIMIT};

fn require_guildmaster() -> Result<(), String> {
    let caller = ic_cdk::api::msg_caller();
    if caller != state::read(|p| p.guildmaster()) {
        return Err("Unauthorized: guildmaster only".to_string());
    }
    Ok(())
}

/// Held value against what the canister actually has and what it owes.
pub fn admin_health_check() -> Result<HealthCheck, String> {
    require_guildmaster()?;

    let (held, owed_to_live_wizards, live_wizards) =
        state::read(|p| (p.held(), p.owed_to_live_wizards(), p.wizard_count()));
    let pending_payouts_total = payouts::pending_payouts_total();
    let canister_balance = ic_cdk::api::canister_cycle_balance();

    let obligations = held.saturating_add(pending_payouts_total);
    let (is_healthy, health_status) = if held < owed_to_live_wizards {
        (false, "CRITICAL: HELD BELOW OWED".to_string())
    } else if canister_balance < obligations {
        (false, "CRITICAL: BALANCE BELOW OBLIGATIONS".to_string())
    } else {
        (true, "HEALTHY".to_string())
    };

    Ok(HealthCheck {
        held,
        owed_to_live_wizards,
        pending_payouts_total,
        canister_balance,
        live_wizards,
        is_healthy,
        health_status,
        timestamp: ic_cdk::api::time(),
    })
}

pub fn get_pending_payouts(offset: u64, limit: u64) -> Result<Vec<PendingPayoutInfo>, String> {
    require_guildmaster()?;
    let Ok(offset) = usize::try_from(offset) else {
        return Ok(Vec::new());
    };
    let limit = limit.min(MAX_PAGINATION_LIMIT) as usize;
    Ok(payouts::list_pending_payouts(offset, limit)
        .into_iter()
        .map(|(recipient, payout)| PendingPayoutInfo { recipient, payout })
        .collect())
}

pub fn clear_stuck_guard(principal: Principal) -> Result<bool, String> {
    require_guildmaster()?;
    let cleared = guard::clear_guard_for_principal(principal);
    ic_cdk::println!("Admin: guard for {} cleared: {}", principal, cleared);
    Ok(cleared)
}

pub fn has_active_guard(principal: Principal) -> Result<bool, String> {
    require_guildmaster()?;
    Ok(guard::has_active_guard(principal))
}
