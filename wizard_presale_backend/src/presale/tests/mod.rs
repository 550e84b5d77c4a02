//! Shared fixtures for the presale test suites.


use candid::Principal;
use std::collections::BTreeSet;

use super::{CallContext, Presale, Settlement};
use crate::types::{Affinity, Cycles, InitArgs, WizardId, SCALE};

pub(crate) const SALE_START: u64 = 1_000;
pub(crate) const SALE_DURATION: u64 = 1_000;

pub(crate) fn user(n: u8) -> Principal {
    Principal::from_slice(&[n; 29])
}

pub(crate) fn guildmaster() -> Principal {
    Principal::from_slice(&[0xAA; 29])
}

pub(crate) fn gatekeeper() -> Principal {
    Principal::from_slice(&[0xBB; 29])
}

/// `starting_cost = 1000`, flat elemental price, ids 1..=5 reserved.
pub(crate) fn fixture() -> Presale {
    fixture_with(1_000, 0, 5)
}

pub(crate) fn fixture_with(starting_cost: Cycles, increment_rate: u128, max_exclusive_id: WizardId) -> Presale {
    let args = InitArgs {
        starting_cost,
        increment_rate,
        max_exclusive_id,
        sale_start: SALE_START,
        sale_duration: SALE_DURATION,
        refund_fee: None,
    };
    Presale::new(guildmaster(), &args).unwrap()
}

pub(crate) fn with_gatekeeper(mut presale: Presale) -> Presale {
    presale
        .set_gatekeeper(&CallContext::new(guildmaster(), 0), gatekeeper())
        .unwrap();
    presale
}

pub(crate) fn open_sale(caller: Principal) -> CallContext {
    CallContext::new(caller, SALE_START)
}

pub(crate) fn mint_neutral(presale: &mut Presale, owner: Principal) -> WizardId {
    let price = presale.config().neutral_cost;
    presale
        .conjure_wizard(&open_sale(owner).paying(price), Affinity::Neutral, &mut MockSettlement::default())
        .unwrap()
}

pub(crate) fn mint_exclusive(presale: &mut Presale, id: WizardId, owner: Principal, affinity: Affinity) {
    let ctx = CallContext::new(guildmaster(), 0).paying(SCALE);
    presale.conjure_exclusive_wizard(&ctx, id, owner, affinity).unwrap();
}

/// Records every external effect and fails on demand.
#[derive(Debug, Default)]
pub(crate) struct MockSettlement {
    pub rejecting: BTreeSet<Principal>,
    pub fail_transfers: bool,
    pub fail_refunds: bool,
    pub checked: Vec<(Principal, WizardId)>,
    pub refunds: Vec<(Principal, Cycles)>,
    pub transfers: Vec<(Principal, Cycles)>,
}

impl MockSettlement {
    pub fn rejecting(recipient: Principal) -> Self {
        Self {
            rejecting: BTreeSet::from([recipient]),
            ..Self::default()
        }
    }

    pub fn failing_transfers() -> Self {
        Self {
            fail_transfers: true,
            ..Self::default()
        }
    }

    pub fn failing_refunds() -> Self {
        Self {
            fail_refunds: true,
            ..Self::default()
        }
    }
}

impl Settlement for MockSettlement {
    fn accepts_wizard(&mut self, recipient: Principal, id: WizardId) -> bool {
        self.checked.push((recipient, id));
        !self.rejecting.contains(&recipient)
    }

    fn refund(&mut self, to: Principal, amount: Cycles) -> Result<(), String> {
        if self.fail_refunds {
            return Err(format!("refund of {} to {} bounced", amount, to));
        }
        self.refunds.push((to, amount));
        Ok(())
    }

    fn transfer(&mut self, to: Principal, amount: Cycles) -> Result<(), String> {
        if self.fail_transfers || self.rejecting.contains(&to) {
            return Err(format!("{} rejected {}", to, amount));
        }
        self.transfers.push((to, amount));
        Ok(())
    }
}
