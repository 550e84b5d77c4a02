// Wizard Presale Type Definitions

use candid::{CandidType, Deserialize, Principal};
use ic_stable_structures::storable::{Bound, Storable};
use serde::Serialize;
use std::borrow::Cow;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Cycles per unit of power. `power = cost / SCALE`, `cost = power * SCALE`.
pub const SCALE: u128 = 1_000;
/// `increment_rate` is expressed in hundred-thousandths (100_000 = +100% per sale).
pub const INCREMENT_DENOMINATOR: u128 = 100_000;
/// Exclusive upper bound on a wizard's power (2^88).
pub const MAX_POWER: u128 = 1 << 88;
/// Overhead of a refund transfer. Change at or below this is kept, not refunded.
pub const DEFAULT_REFUND_FEE: u128 = 10_000;
/// Cap for every paginated query.
pub const MAX_PAGINATION_LIMIT: u64 = 100;
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

pub type WizardId = u64;
pub type Cycles = u128;

// =============================================================================
// WIZARD TYPES
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Affinity {
    NotSet,
    Neutral,
    Fire,
    Wind,
    Water,
}

impl Affinity {
    /// Every affinity except `NotSet`.
    pub fn is_set(self) -> bool {
        self != Affinity::NotSet
    }

    /// Fire, Wind and Water ride the rising price curve.
    pub fn is_elemental(self) -> bool {
        matches!(self, Affinity::Fire | Affinity::Wind | Affinity::Water)
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct WizardRecord {
    pub id: WizardId,
    pub owner: Principal,
    pub power: u128,
    pub affinity: Affinity,
}

/// What `get_wizard` and absorption hand back to the successor system.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct WizardInfo {
    pub owner: Principal,
    pub power: u128,
    pub affinity: Affinity,
}

impl From<&WizardRecord> for WizardInfo {
    fn from(record: &WizardRecord) -> Self {
        Self {
            owner: record.owner,
            power: record.power,
            affinity: record.affinity,
        }
    }
}

/// Parallel arrays returned by `absorb_wizard_multi`, in input order.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AbsorbedWizards {
    pub owners: Vec<Principal>,
    pub powers: Vec<u128>,
    pub affinities: Vec<Affinity>,
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Install-time arguments. Everything except `sale_start` is fixed afterwards.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct InitArgs {
    pub starting_cost: Cycles,
    pub increment_rate: u128,
    pub max_exclusive_id: WizardId,
    /// Seconds since the Unix epoch.
    pub sale_start: u64,
    pub sale_duration: u64,
    pub refund_fee: Option<Cycles>,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SaleConfigView {
    pub guildmaster: Principal,
    pub gatekeeper: Option<Principal>,
    pub sale_start: u64,
    pub sale_duration: u64,
    pub neutral_cost: Cycles,
    pub elemental_cost: Cycles,
    pub increment_rate: u128,
    pub max_exclusive_id: WizardId,
    pub next_id: WizardId,
    pub refund_fee: Cycles,
    pub held: Cycles,
    pub terminated: bool,
}

// =============================================================================
// CANISTER TYPES
// =============================================================================

/// Payout parked after its deposit failed. The recipient retries it manually.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PendingPayout {
    pub amount: Cycles,
    pub created_at: u64,
    pub last_error: Option<String>,
}

impl Storable for PendingPayout {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(
            candid::encode_one(self).expect(
                "CRITICAL: Failed to encode PendingPayout. \
                 This should never happen unless there's a bug in candid serialization."
            )
        )
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect(
            "CRITICAL: Failed to decode PendingPayout from stable storage. \
             This indicates storage corruption or an incompatible canister upgrade."
        )
    }

    const BOUND: Bound = Bound::Unbounded;
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct PendingPayoutInfo {
    pub recipient: Principal,
    pub payout: PendingPayout,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct HealthCheck {
    pub held: Cycles,
    pub owed_to_live_wizards: Cycles,
    pub pending_payouts_total: Cycles,
    pub canister_balance: Cycles,
    pub live_wizards: u64,
    pub is_healthy: bool,
    pub health_status: String,
    pub timestamp: u64,
}
