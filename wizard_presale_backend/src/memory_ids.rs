//! Central registry for stable memory IDs.
//!
//! IMPORTANT: All memory IDs must be unique across the entire canister.
//!
//! Allocation strategy:
//! - 0-9: Presale core (snapshot of the whole store, written on upgrade)
//! - 10-19: Receiver registry
//! - 20-29: Payouts

// Presale core (0-9)
pub const PRESALE_STATE_MEMORY_ID: u8 = 0;

// Receiver registry (10-19)
pub const WIZARD_RECEIVERS_MEMORY_ID: u8 = 10;

// Payouts (20-29)
pub const PENDING_PAYOUTS_MEMORY_ID: u8 = 20;
