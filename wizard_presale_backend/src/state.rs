//! The canister's single presale instance.
//!
//! Lives on the heap while the canister runs. Stable memory is written only
//! in `pre_upgrade` and read back in `post_upgrade`.

use candid::{CandidType, Deserialize};
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::storable::{Bound, Storable};
use ic_stable_structures::StableCell;
use std::borrow::Cow;
use std::cell::RefCell;

use crate::memory_ids::PRESALE_STATE_MEMORY_ID;
use crate::presale::Presale;
use crate::{Memory, MEMORY_MANAGER};

#[derive(CandidType, Deserialize, Clone, Debug, Default)]
struct StoredPresale(Option<Presale>);

impl Storable for StoredPresale {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(
            candid::encode_one(self).expect(
                "CRITICAL: Failed to encode presale state. \
                 The upgrade cannot proceed without losing wizards."
            )
        )
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect(
            "CRITICAL: Failed to decode presale state from stable storage. \
             This indicates storage corruption or an incompatible canister upgrade."
        )
    }

    const BOUND: Bound = Bound::Unbounded;
}

thread_local! {
    static PRESALE: RefCell<Option<Presale>> = const { RefCell::new(None) };

    static PRESALE_STATE: RefCell<StableCell<StoredPresale, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(PRESALE_STATE_MEMORY_ID))),
            StoredPresale::default()
        )
    );
}

pub fn install(presale: Presale) {
    PRESALE.with(|p| *p.borrow_mut() = Some(presale));
}

pub fn read<R>(f: impl FnOnce(&Presale) -> R) -> R {
    PRESALE.with(|p| match p.borrow().as_ref() {
        Some(presale) => f(presale),
        None => ic_cdk::trap("Presale not initialized"),
    })
}

/// Exclusive access for the whole synchronous body of an update call.
pub fn mutate<R>(f: impl FnOnce(&mut Presale) -> R) -> R {
    PRESALE.with(|p| match p.borrow_mut().as_mut() {
        Some(presale) => f(presale),
        None => ic_cdk::trap("Presale not initialized"),
    })
}

/// Snapshot the heap state into stable memory (call in pre_upgrade)
pub fn save() -> u64 {
    let snapshot = PRESALE.with(|p| p.borrow().clone());
    let wizards = snapshot.as_ref().map(|p| p.wizard_count()).unwrap_or(0);
    PRESALE_STATE.with(|cell| {
        cell.borrow_mut().set(StoredPresale(snapshot));
    });
    wizards
}

/// Restore the heap state from stable memory (call in post_upgrade)
pub fn restore() -> Option<u64> {
    let stored = PRESALE_STATE.with(|cell| cell.borrow().get().0.clone());
    let wizards = stored.as_ref().map(|p| p.wizard_count());
    PRESALE.with(|p| *p.borrow_mut() = stored);
    wizards
}
