use candid::Principal;
use std::cell::RefCell;
use std::collections::BTreeSet;

thread_local! {
    static PENDING_OPERATIONS: RefCell<BTreeSet<Principal>> = const { RefCell::new(BTreeSet::new()) };
}

/// Guard to prevent concurrent payout retries from the same caller.
/// Released on drop, including when the awaiting call is rejected.
pub struct OperationGuard {
    caller: Principal,
}

impl OperationGuard {
    /// Returns error if `caller` already has an operation in flight
    pub fn new(caller: Principal) -> Result<Self, String> {
        PENDING_OPERATIONS.with(|ops| {
            let mut ops = ops.borrow_mut();
            if !ops.insert(caller) {
                return Err("Operation already in progress for this caller".to_string());
            }
            Ok(Self { caller })
        })
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        PENDING_OPERATIONS.with(|ops| {
            ops.borrow_mut().remove(&self.caller);
        });
    }
}

/// Emergency valve for a guard stranded by a trap mid-operation.
/// Returns true if a guard was cleared.
pub fn clear_guard_for_principal(principal: Principal) -> bool {
    PENDING_OPERATIONS.with(|ops| ops.borrow_mut().remove(&principal))
}

pub fn has_active_guard(principal: Principal) -> bool {
    PENDING_OPERATIONS.with(|ops| ops.borrow().contains(&principal))
}
