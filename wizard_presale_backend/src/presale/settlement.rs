use candid::Principal;

use crate::types::{Cycles, WizardId};

/// The presale's only window onto the outside world.
///
/// Operations call into a `Settlement` strictly after their internal state is
/// final, and an implementation never sees the presale itself, so nothing it
/// does can observe or re-enter a half-applied mutation. If any call here
/// fails, the operation is rolled back and reports the failure.
///
/// Acceptance checks always run before value moves, and each operation moves
/// value at most once, as its very last step.
pub trait Settlement {
    /// Standard acceptance check for a wizard freshly minted to `recipient`.
    fn accepts_wizard(&mut self, recipient: Principal, id: WizardId) -> bool;

    /// Returns `amount` of the payment attached to the current call.
    fn refund(&mut self, to: Principal, amount: Cycles) -> Result<(), String>;

    /// Pays `amount` out of held value. Fails if `to` cannot receive it.
    fn transfer(&mut self, to: Principal, amount: Cycles) -> Result<(), String>;
}
