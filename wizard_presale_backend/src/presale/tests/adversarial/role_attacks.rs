//! Role Escalation Attack Tests

use crate::error::PresaleError;
use crate::presale::tests::{fixture, gatekeeper, guildmaster, open_sale, user, with_gatekeeper, MockSettlement, SALE_START};
use crate::presale::CallContext;
use crate::types::{Affinity, SCALE};

#[test]
fn attack_outsider_uses_guildmaster_operations() {
    println!("\n🔴 ATTACK: Outsider calls every guildmaster operation");

    let mut presale = fixture();
    let attacker = CallContext::new(user(99), 0).paying(10 * SCALE);
    let before = presale.clone();

    println!("\n✅ DEFENSE CHECK:");
    let results = [
        presale.conjure_exclusive_wizard(&attacker, 1, user(99), Affinity::Fire).map(|_| ()),
        presale
            .conjure_exclusive_wizard_multi(&attacker, &[1], &[user(99)], &[1], &[Affinity::Fire])
            .map(|_| ()),
        presale.set_gatekeeper(&attacker, user(99)),
        presale.postpone_sale(&attacker, SALE_START + 10),
        presale.destroy(&attacker, &mut MockSettlement::default()).map(|_| ()),
        presale.destroy_into(&attacker, user(99), &mut MockSettlement::default()).map(|_| ()),
    ];
    for result in results {
        assert!(matches!(result, Err(PresaleError::Unauthorized(_))), "🔥 EXPLOIT SUCCEEDED: {:?}", result);
    }
    assert_eq!(presale, before);

    println!("\n✅ ATTACK THWARTED: Guildmaster operations are guildmaster-only");
}

#[test]
fn attack_guildmaster_absorbs_without_gatekeeper_role() {
    println!("\n🔴 ATTACK: Guildmaster absorbs a wizard directly");

    let mut presale = with_gatekeeper(fixture());
    let id = presale
        .conjure_wizard(&open_sale(user(1)).paying(1_000), Affinity::Neutral, &mut MockSettlement::default())
        .unwrap();

    let result = presale.absorb_wizard(&CallContext::new(guildmaster(), 0), id, &mut MockSettlement::default());

    println!("\n✅ DEFENSE CHECK:");
    assert!(matches!(result, Err(PresaleError::Unauthorized(_))));
    assert!(presale.get_wizard(id).is_ok());

    println!("\n✅ ATTACK THWARTED: Only the gatekeeper absorbs");
}

#[test]
fn attack_hijack_gatekeeper_slot() {
    println!("\n🔴 ATTACK: Guildmaster tries to swap the gatekeeper after it is set");

    let mut presale = with_gatekeeper(fixture());

    let result = presale.set_gatekeeper(&CallContext::new(guildmaster(), 0), user(5));

    println!("\n✅ DEFENSE CHECK:");
    assert!(matches!(result, Err(PresaleError::Validation(_))));
    assert_eq!(presale.config().gatekeeper, Some(gatekeeper()));

    println!("\n✅ ATTACK THWARTED: Gatekeeper is set exactly once");
}

#[test]
fn attack_steal_affinity_choice() {
    println!("\n🔴 ATTACK: Choose the affinity of someone else's exclusive");

    let mut presale = fixture();
    presale
        .conjure_exclusive_wizard(&CallContext::new(guildmaster(), 0).paying(SCALE), 1, user(1), Affinity::NotSet)
        .unwrap();

    for attacker in [user(2), guildmaster()] {
        let result = presale.set_affinity(&CallContext::new(attacker, 0), 1, Affinity::Fire);
        assert!(matches!(result, Err(PresaleError::Unauthorized(_))));
    }

    println!("\n✅ DEFENSE CHECK:");
    assert_eq!(presale.get_wizard(1).unwrap().affinity, Affinity::NotSet);
    presale.set_affinity(&CallContext::new(user(1), 0), 1, Affinity::Water).unwrap();

    println!("\n✅ ATTACK THWARTED: Owner still holds the one-time choice");
}

#[test]
fn attack_postpone_after_start() {
    println!("\n🔴 ATTACK: Postpone a running sale to lock buyers out");

    let mut presale = fixture();
    let result = presale.postpone_sale(&CallContext::new(guildmaster(), SALE_START), SALE_START + 500);

    println!("\n✅ DEFENSE CHECK:");
    assert!(matches!(result, Err(PresaleError::WindowError(_))));
    assert!(presale.is_during_sale(SALE_START));

    println!("\n✅ ATTACK THWARTED: Start only moves before the sale opens");
}
