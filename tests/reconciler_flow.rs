use alloy::primitives::{Address, U256};
use antibot_indexer::entities::{RelationKey, RelationKind, Token};
use antibot_indexer::events::{Antibot, AntibotEvent};
use antibot_indexer::reconciler::Reconciler;
use antibot_indexer::store::{EntityStore, MemoryStore};

fn token_addr() -> Address {
    Address::from([0xAA; 20])
}

fn user_addr() -> Address {
    Address::from([0xBB; 20])
}

fn active_changed(token: Address, active: bool) -> AntibotEvent {
    AntibotEvent::AntibotActiveChanged(Antibot::AntibotActiveChanged { token, active })
}

fn authority_changed(target: Address, user: Address, authorized: bool) -> AntibotEvent {
    AntibotEvent::AuthorityChanged(Antibot::AuthorityChanged {
        target,
        user,
        authorized,
    })
}

fn marked_blacklisted(token: Address, account: Address, flag: bool) -> AntibotEvent {
    AntibotEvent::MarkedBlacklisted(Antibot::MarkedBlacklisted {
        token,
        account,
        isBlacklisted: flag,
    })
}

fn marked_protected(token: Address, account: Address, flag: bool) -> AntibotEvent {
    AntibotEvent::MarkedProtected(Antibot::MarkedProtected {
        token,
        account,
        isProtected: flag,
    })
}

fn marked_unthrottled(token: Address, account: Address, flag: bool) -> AntibotEvent {
    AntibotEvent::MarkedUnthrottled(Antibot::MarkedUnthrottled {
        token,
        account,
        isUnthrottled: flag,
    })
}

fn marked_whitelisted(token: Address, account: Address, flag: bool) -> AntibotEvent {
    AntibotEvent::MarkedWhitelisted(Antibot::MarkedWhitelisted {
        token,
        account,
        isWhitelisted: flag,
    })
}

fn trading_start_changed(token: Address, trading_start: u64) -> AntibotEvent {
    AntibotEvent::TradingStartChanged(Antibot::TradingStartChanged {
        token,
        tradingStart: U256::from(trading_start),
    })
}

fn max_transfer_amount_changed(token: Address, amount: u64) -> AntibotEvent {
    AntibotEvent::MaxTransferAmountChanged(Antibot::MaxTransferAmountChanged {
        token,
        maxTransferAmount: U256::from(amount),
    })
}

fn relation_events() -> Vec<(RelationKind, fn(Address, Address, bool) -> AntibotEvent)> {
    vec![
        (RelationKind::Owner, authority_changed),
        (RelationKind::Blacklisted, marked_blacklisted),
        (RelationKind::Protected, marked_protected),
        (RelationKind::Unthrottled, marked_unthrottled),
        (RelationKind::Whitelisted, marked_whitelisted),
    ]
}

#[test]
fn test_authority_grant_creates_token_user_and_owner() {
    let reconciler = Reconciler::new(MemoryStore::new());

    reconciler
        .handle(&authority_changed(token_addr(), user_addr(), true))
        .expect("grant");

    let store = reconciler.store();
    assert_eq!(store.token_count(), 1);
    assert_eq!(store.user_count(), 1);
    assert_eq!(store.relation_count(RelationKind::Owner), 1);

    let token = store
        .load_token(token_addr())
        .expect("load token")
        .expect("token must exist");
    assert_eq!(token, Token::with_defaults(token_addr()));

    let key = RelationKey::new(token_addr(), user_addr());
    let owner = store
        .load_relation(RelationKind::Owner, key)
        .expect("load owner")
        .expect("owner must exist");
    assert_eq!(owner.token, token_addr());
    assert_eq!(owner.user, user_addr());
}

#[test]
fn test_authority_revoke_removes_owner_but_keeps_token_and_user() {
    let reconciler = Reconciler::new(MemoryStore::new());

    reconciler
        .handle(&authority_changed(token_addr(), user_addr(), true))
        .expect("grant");
    reconciler
        .handle(&authority_changed(token_addr(), user_addr(), false))
        .expect("revoke");

    let store = reconciler.store();
    assert_eq!(store.token_count(), 1);
    assert_eq!(store.user_count(), 1);
    assert_eq!(store.relation_count(RelationKind::Owner), 0);
    assert_eq!(
        store
            .load_token(token_addr())
            .expect("load token")
            .expect("token must exist"),
        Token::with_defaults(token_addr())
    );
}

#[test]
fn test_antibot_active_toggle_keeps_single_token() {
    let reconciler = Reconciler::new(MemoryStore::new());

    reconciler
        .handle(&active_changed(token_addr(), true))
        .expect("activate");
    let token = reconciler
        .store()
        .load_token(token_addr())
        .expect("load")
        .expect("must exist");
    assert!(token.antibot_active);
    assert_eq!(token.trading_start, U256::ZERO);
    assert_eq!(token.max_transfer_amount, U256::ZERO);

    reconciler
        .handle(&active_changed(token_addr(), false))
        .expect("deactivate");
    let token = reconciler
        .store()
        .load_token(token_addr())
        .expect("load")
        .expect("must exist");
    assert!(!token.antibot_active);
    assert_eq!(reconciler.store().token_count(), 1);
}

#[test]
fn test_every_relation_kind_grant_and_revoke_round_trip() {
    for (kind, make_event) in relation_events() {
        let reconciler = Reconciler::new(MemoryStore::new());

        reconciler
            .handle(&make_event(token_addr(), user_addr(), true))
            .expect("grant");
        assert_eq!(reconciler.store().relation_count(kind), 1, "{kind:?}");

        reconciler
            .handle(&make_event(token_addr(), user_addr(), false))
            .expect("revoke");
        assert_eq!(reconciler.store().relation_count(kind), 0, "{kind:?}");
        assert_eq!(reconciler.store().token_count(), 1, "{kind:?}");
        assert_eq!(reconciler.store().user_count(), 1, "{kind:?}");
    }
}

#[test]
fn test_repeated_grant_is_idempotent() {
    for (kind, make_event) in relation_events() {
        let reconciler = Reconciler::new(MemoryStore::new());

        reconciler
            .handle(&make_event(token_addr(), user_addr(), true))
            .expect("first grant");
        reconciler
            .handle(&make_event(token_addr(), user_addr(), true))
            .expect("second grant");

        let store = reconciler.store();
        assert_eq!(store.relation_count(kind), 1, "{kind:?}");
        let relation = store
            .load_relation(kind, RelationKey::new(token_addr(), user_addr()))
            .expect("load")
            .expect("must exist");
        assert_eq!(relation.token, token_addr());
        assert_eq!(relation.user, user_addr());
    }
}

#[test]
fn test_revoke_without_grant_is_noop() {
    for (kind, make_event) in relation_events() {
        let reconciler = Reconciler::new(MemoryStore::new());

        reconciler
            .handle(&make_event(token_addr(), user_addr(), false))
            .expect("revoke on empty store");

        // Token and User are still ensured; only the relation stays absent.
        let store = reconciler.store();
        assert_eq!(store.relation_count(kind), 0, "{kind:?}");
        assert_eq!(store.token_count(), 1, "{kind:?}");
        assert_eq!(store.user_count(), 1, "{kind:?}");
    }
}

#[test]
fn test_partial_update_preserves_other_fields() {
    let reconciler = Reconciler::new(MemoryStore::new());

    reconciler
        .handle(&active_changed(token_addr(), true))
        .expect("activate");
    reconciler
        .handle(&trading_start_changed(token_addr(), 5))
        .expect("set trading start");
    reconciler
        .handle(&max_transfer_amount_changed(token_addr(), 7))
        .expect("set max transfer");

    reconciler
        .handle(&max_transfer_amount_changed(token_addr(), 9))
        .expect("update max transfer");

    let token = reconciler
        .store()
        .load_token(token_addr())
        .expect("load")
        .expect("must exist");
    assert!(token.antibot_active);
    assert_eq!(token.trading_start, U256::from(5u64));
    assert_eq!(token.max_transfer_amount, U256::from(9u64));
    assert_eq!(reconciler.store().token_count(), 1);
}

#[test]
fn test_field_handlers_create_token_with_defaults() {
    let reconciler = Reconciler::new(MemoryStore::new());
    reconciler
        .handle(&trading_start_changed(token_addr(), 11))
        .expect("trading start on fresh token");
    let token = reconciler
        .store()
        .load_token(token_addr())
        .expect("load")
        .expect("must exist");
    assert!(!token.antibot_active);
    assert_eq!(token.trading_start, U256::from(11u64));
    assert_eq!(token.max_transfer_amount, U256::ZERO);

    let reconciler = Reconciler::new(MemoryStore::new());
    reconciler
        .handle(&max_transfer_amount_changed(token_addr(), 13))
        .expect("max transfer on fresh token");
    let token = reconciler
        .store()
        .load_token(token_addr())
        .expect("load")
        .expect("must exist");
    assert!(!token.antibot_active);
    assert_eq!(token.trading_start, U256::ZERO);
    assert_eq!(token.max_transfer_amount, U256::from(13u64));
}

#[test]
fn test_relation_events_leave_existing_token_fields_untouched() {
    let reconciler = Reconciler::new(MemoryStore::new());

    reconciler
        .handle(&active_changed(token_addr(), true))
        .expect("activate");
    reconciler
        .handle(&trading_start_changed(token_addr(), 21))
        .expect("set trading start");
    reconciler
        .handle(&authority_changed(token_addr(), user_addr(), true))
        .expect("grant");

    let token = reconciler
        .store()
        .load_token(token_addr())
        .expect("load")
        .expect("must exist");
    assert!(token.antibot_active);
    assert_eq!(token.trading_start, U256::from(21u64));
}

#[test]
fn test_relation_kinds_do_not_interfere() {
    let reconciler = Reconciler::new(MemoryStore::new());

    reconciler
        .handle(&marked_blacklisted(token_addr(), user_addr(), true))
        .expect("blacklist");
    reconciler
        .handle(&marked_whitelisted(token_addr(), user_addr(), false))
        .expect("whitelist revoke");

    let store = reconciler.store();
    assert_eq!(store.relation_count(RelationKind::Blacklisted), 1);
    assert_eq!(store.relation_count(RelationKind::Whitelisted), 0);
}

#[test]
fn test_composite_key_orders_token_before_user() {
    let reconciler = Reconciler::new(MemoryStore::new());

    reconciler
        .handle(&authority_changed(token_addr(), user_addr(), true))
        .expect("grant");

    let store = reconciler.store();
    let forward = RelationKey::new(token_addr(), user_addr());
    let reversed = RelationKey::new(user_addr(), token_addr());
    assert!(store
        .load_relation(RelationKind::Owner, forward)
        .expect("load forward")
        .is_some());
    assert!(store
        .load_relation(RelationKind::Owner, reversed)
        .expect("load reversed")
        .is_none());
}

#[test]
fn test_full_sequence_is_idempotent_under_redelivery() {
    let reconciler = Reconciler::new(MemoryStore::new());
    let sequence = [
        active_changed(token_addr(), true),
        authority_changed(token_addr(), user_addr(), true),
        marked_blacklisted(token_addr(), user_addr(), true),
        trading_start_changed(token_addr(), 99),
        marked_blacklisted(token_addr(), user_addr(), false),
    ];

    for event in &sequence {
        reconciler.handle(event).expect("first delivery");
    }
    let token_after_first = reconciler
        .store()
        .load_token(token_addr())
        .expect("load")
        .expect("must exist");

    for event in &sequence {
        reconciler.handle(event).expect("redelivery");
    }

    let store = reconciler.store();
    assert_eq!(store.token_count(), 1);
    assert_eq!(store.user_count(), 1);
    assert_eq!(store.relation_count(RelationKind::Owner), 1);
    assert_eq!(store.relation_count(RelationKind::Blacklisted), 0);
    assert_eq!(
        store
            .load_token(token_addr())
            .expect("load")
            .expect("must exist"),
        token_after_first
    );
}
