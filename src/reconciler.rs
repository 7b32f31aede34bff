use crate::entities::{Relation, RelationKey, RelationKind, Token, User};
use crate::error::StoreError;
use crate::events::AntibotEvent;
use crate::store::EntityStore;
use alloy::primitives::{Address, U256};

/// Applies one decoded contract event to the record store.
///
/// Handlers are idempotent under re-delivery and assume serialized
/// invocation in log order: each event is processed to completion before
/// the next is considered, and a handler sees its own writes when it reads
/// back within the same invocation. A store failure aborts the event
/// uncaught; there is no retry here.
pub struct Reconciler<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn handle(&self, event: &AntibotEvent) -> Result<(), StoreError> {
        match event {
            AntibotEvent::AntibotActiveChanged(e) => self.antibot_active_changed(e.token, e.active),
            AntibotEvent::AuthorityChanged(e) => {
                self.relation_flag_changed(RelationKind::Owner, e.target, e.user, e.authorized)
            }
            AntibotEvent::MarkedBlacklisted(e) => self.relation_flag_changed(
                RelationKind::Blacklisted,
                e.token,
                e.account,
                e.isBlacklisted,
            ),
            AntibotEvent::MarkedProtected(e) => {
                self.relation_flag_changed(RelationKind::Protected, e.token, e.account, e.isProtected)
            }
            AntibotEvent::MarkedUnthrottled(e) => self.relation_flag_changed(
                RelationKind::Unthrottled,
                e.token,
                e.account,
                e.isUnthrottled,
            ),
            AntibotEvent::MarkedWhitelisted(e) => self.relation_flag_changed(
                RelationKind::Whitelisted,
                e.token,
                e.account,
                e.isWhitelisted,
            ),
            AntibotEvent::MaxTransferAmountChanged(e) => {
                self.max_transfer_amount_changed(e.token, e.maxTransferAmount)
            }
            AntibotEvent::TradingStartChanged(e) => {
                self.trading_start_changed(e.token, e.tradingStart)
            }
            // Proxy/ownable housekeeping: no antibot state to track.
            AntibotEvent::AdminChanged(_)
            | AntibotEvent::BeaconUpgraded(_)
            | AntibotEvent::Initialized(_)
            | AntibotEvent::OwnershipTransferred(_)
            | AntibotEvent::Upgraded(_) => {
                tracing::debug!("[RECONCILE] Ignoring administrative event {}", event.name());
                Ok(())
            }
        }
    }

    fn antibot_active_changed(&self, token: Address, active: bool) -> Result<(), StoreError> {
        let mut record = self
            .store
            .load_token(token)?
            .unwrap_or_else(|| Token::with_defaults(token));
        record.antibot_active = active;
        self.store.save_token(&record)
    }

    fn trading_start_changed(&self, token: Address, trading_start: U256) -> Result<(), StoreError> {
        let mut record = self
            .store
            .load_token(token)?
            .unwrap_or_else(|| Token::with_defaults(token));
        record.trading_start = trading_start;
        self.store.save_token(&record)
    }

    fn max_transfer_amount_changed(
        &self,
        token: Address,
        max_transfer_amount: U256,
    ) -> Result<(), StoreError> {
        let mut record = self
            .store
            .load_token(token)?
            .unwrap_or_else(|| Token::with_defaults(token));
        record.max_transfer_amount = max_transfer_amount;
        self.store.save_token(&record)
    }

    /// Shared body of AuthorityChanged and the four Marked* handlers: the
    /// flag drives the relation record between absent and present.
    fn relation_flag_changed(
        &self,
        kind: RelationKind,
        token: Address,
        user: Address,
        flagged: bool,
    ) -> Result<(), StoreError> {
        self.ensure_token(token)?;
        self.ensure_user(user)?;

        let key = RelationKey::new(token, user);
        if flagged {
            if self.store.load_relation(kind, key)?.is_none() {
                self.store.save_relation(kind, &Relation::link(token, user))?;
                tracing::debug!("[RECONCILE] Created {} {}", kind.entity_name(), key);
            }
        } else if self.store.load_relation(kind, key)?.is_some() {
            self.store.delete_relation(kind, key)?;
            tracing::debug!("[RECONCILE] Removed {} {}", kind.entity_name(), key);
        }
        Ok(())
    }

    fn ensure_token(&self, token: Address) -> Result<(), StoreError> {
        if self.store.load_token(token)?.is_none() {
            self.store.save_token(&Token::with_defaults(token))?;
        }
        Ok(())
    }

    fn ensure_user(&self, user: Address) -> Result<(), StoreError> {
        if self.store.load_user(user)?.is_none() {
            self.store.save_user(&User { id: user })?;
        }
        Ok(())
    }
}
