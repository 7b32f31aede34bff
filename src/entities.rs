use alloy::primitives::{hex, Address, U256};
use std::fmt;

/// Length of a [`RelationKey`]: two 20-byte addresses, token first.
pub const RELATION_KEY_LEN: usize = 40;

/// One record per antibot-protected token contract, keyed by its address.
///
/// The five list fields exist in the schema but are populated by no handler;
/// they stay unset for the life of the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: Address,
    pub antibot_active: bool,
    pub trading_start: U256,
    pub max_transfer_amount: U256,
    pub owners: Option<Vec<Address>>,
    pub whitelisted_accounts: Option<Vec<Address>>,
    pub unthrottled_accounts: Option<Vec<Address>>,
    pub protected_accounts: Option<Vec<Address>>,
    pub blacklisted_accounts: Option<Vec<Address>>,
}

impl Token {
    pub fn with_defaults(id: Address) -> Self {
        Self {
            id,
            antibot_active: false,
            trading_start: U256::ZERO,
            max_transfer_amount: U256::ZERO,
            owners: None,
            whitelisted_accounts: None,
            unthrottled_accounts: None,
            protected_accounts: None,
            blacklisted_accounts: None,
        }
    }
}

/// Marker record: existence means the address has appeared in some relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct User {
    pub id: Address,
}

/// Tag selecting one of the five (token, user) relation record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Owner,
    Blacklisted,
    Protected,
    Unthrottled,
    Whitelisted,
}

impl RelationKind {
    pub const ALL: [RelationKind; 5] = [
        RelationKind::Owner,
        RelationKind::Blacklisted,
        RelationKind::Protected,
        RelationKind::Unthrottled,
        RelationKind::Whitelisted,
    ];

    pub fn entity_name(self) -> &'static str {
        match self {
            RelationKind::Owner => "Owner",
            RelationKind::Blacklisted => "BlacklistedAccount",
            RelationKind::Protected => "ProtectedAccount",
            RelationKind::Unthrottled => "UnthrottledAccount",
            RelationKind::Whitelisted => "WhitelistedAccount",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            RelationKind::Owner => "owners",
            RelationKind::Blacklisted => "blacklisted_accounts",
            RelationKind::Protected => "protected_accounts",
            RelationKind::Unthrottled => "unthrottled_accounts",
            RelationKind::Whitelisted => "whitelisted_accounts",
        }
    }
}

/// Composite key for relation records: the raw concatenation of the token
/// address followed by the user address, no delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationKey([u8; RELATION_KEY_LEN]);

impl RelationKey {
    pub fn new(token: Address, user: Address) -> Self {
        let mut raw = [0u8; RELATION_KEY_LEN];
        raw[..20].copy_from_slice(token.as_slice());
        raw[20..].copy_from_slice(user.as_slice());
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; RELATION_KEY_LEN] {
        &self.0
    }

    pub fn token(&self) -> Address {
        Address::from_slice(&self.0[..20])
    }

    pub fn user(&self) -> Address {
        Address::from_slice(&self.0[20..])
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A (token, user) relation record. The `token` and `user` references are
/// set once at creation and never updated; the record is deleted outright
/// when the flag that created it is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub id: RelationKey,
    pub token: Address,
    pub user: Address,
}

impl Relation {
    pub fn link(token: Address, user: Address) -> Self {
        Self {
            id: RelationKey::new(token, user),
            token,
            user,
        }
    }
}
