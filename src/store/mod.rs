//! Record store collaborator: a key-value interface per entity type.
//!
//! The reconciler is generic over [`EntityStore`] so it can run against the
//! in-memory fake in tests and the sqlite store in the runner. All
//! operations are synchronous and read-your-own-write within a single
//! handler invocation.

use crate::entities::{Relation, RelationKey, RelationKind, Token, User};
use crate::error::StoreError;
use alloy::primitives::Address;
use dashmap::DashMap;

pub mod sqlite;

pub use sqlite::SqliteStore;

pub trait EntityStore {
    fn load_token(&self, id: Address) -> Result<Option<Token>, StoreError>;
    fn save_token(&self, token: &Token) -> Result<(), StoreError>;

    fn load_user(&self, id: Address) -> Result<Option<User>, StoreError>;
    fn save_user(&self, user: &User) -> Result<(), StoreError>;

    fn load_relation(
        &self,
        kind: RelationKind,
        key: RelationKey,
    ) -> Result<Option<Relation>, StoreError>;
    fn save_relation(&self, kind: RelationKind, relation: &Relation) -> Result<(), StoreError>;
    fn delete_relation(&self, kind: RelationKind, key: RelationKey) -> Result<(), StoreError>;
}

/// In-memory store for tests and dry runs. Uniqueness per (type, key) falls
/// out of the backing maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tokens: DashMap<Address, Token>,
    users: DashMap<Address, User>,
    relations: DashMap<(RelationKind, RelationKey), Relation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn relation_count(&self, kind: RelationKind) -> usize {
        self.relations
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .count()
    }

    pub fn total_relation_count(&self) -> usize {
        self.relations.len()
    }
}

impl EntityStore for MemoryStore {
    fn load_token(&self, id: Address) -> Result<Option<Token>, StoreError> {
        Ok(self.tokens.get(&id).map(|entry| entry.clone()))
    }

    fn save_token(&self, token: &Token) -> Result<(), StoreError> {
        self.tokens.insert(token.id, token.clone());
        Ok(())
    }

    fn load_user(&self, id: Address) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|entry| *entry))
    }

    fn save_user(&self, user: &User) -> Result<(), StoreError> {
        self.users.insert(user.id, *user);
        Ok(())
    }

    fn load_relation(
        &self,
        kind: RelationKind,
        key: RelationKey,
    ) -> Result<Option<Relation>, StoreError> {
        Ok(self.relations.get(&(kind, key)).map(|entry| *entry))
    }

    fn save_relation(&self, kind: RelationKind, relation: &Relation) -> Result<(), StoreError> {
        self.relations.insert((kind, relation.id), *relation);
        Ok(())
    }

    fn delete_relation(&self, kind: RelationKind, key: RelationKey) -> Result<(), StoreError> {
        self.relations.remove(&(kind, key));
        Ok(())
    }
}
