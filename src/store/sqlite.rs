use crate::entities::{Relation, RelationKey, RelationKind, Token, User};
use crate::error::StoreError;
use crate::store::EntityStore;
use alloy::primitives::{Address, U256};
use rusqlite::ffi::ErrorCode;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DEFAULT_DB_PATH: &str = "antibot.db";

static LAST_STORE_NOW_MS: AtomicU64 = AtomicU64::new(1);

fn now_ms() -> u64 {
    let sample = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_millis() as u64);
    let mut prev = LAST_STORE_NOW_MS.load(Ordering::Relaxed);
    loop {
        let normalized = sample.unwrap_or(prev).max(prev).max(1);
        match LAST_STORE_NOW_MS.compare_exchange_weak(
            prev,
            normalized,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return normalized,
            Err(actual) => prev = actual,
        }
    }
}

fn is_sqlite_locked_error(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

fn parse_address_column(raw: String) -> rusqlite::Result<Address> {
    Address::from_str(raw.trim()).map_err(|e| rusqlite::Error::ToSqlConversionFailure(e.into()))
}

fn parse_u256_column(raw: String) -> rusqlite::Result<U256> {
    U256::from_str(raw.trim()).map_err(|e| rusqlite::Error::ToSqlConversionFailure(e.into()))
}

fn parse_address_list_column(raw: Option<String>) -> rusqlite::Result<Option<Vec<Address>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    serde_json::from_str::<Vec<Address>>(&raw)
        .map(Some)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(e.into()))
}

fn encode_address_list(
    context: &'static str,
    list: Option<&[Address]>,
) -> Result<Option<String>, StoreError> {
    let Some(list) = list else {
        return Ok(None);
    };
    serde_json::to_string(list)
        .map(Some)
        .map_err(|err| StoreError::Query {
            context,
            reason: format!("failed to encode address list: {err}"),
        })
}

/// Sqlite-backed record store. One row per (entity type, key); addresses and
/// composite keys are stored as lowercase hex text. Writes are synchronous:
/// every handler depends on reading its own writes back within the same
/// invocation.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(DEFAULT_DB_PATH)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.with_connection("ensure_schema", |conn| {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS tokens (
                    address TEXT PRIMARY KEY NOT NULL,
                    antibot_active INTEGER NOT NULL,
                    trading_start TEXT NOT NULL,
                    max_transfer_amount TEXT NOT NULL,
                    owners TEXT,
                    whitelisted_accounts TEXT,
                    unthrottled_accounts TEXT,
                    protected_accounts TEXT,
                    blacklisted_accounts TEXT,
                    updated_at_ms INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS users (
                    address TEXT PRIMARY KEY NOT NULL,
                    created_at_ms INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS sync_checkpoint (
                    id INTEGER PRIMARY KEY CHECK (id = 0),
                    last_block INTEGER NOT NULL,
                    updated_at_ms INTEGER NOT NULL
                );
                "#,
            )?;
            for kind in RelationKind::ALL {
                conn.execute_batch(&format!(
                    r#"
                    CREATE TABLE IF NOT EXISTS {table} (
                        id TEXT PRIMARY KEY NOT NULL,
                        token_address TEXT NOT NULL,
                        user_address TEXT NOT NULL,
                        created_at_ms INTEGER NOT NULL
                    );
                    CREATE INDEX IF NOT EXISTS idx_{table}_token ON {table}(token_address);
                    CREATE INDEX IF NOT EXISTS idx_{table}_user ON {table}(user_address);
                    "#,
                    table = kind.table(),
                ))?;
            }
            // WAL keeps readers unblocked while the indexer writes.
            let _ = conn.execute_batch(
                r#"
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                "#,
            );
            Ok(())
        })
    }

    fn with_connection<T, F>(&self, context: &'static str, op: F) -> Result<T, StoreError>
    where
        F: Fn(&Connection) -> rusqlite::Result<T>,
    {
        let max_attempts = 6u32;
        let mut last_err = String::new();

        for attempt in 1..=max_attempts {
            let conn = Connection::open(&self.path).map_err(|err| StoreError::Open {
                path: self.path.display().to_string(),
                reason: err.to_string(),
            })?;
            conn.busy_timeout(Duration::from_millis(5_000))
                .map_err(|err| StoreError::Open {
                    path: self.path.display().to_string(),
                    reason: format!("failed to configure busy timeout: {err}"),
                })?;

            match op(&conn) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    last_err = err.to_string();
                    if is_sqlite_locked_error(&err) && attempt < max_attempts {
                        std::thread::sleep(Duration::from_millis(50 * u64::from(attempt)));
                        continue;
                    }
                    break;
                }
            }
        }

        Err(StoreError::Query {
            context,
            reason: last_err,
        })
    }

    /// Last block whose logs were fully reconciled, if any.
    pub fn load_checkpoint(&self) -> Result<Option<u64>, StoreError> {
        let raw = self.with_connection("load_checkpoint", |conn| {
            conn.query_row(
                "SELECT last_block FROM sync_checkpoint WHERE id = 0",
                [],
                |row| row.get::<_, i64>(0),
            )
            .optional()
        })?;
        Ok(raw.map(|block| if block < 0 { 0 } else { block as u64 }))
    }

    pub fn save_checkpoint(&self, block: u64) -> Result<(), StoreError> {
        let block = block.min(i64::MAX as u64) as i64;
        let now = now_ms();
        self.with_connection("save_checkpoint", |conn| {
            conn.execute(
                "INSERT INTO sync_checkpoint (id, last_block, updated_at_ms)
                 VALUES (0, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                     last_block = excluded.last_block,
                     updated_at_ms = excluded.updated_at_ms",
                params![block, now],
            )
            .map(|_| ())
        })
    }

    pub fn token_count(&self) -> Result<u64, StoreError> {
        self.count_rows("token_count", "SELECT COUNT(*) FROM tokens")
    }

    pub fn user_count(&self) -> Result<u64, StoreError> {
        self.count_rows("user_count", "SELECT COUNT(*) FROM users")
    }

    pub fn relation_count(&self, kind: RelationKind) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        self.with_connection("relation_count", |conn| {
            conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
        })
        .map(|count| count.max(0) as u64)
    }

    fn count_rows(&self, context: &'static str, sql: &'static str) -> Result<u64, StoreError> {
        self.with_connection(context, |conn| {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        })
        .map(|count| count.max(0) as u64)
    }
}

impl EntityStore for SqliteStore {
    fn load_token(&self, id: Address) -> Result<Option<Token>, StoreError> {
        let address_hex = format!("{id:#x}");
        self.with_connection("load_token", |conn| {
            conn.query_row(
                "SELECT antibot_active, trading_start, max_transfer_amount,
                        owners, whitelisted_accounts, unthrottled_accounts,
                        protected_accounts, blacklisted_accounts
                 FROM tokens WHERE address = ?1 LIMIT 1",
                params![address_hex],
                |row| {
                    Ok(Token {
                        id,
                        antibot_active: row.get::<_, i64>(0)? != 0,
                        trading_start: parse_u256_column(row.get(1)?)?,
                        max_transfer_amount: parse_u256_column(row.get(2)?)?,
                        owners: parse_address_list_column(row.get(3)?)?,
                        whitelisted_accounts: parse_address_list_column(row.get(4)?)?,
                        unthrottled_accounts: parse_address_list_column(row.get(5)?)?,
                        protected_accounts: parse_address_list_column(row.get(6)?)?,
                        blacklisted_accounts: parse_address_list_column(row.get(7)?)?,
                    })
                },
            )
            .optional()
        })
    }

    fn save_token(&self, token: &Token) -> Result<(), StoreError> {
        let address_hex = format!("{:#x}", token.id);
        let trading_start = token.trading_start.to_string();
        let max_transfer_amount = token.max_transfer_amount.to_string();
        let owners = encode_address_list("save_token", token.owners.as_deref())?;
        let whitelisted = encode_address_list("save_token", token.whitelisted_accounts.as_deref())?;
        let unthrottled = encode_address_list("save_token", token.unthrottled_accounts.as_deref())?;
        let protected = encode_address_list("save_token", token.protected_accounts.as_deref())?;
        let blacklisted = encode_address_list("save_token", token.blacklisted_accounts.as_deref())?;
        let now = now_ms();
        self.with_connection("save_token", |conn| {
            conn.execute(
                "INSERT INTO tokens (address, antibot_active, trading_start, max_transfer_amount,
                     owners, whitelisted_accounts, unthrottled_accounts, protected_accounts,
                     blacklisted_accounts, updated_at_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(address) DO UPDATE SET
                     antibot_active = excluded.antibot_active,
                     trading_start = excluded.trading_start,
                     max_transfer_amount = excluded.max_transfer_amount,
                     owners = excluded.owners,
                     whitelisted_accounts = excluded.whitelisted_accounts,
                     unthrottled_accounts = excluded.unthrottled_accounts,
                     protected_accounts = excluded.protected_accounts,
                     blacklisted_accounts = excluded.blacklisted_accounts,
                     updated_at_ms = excluded.updated_at_ms",
                params![
                    address_hex,
                    token.antibot_active as i64,
                    trading_start,
                    max_transfer_amount,
                    owners,
                    whitelisted,
                    unthrottled,
                    protected,
                    blacklisted,
                    now,
                ],
            )
            .map(|_| ())
        })
    }

    fn load_user(&self, id: Address) -> Result<Option<User>, StoreError> {
        let address_hex = format!("{id:#x}");
        let found = self.with_connection("load_user", |conn| {
            conn.query_row(
                "SELECT 1 FROM users WHERE address = ?1 LIMIT 1",
                params![address_hex],
                |row| row.get::<_, i64>(0),
            )
            .optional()
        })?;
        Ok(found.map(|_| User { id }))
    }

    fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let address_hex = format!("{:#x}", user.id);
        let now = now_ms();
        self.with_connection("save_user", |conn| {
            conn.execute(
                "INSERT INTO users (address, created_at_ms) VALUES (?1, ?2)
                 ON CONFLICT(address) DO NOTHING",
                params![address_hex, now],
            )
            .map(|_| ())
        })
    }

    fn load_relation(
        &self,
        kind: RelationKind,
        key: RelationKey,
    ) -> Result<Option<Relation>, StoreError> {
        let sql = format!(
            "SELECT token_address, user_address FROM {} WHERE id = ?1 LIMIT 1",
            kind.table(),
        );
        let key_hex = key.to_string();
        self.with_connection("load_relation", |conn| {
            conn.query_row(&sql, params![key_hex], |row| {
                Ok(Relation {
                    id: key,
                    token: parse_address_column(row.get(0)?)?,
                    user: parse_address_column(row.get(1)?)?,
                })
            })
            .optional()
        })
    }

    fn save_relation(&self, kind: RelationKind, relation: &Relation) -> Result<(), StoreError> {
        // DO NOTHING on conflict: a relation's token/user refs are fixed at
        // creation time.
        let sql = format!(
            "INSERT INTO {} (id, token_address, user_address, created_at_ms)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO NOTHING",
            kind.table(),
        );
        let key_hex = relation.id.to_string();
        let token_hex = format!("{:#x}", relation.token);
        let user_hex = format!("{:#x}", relation.user);
        let now = now_ms();
        self.with_connection("save_relation", |conn| {
            conn.execute(&sql, params![key_hex, token_hex, user_hex, now])
                .map(|_| ())
        })
    }

    fn delete_relation(&self, kind: RelationKind, key: RelationKey) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
        let key_hex = key.to_string();
        self.with_connection("delete_relation", |conn| {
            conn.execute(&sql, params![key_hex]).map(|_| ())
        })
    }
}
