use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx_core::pool::{Pool, PoolOptions};
use sqlx_core::row::Row;
use sqlx_core::transaction::Transaction as SqlxTransaction;
use sqlx_sqlite::{Sqlite, SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use tracing::debug;

use lockbox_core::{Error, Key, Mode, Result, StoreName};

use crate::engine::{generator_exhausted, Engine, EngineTransaction};

pub type SqlitePool = Pool<Sqlite>;

macro_rules! query {
    ($sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query::query::<Sqlite>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS records (
        store TEXT NOT NULL,
        key TEXT NOT NULL,
        key_int INTEGER,
        value TEXT NOT NULL,
        PRIMARY KEY (store, key)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS records_store_key_int ON records (store, key_int)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS key_generators (
        store TEXT PRIMARY KEY,
        next_id INTEGER
    )
    "#,
];

pub async fn connect_sqlite(path: &str) -> std::result::Result<SqlitePool, sqlx_core::Error> {
    connect_sqlite_with_max(path, 10).await
}

pub async fn connect_sqlite_with_max(
    path: &str,
    max_connections: u32,
) -> std::result::Result<SqlitePool, sqlx_core::Error> {
    let options = SqliteConnectOptions::from_str(path)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    PoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

fn storage_error(err: sqlx_core::Error) -> Error {
    Error::Storage(err.to_string())
}

fn encode_key(key: &Key) -> Result<String> {
    Ok(serde_json::to_string(key)?)
}

/// Engine persisting every store into one `records` table of a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteEngine {
    pool: SqlitePool,
}

impl SqliteEngine {
    pub async fn open(url: &str) -> Result<Self> {
        let pool = connect_sqlite(url).await.map_err(storage_error)?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        for statement in SCHEMA {
            query!(statement)
                .execute(&pool)
                .await
                .map_err(storage_error)?;
        }
        debug!("sqlite schema ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Engine for SqliteEngine {
    async fn begin(
        &self,
        _stores: &[StoreName],
        mode: Mode,
    ) -> Result<Box<dyn EngineTransaction>> {
        let tx = self.pool.begin().await.map_err(storage_error)?;
        Ok(Box::new(SqliteTransaction { tx, mode }))
    }
}

struct SqliteTransaction {
    tx: SqlxTransaction<'static, Sqlite>,
    mode: Mode,
}

#[async_trait]
impl EngineTransaction for SqliteTransaction {
    async fn get(&mut self, store: StoreName, key: &Key) -> Result<Option<Value>> {
        let key = encode_key(key)?;
        let row = query!(
            r#"
            SELECT value
            FROM records
            WHERE store = ?1 AND key = ?2
            "#,
            store.as_str(),
            key.as_str()
        )
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(storage_error)?;
        match row {
            Some(row) => {
                let raw: String = row.try_get("value").map_err(storage_error)?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&mut self, store: StoreName, key: &Key, value: &Value) -> Result<()> {
        let encoded = encode_key(key)?;
        let raw = serde_json::to_string(value)?;
        query!(
            r#"
            INSERT INTO records (store, key, key_int, value)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(store, key) DO UPDATE SET value = excluded.value
            "#,
            store.as_str(),
            encoded.as_str(),
            key.as_int(),
            raw.as_str()
        )
        .execute(&mut *self.tx)
        .await
        .map_err(storage_error)?;

        if let Some(id) = key.as_int() {
            query!(
                r#"
                INSERT INTO key_generators (store, next_id)
                VALUES (?1, ?2)
                ON CONFLICT(store) DO UPDATE SET next_id = MAX(next_id, excluded.next_id)
                "#,
                store.as_str(),
                id.checked_add(1)
            )
            .execute(&mut *self.tx)
            .await
            .map_err(storage_error)?;
        }
        Ok(())
    }

    async fn delete(&mut self, store: StoreName, key: &Key) -> Result<()> {
        let key = encode_key(key)?;
        query!(
            r#"DELETE FROM records WHERE store = ?1 AND key = ?2"#,
            store.as_str(),
            key.as_str()
        )
        .execute(&mut *self.tx)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn clear(&mut self, store: StoreName) -> Result<()> {
        query!(r#"DELETE FROM records WHERE store = ?1"#, store.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn scan(&mut self, store: StoreName) -> Result<Vec<(Key, Value)>> {
        let rows = query!(
            r#"
            SELECT key, value
            FROM records
            WHERE store = ?1
            ORDER BY key_int IS NULL, key_int, key
            "#,
            store.as_str()
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(storage_error)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("key").map_err(storage_error)?;
            let value: String = row.try_get("value").map_err(storage_error)?;
            records.push((serde_json::from_str(&key)?, serde_json::from_str(&value)?));
        }
        Ok(records)
    }

    async fn next_id(&mut self, store: StoreName) -> Result<i64> {
        let row = query!(
            r#"SELECT next_id FROM key_generators WHERE store = ?1"#,
            store.as_str()
        )
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(storage_error)?;
        // A NULL `next_id` marks a generator that already issued `i64::MAX`.
        let id = match row {
            Some(row) => row
                .try_get::<Option<i64>, _>("next_id")
                .map_err(storage_error)?
                .ok_or_else(|| generator_exhausted(store))?
                .max(1),
            None => 1,
        };
        query!(
            r#"
            INSERT INTO key_generators (store, next_id)
            VALUES (?1, ?2)
            ON CONFLICT(store) DO UPDATE SET next_id = excluded.next_id
            "#,
            store.as_str(),
            id.checked_add(1)
        )
        .execute(&mut *self.tx)
        .await
        .map_err(storage_error)?;
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let SqliteTransaction { tx, mode } = *self;
        debug!(mode = %mode, "sqlite commit");
        tx.commit().await.map_err(storage_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let SqliteTransaction { tx, .. } = *self;
        tx.rollback().await.map_err(storage_error)
    }
}
