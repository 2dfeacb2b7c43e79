//! SQLite-backed inventory store.
//!
//! ## Write path
//!
//! Every mutating operation runs inside one transaction whose first statement
//! bumps `store_meta.revision`. That write takes SQLite's database write lock
//! before any row is read, so the load/decide/write sequence that follows is
//! serialized against every other writer (including other processes sharing
//! the file). A contending writer waits up to the configured busy timeout and
//! then surfaces `StoreError::Busy`, which the retry policy re-runs from the
//! start. Row updates are additionally guarded on their expected prior state
//! (`WHERE status = 'Available'`, ...) and the schema carries CHECK and UNIQUE
//! constraints mirroring the drum/grid invariants.
//!
//! ## Error Mapping
//!
//! | SQLx Error | SQLite primary code | StoreError |
//! |------------|---------------------|------------|
//! | Database | `SQLITE_BUSY` (5), `SQLITE_LOCKED` (6) | `Busy` |
//! | Database | `SQLITE_CONSTRAINT` (19) | `Constraint` |
//! | Database | any other | `Unavailable` |
//! | PoolTimedOut | N/A | `Busy` |
//! | ColumnDecode / ColumnNotFound / Decode | N/A | `Decode` |
//! | Other | N/A | `Unavailable` |

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, Sqlite, Transaction};
use tracing::instrument;

use drumyard_core::{DomainError, DrumId, GridId};
use drumyard_inventory::{
    Drum, DrumLookup, DrumStatus, Grid, GridLayout, GridStatus, HistoryRecord, InventorySnapshot,
    PendingHistory, PendingTransaction, Registration, TransactionRecord, register,
};

use super::r#trait::{CommittedPlacement, CommittedRetrieval, DrumFilter, GridFilter, InventoryStore};
use crate::config::InventoryConfig;
use crate::error::StoreError;
use crate::retry::RetryPolicy;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CONSTRAINT: i32 = 19;

/// Idempotent schema, applied statement by statement on startup.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS store_meta (
        id       INTEGER PRIMARY KEY CHECK (id = 1),
        revision INTEGER NOT NULL
    )",
    "INSERT OR IGNORE INTO store_meta (id, revision) VALUES (1, 0)",
    "CREATE TABLE IF NOT EXISTS drums (
        drum_id      TEXT PRIMARY KEY,
        order_ref    TEXT NOT NULL,
        material_ref TEXT NOT NULL,
        status       TEXT NOT NULL CHECK (status IN ('IN', 'OUT')),
        current_grid TEXT UNIQUE,
        last_updated TEXT NOT NULL,
        CHECK ((status = 'IN') = (current_grid IS NOT NULL))
    )",
    "CREATE TABLE IF NOT EXISTS grids (
        grid_id  TEXT PRIMARY KEY,
        status   TEXT NOT NULL CHECK (status IN ('Available', 'Occupied')),
        occupant TEXT UNIQUE,
        CHECK ((status = 'Occupied') = (occupant IS NOT NULL))
    )",
    "CREATE TABLE IF NOT EXISTS transactions (
        seq       INTEGER PRIMARY KEY AUTOINCREMENT,
        drum_id   TEXT NOT NULL,
        grid_id   TEXT NOT NULL,
        direction TEXT NOT NULL CHECK (direction IN ('IN', 'OUT')),
        timestamp TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS drum_history (
        seq          INTEGER PRIMARY KEY AUTOINCREMENT,
        drum_id      TEXT NOT NULL,
        order_ref    TEXT NOT NULL,
        material_ref TEXT NOT NULL,
        grid_id      TEXT NOT NULL,
        timestamp    TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS drums_by_order ON drums (order_ref)",
    "CREATE INDEX IF NOT EXISTS transactions_by_drum ON transactions (drum_id, seq)",
    // Log rows are append-only; only a full reset may delete them.
    "CREATE TRIGGER IF NOT EXISTS transactions_append_only
        BEFORE UPDATE ON transactions
        BEGIN SELECT RAISE(ABORT, 'transactions are append-only'); END",
    "CREATE TRIGGER IF NOT EXISTS drum_history_append_only
        BEFORE UPDATE ON drum_history
        BEGIN SELECT RAISE(ABORT, 'drum history is append-only'); END",
];

const DRUM_COLUMNS: &str =
    "drum_id, order_ref, material_ref, status, current_grid, last_updated";

/// Durable inventory store on a single SQLite file (WAL journal).
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct SqliteInventoryStore {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl SqliteInventoryStore {
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// Open (creating if missing) the database named by `config.database_url`.
    pub async fn connect(config: &InventoryConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| map_sqlx_error("parse_database_url", e))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        tracing::info!(
            database_url = %config.database_url,
            max_connections = config.max_connections,
            "sqlite inventory store connected"
        );
        Ok(Self::new(pool, config.retry.clone()))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a write transaction and take the database write lock.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        sqlx::query("UPDATE store_meta SET revision = revision + 1 WHERE id = 1")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("claim_write_lock", e))?;
        Ok(tx)
    }

    async fn initialize_once(&self, layout: &GridLayout) -> Result<usize, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        for &statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("apply_schema", e))?;
        }

        let mut seeded = 0;
        for id in layout.labels() {
            seeded += sqlx::query(
                "INSERT OR IGNORE INTO grids (grid_id, status, occupant) VALUES (?1, 'Available', NULL)",
            )
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_grid", e))?
            .rows_affected() as usize;
        }

        if seeded > 0 {
            bump_revision(&mut tx).await?;
        }
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(seeded)
    }

    async fn register_once(
        &self,
        drum_id: &DrumId,
        order_ref: &str,
        material_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<Registration, StoreError> {
        let mut tx = self.begin_write().await?;

        let existing = fetch_drum(&mut tx, drum_id).await?;
        // A rejection drops `tx`, rolling back the revision bump.
        let registration = register(
            DrumLookup::from_option(drum_id, existing),
            order_ref,
            material_ref,
            now,
        )?;

        let drum = registration.drum();
        let affected = if registration.is_created() {
            sqlx::query(
                "INSERT INTO drums (drum_id, order_ref, material_ref, status, current_grid, last_updated)
                 VALUES (?1, ?2, ?3, 'OUT', NULL, ?4)",
            )
            .bind(drum.id_typed().as_str())
            .bind(drum.order_ref())
            .bind(drum.material_ref())
            .bind(drum.last_updated())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_drum", e))?
            .rows_affected()
        } else {
            sqlx::query(
                "UPDATE drums SET order_ref = ?1, material_ref = ?2, last_updated = ?3
                 WHERE drum_id = ?4 AND status = 'OUT'",
            )
            .bind(drum.order_ref())
            .bind(drum.material_ref())
            .bind(drum.last_updated())
            .bind(drum.id_typed().as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("restage_drum", e))?
            .rows_affected()
        };
        expect_single_row("register_drum", affected)?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(registration)
    }

    async fn place_once(
        &self,
        drum_id: &DrumId,
        grid_id: &GridId,
        now: DateTime<Utc>,
    ) -> Result<CommittedPlacement, StoreError> {
        let mut tx = self.begin_write().await?;

        let drum = fetch_drum(&mut tx, drum_id)
            .await?
            .ok_or_else(|| DomainError::DrumNotFound(drum_id.clone()))?;
        if drum.is_placed() {
            return Err(DomainError::DrumAlreadyPlaced(drum_id.clone()).into());
        }
        let grid = fetch_grid(&mut tx, grid_id)
            .await?
            .ok_or_else(|| DomainError::GridUnavailable(grid_id.clone()))?;
        let placement = drum.place(&grid, now)?;

        let occupied = sqlx::query(
            "UPDATE grids SET status = 'Occupied', occupant = ?1
             WHERE grid_id = ?2 AND status = 'Available'",
        )
        .bind(drum_id.as_str())
        .bind(grid_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("occupy_grid", e))?
        .rows_affected();
        if occupied != 1 {
            return Err(DomainError::GridUnavailable(grid_id.clone()).into());
        }

        let moved = sqlx::query(
            "UPDATE drums SET status = 'IN', current_grid = ?1, last_updated = ?2
             WHERE drum_id = ?3 AND status = 'OUT'",
        )
        .bind(grid_id.as_str())
        .bind(placement.drum.last_updated())
        .bind(drum_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("place_drum", e))?
        .rows_affected();
        expect_single_row("place_drum", moved)?;

        let seq = insert_transaction(&mut tx, &placement.transaction).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;

        Ok(CommittedPlacement {
            drum: placement.drum,
            grid: placement.grid,
            transaction: placement.transaction.into_record(seq),
        })
    }

    async fn retrieve_once(
        &self,
        drum_id: &DrumId,
        now: DateTime<Utc>,
    ) -> Result<CommittedRetrieval, StoreError> {
        let mut tx = self.begin_write().await?;

        let drum = fetch_drum(&mut tx, drum_id)
            .await?
            .filter(Drum::is_placed)
            .ok_or_else(|| DomainError::DrumNotPlaced(drum_id.clone()))?;
        let grid_id = drum
            .current_grid()
            .cloned()
            .ok_or_else(|| DomainError::DrumNotPlaced(drum_id.clone()))?;
        let grid = fetch_grid(&mut tx, &grid_id).await?.ok_or_else(|| {
            DomainError::invariant(format!("drum {drum_id} references missing grid {grid_id}"))
        })?;
        let retrieval = drum.retrieve(&grid, now)?;

        // History first: the order/material context must be captured before
        // the live drum row forgets its grid.
        let history_seq = insert_history(&mut tx, &retrieval.history).await?;

        let cleared = sqlx::query(
            "UPDATE drums
             SET status = 'OUT', current_grid = NULL, order_ref = ?1, material_ref = ?2,
                 last_updated = ?3
             WHERE drum_id = ?4 AND status = 'IN' AND current_grid = ?5",
        )
        .bind(retrieval.drum.order_ref())
        .bind(retrieval.drum.material_ref())
        .bind(retrieval.drum.last_updated())
        .bind(drum_id.as_str())
        .bind(grid_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("clear_drum", e))?
        .rows_affected();
        expect_single_row("clear_drum", cleared)?;

        let vacated = sqlx::query(
            "UPDATE grids SET status = 'Available', occupant = NULL
             WHERE grid_id = ?1 AND occupant = ?2",
        )
        .bind(grid_id.as_str())
        .bind(drum_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("vacate_grid", e))?
        .rows_affected();
        expect_single_row("vacate_grid", vacated)?;

        let transaction_seq = insert_transaction(&mut tx, &retrieval.transaction).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;

        Ok(CommittedRetrieval {
            history: retrieval.history.into_record(history_seq),
            drum: retrieval.drum,
            grid: retrieval.grid,
            transaction: retrieval.transaction.into_record(transaction_seq),
        })
    }

    async fn reset_once(&self, layout: &GridLayout) -> Result<(), StoreError> {
        let mut tx = self.begin_write().await?;

        for statement in [
            "DELETE FROM drum_history",
            "DELETE FROM transactions",
            "DELETE FROM drums",
            "DELETE FROM grids",
        ] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("reset", e))?;
        }

        for id in layout.labels() {
            sqlx::query("INSERT INTO grids (grid_id, status, occupant) VALUES (?1, 'Available', NULL)")
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("seed_grid", e))?;
        }

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    #[instrument(skip_all, fields(slots = layout.len()), err)]
    async fn initialize(&self, layout: &GridLayout) -> Result<usize, StoreError> {
        self.retry
            .run("initialize", move || self.initialize_once(layout))
            .await
    }

    #[instrument(skip_all, fields(drum_id = %drum_id), err)]
    async fn register_drum(
        &self,
        drum_id: &DrumId,
        order_ref: &str,
        material_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<Registration, StoreError> {
        self.retry
            .run("register_drum", move || {
                self.register_once(drum_id, order_ref, material_ref, now)
            })
            .await
    }

    #[instrument(skip_all, fields(drum_id = %drum_id, grid_id = %grid_id), err)]
    async fn place_drum(
        &self,
        drum_id: &DrumId,
        grid_id: &GridId,
        now: DateTime<Utc>,
    ) -> Result<CommittedPlacement, StoreError> {
        self.retry
            .run("place_drum", move || self.place_once(drum_id, grid_id, now))
            .await
    }

    #[instrument(skip_all, fields(drum_id = %drum_id), err)]
    async fn retrieve_drum(
        &self,
        drum_id: &DrumId,
        now: DateTime<Utc>,
    ) -> Result<CommittedRetrieval, StoreError> {
        self.retry
            .run("retrieve_drum", move || self.retrieve_once(drum_id, now))
            .await
    }

    #[instrument(skip_all, err)]
    async fn reset(&self, layout: &GridLayout) -> Result<(), StoreError> {
        self.retry
            .run("reset", move || self.reset_once(layout))
            .await
    }

    async fn drum(&self, drum_id: &DrumId) -> Result<Option<Drum>, StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;
        fetch_drum(&mut conn, drum_id).await
    }

    async fn drums(&self, filter: &DrumFilter) -> Result<Vec<Drum>, StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;
        fetch_drums(&mut conn, filter.order_ref()).await
    }

    async fn grids(&self, filter: GridFilter) -> Result<Vec<Grid>, StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;
        let status = match filter {
            GridFilter::All => None,
            GridFilter::Available => Some(GridStatus::Available.as_str()),
        };
        fetch_grids(&mut conn, status).await
    }

    async fn history(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT seq, drum_id, order_ref, material_ref, grid_id, timestamp
             FROM drum_history ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_history", e))?;

        rows.iter().map(history_from_row).collect()
    }

    async fn transactions(
        &self,
        drum_id: Option<&DrumId>,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT seq, drum_id, grid_id, direction, timestamp
             FROM transactions
             WHERE (?1 IS NULL OR drum_id = ?1)
             ORDER BY seq",
        )
        .bind(drum_id.map(DrumId::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_transactions", e))?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn snapshot(&self) -> Result<InventorySnapshot, StoreError> {
        // One read transaction, so drums and grids come from the same commit.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        let revision = fetch_revision(&mut tx).await?;
        let drums = fetch_drums(&mut tx, None).await?;
        let grids = fetch_grids(&mut tx, None).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;

        Ok(InventorySnapshot {
            revision,
            drums,
            grids,
        })
    }

    async fn revision(&self) -> Result<u64, StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;
        fetch_revision(&mut conn).await
    }
}

async fn bump_revision(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    sqlx::query("UPDATE store_meta SET revision = revision + 1 WHERE id = 1")
        .execute(conn)
        .await
        .map_err(|e| map_sqlx_error("bump_revision", e))?;
    Ok(())
}

async fn fetch_revision(conn: &mut SqliteConnection) -> Result<u64, StoreError> {
    let revision: i64 = sqlx::query_scalar("SELECT revision FROM store_meta WHERE id = 1")
        .fetch_one(conn)
        .await
        .map_err(|e| map_sqlx_error("load_revision", e))?;
    u64::try_from(revision).map_err(|_| StoreError::Decode(format!("negative revision {revision}")))
}

async fn fetch_drum(conn: &mut SqliteConnection, id: &DrumId) -> Result<Option<Drum>, StoreError> {
    let sql = format!("SELECT {DRUM_COLUMNS} FROM drums WHERE drum_id = ?1");
    let row = sqlx::query(&sql)
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error("load_drum", e))?;

    row.as_ref().map(drum_from_row).transpose()
}

async fn fetch_drums(
    conn: &mut SqliteConnection,
    order_ref: Option<&str>,
) -> Result<Vec<Drum>, StoreError> {
    let sql = format!(
        "SELECT {DRUM_COLUMNS} FROM drums WHERE (?1 IS NULL OR order_ref = ?1) ORDER BY drum_id"
    );
    let rows = sqlx::query(&sql)
        .bind(order_ref)
        .fetch_all(conn)
        .await
        .map_err(|e| map_sqlx_error("load_drums", e))?;

    rows.iter().map(drum_from_row).collect()
}

async fn fetch_grid(conn: &mut SqliteConnection, id: &GridId) -> Result<Option<Grid>, StoreError> {
    let row = sqlx::query("SELECT grid_id, status, occupant FROM grids WHERE grid_id = ?1")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error("load_grid", e))?;

    row.as_ref().map(grid_from_row).transpose()
}

async fn fetch_grids(
    conn: &mut SqliteConnection,
    status: Option<&str>,
) -> Result<Vec<Grid>, StoreError> {
    let rows = sqlx::query(
        "SELECT grid_id, status, occupant FROM grids
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY grid_id",
    )
    .bind(status)
    .fetch_all(conn)
    .await
    .map_err(|e| map_sqlx_error("load_grids", e))?;

    rows.iter().map(grid_from_row).collect()
}

async fn insert_transaction(
    conn: &mut SqliteConnection,
    pending: &PendingTransaction,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO transactions (drum_id, grid_id, direction, timestamp) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(pending.drum_id.as_str())
    .bind(pending.grid_id.as_str())
    .bind(pending.direction.as_str())
    .bind(pending.timestamp)
    .execute(conn)
    .await
    .map_err(|e| map_sqlx_error("append_transaction", e))?;

    seq_from_rowid(result.last_insert_rowid())
}

async fn insert_history(
    conn: &mut SqliteConnection,
    pending: &PendingHistory,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO drum_history (drum_id, order_ref, material_ref, grid_id, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(pending.drum_id.as_str())
    .bind(pending.order_ref.as_str())
    .bind(pending.material_ref.as_str())
    .bind(pending.grid_id.as_str())
    .bind(pending.timestamp)
    .execute(conn)
    .await
    .map_err(|e| map_sqlx_error("append_history", e))?;

    seq_from_rowid(result.last_insert_rowid())
}

fn seq_from_rowid(rowid: i64) -> Result<u64, StoreError> {
    u64::try_from(rowid).map_err(|_| StoreError::Decode(format!("invalid sequence {rowid}")))
}

fn expect_single_row(operation: &str, affected: u64) -> Result<(), StoreError> {
    if affected == 1 {
        Ok(())
    } else {
        Err(DomainError::invariant(format!(
            "{operation} touched {affected} rows, expected 1"
        ))
        .into())
    }
}

fn decode_err(e: sqlx::Error) -> StoreError {
    map_sqlx_error("decode_row", e)
}

fn corrupt(e: DomainError) -> StoreError {
    StoreError::Decode(e.to_string())
}

fn drum_from_row(row: &SqliteRow) -> Result<Drum, StoreError> {
    let id: String = row.try_get("drum_id").map_err(decode_err)?;
    let status: String = row.try_get("status").map_err(decode_err)?;
    let current_grid: Option<String> = row.try_get("current_grid").map_err(decode_err)?;

    Drum::from_parts(
        DrumId::new(id).map_err(corrupt)?,
        row.try_get("order_ref").map_err(decode_err)?,
        row.try_get("material_ref").map_err(decode_err)?,
        DrumStatus::from_str(&status).map_err(corrupt)?,
        current_grid.map(GridId::new).transpose().map_err(corrupt)?,
        row.try_get("last_updated").map_err(decode_err)?,
    )
    .map_err(corrupt)
}

fn grid_from_row(row: &SqliteRow) -> Result<Grid, StoreError> {
    let id: String = row.try_get("grid_id").map_err(decode_err)?;
    let status: String = row.try_get("status").map_err(decode_err)?;
    let occupant: Option<String> = row.try_get("occupant").map_err(decode_err)?;

    Grid::from_parts(
        GridId::new(id).map_err(corrupt)?,
        GridStatus::from_str(&status).map_err(corrupt)?,
        occupant.map(DrumId::new).transpose().map_err(corrupt)?,
    )
    .map_err(corrupt)
}

fn transaction_from_row(row: &SqliteRow) -> Result<TransactionRecord, StoreError> {
    let seq: i64 = row.try_get("seq").map_err(decode_err)?;
    let drum_id: String = row.try_get("drum_id").map_err(decode_err)?;
    let grid_id: String = row.try_get("grid_id").map_err(decode_err)?;
    let direction: String = row.try_get("direction").map_err(decode_err)?;

    Ok(TransactionRecord {
        seq: seq_from_rowid(seq)?,
        drum_id: DrumId::new(drum_id).map_err(corrupt)?,
        grid_id: GridId::new(grid_id).map_err(corrupt)?,
        direction: direction.parse().map_err(corrupt)?,
        timestamp: row.try_get("timestamp").map_err(decode_err)?,
    })
}

fn history_from_row(row: &SqliteRow) -> Result<HistoryRecord, StoreError> {
    let seq: i64 = row.try_get("seq").map_err(decode_err)?;
    let drum_id: String = row.try_get("drum_id").map_err(decode_err)?;
    let grid_id: String = row.try_get("grid_id").map_err(decode_err)?;

    Ok(HistoryRecord {
        seq: seq_from_rowid(seq)?,
        drum_id: DrumId::new(drum_id).map_err(corrupt)?,
        order_ref: row.try_get("order_ref").map_err(decode_err)?,
        material_ref: row.try_get("material_ref").map_err(decode_err)?,
        grid_id: GridId::new(grid_id).map_err(corrupt)?,
        timestamp: row.try_get("timestamp").map_err(decode_err)?,
    })
}

/// Map a SQLx error onto [`StoreError`] (see the module docs for the table).
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            let primary = db_err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| code & 0xff);
            match primary {
                Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => StoreError::Busy(msg),
                Some(SQLITE_CONSTRAINT) => StoreError::Constraint(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Busy(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        e @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)) => StoreError::Decode(format!("{operation}: {e}")),
        other => StoreError::Unavailable(format!("sqlx error in {operation}: {other}")),
    }
}
