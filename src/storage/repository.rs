//! Repository pattern for reservation persistence
//!
//! Business logic (the reserver loop and the reservation service) only sees
//! the [`ReservationRepository`] trait, so the SQLite store can be swapped
//! for the in-memory one in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   Reserver loop        ReservationService    │
//! └──────────────────────────────────────────────┘
//!                        │
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │            ReservationRepository             │
//! └──────────────────────────────────────────────┘
//!              │                     │
//!              ▼                     ▼
//!     ┌─────────────────┐   ┌─────────────────┐
//!     │     SQLite      │   │      Mock       │
//!     └─────────────────┘   └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use classhold::storage::repository::{ReservationRepository, SqliteReservationRepository};
//!
//! let repo = SqliteReservationRepository::new("data/reservations.db")?;
//! let pending = repo.list_pending("03/08/2024")?;
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::models::{NewReservation, ReservationRequest, ReservationStatus};
use crate::utils::truncate_text;

/// Longest failure reason kept per reservation
const MAX_ERROR_CHARS: usize = 500;

// ============================================================================
// Core Types
// ============================================================================

/// Errors raised by reservation stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem failure while opening the database
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No reservation with the given id
    #[error("Reservation {0} not found")]
    NotFound(i64),

    /// A writer panicked while holding the store lock
    #[error("Reservation store lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Reservation counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReservationStats {
    pub total: usize,
    pub pending: usize,
    pub done: usize,
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Durable store of reservation requests
///
/// Implementations serialize writers, so a `mark_done` is never observed
/// half-applied by a concurrent `list_pending`.
pub trait ReservationRepository: Send + Sync {
    /// Pending requests for a class date, ordered by id
    fn list_pending(&self, date: &str) -> StoreResult<Vec<ReservationRequest>>;

    /// Insert a new pending request and return its id
    fn create(&self, reservation: &NewReservation) -> StoreResult<i64>;

    /// Mark a request as booked
    ///
    /// Returns `StoreError::NotFound` for unknown ids. Marking an already
    /// booked request again is a no-op.
    fn mark_done(&self, id: i64) -> StoreResult<()>;

    /// Fetch a single request
    fn get(&self, id: i64) -> StoreResult<Option<ReservationRequest>>;

    /// Record a failed booking attempt without changing status
    fn record_failure(&self, id: i64, reason: &str) -> StoreResult<()>;

    /// Counts by status
    fn stats(&self) -> StoreResult<ReservationStats>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of [`ReservationRepository`]
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteReservationRepository {
    conn: Mutex<Connection>,
}

impl SqliteReservationRepository {
    /// Open (or create) a database file
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "Reservation store initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn create_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS class_reservation (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT NOT NULL,
                    date TEXT NOT NULL,
                    time TEXT NOT NULL,
                    name_id TEXT NOT NULL,
                    teacher_id TEXT NOT NULL,
                    is_done INTEGER NOT NULL DEFAULT 0,
                    attempts INTEGER NOT NULL DEFAULT 0,
                    last_error TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_class_reservation_date_done
                    ON class_reservation(date, is_done);
                "#,
        )?;

        Ok(())
    }

    fn row_to_request(row: &Row<'_>) -> rusqlite::Result<ReservationRequest> {
        Ok(ReservationRequest {
            id: row.get(0)?,
            email: row.get(1)?,
            date: row.get(2)?,
            time: row.get(3)?,
            name_id: row.get(4)?,
            teacher_id: row.get(5)?,
            status: ReservationStatus::from(row.get::<_, bool>(6)?),
            attempts: row.get(7)?,
            last_error: row.get(8)?,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, email, date, time, name_id, teacher_id, is_done, attempts, last_error FROM class_reservation";

impl ReservationRepository for SqliteReservationRepository {
    fn list_pending(&self, date: &str) -> StoreResult<Vec<ReservationRequest>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare(&format!("{SELECT_COLUMNS} WHERE date = ?1 AND is_done = 0 ORDER BY id"))?;

        let requests = stmt
            .query_map(params![date], Self::row_to_request)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(requests)
    }

    fn create(&self, reservation: &NewReservation) -> StoreResult<i64> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
                INSERT INTO class_reservation
                    (email, date, time, name_id, teacher_id, is_done, attempts, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6, ?6)
                "#,
            params![
                reservation.email,
                reservation.date,
                reservation.time,
                reservation.name_id,
                reservation.teacher_id,
                now
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn mark_done(&self, id: i64) -> StoreResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let updated = conn.execute(
            "UPDATE class_reservation SET is_done = 1, updated_at = ?2 WHERE id = ?1",
            params![id, now],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn get(&self, id: i64) -> StoreResult<Option<ReservationRequest>> {
        let conn = self.lock()?;
        let request = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                Self::row_to_request,
            )
            .optional()?;

        Ok(request)
    }

    fn record_failure(&self, id: i64, reason: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let updated = conn.execute(
            r#"
                UPDATE class_reservation
                SET attempts = attempts + 1, last_error = ?2, updated_at = ?3
                WHERE id = ?1
                "#,
            params![id, truncate_text(reason, MAX_ERROR_CHARS), now],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn stats(&self) -> StoreResult<ReservationStats> {
        let conn = self.lock()?;
        let (total, done): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_done), 0) FROM class_reservation",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(ReservationStats {
            total: total as usize,
            pending: (total - done) as usize,
            done: done as usize,
        })
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// In-memory implementation of [`ReservationRepository`]
///
/// Useful for testing without database dependencies.
pub struct MockReservationRepository {
    records: RwLock<BTreeMap<i64, ReservationRequest>>,
}

impl MockReservationRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MockReservationRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservationRepository for MockReservationRepository {
    fn list_pending(&self, date: &str) -> StoreResult<Vec<ReservationRequest>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records
            .values()
            .filter(|r| r.date == date && r.is_pending())
            .cloned()
            .collect())
    }

    fn create(&self, reservation: &NewReservation) -> StoreResult<i64> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        let id = records.keys().next_back().map_or(1, |last| last + 1);

        records.insert(
            id,
            ReservationRequest {
                id,
                email: reservation.email.clone(),
                date: reservation.date.clone(),
                time: reservation.time.clone(),
                name_id: reservation.name_id.clone(),
                teacher_id: reservation.teacher_id.clone(),
                status: ReservationStatus::Pending,
                attempts: 0,
                last_error: None,
            },
        );
        Ok(id)
    }

    fn mark_done(&self, id: i64) -> StoreResult<()> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.status = ReservationStatus::Done;
        Ok(())
    }

    fn get(&self, id: i64) -> StoreResult<Option<ReservationRequest>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.get(&id).cloned())
    }

    fn record_failure(&self, id: i64, reason: &str) -> StoreResult<()> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.attempts += 1;
        record.last_error = Some(truncate_text(reason, MAX_ERROR_CHARS));
        Ok(())
    }

    fn stats(&self) -> StoreResult<ReservationStats> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut stats = ReservationStats::default();

        for record in records.values() {
            stats.total += 1;
            match record.status {
                ReservationStatus::Pending => stats.pending += 1,
                ReservationStatus::Done => stats.done += 1,
            }
        }

        Ok(stats)
    }
}

// ============================================================================
// Shared Repository Types
// ============================================================================

/// Thread-safe shared repository wrapper
pub type SharedReservationRepository = Arc<dyn ReservationRepository>;

/// Create a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> StoreResult<SharedReservationRepository> {
    let repo = SqliteReservationRepository::new(path)?;
    Ok(Arc::new(repo))
}

/// Create a shared mock repository
pub fn create_mock_repository() -> SharedReservationRepository {
    Arc::new(MockReservationRepository::new())
}

// ============================================================================
// Tests
// ============================================================================
