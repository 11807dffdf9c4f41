//! SQLite storage backend for hotelcheck

use super::traits::{HotelStore, OpenStore, StorageError, StorageResult};
use crate::model::{
    table, AccessibilityFeature, AccessibilityScore, ComplianceNote, Hotel, HotelId, HotelOwned,
    NewAccessibilityFeature, NewComplianceNote, NewHotel, NewSentimentInsight, RecordId,
    SentimentInsight, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Row counts per table, mostly for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub hotels: usize,
    pub features: usize,
    pub compliance_notes: usize,
    pub sentiment_insights: usize,
}

impl RowCounts {
    pub fn total(&self) -> usize {
        self.hotels + self.features + self.compliance_notes + self.sentiment_insights
    }
}

/// SQLite-backed hotel store
///
/// Uses a single SQLite database file with one table per record type.
/// Thread-safe via internal mutex on the connection. Dependent rows reference
/// their hotel with `ON DELETE CASCADE`, and every dependent batch is written
/// in one transaction after checking that the owner holds each referenced
/// hotel.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS hotels (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                name TEXT NOT NULL,
                location TEXT NOT NULL,
                accessibility_score REAL
                    CHECK (accessibility_score IS NULL
                           OR (accessibility_score >= 0 AND accessibility_score <= 10)),
                created_at TEXT NOT NULL,
                user_id TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_hotels_user
                ON hotels(user_id, created_at);

            CREATE TABLE IF NOT EXISTS accessibility_features (
                id TEXT PRIMARY KEY,
                hotel_id TEXT NOT NULL,
                name TEXT NOT NULL,
                available INTEGER NOT NULL DEFAULT 1,
                description TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (hotel_id) REFERENCES hotels(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS compliance_notes (
                id TEXT PRIMARY KEY,
                hotel_id TEXT NOT NULL,
                note TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (hotel_id) REFERENCES hotels(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS sentiment_insights (
                id TEXT PRIMARY KEY,
                hotel_id TEXT NOT NULL,
                insight TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (hotel_id) REFERENCES hotels(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_features_hotel
                ON accessibility_features(hotel_id);
            CREATE INDEX IF NOT EXISTS idx_compliance_hotel
                ON compliance_notes(hotel_id);
            CREATE INDEX IF NOT EXISTS idx_sentiment_hotel
                ON sentiment_insights(hotel_id);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Internal("connection mutex poisoned".to_string()))
    }

    /// Count rows in every table
    pub fn row_counts(&self) -> StorageResult<RowCounts> {
        let conn = self.lock()?;
        let count = |table: &str| -> StorageResult<usize> {
            let n: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            Ok(n as usize)
        };
        Ok(RowCounts {
            hotels: count(table::HOTELS)?,
            features: count(table::FEATURES)?,
            compliance_notes: count(table::COMPLIANCE_NOTES)?,
            sentiment_insights: count(table::SENTIMENT_INSIGHTS)?,
        })
    }

    /// Current time at the precision the database keeps
    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    fn timestamp(now: &DateTime<Utc>) -> String {
        // Fixed precision keeps lexical order equal to time order
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(s: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StorageError::DateParse(e.to_string()))
    }

    fn parse_uuid(table: &'static str, s: &str) -> StorageResult<Uuid> {
        Uuid::parse_str(s).map_err(|e| StorageError::InvalidRow {
            table,
            reason: format!("bad id '{}': {}", s, e),
        })
    }

    /// Fail unless every hotel referenced by `rows` exists and belongs to `owner`
    fn check_ownership<R: HotelOwned>(
        tx: &Transaction<'_>,
        owner: &UserId,
        rows: &[R],
    ) -> StorageResult<()> {
        let hotel_ids: HashSet<HotelId> = rows.iter().map(|r| r.hotel_id()).collect();
        for hotel_id in hotel_ids {
            let holder: Option<String> = tx
                .query_row(
                    "SELECT user_id FROM hotels WHERE id = ?1",
                    params![hotel_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            match holder {
                Some(user) if user == owner.as_str() => {}
                Some(_) => {
                    return Err(StorageError::AccessDenied(format!(
                        "hotel {} belongs to another user",
                        hotel_id
                    )))
                }
                None => {
                    return Err(StorageError::AccessDenied(format!(
                        "hotel {} does not exist",
                        hotel_id
                    )))
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn row_to_hotel(
        id: String,
        url: String,
        name: String,
        location: String,
        score: Option<f64>,
        created_at: String,
        user_id: String,
    ) -> StorageResult<Hotel> {
        let accessibility_score = score
            .map(AccessibilityScore::new)
            .transpose()
            .map_err(|e| StorageError::InvalidRow {
                table: table::HOTELS,
                reason: e.to_string(),
            })?;

        Ok(Hotel {
            id: HotelId::from_uuid(Self::parse_uuid(table::HOTELS, &id)?),
            url,
            name,
            location,
            accessibility_score,
            created_at: Self::parse_timestamp(&created_at)?,
            user_id: UserId::new(user_id),
        })
    }

    fn query_hotels(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> StorageResult<Vec<Hotel>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut hotels = Vec::new();
        for row in rows {
            let (id, url, name, location, score, created_at, user_id) = row?;
            hotels.push(Self::row_to_hotel(
                id, url, name, location, score, created_at, user_id,
            )?);
        }
        Ok(hotels)
    }

    fn insert_hotel_sync(&self, hotel: &NewHotel) -> StorageResult<Hotel> {
        let conn = self.lock()?;
        let id = HotelId::new();
        let now = Self::now();

        let inserted = conn.execute(
            "INSERT INTO hotels (id, url, name, location, accessibility_score, created_at, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                hotel.url,
                hotel.name,
                hotel.location,
                hotel.accessibility_score.map(|s| s.value()),
                Self::timestamp(&now),
                hotel.user_id.as_str(),
            ],
        )?;
        if inserted == 0 {
            return Err(StorageError::NoRowReturned(table::HOTELS));
        }

        debug!(hotel_id = %id, user = %hotel.user_id, "inserted hotel");

        // Read back so the caller sees exactly what was stored
        Self::query_hotels(
            &conn,
            "SELECT id, url, name, location, accessibility_score, created_at, user_id
             FROM hotels WHERE id = ?1",
            &[&id.to_string()],
        )?
        .into_iter()
        .next()
        .ok_or(StorageError::NoRowReturned(table::HOTELS))
    }

    fn insert_features_sync(
        &self,
        owner: &UserId,
        rows: &[NewAccessibilityFeature],
    ) -> StorageResult<Vec<AccessibilityFeature>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::check_ownership(&tx, owner, rows)?;

        let now = Self::now();
        let mut inserted = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO accessibility_features
                     (id, hotel_id, name, available, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                let id = RecordId::new();
                stmt.execute(params![
                    id.to_string(),
                    row.hotel_id.to_string(),
                    row.name,
                    row.available,
                    row.description,
                    Self::timestamp(&now),
                ])?;
                inserted.push(AccessibilityFeature {
                    id,
                    hotel_id: row.hotel_id,
                    name: row.name.clone(),
                    available: row.available,
                    description: row.description.clone(),
                    created_at: now,
                });
            }
        }
        tx.commit()?;

        debug!(rows = inserted.len(), "inserted accessibility features");
        Ok(inserted)
    }

    fn insert_compliance_notes_sync(
        &self,
        owner: &UserId,
        rows: &[NewComplianceNote],
    ) -> StorageResult<Vec<ComplianceNote>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::check_ownership(&tx, owner, rows)?;

        let now = Self::now();
        let mut inserted = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO compliance_notes (id, hotel_id, note, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                let id = RecordId::new();
                stmt.execute(params![
                    id.to_string(),
                    row.hotel_id.to_string(),
                    row.note,
                    Self::timestamp(&now),
                ])?;
                inserted.push(ComplianceNote {
                    id,
                    hotel_id: row.hotel_id,
                    note: row.note.clone(),
                    created_at: now,
                });
            }
        }
        tx.commit()?;

        debug!(rows = inserted.len(), "inserted compliance notes");
        Ok(inserted)
    }

    fn insert_sentiment_insights_sync(
        &self,
        owner: &UserId,
        rows: &[NewSentimentInsight],
    ) -> StorageResult<Vec<SentimentInsight>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::check_ownership(&tx, owner, rows)?;

        let now = Self::now();
        let mut inserted = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO sentiment_insights (id, hotel_id, insight, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                let id = RecordId::new();
                stmt.execute(params![
                    id.to_string(),
                    row.hotel_id.to_string(),
                    row.insight,
                    Self::timestamp(&now),
                ])?;
                inserted.push(SentimentInsight {
                    id,
                    hotel_id: row.hotel_id,
                    insight: row.insight.clone(),
                    created_at: now,
                });
            }
        }
        tx.commit()?;

        debug!(rows = inserted.len(), "inserted sentiment insights");
        Ok(inserted)
    }

    fn select_hotel_sync(&self, owner: &UserId, id: &HotelId) -> StorageResult<Option<Hotel>> {
        let conn = self.lock()?;
        Ok(Self::query_hotels(
            &conn,
            "SELECT id, url, name, location, accessibility_score, created_at, user_id
             FROM hotels WHERE id = ?1 AND user_id = ?2",
            &[&id.to_string(), &owner.as_str()],
        )?
        .into_iter()
        .next())
    }

    fn list_hotels_sync(&self, owner: &UserId) -> StorageResult<Vec<Hotel>> {
        let conn = self.lock()?;
        Self::query_hotels(
            &conn,
            "SELECT id, url, name, location, accessibility_score, created_at, user_id
             FROM hotels WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC",
            &[&owner.as_str()],
        )
    }

    fn select_features_sync(
        &self,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<AccessibilityFeature>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT f.id, f.hotel_id, f.name, f.available, f.description, f.created_at
             FROM accessibility_features f
             JOIN hotels h ON h.id = f.hotel_id
             WHERE f.hotel_id = ?1 AND h.user_id = ?2
             ORDER BY f.created_at, f.rowid",
        )?;
        let rows = stmt.query_map(params![hotel_id.to_string(), owner.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut features = Vec::new();
        for row in rows {
            let (id, hotel, name, available, description, created_at) = row?;
            features.push(AccessibilityFeature {
                id: RecordId::from_uuid(Self::parse_uuid(table::FEATURES, &id)?),
                hotel_id: HotelId::from_uuid(Self::parse_uuid(table::FEATURES, &hotel)?),
                name,
                available,
                description,
                created_at: Self::parse_timestamp(&created_at)?,
            });
        }
        Ok(features)
    }

    /// Shared loader for the two text-only dependent tables
    fn select_text_rows(
        &self,
        table: &'static str,
        column: &str,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<(RecordId, HotelId, String, DateTime<Utc>)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT t.id, t.hotel_id, t.{column}, t.created_at
             FROM {table} t
             JOIN hotels h ON h.id = t.hotel_id
             WHERE t.hotel_id = ?1 AND h.user_id = ?2
             ORDER BY t.created_at, t.rowid",
        ))?;
        let rows = stmt.query_map(params![hotel_id.to_string(), owner.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, hotel, text, created_at) = row?;
            out.push((
                RecordId::from_uuid(Self::parse_uuid(table, &id)?),
                HotelId::from_uuid(Self::parse_uuid(table, &hotel)?),
                text,
                Self::parse_timestamp(&created_at)?,
            ));
        }
        Ok(out)
    }

    fn delete_hotel_sync(&self, owner: &UserId, id: &HotelId) -> StorageResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM hotels WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), owner.as_str()],
        )?;
        if deleted > 0 {
            debug!(hotel_id = %id, "deleted hotel and dependent rows");
        }
        Ok(deleted > 0)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl HotelStore for SqliteStore {
    async fn insert_hotel(&self, hotel: &NewHotel) -> StorageResult<Hotel> {
        self.insert_hotel_sync(hotel)
    }

    async fn insert_features(
        &self,
        owner: &UserId,
        rows: &[NewAccessibilityFeature],
    ) -> StorageResult<Vec<AccessibilityFeature>> {
        self.insert_features_sync(owner, rows)
    }

    async fn insert_compliance_notes(
        &self,
        owner: &UserId,
        rows: &[NewComplianceNote],
    ) -> StorageResult<Vec<ComplianceNote>> {
        self.insert_compliance_notes_sync(owner, rows)
    }

    async fn insert_sentiment_insights(
        &self,
        owner: &UserId,
        rows: &[NewSentimentInsight],
    ) -> StorageResult<Vec<SentimentInsight>> {
        self.insert_sentiment_insights_sync(owner, rows)
    }

    async fn select_hotel(&self, owner: &UserId, id: &HotelId) -> StorageResult<Option<Hotel>> {
        self.select_hotel_sync(owner, id)
    }

    async fn list_hotels(&self, owner: &UserId) -> StorageResult<Vec<Hotel>> {
        self.list_hotels_sync(owner)
    }

    async fn select_features(
        &self,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<AccessibilityFeature>> {
        self.select_features_sync(owner, hotel_id)
    }

    async fn select_compliance_notes(
        &self,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<ComplianceNote>> {
        let rows = self.select_text_rows(table::COMPLIANCE_NOTES, "note", owner, hotel_id)?;
        Ok(rows
            .into_iter()
            .map(|(id, hotel_id, note, created_at)| ComplianceNote {
                id,
                hotel_id,
                note,
                created_at,
            })
            .collect())
    }

    async fn select_sentiment_insights(
        &self,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<SentimentInsight>> {
        let rows =
            self.select_text_rows(table::SENTIMENT_INSIGHTS, "insight", owner, hotel_id)?;
        Ok(rows
            .into_iter()
            .map(|(id, hotel_id, insight, created_at)| SentimentInsight {
                id,
                hotel_id,
                insight,
                created_at,
            })
            .collect())
    }

    async fn delete_hotel(&self, owner: &UserId, id: &HotelId) -> StorageResult<bool> {
        self.delete_hotel_sync(owner, id)
    }
}
