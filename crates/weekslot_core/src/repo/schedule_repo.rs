//! Weekly schedule repository and SQLite-backed scheduling backend.
//!
//! # Responsibility
//! - Persist committed weekly schedules in `weekly_schedules`.
//! - Answer availability checks by per-facility date-range intersection.
//! - Load stored schedules back for the edit flow.
//!
//! # Invariants
//! - Write paths parse wire fields with `PersistedWeeklyFields::from_wire`
//!   before any SQL mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Dates are stored as ISO `YYYY-MM-DD` text so lexical order is date order.

use crate::backend::{
    AvailabilityRequest, BackendResponse, BackendResult, CommitMode, CommitRequest,
    ScheduleBackend,
};
use crate::calendar::date_range::{format_storage_date, parse_storage_date, DateRange};
use crate::db::DbError;
use crate::wire::fields::{PersistedWeeklyFields, WeeklyWireFields, WireError};
use log::{info, warn};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const SCHEDULE_SELECT_SQL: &str = "SELECT
    identifier,
    facility_id,
    start_date,
    end_date,
    checked_day,
    day_time,
    book_app_type,
    slot_duration,
    patient_count
FROM weekly_schedules";

pub const SCHEDULE_EXISTS_MESSAGE: &str = "A schedule already exists for the selected date range.";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for schedule persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(String),
    InvalidData(String),
    Wire(WireError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(identifier) => write!(f, "schedule not found: {identifier}"),
            Self::InvalidData(message) => write!(f, "invalid persisted schedule data: {message}"),
            Self::Wire(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Wire(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<WireError> for RepoError {
    fn from(value: WireError) -> Self {
        Self::Wire(value)
    }
}

/// One committed schedule as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSchedule {
    pub identifier: String,
    pub facility_id: i64,
    pub range: DateRange,
    /// Fields exactly as committed.
    pub wire: WeeklyWireFields,
    /// Per-weekday expansion of `wire`, the input of `wire::codec::decode`.
    pub fields: PersistedWeeklyFields,
}

/// Repository interface for weekly schedule persistence.
pub trait ScheduleRepository {
    fn insert_schedule(
        &self,
        facility_id: i64,
        range: &DateRange,
        wire: &WeeklyWireFields,
    ) -> RepoResult<String>;
    fn update_schedule(
        &self,
        identifier: &str,
        range: &DateRange,
        wire: &WeeklyWireFields,
    ) -> RepoResult<()>;
    fn load_schedule(&self, identifier: &str) -> RepoResult<StoredSchedule>;
    fn list_schedules(&self, facility_id: i64) -> RepoResult<Vec<StoredSchedule>>;
    /// Schedules of `facility_id` whose range intersects `range`, minus `exclude`.
    fn find_overlapping(
        &self,
        facility_id: i64,
        range: &DateRange,
        exclude: Option<&str>,
    ) -> RepoResult<Vec<StoredSchedule>>;
}

/// SQLite-backed schedule repository.
pub struct SqliteScheduleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScheduleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_schedules(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<StoredSchedule>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut schedules = Vec::new();
        while let Some(row) = rows.next()? {
            schedules.push(parse_schedule_row(row)?);
        }
        Ok(schedules)
    }
}

impl ScheduleRepository for SqliteScheduleRepository<'_> {
    fn insert_schedule(
        &self,
        facility_id: i64,
        range: &DateRange,
        wire: &WeeklyWireFields,
    ) -> RepoResult<String> {
        let fields = PersistedWeeklyFields::from_wire(wire)?;
        let identifier = Uuid::new_v4().to_string();

        self.conn.execute(
            "INSERT INTO weekly_schedules (
                identifier,
                facility_id,
                start_date,
                end_date,
                checked_day,
                day_time,
                book_app_type,
                slot_duration,
                patient_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                identifier.as_str(),
                facility_id,
                format_storage_date(range.start()),
                format_storage_date(range.end()),
                wire.checked_day.as_str(),
                wire.day_time.as_str(),
                fields.appointment_type.wire_name(),
                wire.slot_duration,
                wire.patient_count,
            ],
        )?;

        Ok(identifier)
    }

    fn update_schedule(
        &self,
        identifier: &str,
        range: &DateRange,
        wire: &WeeklyWireFields,
    ) -> RepoResult<()> {
        let fields = PersistedWeeklyFields::from_wire(wire)?;

        let changed = self.conn.execute(
            "UPDATE weekly_schedules
             SET
                start_date = ?1,
                end_date = ?2,
                checked_day = ?3,
                day_time = ?4,
                book_app_type = ?5,
                slot_duration = ?6,
                patient_count = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE identifier = ?8;",
            params![
                format_storage_date(range.start()),
                format_storage_date(range.end()),
                wire.checked_day.as_str(),
                wire.day_time.as_str(),
                fields.appointment_type.wire_name(),
                wire.slot_duration,
                wire.patient_count,
                identifier,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(identifier.to_string()));
        }

        Ok(())
    }

    fn load_schedule(&self, identifier: &str) -> RepoResult<StoredSchedule> {
        self.query_schedules(
            &format!("{SCHEDULE_SELECT_SQL} WHERE identifier = ?1;"),
            [identifier],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| RepoError::NotFound(identifier.to_string()))
    }

    fn list_schedules(&self, facility_id: i64) -> RepoResult<Vec<StoredSchedule>> {
        self.query_schedules(
            &format!(
                "{SCHEDULE_SELECT_SQL}
                 WHERE facility_id = ?1
                 ORDER BY start_date ASC, identifier ASC;"
            ),
            [facility_id],
        )
    }

    fn find_overlapping(
        &self,
        facility_id: i64,
        range: &DateRange,
        exclude: Option<&str>,
    ) -> RepoResult<Vec<StoredSchedule>> {
        self.query_schedules(
            &format!(
                "{SCHEDULE_SELECT_SQL}
                 WHERE facility_id = ?1
                   AND start_date <= ?2
                   AND end_date >= ?3
                   AND (?4 IS NULL OR identifier <> ?4)
                 ORDER BY start_date ASC, identifier ASC;"
            ),
            params![
                facility_id,
                format_storage_date(range.end()),
                format_storage_date(range.start()),
                exclude,
            ],
        )
    }
}

impl ScheduleBackend for SqliteScheduleRepository<'_> {
    fn check_availability(&self, request: &AvailabilityRequest) -> BackendResult<BackendResponse> {
        let range = match DateRange::parse(&request.start_date, &request.end_date) {
            Ok(range) => range,
            Err(err) => {
                warn!(
                    "event=availability_check module=repo status=rejected reason=invalid_range"
                );
                return Ok(BackendResponse::rejected(format!("Invalid date range: {err}")));
            }
        };

        let overlapping =
            self.find_overlapping(request.facility_id, &range, request.identifier.as_deref())?;
        if !overlapping.is_empty() {
            info!(
                "event=availability_check module=repo status=rejected reason=overlap overlaps={}",
                overlapping.len()
            );
            return Ok(BackendResponse::rejected(SCHEDULE_EXISTS_MESSAGE));
        }

        info!("event=availability_check module=repo status=ok");
        Ok(BackendResponse::accepted(
            "Date range is available.",
            request.identifier.clone(),
        ))
    }

    fn commit_schedule(&self, request: &CommitRequest) -> BackendResult<BackendResponse> {
        let outcome = match request.mode {
            CommitMode::Create => self
                .insert_schedule(request.facility_id, &request.range, &request.fields)
                .map(|identifier| BackendResponse::accepted("Schedule created.", Some(identifier))),
            CommitMode::Edit => {
                let Some(identifier) = request.identifier.as_deref() else {
                    return Ok(BackendResponse::rejected(
                        "A schedule identifier is required to edit a schedule.",
                    ));
                };
                self.update_schedule(identifier, &request.range, &request.fields)
                    .map(|()| {
                        BackendResponse::accepted("Schedule updated.", Some(identifier.to_string()))
                    })
            }
        };

        match outcome {
            Ok(response) => {
                info!(
                    "event=schedule_commit module=repo status=ok mode={}",
                    request.mode.label()
                );
                Ok(response)
            }
            Err(err @ (RepoError::NotFound(_) | RepoError::Wire(_))) => {
                warn!(
                    "event=schedule_commit module=repo status=rejected mode={}",
                    request.mode.label()
                );
                Ok(BackendResponse::rejected(err.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn parse_schedule_row(row: &Row<'_>) -> RepoResult<StoredSchedule> {
    let identifier: String = row.get("identifier")?;
    let start_text: String = row.get("start_date")?;
    let end_text: String = row.get("end_date")?;

    let start = parse_storage_date(&start_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{start_text}` in weekly_schedules.start_date"
        ))
    })?;
    let end = parse_storage_date(&end_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{end_text}` in weekly_schedules.end_date"
        ))
    })?;
    let range = DateRange::new(start, end)
        .map_err(|err| RepoError::InvalidData(format!("schedule `{identifier}`: {err}")))?;

    let wire = WeeklyWireFields {
        checked_day: row.get("checked_day")?,
        day_time: row.get("day_time")?,
        book_app_type: row.get("book_app_type")?,
        slot_duration: row.get("slot_duration")?,
        patient_count: row.get("patient_count")?,
    };
    let fields = PersistedWeeklyFields::from_wire(&wire)
        .map_err(|err| RepoError::InvalidData(format!("schedule `{identifier}`: {err}")))?;

    Ok(StoredSchedule {
        identifier,
        facility_id: row.get("facility_id")?,
        range,
        wire,
        fields,
    })
}
