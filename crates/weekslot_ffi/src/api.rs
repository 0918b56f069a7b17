//! FFI use-case API for Flutter-facing schedule calls.
//!
//! # Responsibility
//! - Expose weekday lookup, schedule commit and schedule load to Dart via FRB.
//! - Translate text input from form fields into core session operations.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported inside response envelopes, never thrown.

use log::{debug, warn};
use std::path::PathBuf;
use std::sync::OnceLock;
use weekslot_core::{
    allowed_weekdays_or_all, core_version as core_version_inner, decode,
    init_logging as init_logging_inner, open_store, ping as ping_inner, AppointmentType,
    DateRange, ScheduleRepository, ScheduleSession, SessionError, SlotField, SlotInput,
    SqliteScheduleRepository, Weekday,
};

const STORE_FILE_NAME: &str = "weekslot_schedules.sqlite3";
const STORE_PATH_ENV: &str = "WEEKSLOT_DB_PATH";
static STORE_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Same `level + log_dir` again is a no-op; a different one is an error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the schedule store file used by every later call.
///
/// # FFI contract
/// - Must run before the first store-backed call to take effect.
/// - Same path again is a no-op; a different path is an error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_schedule_store(path: String) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "store path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = STORE_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "schedule store already set to `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Weekdays a caller may offer for a date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekdayRangeResponse {
    /// Full weekday names in Monday-first order.
    pub weekdays: Vec<String>,
    /// `true` when the range was unparsable and all days are offered.
    pub fallback: bool,
    pub message: String,
}

/// Selectable weekdays for a `DD/MM/YYYY` (or `DD.MM.YY`) range.
///
/// Unparsable ranges offer all seven days and set `fallback`.
#[flutter_rust_bridge::frb(sync)]
pub fn schedule_weekdays_in_range(start_date: String, end_date: String) -> WeekdayRangeResponse {
    let allowed = allowed_weekdays_or_all(&start_date, &end_date);
    let message = match &allowed.fallback_reason {
        Some(err) => format!("Showing all days: {err}"),
        None => format!("{} day(s) in range.", allowed.days.len()),
    };
    WeekdayRangeResponse {
        weekdays: allowed
            .days
            .iter()
            .map(|day| day.full_name().to_string())
            .collect(),
        fallback: allowed.is_fallback(),
        message,
    }
}

/// One slot as typed into the form; blank text means an empty field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotTextInput {
    pub from_hour: String,
    pub from_minute: String,
    pub to_hour: String,
    pub to_minute: String,
    /// Patients per slot for `sequence` schedules.
    pub capacity: Option<u32>,
}

/// Form state submitted for commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyScheduleInput {
    /// Set to edit a stored schedule; `None` creates a new one.
    pub identifier: Option<String>,
    pub facility_id: i64,
    pub start_date: String,
    pub end_date: String,
    /// Full or three-letter weekday names.
    pub weekdays: Vec<String>,
    pub slots: Vec<SlotTextInput>,
    /// `timeslot` or `sequence`.
    pub appointment_type: String,
    pub slot_duration: Option<u32>,
}

/// Commit outcome envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleActionResponse {
    pub ok: bool,
    pub identifier: Option<String>,
    /// Server or validation message for display.
    pub message: String,
    /// Validation issue codes, when validation failed.
    pub issue_codes: Vec<String>,
}

impl ScheduleActionResponse {
    fn success(message: impl Into<String>, identifier: Option<String>) -> Self {
        Self {
            ok: true,
            identifier,
            message: message.into(),
            issue_codes: Vec::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            identifier: None,
            message: message.into(),
            issue_codes: Vec::new(),
        }
    }
}

impl From<SessionError> for ScheduleActionResponse {
    fn from(value: SessionError) -> Self {
        let issue_codes = match &value {
            SessionError::Validation(issues) => {
                issues.iter().map(|issue| issue.code().to_string()).collect()
            }
            _ => Vec::new(),
        };
        Self {
            issue_codes,
            ..Self::failure(value.to_string())
        }
    }
}

/// Validates and commits a weekly schedule against the local store.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Runs availability check before create/edit.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn commit_weekly_schedule(input: WeeklyScheduleInput) -> ScheduleActionResponse {
    run_commit(&input).unwrap_or_else(|failure| {
        warn!(
            "event=ffi_commit module=ffi status=error mode={} issues={}",
            if input.identifier.is_some() { "edit" } else { "create" },
            failure.issue_codes.len()
        );
        failure
    })
}

fn run_commit(
    input: &WeeklyScheduleInput,
) -> Result<ScheduleActionResponse, ScheduleActionResponse> {
    let range = DateRange::parse(&input.start_date, &input.end_date)
        .map_err(|err| ScheduleActionResponse::failure(err.to_string()))?;
    let weekdays = parse_weekdays(&input.weekdays).map_err(ScheduleActionResponse::failure)?;
    let appointment_type = AppointmentType::parse_wire(&input.appointment_type).ok_or_else(|| {
        ScheduleActionResponse::failure(format!(
            "unknown appointment type `{}`",
            input.appointment_type.trim()
        ))
    })?;

    let conn = open_store(resolve_store_path()).map_err(|err| {
        ScheduleActionResponse::failure(format!("schedule store open failed: {err}"))
    })?;
    let repo = SqliteScheduleRepository::new(&conn);

    let mut session = match input.identifier.as_deref() {
        Some(identifier) => {
            let stored = repo.load_schedule(identifier).map_err(|err| {
                ScheduleActionResponse::failure(format!("schedule load failed: {err}"))
            })?;
            let mut session = ScheduleSession::edit(
                &repo,
                input.facility_id,
                identifier,
                stored.range,
                &stored.fields,
            );
            let dropped = session.change_date_range(range)?;
            if !dropped.is_empty() {
                debug!(
                    "event=ffi_commit module=ffi status=pruned dropped_days={}",
                    dropped.len()
                );
            }
            session.select_days(weekdays)?;
            session.confirm_range()?;
            session
        }
        None => {
            let mut session = ScheduleSession::create(&repo, input.facility_id, range);
            session.select_days(weekdays)?;
            session.open_editor()?;
            session
        }
    };

    replace_slots(&mut session, &input.slots)?;
    session.set_appointment_type(appointment_type)?;
    session.set_slot_duration(input.slot_duration)?;

    let receipt = session.commit()?;
    Ok(ScheduleActionResponse::success(
        receipt.message,
        receipt.identifier,
    ))
}

/// Stored schedule rebuilt into editable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyScheduleView {
    pub ok: bool,
    pub message: String,
    pub identifier: String,
    pub facility_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub weekdays: Vec<String>,
    pub slots: Vec<SlotTextInput>,
    pub appointment_type: String,
    pub slot_duration: Option<u32>,
}

impl WeeklyScheduleView {
    fn failure(identifier: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            identifier: identifier.to_string(),
            facility_id: 0,
            start_date: String::new(),
            end_date: String::new(),
            weekdays: Vec::new(),
            slots: Vec::new(),
            appointment_type: String::new(),
            slot_duration: None,
        }
    }
}

/// Loads a stored schedule and decodes it for the edit form.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; `ok = false` carries the reason.
#[flutter_rust_bridge::frb(sync)]
pub fn load_weekly_schedule(identifier: String) -> WeeklyScheduleView {
    let identifier = identifier.trim();
    let conn = match open_store(resolve_store_path()) {
        Ok(conn) => conn,
        Err(err) => {
            return WeeklyScheduleView::failure(
                identifier,
                format!("schedule store open failed: {err}"),
            )
        }
    };
    let stored = match SqliteScheduleRepository::new(&conn).load_schedule(identifier) {
        Ok(stored) => stored,
        Err(err) => return WeeklyScheduleView::failure(identifier, err.to_string()),
    };

    let draft = decode(&stored.fields, stored.range);
    let (start_date, end_date) = stored.range.display_bounds();
    WeeklyScheduleView {
        ok: true,
        message: "Schedule loaded.".to_string(),
        identifier: stored.identifier,
        facility_id: stored.facility_id,
        start_date,
        end_date,
        weekdays: draft
            .selected_weekdays()
            .iter()
            .map(|day| day.full_name().to_string())
            .collect(),
        slots: draft.slots().iter().map(to_slot_text).collect(),
        appointment_type: draft.appointment_type().wire_name().to_string(),
        slot_duration: draft.slot_duration_minutes(),
    }
}

fn parse_weekdays(names: &[String]) -> Result<Vec<Weekday>, String> {
    names
        .iter()
        .map(|name| {
            Weekday::parse_name(name).ok_or_else(|| format!("unknown weekday `{}`", name.trim()))
        })
        .collect()
}

fn replace_slots(
    session: &mut ScheduleSession<&SqliteScheduleRepository<'_>>,
    slots: &[SlotTextInput],
) -> Result<(), SessionError> {
    while !session.draft().slots().is_empty() {
        session.remove_slot(0)?;
    }
    for slot in slots {
        let index = session.add_slot()?;
        for (field, text) in [
            (SlotField::FromHour, &slot.from_hour),
            (SlotField::FromMinute, &slot.from_minute),
            (SlotField::ToHour, &slot.to_hour),
            (SlotField::ToMinute, &slot.to_minute),
        ] {
            session.set_slot_field(index, field, text)?;
        }
        session.set_slot_capacity(index, slot.capacity)?;
    }
    Ok(())
}

fn to_slot_text(slot: &SlotInput) -> SlotTextInput {
    let text = |field| {
        slot.field(field)
            .map(|value| format!("{value:02}"))
            .unwrap_or_default()
    };
    SlotTextInput {
        from_hour: text(SlotField::FromHour),
        from_minute: text(SlotField::FromMinute),
        to_hour: text(SlotField::ToHour),
        to_minute: text(SlotField::ToMinute),
        capacity: slot.capacity,
    }
}

fn resolve_store_path() -> PathBuf {
    STORE_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(STORE_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_FILE_NAME)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::{
        commit_weekly_schedule, configure_schedule_store, core_version, init_logging,
        load_weekly_schedule, ping, schedule_weekdays_in_range, SlotTextInput,
        WeeklyScheduleInput,
    };
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEST_STORE: OnceLock<PathBuf> = OnceLock::new();

    fn use_test_store() {
        let path = TEST_STORE.get_or_init(|| {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos();
            std::env::temp_dir().join(format!(
                "weekslot-ffi-test-{}-{nanos}.sqlite3",
                std::process::id()
            ))
        });
        let error = configure_schedule_store(path.to_string_lossy().into_owned());
        assert!(error.is_empty(), "{error}");
    }

    fn slot(from: (&str, &str), to: (&str, &str)) -> SlotTextInput {
        SlotTextInput {
            from_hour: from.0.to_string(),
            from_minute: from.1.to_string(),
            to_hour: to.0.to_string(),
            to_minute: to.1.to_string(),
            capacity: None,
        }
    }

    fn input(facility_id: i64) -> WeeklyScheduleInput {
        WeeklyScheduleInput {
            identifier: None,
            facility_id,
            start_date: "01/09/2025".to_string(),
            end_date: "30/09/2025".to_string(),
            weekdays: vec!["Wednesday".to_string(), "mon".to_string()],
            slots: vec![slot(("09", "00"), ("10", "00"))],
            appointment_type: "timeslot".to_string(),
            slot_duration: Some(30),
        }
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/weekslot-logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn weekdays_in_short_range_and_fallback() {
        let response =
            schedule_weekdays_in_range("01/09/2025".to_string(), "02/09/2025".to_string());
        assert_eq!(response.weekdays, vec!["Monday", "Tuesday"]);
        assert!(!response.fallback);

        let fallback = schedule_weekdays_in_range("bad".to_string(), "02/09/2025".to_string());
        assert_eq!(fallback.weekdays.len(), 7);
        assert!(fallback.fallback);
    }

    #[test]
    fn store_path_cannot_switch_once_set() {
        use_test_store();
        assert!(!configure_schedule_store("/tmp/another-weekslot.sqlite3".to_string()).is_empty());
        assert!(!configure_schedule_store("  ".to_string()).is_empty());
    }

    #[test]
    fn commit_then_load_then_edit() {
        use_test_store();
        let created = commit_weekly_schedule(input(9_001));
        assert!(created.ok, "{}", created.message);
        let identifier = created.identifier.clone().unwrap();

        let view = load_weekly_schedule(identifier.clone());
        assert!(view.ok, "{}", view.message);
        assert_eq!(view.weekdays, vec!["Monday", "Wednesday"]);
        assert_eq!(view.slots[0], slot(("09", "00"), ("10", "00")));
        assert_eq!(view.slot_duration, Some(30));

        let mut edit = input(9_001);
        edit.identifier = Some(identifier.clone());
        edit.start_date = "08/09/2025".to_string();
        edit.end_date = "19/09/2025".to_string();
        edit.weekdays = vec!["Friday".to_string()];
        edit.slots = vec![slot(("", ""), ("", "")), slot(("14", "00"), ("16", "30"))];
        let edited = commit_weekly_schedule(edit);
        assert!(edited.ok, "{}", edited.message);
        assert_eq!(edited.identifier.as_deref(), Some(identifier.as_str()));

        let reloaded = load_weekly_schedule(identifier);
        assert_eq!(reloaded.start_date, "08/09/2025");
        assert_eq!(reloaded.end_date, "19/09/2025");
        assert_eq!(reloaded.weekdays, vec!["Friday"]);
        assert_eq!(reloaded.slots[1], slot(("14", "00"), ("16", "30")));
    }

    #[test]
    fn invalid_schedule_reports_issue_codes() {
        use_test_store();
        let mut bad = input(9_002);
        bad.slots = vec![slot(("10", "00"), ("09", "00"))];
        let response = commit_weekly_schedule(bad);
        assert!(!response.ok);
        assert_eq!(response.issue_codes, vec!["invalid_ordering"]);
    }

    #[test]
    fn morning_slot_in_afternoon_position_is_rejected() {
        use_test_store();
        let mut bad = input(9_004);
        bad.slots = vec![slot(("08", "00"), ("09", "00")), slot(("10", "00"), ("11", "00"))];
        let response = commit_weekly_schedule(bad);
        assert!(!response.ok);
        assert_eq!(response.issue_codes, vec!["slot_outside_half"]);
    }

    #[test]
    fn unknown_weekday_is_rejected_before_store_access() {
        let mut bad = input(9_003);
        bad.weekdays = vec!["Funday".to_string()];
        let response = commit_weekly_schedule(bad);
        assert!(!response.ok);
        assert!(response.message.contains("Funday"));
    }

    #[test]
    fn loading_unknown_schedule_fails_softly() {
        use_test_store();
        let view = load_weekly_schedule("does-not-exist".to_string());
        assert!(!view.ok);
    }
}
