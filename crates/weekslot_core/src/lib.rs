//! Core domain logic for the weekly availability scheduler.
//! This crate is the single source of truth for schedule invariants.

pub mod backend;
pub mod calendar;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;
pub mod wire;

pub use backend::{
    AvailabilityRequest, BackendError, BackendResponse, BackendResult, CommitMode, CommitRequest,
    ScheduleBackend,
};
pub use calendar::date_range::{CalendarError, DateRange};
pub use calendar::range_weekdays::{allowed_weekdays_or_all, weekdays_in_range, AllowedWeekdays};
pub use calendar::weekday::Weekday;
pub use db::{open_store, open_store_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::draft::{AppointmentType, DraftError, WeeklyScheduleDraft, MAX_SLOTS};
pub use model::time::{SlotField, SlotInput, TimeFieldError, TimeOfDay, TimeSlot};
pub use repo::schedule_repo::{
    RepoError, RepoResult, ScheduleRepository, SqliteScheduleRepository, StoredSchedule,
};
pub use service::session::{
    CommitReceipt, ScheduleSession, SessionError, SessionMode, SessionState,
};
pub use validation::{validate, ValidationIssue, ALLOWED_SLOT_DURATIONS};
pub use wire::codec::{decode, encode};
pub use wire::fields::{PersistedWeeklyFields, WeeklyWireFields, WireError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
