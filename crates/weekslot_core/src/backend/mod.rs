//! Scheduling backend contract consumed by `ScheduleSession`.
//!
//! # Responsibility
//! - Define the availability-check and slot-commit collaborator calls.
//! - Keep request/response envelopes independent of transport.
//!
//! # Invariants
//! - Availability requests carry dates in `DD/MM/YYYY` form.
//! - A transport-level `Err` is handled exactly like an `ok = false` reply.

use crate::calendar::date_range::DateRange;
use crate::repo::schedule_repo::RepoError;
use crate::wire::fields::WeeklyWireFields;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BackendResult<T> = Result<T, BackendError>;

/// Failure to obtain any reply from the backend.
#[derive(Debug)]
pub enum BackendError {
    /// Network/transport failure reported by the collaborator.
    Transport(String),
    /// The collaborator gave up waiting.
    TimedOut,
    /// Local store failure.
    Repo(RepoError),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "backend transport error: {message}"),
            Self::TimedOut => write!(f, "backend request timed out"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BackendError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Request for the availability-check endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRequest {
    pub facility_id: i64,
    /// `DD/MM/YYYY`.
    pub start_date: String,
    /// `DD/MM/YYYY`.
    pub end_date: String,
    /// Schedule being edited, so a store can ignore its own range.
    pub identifier: Option<String>,
}

impl AvailabilityRequest {
    pub fn for_range(facility_id: i64, range: &DateRange, identifier: Option<&str>) -> Self {
        let (start_date, end_date) = range.display_bounds();
        Self {
            facility_id,
            start_date,
            end_date,
            identifier: identifier.map(str::to_string),
        }
    }
}

/// Create a new schedule or replace an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    Create,
    Edit,
}

impl CommitMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
        }
    }
}

/// Request for the slot-commit endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub mode: CommitMode,
    /// Present for `CommitMode::Edit`.
    pub identifier: Option<String>,
    pub fields: WeeklyWireFields,
    pub range: DateRange,
    pub facility_id: i64,
}

/// Server reply for either call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub ok: bool,
    /// Human-readable server message, surfaced verbatim.
    pub message: String,
    /// Identifier of the created or edited schedule, when known.
    pub identifier: Option<String>,
}

impl BackendResponse {
    pub fn accepted(message: impl Into<String>, identifier: Option<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            identifier,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            identifier: None,
        }
    }
}

/// Collaborator interface for the two scheduling endpoints.
pub trait ScheduleBackend {
    fn check_availability(&self, request: &AvailabilityRequest) -> BackendResult<BackendResponse>;
    fn commit_schedule(&self, request: &CommitRequest) -> BackendResult<BackendResponse>;
}

impl<T: ScheduleBackend + ?Sized> ScheduleBackend for &T {
    fn check_availability(&self, request: &AvailabilityRequest) -> BackendResult<BackendResponse> {
        (**self).check_availability(request)
    }

    fn commit_schedule(&self, request: &CommitRequest) -> BackendResult<BackendResponse> {
        (**self).commit_schedule(request)
    }
}
