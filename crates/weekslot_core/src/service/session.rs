//! Schedule session state machine.
//!
//! # Responsibility
//! - Drive day selection, slot editing and the two-phase commit
//!   (availability check, then create/edit) over one owned draft.
//! - Keep create and edit flows on the same transitions, diverging only in
//!   range confirmation and the commit identifier.
//!
//! # Invariants
//! - Slot edits are accepted only in `Editing`.
//! - Any commit failure records `Error` in the trail and returns to
//!   `Editing` with the draft untouched.
//! - Encoding happens only after validation and the availability check pass.
//! - After `Done` every operation returns `SessionClosed`.

use crate::backend::{AvailabilityRequest, CommitMode, CommitRequest, ScheduleBackend};
use crate::calendar::date_range::{CalendarError, DateRange};
use crate::calendar::weekday::Weekday;
use crate::model::draft::{AppointmentType, DraftError, WeeklyScheduleDraft};
use crate::model::time::SlotField;
use crate::validation::{validate, ValidationIssue};
use crate::wire::codec::{decode, encode};
use crate::wire::fields::{PersistedWeeklyFields, WeeklyWireFields};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SELECTION_STATES: &[SessionState] = &[
    SessionState::Empty,
    SessionState::DaysSelected,
    SessionState::Editing,
];

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    DaysSelected,
    Editing,
    Validating,
    AvailabilityChecking,
    Committing,
    Done,
    Error,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::DaysSelected => "days_selected",
            Self::Editing => "editing",
            Self::Validating => "validating",
            Self::AvailabilityChecking => "availability_checking",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the session creates a new schedule or replaces a stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    Create,
    Edit { identifier: String },
}

impl SessionMode {
    fn commit_mode(&self) -> CommitMode {
        match self {
            Self::Create => CommitMode::Create,
            Self::Edit { .. } => CommitMode::Edit,
        }
    }

    fn identifier(&self) -> Option<&str> {
        match self {
            Self::Create => None,
            Self::Edit { identifier } => Some(identifier.as_str()),
        }
    }
}

/// Error surfaced by a session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Draft(DraftError),
    Calendar(CalendarError),
    Validation(Vec<ValidationIssue>),
    /// Availability check answered not ok, or could not be reached.
    AvailabilityRejected(String),
    /// Create/edit call answered not ok, or could not be reached.
    CommitFailed(String),
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },
    /// An edit-mode range change must be confirmed before editing resumes.
    RangeConfirmationPending,
    NoDaysSelected,
    SessionClosed,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft(err) => write!(f, "{err}"),
            Self::Calendar(err) => write!(f, "{err}"),
            Self::Validation(issues) => {
                let joined = issues
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "schedule is not valid: {joined}")
            }
            Self::AvailabilityRejected(message) | Self::CommitFailed(message) => {
                f.write_str(message)
            }
            Self::InvalidTransition { from, action } => {
                write!(f, "`{action}` is not allowed in state `{from}`")
            }
            Self::RangeConfirmationPending => {
                write!(f, "confirm the new date range before editing slots")
            }
            Self::NoDaysSelected => write!(f, "select at least one day"),
            Self::SessionClosed => write!(f, "schedule session is already committed"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Draft(err) => Some(err),
            Self::Calendar(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DraftError> for SessionError {
    fn from(value: DraftError) -> Self {
        Self::Draft(value)
    }
}

impl From<CalendarError> for SessionError {
    fn from(value: CalendarError) -> Self {
        Self::Calendar(value)
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub mode: CommitMode,
    /// Identifier reported by the backend, or the edited one.
    pub identifier: Option<String>,
    /// Server message, verbatim.
    pub message: String,
    /// Fields that were sent.
    pub fields: WeeklyWireFields,
}

/// One create or edit flow over a single weekly schedule.
pub struct ScheduleSession<B: ScheduleBackend> {
    backend: B,
    facility_id: i64,
    mode: SessionMode,
    draft: WeeklyScheduleDraft,
    state: SessionState,
    range_confirmed: bool,
    days_initialized: bool,
    dropped_on_open: Vec<Weekday>,
    trail: Vec<SessionState>,
    last_error: Option<SessionError>,
}

impl<B: ScheduleBackend> ScheduleSession<B> {
    /// Starts a create flow with nothing selected.
    pub fn create(backend: B, facility_id: i64, date_range: DateRange) -> Self {
        Self::start(
            backend,
            facility_id,
            SessionMode::Create,
            WeeklyScheduleDraft::new(date_range),
            SessionState::Empty,
        )
    }

    /// Starts an edit flow from stored fields, directly in `Editing`.
    ///
    /// Decoded days that do not occur in `date_range` are pruned and
    /// reported by `dropped_on_open`.
    pub fn edit(
        backend: B,
        facility_id: i64,
        identifier: impl Into<String>,
        date_range: DateRange,
        fields: &PersistedWeeklyFields,
    ) -> Self {
        let mut draft = decode(fields, date_range);
        let dropped = draft.set_date_range(date_range);
        if !dropped.is_empty() {
            info!(
                "event=session_edit_start module=session status=pruned dropped_days={}",
                dropped
                    .iter()
                    .map(|day| day.full_name())
                    .collect::<Vec<_>>()
                    .join("|")
            );
        }
        let mut session = Self::start(
            backend,
            facility_id,
            SessionMode::Edit {
                identifier: identifier.into(),
            },
            draft,
            SessionState::Editing,
        );
        session.days_initialized = true;
        session.dropped_on_open = dropped;
        session
    }

    fn start(
        backend: B,
        facility_id: i64,
        mode: SessionMode,
        draft: WeeklyScheduleDraft,
        state: SessionState,
    ) -> Self {
        info!(
            "event=session_start module=session status=ok mode={} state={}",
            mode.commit_mode().label(),
            state
        );
        Self {
            backend,
            facility_id,
            mode,
            draft,
            state,
            range_confirmed: true,
            days_initialized: false,
            dropped_on_open: Vec::new(),
            trail: vec![state],
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state visited, in order, starting with the initial one.
    pub fn trail(&self) -> &[SessionState] {
        &self.trail
    }

    pub fn draft(&self) -> &WeeklyScheduleDraft {
        &self.draft
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn facility_id(&self) -> i64 {
        self.facility_id
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Stored weekdays pruned when an edit session opened; empty for create.
    pub fn dropped_on_open(&self) -> &[Weekday] {
        &self.dropped_on_open
    }

    /// `false` after an edit-mode range change until `confirm_range`.
    pub fn is_range_confirmed(&self) -> bool {
        self.range_confirmed
    }

    /// Replaces the weekday selection.
    ///
    /// The first selection of a session resets slots to one empty TIMESLOT slot.
    pub fn select_days(
        &mut self,
        days: impl IntoIterator<Item = Weekday>,
    ) -> Result<(), SessionError> {
        self.ensure_state("select_days", SELECTION_STATES)?;
        let days = days.into_iter().collect::<BTreeSet<_>>();
        if days.is_empty() {
            return Err(self.record(SessionError::NoDaysSelected));
        }
        if let Err(err) = self.draft.replace_selection(days) {
            return Err(self.record(err.into()));
        }

        if !self.days_initialized {
            self.draft.reset_slots();
            self.days_initialized = true;
        }
        if self.state == SessionState::Empty {
            self.transition(SessionState::DaysSelected);
        }
        Ok(())
    }

    /// Removes one day; an emptied selection before the editor returns to `Empty`.
    pub fn deselect_day(&mut self, day: Weekday) -> Result<bool, SessionError> {
        self.ensure_state("deselect_day", SELECTION_STATES)?;
        let removed = self.draft.deselect_weekday(day);
        if self.state == SessionState::DaysSelected && self.draft.selected_weekdays().is_empty() {
            self.transition(SessionState::Empty);
        }
        Ok(removed)
    }

    /// `DaysSelected -> Editing`.
    pub fn open_editor(&mut self) -> Result<(), SessionError> {
        self.ensure_state("open_editor", &[SessionState::DaysSelected])?;
        if !self.range_confirmed {
            return Err(self.record(SessionError::RangeConfirmationPending));
        }
        if self.draft.selected_weekdays().is_empty() {
            return Err(self.record(SessionError::NoDaysSelected));
        }
        self.transition(SessionState::Editing);
        Ok(())
    }

    pub fn add_slot(&mut self) -> Result<usize, SessionError> {
        self.ensure_state("add_slot", &[SessionState::Editing])?;
        self.draft.add_slot().map_err(|err| self.record(err.into()))
    }

    pub fn remove_slot(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_state("remove_slot", &[SessionState::Editing])?;
        self.draft
            .remove_slot(index)
            .map(|_| ())
            .map_err(|err| self.record(err.into()))
    }

    pub fn set_slot_field(
        &mut self,
        index: usize,
        field: SlotField,
        text: &str,
    ) -> Result<(), SessionError> {
        self.ensure_state("set_slot_field", &[SessionState::Editing])?;
        self.draft
            .set_slot_field(index, field, text)
            .map_err(|err| self.record(err.into()))
    }

    pub fn set_slot_capacity(
        &mut self,
        index: usize,
        capacity: Option<u32>,
    ) -> Result<(), SessionError> {
        self.ensure_state("set_slot_capacity", &[SessionState::Editing])?;
        self.draft
            .set_slot_capacity(index, capacity)
            .map_err(|err| self.record(err.into()))
    }

    pub fn set_appointment_type(
        &mut self,
        appointment_type: AppointmentType,
    ) -> Result<(), SessionError> {
        self.ensure_state("set_appointment_type", &[SessionState::Editing])?;
        self.draft.set_appointment_type(appointment_type);
        Ok(())
    }

    pub fn set_slot_duration(&mut self, minutes: Option<u32>) -> Result<(), SessionError> {
        self.ensure_state("set_slot_duration", &[SessionState::Editing])?;
        self.draft.set_slot_duration(minutes);
        Ok(())
    }

    /// Moves the draft to a new range and returns the weekdays it dropped.
    ///
    /// Edit mode leaves `Editing` until the range is confirmed. Create mode
    /// falls back to `Empty` only when no selected day survives.
    pub fn change_date_range(
        &mut self,
        date_range: DateRange,
    ) -> Result<Vec<Weekday>, SessionError> {
        self.ensure_state("change_date_range", SELECTION_STATES)?;
        let dropped = self.draft.set_date_range(date_range);
        let nothing_selected = self.draft.selected_weekdays().is_empty();

        let next = match self.mode {
            SessionMode::Edit { .. } => {
                self.range_confirmed = false;
                if nothing_selected {
                    SessionState::Empty
                } else {
                    SessionState::DaysSelected
                }
            }
            SessionMode::Create if nothing_selected => SessionState::Empty,
            SessionMode::Create => self.state,
        };
        if next != self.state {
            self.transition(next);
        }

        debug!(
            "event=session_range_change module=session status=ok dropped_days={} state={}",
            dropped.len(),
            self.state
        );
        Ok(dropped)
    }

    /// Parses `DD/MM/YYYY` (or `DD.MM.YY`) endpoints, then `change_date_range`.
    pub fn change_date_range_text(
        &mut self,
        start: &str,
        end: &str,
    ) -> Result<Vec<Weekday>, SessionError> {
        self.ensure_open()?;
        let date_range = DateRange::parse(start, end).map_err(|err| self.record(err.into()))?;
        self.change_date_range(date_range)
    }

    /// Accepts the current range and reopens the editor.
    pub fn confirm_range(&mut self) -> Result<(), SessionError> {
        self.ensure_state("confirm_range", SELECTION_STATES)?;
        if self.draft.selected_weekdays().is_empty() {
            return Err(self.record(SessionError::NoDaysSelected));
        }
        self.range_confirmed = true;
        if self.state == SessionState::DaysSelected {
            self.transition(SessionState::Editing);
        }
        Ok(())
    }

    /// Validates, checks availability, then creates or edits the schedule.
    pub fn commit(&mut self) -> Result<CommitReceipt, SessionError> {
        self.ensure_state("commit", &[SessionState::Editing])?;

        self.transition(SessionState::Validating);
        let issues = validate(&self.draft);
        if !issues.is_empty() {
            return Err(self.fail_commit(SessionError::Validation(issues)));
        }

        self.transition(SessionState::AvailabilityChecking);
        let identifier = self.mode.identifier().map(str::to_string);
        let request = AvailabilityRequest::for_range(
            self.facility_id,
            self.draft.date_range(),
            identifier.as_deref(),
        );
        match self.backend.check_availability(&request) {
            Ok(response) if response.ok => {}
            Ok(response) => {
                return Err(self.fail_commit(SessionError::AvailabilityRejected(response.message)))
            }
            Err(err) => {
                return Err(self.fail_commit(SessionError::AvailabilityRejected(err.to_string())))
            }
        }

        self.transition(SessionState::Committing);
        let fields = encode(&self.draft);
        let request = CommitRequest {
            mode: self.mode.commit_mode(),
            identifier: identifier.clone(),
            fields: fields.clone(),
            range: *self.draft.date_range(),
            facility_id: self.facility_id,
        };
        let response = match self.backend.commit_schedule(&request) {
            Ok(response) if response.ok => response,
            Ok(response) => {
                return Err(self.fail_commit(SessionError::CommitFailed(response.message)))
            }
            Err(err) => {
                return Err(self.fail_commit(SessionError::CommitFailed(err.to_string())))
            }
        };

        self.transition(SessionState::Done);
        self.last_error = None;
        info!(
            "event=schedule_commit module=session status=ok mode={} days={}",
            request.mode.label(),
            self.draft.selected_weekdays().len()
        );
        Ok(CommitReceipt {
            mode: request.mode,
            identifier: response.identifier.or(identifier),
            message: response.message,
            fields,
        })
    }

    /// Abandons the flow without any backend call and hands back the draft.
    pub fn cancel(self) -> WeeklyScheduleDraft {
        info!(
            "event=session_cancel module=session status=ok mode={} state={}",
            self.mode.commit_mode().label(),
            self.state
        );
        self.draft
    }

    fn ensure_open(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Done {
            return Err(self.record(SessionError::SessionClosed));
        }
        Ok(())
    }

    fn ensure_state(
        &mut self,
        action: &'static str,
        allowed: &[SessionState],
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        if !allowed.contains(&self.state) {
            return Err(self.record(SessionError::InvalidTransition {
                from: self.state,
                action,
            }));
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            "event=session_transition module=session status=ok from={} to={}",
            self.state, next
        );
        self.state = next;
        self.trail.push(next);
    }

    fn record(&mut self, err: SessionError) -> SessionError {
        self.last_error = Some(err.clone());
        err
    }

    fn fail_commit(&mut self, err: SessionError) -> SessionError {
        warn!(
            "event=schedule_commit module=session status=error stage={} mode={}",
            self.state,
            self.mode.commit_mode().label()
        );
        self.transition(SessionState::Error);
        self.transition(SessionState::Editing);
        self.record(err)
    }
}
