use std::cell::RefCell;
use std::collections::BTreeSet;
use weekslot_core::{
    AvailabilityRequest, BackendError, BackendResponse, BackendResult, CommitMode, CommitRequest,
    DateRange, PersistedWeeklyFields, ScheduleBackend, ScheduleSession, SessionError,
    SessionState, SlotField, ValidationIssue, Weekday, WeeklyWireFields,
};

#[derive(Default)]
struct RecordingBackend {
    reject_availability: Option<String>,
    fail_transport: bool,
    reject_commit: Option<String>,
    availability_calls: RefCell<Vec<AvailabilityRequest>>,
    commit_calls: RefCell<Vec<CommitRequest>>,
}

impl ScheduleBackend for RecordingBackend {
    fn check_availability(&self, request: &AvailabilityRequest) -> BackendResult<BackendResponse> {
        self.availability_calls.borrow_mut().push(request.clone());
        if self.fail_transport {
            return Err(BackendError::TimedOut);
        }
        Ok(match &self.reject_availability {
            Some(message) => BackendResponse::rejected(message.clone()),
            None => BackendResponse::accepted("Available", None),
        })
    }

    fn commit_schedule(&self, request: &CommitRequest) -> BackendResult<BackendResponse> {
        self.commit_calls.borrow_mut().push(request.clone());
        Ok(match &self.reject_commit {
            Some(message) => BackendResponse::rejected(message.clone()),
            None => BackendResponse::accepted(
                "Saved",
                Some(
                    request
                        .identifier
                        .clone()
                        .unwrap_or_else(|| "new-1".to_string()),
                ),
            ),
        })
    }
}

fn range(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, end).unwrap()
}

fn fill_slot<B: ScheduleBackend>(
    session: &mut ScheduleSession<B>,
    index: usize,
    from: (&str, &str),
    to: (&str, &str),
) {
    session.set_slot_field(index, SlotField::FromHour, from.0).unwrap();
    session.set_slot_field(index, SlotField::FromMinute, from.1).unwrap();
    session.set_slot_field(index, SlotField::ToHour, to.0).unwrap();
    session.set_slot_field(index, SlotField::ToMinute, to.1).unwrap();
}

fn ready_session(backend: &RecordingBackend) -> ScheduleSession<&RecordingBackend> {
    let mut session = ScheduleSession::create(backend, 7, range("01/09/2025", "30/09/2025"));
    session
        .select_days([Weekday::Wednesday, Weekday::Monday])
        .unwrap();
    session.open_editor().unwrap();
    fill_slot(&mut session, 0, ("09", "00"), ("10", "00"));
    session.set_slot_duration(Some(30)).unwrap();
    session
}

#[test]
fn create_flow_visits_every_commit_state() {
    let backend = RecordingBackend::default();
    let mut session = ready_session(&backend);

    let receipt = session.commit().unwrap();
    assert_eq!(receipt.mode, CommitMode::Create);
    assert_eq!(receipt.identifier.as_deref(), Some("new-1"));
    assert_eq!(receipt.message, "Saved");
    assert_eq!(receipt.fields.checked_day, "Monday,Wednesday");
    assert_eq!(receipt.fields.day_time, "09-00-10-00,09-00-10-00");

    assert_eq!(
        session.trail(),
        &[
            SessionState::Empty,
            SessionState::DaysSelected,
            SessionState::Editing,
            SessionState::Validating,
            SessionState::AvailabilityChecking,
            SessionState::Committing,
            SessionState::Done,
        ]
    );

    let availability = backend.availability_calls.borrow();
    assert_eq!(availability.len(), 1);
    assert_eq!(availability[0].start_date, "01/09/2025");
    assert_eq!(availability[0].end_date, "30/09/2025");
    assert_eq!(availability[0].facility_id, 7);
    assert_eq!(availability[0].identifier, None);
}

#[test]
fn committed_session_is_closed() {
    let backend = RecordingBackend::default();
    let mut session = ready_session(&backend);
    session.commit().unwrap();

    assert_eq!(session.add_slot().unwrap_err(), SessionError::SessionClosed);
    assert_eq!(session.commit().unwrap_err(), SessionError::SessionClosed);
    assert_eq!(backend.commit_calls.borrow().len(), 1);
}

#[test]
fn validation_failure_skips_backend_and_returns_to_editing() {
    let backend = RecordingBackend::default();
    let mut session = ready_session(&backend);
    session.set_slot_duration(None).unwrap();

    let err = session.commit().unwrap_err();
    assert_eq!(
        err,
        SessionError::Validation(vec![ValidationIssue::MissingDuration])
    );
    assert_eq!(session.state(), SessionState::Editing);
    assert_eq!(session.last_error(), Some(&err));
    assert!(session.trail().ends_with(&[
        SessionState::Validating,
        SessionState::Error,
        SessionState::Editing
    ]));
    assert!(backend.availability_calls.borrow().is_empty());
}

#[test]
fn unavailable_range_surfaces_server_message_without_committing() {
    let backend = RecordingBackend {
        reject_availability: Some("A schedule already exists.".to_string()),
        ..RecordingBackend::default()
    };
    let mut session = ready_session(&backend);

    assert_eq!(
        session.commit().unwrap_err(),
        SessionError::AvailabilityRejected("A schedule already exists.".to_string())
    );
    assert_eq!(session.state(), SessionState::Editing);
    assert!(backend.commit_calls.borrow().is_empty());
}

#[test]
fn transport_failure_is_treated_as_rejection() {
    let backend = RecordingBackend {
        fail_transport: true,
        ..RecordingBackend::default()
    };
    let mut session = ready_session(&backend);

    assert!(matches!(
        session.commit(),
        Err(SessionError::AvailabilityRejected(_))
    ));
    assert_eq!(session.state(), SessionState::Editing);
}

#[test]
fn commit_rejection_keeps_draft_and_allows_retry() {
    let backend = RecordingBackend {
        reject_commit: Some("Server busy".to_string()),
        ..RecordingBackend::default()
    };
    let mut session = ready_session(&backend);
    let before = session.draft().clone();

    assert_eq!(
        session.commit().unwrap_err(),
        SessionError::CommitFailed("Server busy".to_string())
    );
    assert_eq!(session.draft(), &before);
    assert_eq!(session.state(), SessionState::Editing);
    assert_eq!(
        session.trail().last().copied(),
        Some(SessionState::Editing)
    );
}

#[test]
fn pruning_saturday_forces_reselection_before_editor() {
    let backend = RecordingBackend::default();
    let mut session = ScheduleSession::create(&backend, 7, range("01/09/2025", "30/09/2025"));
    session.select_days([Weekday::Saturday]).unwrap();

    let dropped = session
        .change_date_range(range("01/09/2025", "03/09/2025"))
        .unwrap();
    assert_eq!(dropped, vec![Weekday::Saturday]);
    assert!(session.draft().selected_weekdays().is_empty());
    assert_eq!(session.state(), SessionState::Empty);
    assert!(matches!(
        session.open_editor(),
        Err(SessionError::InvalidTransition {
            from: SessionState::Empty,
            ..
        })
    ));
    assert_eq!(
        session.select_days([Weekday::Saturday]).unwrap_err(),
        SessionError::Draft(weekslot_core::DraftError::DayOutOfRange(Weekday::Saturday))
    );

    session.select_days([Weekday::Tuesday]).unwrap();
    session.open_editor().unwrap();
    assert_eq!(session.state(), SessionState::Editing);
}

fn stored_fields() -> PersistedWeeklyFields {
    PersistedWeeklyFields::from_wire(&WeeklyWireFields {
        checked_day: "Monday,Friday".to_string(),
        day_time: "09-00-12-00~14-00-16-00,09-00-12-00~14-00-16-00".to_string(),
        book_app_type: "timeslot".to_string(),
        slot_duration: Some(20),
        patient_count: None,
    })
    .unwrap()
}

#[test]
fn edit_flow_starts_editing_and_commits_with_identifier() {
    let backend = RecordingBackend::default();
    let mut session = ScheduleSession::edit(
        &backend,
        7,
        "sched-9",
        range("01/09/2025", "30/09/2025"),
        &stored_fields(),
    );
    assert_eq!(session.state(), SessionState::Editing);
    assert_eq!(
        session.draft().selected_weekdays(),
        &BTreeSet::from([Weekday::Monday, Weekday::Friday])
    );
    assert_eq!(session.draft().slots().len(), 2);

    session.select_days([Weekday::Monday, Weekday::Tuesday]).unwrap();
    assert_eq!(session.draft().slots().len(), 2);

    let receipt = session.commit().unwrap();
    assert_eq!(receipt.mode, CommitMode::Edit);
    assert_eq!(receipt.identifier.as_deref(), Some("sched-9"));
    assert_eq!(receipt.fields.checked_day, "Monday,Tuesday");
    assert_eq!(
        receipt.fields.day_time,
        "09-00-12-00~14-00-16-00,09-00-12-00~14-00-16-00"
    );

    let commits = backend.commit_calls.borrow();
    assert_eq!(commits[0].identifier.as_deref(), Some("sched-9"));
    assert_eq!(
        backend.availability_calls.borrow()[0].identifier.as_deref(),
        Some("sched-9")
    );
}

#[test]
fn edit_range_change_requires_confirmation() {
    let backend = RecordingBackend::default();
    let mut session = ScheduleSession::edit(
        &backend,
        7,
        "sched-9",
        range("01/09/2025", "30/09/2025"),
        &stored_fields(),
    );

    let dropped = session
        .change_date_range(range("01/09/2025", "02/09/2025"))
        .unwrap();
    assert_eq!(dropped, vec![Weekday::Friday]);
    assert_eq!(session.state(), SessionState::DaysSelected);
    assert!(!session.is_range_confirmed());
    assert_eq!(
        session.open_editor().unwrap_err(),
        SessionError::RangeConfirmationPending
    );
    assert!(matches!(
        session.commit(),
        Err(SessionError::InvalidTransition { .. })
    ));

    session.confirm_range().unwrap();
    assert_eq!(session.state(), SessionState::Editing);
    let receipt = session.commit().unwrap();
    assert_eq!(receipt.fields.checked_day, "Monday");
}

#[test]
fn edit_reports_days_pruned_from_stored_selection() {
    let backend = RecordingBackend::default();
    let session = ScheduleSession::edit(
        &backend,
        7,
        "sched-9",
        range("01/09/2025", "02/09/2025"),
        &stored_fields(),
    );

    assert_eq!(session.dropped_on_open(), &[Weekday::Friday]);
    assert_eq!(
        session.draft().selected_weekdays(),
        &BTreeSet::from([Weekday::Monday])
    );
    assert_eq!(session.state(), SessionState::Editing);

    let untouched = ScheduleSession::edit(
        &backend,
        7,
        "sched-9",
        range("01/09/2025", "30/09/2025"),
        &stored_fields(),
    );
    assert!(untouched.dropped_on_open().is_empty());
}

#[test]
fn second_range_change_prunes_again_and_still_needs_confirmation() {
    let backend = RecordingBackend::default();
    let stored = PersistedWeeklyFields::from_wire(&WeeklyWireFields {
        checked_day: "Monday,Wednesday,Friday".to_string(),
        day_time: "09-00-12-00,09-00-12-00,09-00-12-00".to_string(),
        book_app_type: "timeslot".to_string(),
        slot_duration: Some(20),
        patient_count: None,
    })
    .unwrap();
    let mut session = ScheduleSession::edit(
        &backend,
        7,
        "sched-9",
        range("01/09/2025", "30/09/2025"),
        &stored,
    );

    let first = session
        .change_date_range(range("01/09/2025", "03/09/2025"))
        .unwrap();
    assert_eq!(first, vec![Weekday::Friday]);

    let second = session
        .change_date_range(range("02/09/2025", "04/09/2025"))
        .unwrap();
    assert_eq!(second, vec![Weekday::Monday]);
    assert_eq!(
        session.draft().selected_weekdays(),
        &BTreeSet::from([Weekday::Wednesday])
    );
    assert_eq!(session.state(), SessionState::DaysSelected);
    assert!(!session.is_range_confirmed());
    assert_eq!(
        session.open_editor().unwrap_err(),
        SessionError::RangeConfirmationPending
    );
    assert_eq!(
        session.commit().unwrap_err(),
        SessionError::InvalidTransition {
            from: SessionState::DaysSelected,
            action: "commit"
        }
    );
    assert!(backend.availability_calls.borrow().is_empty());

    session.confirm_range().unwrap();
    assert_eq!(session.state(), SessionState::Editing);
    let receipt = session.commit().unwrap();
    assert_eq!(receipt.fields.checked_day, "Wednesday");
    let availability = backend.availability_calls.borrow();
    assert_eq!(availability[0].start_date, "02/09/2025");
    assert_eq!(availability[0].end_date, "04/09/2025");
}

#[test]
fn cancel_makes_no_backend_calls() {
    let backend = RecordingBackend::default();
    let session = ready_session(&backend);
    let draft = session.cancel();

    assert_eq!(draft.selected_weekdays().len(), 2);
    assert!(backend.availability_calls.borrow().is_empty());
    assert!(backend.commit_calls.borrow().is_empty());
}
