use std::collections::BTreeSet;
use weekslot_core::{
    decode, encode, AppointmentType, DateRange, PersistedWeeklyFields, SlotField, TimeOfDay,
    Weekday, WeeklyScheduleDraft, WeeklyWireFields,
};

fn september() -> DateRange {
    DateRange::parse("01/09/2025", "30/09/2025").unwrap()
}

fn fill_slot(draft: &mut WeeklyScheduleDraft, from: (&str, &str), to: (&str, &str)) {
    let index = draft.add_slot().unwrap();
    draft.set_slot_field(index, SlotField::FromHour, from.0).unwrap();
    draft.set_slot_field(index, SlotField::FromMinute, from.1).unwrap();
    draft.set_slot_field(index, SlotField::ToHour, to.0).unwrap();
    draft.set_slot_field(index, SlotField::ToMinute, to.1).unwrap();
}

#[test]
fn monday_wednesday_single_slot_encodes_positionally() {
    let mut draft = WeeklyScheduleDraft::new(september());
    draft.select_weekday(Weekday::Wednesday).unwrap();
    draft.select_weekday(Weekday::Monday).unwrap();
    draft.set_slot_duration(Some(30));
    fill_slot(&mut draft, ("09", "00"), ("10", "00"));

    let wire = encode(&draft);
    assert_eq!(wire.checked_day, "Monday,Wednesday");
    assert_eq!(wire.day_time, "09-00-10-00,09-00-10-00");
    assert_eq!(wire.book_app_type, "timeslot");
    assert_eq!(wire.slot_duration, Some(30));
    assert_eq!(wire.patient_count, None);
}

#[test]
fn two_slots_are_joined_with_tilde_per_day() {
    let mut draft = WeeklyScheduleDraft::new(september());
    draft.select_weekday(Weekday::Thursday).unwrap();
    draft.set_slot_duration(Some(15));
    fill_slot(&mut draft, ("08", "30"), ("12", "00"));
    fill_slot(&mut draft, ("14", "00"), ("17", "45"));

    assert_eq!(encode(&draft).day_time, "08-30-12-00~14-00-17-45");
}

#[test]
fn serde_uses_backend_field_names() {
    let wire = WeeklyWireFields {
        checked_day: "Monday".to_string(),
        day_time: "09-00-10-00".to_string(),
        book_app_type: "timeslot".to_string(),
        slot_duration: Some(20),
        patient_count: None,
    };

    let json = serde_json::to_value(&wire).unwrap();
    assert_eq!(json["checkedDay"], "Monday");
    assert_eq!(json["dayTime"], "09-00-10-00");
    assert_eq!(json["bookAppType"], "timeslot");
    assert_eq!(json["slotDuration"], 20);
    assert!(json.get("patientCount").is_none());

    let parsed: WeeklyWireFields = serde_json::from_str(
        r#"{"checkedDay":"Friday","dayTime":"15-00-16-00","bookAppType":"sequence","patientCount":4}"#,
    )
    .unwrap();
    assert_eq!(parsed.slot_duration, None);
    assert_eq!(parsed.patient_count, Some(4));
}

#[test]
fn decode_of_encoded_draft_keeps_days_and_slot_times() {
    let mut draft = WeeklyScheduleDraft::new(september());
    for day in [Weekday::Tuesday, Weekday::Saturday] {
        draft.select_weekday(day).unwrap();
    }
    draft.set_slot_duration(Some(45));
    fill_slot(&mut draft, ("07", "15"), ("11", "30"));
    fill_slot(&mut draft, ("13", "00"), ("19", "00"));

    let stored = PersistedWeeklyFields::from_wire(&encode(&draft)).unwrap();
    let decoded = decode(&stored, september());

    assert_eq!(
        decoded.selected_weekdays(),
        &BTreeSet::from([Weekday::Tuesday, Weekday::Saturday])
    );
    let times = decoded
        .slots()
        .iter()
        .map(|slot| slot.endpoints())
        .collect::<Vec<_>>();
    assert_eq!(
        times,
        vec![
            Some((TimeOfDay::new(7, 15).unwrap(), TimeOfDay::new(11, 30).unwrap())),
            Some((TimeOfDay::new(13, 0).unwrap(), TimeOfDay::new(19, 0).unwrap())),
        ]
    );
    assert_eq!(decoded.slot_duration_minutes(), Some(45));
    assert_eq!(decode(&stored, september()), decoded);
}

#[test]
fn morning_only_schedule_decodes_with_trailing_placeholder() {
    let mut draft = WeeklyScheduleDraft::new(september());
    draft.select_weekday(Weekday::Monday).unwrap();
    draft.set_appointment_type(AppointmentType::Sequence);
    fill_slot(&mut draft, ("09", "00"), ("12", "00"));
    draft.set_slot_capacity(0, Some(6)).unwrap();

    let stored = PersistedWeeklyFields::from_wire(&encode(&draft)).unwrap();
    let decoded = decode(&stored, september());

    assert_eq!(decoded.appointment_type(), AppointmentType::Sequence);
    assert_eq!(decoded.slots().len(), 2);
    assert_eq!(decoded.slots()[0].capacity, Some(6));
    assert!(!decoded.slots()[1].is_complete());
}
