mod common;

use chrono::{TimeZone, Utc};
use common::*;
use std::sync::Arc;
use studiosync::components::google_calendar::models::{APPOINTMENT_ID_KEY, SYNC_MARKER_KEY};
use studiosync::components::sync::{
    AppointmentId, ItemStatus, Reconciler, SyncAction, SyncPhase,
};
use studiosync::components::{Priority, RemoteEvent};
use studiosync::config::SyncSettings;
use studiosync::error::Error;

const STUDIO_A_ID: &str = "7da30d9af6d5d3580baa964404c1ce3e";

struct Harness {
    backend: Arc<RecordingBackend>,
    notifier: Arc<RecordingNotifier>,
    reconciler: Reconciler,
}

fn harness_with(
    source: StaticSource,
    backend: RecordingBackend,
    notifier: RecordingNotifier,
    settings: &SyncSettings,
) -> Harness {
    let backend = Arc::new(backend);
    let notifier = Arc::new(notifier);
    let reconciler = Reconciler::new(
        Arc::new(source),
        backend.clone(),
        notifier.clone(),
        settings,
    )
    .unwrap();
    Harness {
        backend,
        notifier,
        reconciler,
    }
}

fn harness(appointments: Vec<studiosync::components::RawAppointment>, events: Vec<RemoteEvent>) -> Harness {
    harness_with(
        StaticSource::new(appointments),
        RecordingBackend::with_events(events),
        RecordingNotifier::default(),
        &test_settings(),
    )
}

fn studio_a() -> studiosync::components::RawAppointment {
    raw("12.06.2024", "09:00", "11:00", "Studio A", "X", "")
}

fn studio_a_event(event_id: &str) -> RemoteEvent {
    synced_event(
        event_id,
        STUDIO_A_ID,
        "Studio A",
        "2024-06-12T09:00:00+02:00",
        "2024-06-12T11:00:00+02:00",
        "X",
        "",
    )
}

#[tokio::test]
async fn test_new_appointment_is_created_with_metadata() {
    let h = harness(vec![studio_a()], vec![]);

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    let calls = h.backend.calls();
    assert_eq!(calls.len(), 1);
    let CalendarCall::Create(draft) = &calls[0] else {
        panic!("expected a create, got {:?}", calls[0]);
    };
    assert_eq!(draft.summary, "Studio A");
    assert_eq!(draft.location, "X");
    assert_eq!(draft.description, "");
    assert_eq!(draft.start, berlin("2024-06-12T09:00:00+02:00"));
    assert_eq!(draft.end, berlin("2024-06-12T11:00:00+02:00"));
    assert_eq!(draft.time_zone, "Europe/Berlin");
    assert_eq!(draft.private_metadata[APPOINTMENT_ID_KEY], STUDIO_A_ID);
    assert_eq!(draft.private_metadata[SYNC_MARKER_KEY], "true");

    assert_eq!(report.phase, SyncPhase::Done);
    assert_eq!(report.created(), 1);
    assert_eq!(report.outcomes[0].event_id.as_deref(), Some("created-1"));

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "New booking");
    assert_eq!(sent[0].body, "Studio A\n12.06.2024, 09:00 - 11:00\nX");
    assert_eq!(sent[0].priority, Priority::NORMAL);
}

#[tokio::test]
async fn test_identical_event_needs_no_calls() {
    let h = harness(vec![studio_a()], vec![studio_a_event("evt-1")]);

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert!(h.backend.calls().is_empty());
    assert!(h.notifier.sent().is_empty());
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.mutations(), 0);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let h = harness(
        vec![
            studio_a(),
            raw("13.06.2024", "14:00", "18:00", "Studio B", "Y", "Regie: Max"),
        ],
        vec![],
    );

    let first = h.reconciler.run_at(test_now()).await.unwrap();
    assert_eq!(first.created(), 2);

    h.backend.clear_calls();
    let second = h.reconciler.run_at(test_now()).await.unwrap();

    assert!(h.backend.calls().is_empty());
    assert_eq!(second.mutations(), 0);
    assert_eq!(second.unchanged, 2);
    assert_eq!(h.notifier.sent().len(), 2);
}

#[tokio::test]
async fn test_vanished_appointment_is_deleted_and_reported() {
    let cancelled = synced_event(
        "evt-9",
        "0123456789abcdef0123456789abcdef",
        "Studio C",
        "2024-06-20T10:00:00+02:00",
        "2024-06-20T12:30:00+02:00",
        "Hauptstr. 1",
        "",
    );
    let h = harness(vec![], vec![cancelled]);

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert_eq!(h.backend.calls(), vec![CalendarCall::Delete("evt-9".to_string())]);
    assert_eq!(report.deleted(), 1);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Booking cancelled");
    assert_eq!(sent[0].body, "Studio C\n20.06.2024, 10:00 - 12:30\nHauptstr. 1");
}

#[tokio::test]
async fn test_malformed_record_is_skipped() {
    let h = harness(
        vec![
            raw("2024-06-12", "09:00", "11:00", "Broken", "X", ""),
            raw("12.06.2024", "nine", "11:00", "Broken", "X", ""),
            studio_a(),
        ],
        vec![],
    );

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert_eq!(report.skipped, 2);
    assert_eq!(report.created(), 1);
    assert_eq!(h.backend.calls().len(), 1);
}

#[tokio::test]
async fn test_unmarked_events_are_never_touched() {
    let mut personal = studio_a_event("personal");
    personal.private_metadata.clear();
    let mut other_tool = studio_a_event("other");
    other_tool
        .private_metadata
        .insert(SYNC_MARKER_KEY.to_string(), "false".to_string());

    let h = harness(vec![], vec![personal, other_tool]);

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert!(h.backend.calls().is_empty());
    assert_eq!(report.mutations(), 0);
}

#[tokio::test]
async fn test_past_synced_events_are_kept() {
    let past = synced_event(
        "old",
        "ffffffffffffffffffffffffffffffff",
        "Studio Z",
        "2024-05-30T09:00:00+02:00",
        "2024-05-30T11:00:00+02:00",
        "",
        "",
    );
    let h = harness(vec![], vec![past]);

    h.reconciler.run_at(test_now()).await.unwrap();

    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn test_changed_address_updates_event() {
    let mut stale = studio_a_event("evt-1");
    stale.location = "Old street".to_string();
    let h = harness(vec![studio_a()], vec![stale]);

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    let calls = h.backend.calls();
    assert_eq!(calls.len(), 1);
    let CalendarCall::Update(event_id, draft) = &calls[0] else {
        panic!("expected an update, got {:?}", calls[0]);
    };
    assert_eq!(event_id, "evt-1");
    assert_eq!(draft.location, "X");
    assert_eq!(draft.private_metadata[APPOINTMENT_ID_KEY], STUDIO_A_ID);
    assert_eq!(report.updated(), 1);
    assert_eq!(h.notifier.sent()[0].title, "Booking changed");
}

#[tokio::test]
async fn test_moved_time_updates_event() {
    let h = harness(
        vec![raw("12.06.2024", "10:00", "12:00", "Studio A", "X", "")],
        vec![studio_a_event("evt-1")],
    );

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert_eq!(report.updated(), 1);
    assert_eq!(report.created(), 0);
    assert_eq!(report.deleted(), 0);
}

#[tokio::test]
async fn test_equivalent_offset_is_unchanged() {
    let mut utc_event = studio_a_event("evt-1");
    utc_event.start = Some(berlin("2024-06-12T07:00:00Z"));
    utc_event.end = Some(berlin("2024-06-12T07:00:00-02:00"));
    let h = harness(vec![studio_a()], vec![utc_event]);

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert_eq!(report.unchanged, 1);
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn test_failed_item_does_not_stop_the_run() {
    let backend = RecordingBackend::with_events(vec![synced_event(
        "gone",
        "0123456789abcdef0123456789abcdef",
        "Studio C",
        "2024-06-20T10:00:00+02:00",
        "2024-06-20T12:00:00+02:00",
        "",
        "",
    )]);
    backend.fail_create_for("Studio A");
    let h = harness_with(
        StaticSource::new(vec![
            studio_a(),
            raw("13.06.2024", "14:00", "18:00", "Studio B", "Y", ""),
        ]),
        backend,
        RecordingNotifier::default(),
        &test_settings(),
    );

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert_eq!(h.backend.calls().len(), 3);
    assert_eq!(report.created(), 1);
    assert_eq!(report.deleted(), 1);

    let failed = report.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].action, SyncAction::Create);
    assert_eq!(failed[0].appointment_id.as_str(), STUDIO_A_ID);
    assert!(matches!(failed[0].status, ItemStatus::Failed(_)));

    // No notification for the failed create
    assert_eq!(h.notifier.sent().len(), 2);
}

#[tokio::test]
async fn test_missing_remote_event_is_a_per_item_failure() {
    let backend = RecordingBackend::with_events(vec![studio_a_event("evt-1")]);
    backend.fail_event("evt-1");
    let h = harness_with(
        StaticSource::new(vec![raw("12.06.2024", "09:00", "11:30", "Studio A", "X", "")]),
        backend,
        RecordingNotifier::default(),
        &test_settings(),
    );

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert_eq!(report.phase, SyncPhase::Done);
    assert_eq!(report.failed().len(), 1);
    assert_eq!(report.failed()[0].event_id.as_deref(), Some("evt-1"));
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_rejected_login_aborts_the_run() {
    let h = harness_with(
        StaticSource::rejecting_login(),
        RecordingBackend::with_events(vec![studio_a_event("evt-1")]),
        RecordingNotifier::default(),
        &test_settings(),
    );

    let err = h.reconciler.run_at(test_now()).await.unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    assert!(h.backend.queries().is_empty());
    assert!(h.backend.calls().is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_listing_failure_aborts_without_deleting() {
    let h = harness_with(
        StaticSource::new(vec![studio_a()]),
        RecordingBackend::failing_listing(),
        RecordingNotifier::default(),
        &test_settings(),
    );

    let err = h.reconciler.run_at(test_now()).await.unwrap_err();

    assert!(matches!(err, Error::Calendar(_)));
    assert!(h.backend.calls().is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_listing_asks_for_synced_future_events() {
    let h = harness(vec![], vec![]);

    h.reconciler.run_at(test_now()).await.unwrap();

    let queries = h.backend.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].time_min, test_now());
    assert_eq!(
        queries[0].private_filter,
        Some((SYNC_MARKER_KEY.to_string(), "true".to_string()))
    );
}

#[tokio::test]
async fn test_dry_run_makes_no_calls() {
    let settings = SyncSettings {
        dry_run: true,
        ..test_settings()
    };
    let mut stale = studio_a_event("evt-1");
    stale.description = "Regie: Old".to_string();
    let h = harness_with(
        StaticSource::new(vec![
            studio_a(),
            raw("13.06.2024", "14:00", "18:00", "Studio B", "Y", ""),
        ]),
        RecordingBackend::with_events(vec![stale]),
        RecordingNotifier::default(),
        &settings,
    );

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert!(h.reconciler.is_dry_run());
    assert!(h.backend.calls().is_empty());
    assert!(h.notifier.sent().is_empty());
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes.iter().all(|o| o.status == ItemStatus::DryRun));
    assert_eq!(report.mutations(), 0);
    assert!(report.to_string().ends_with("dry run 2"));
}

#[tokio::test]
async fn test_duplicate_events_are_removed_silently() {
    let h = harness(
        vec![studio_a()],
        vec![studio_a_event("evt-1"), studio_a_event("evt-2")],
    );

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert_eq!(h.backend.calls(), vec![CalendarCall::Delete("evt-2".to_string())]);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.outcomes[0].action, SyncAction::RemoveDuplicate);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_double_booking_gets_two_events() {
    let h = harness(
        vec![
            raw("12.06.2024", "09:00", "11:00", "Studio A", "X", "Regie: Max"),
            raw("12.06.2024", "14:00", "16:00", "Studio A", "X", "Regie: Max"),
        ],
        vec![],
    );

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert_eq!(report.created(), 2);
    let ids: Vec<AppointmentId> = report
        .outcomes
        .iter()
        .map(|o| o.appointment_id.clone())
        .collect();
    assert_eq!(ids[0].as_str(), "1be0e7681fbca15ab71482f009bd8992");
    assert_eq!(ids[1].as_str(), "bf63667e8977eaaa1c3bb11e5060423b");
}

#[tokio::test]
async fn test_started_double_booking_keeps_ids() {
    let h = harness(
        vec![
            raw("12.06.2024", "09:00", "11:00", "Studio A", "X", "Regie: Max"),
            raw("12.06.2024", "14:00", "16:00", "Studio A", "X", "Regie: Max"),
        ],
        vec![],
    );
    let first = h.reconciler.run_at(test_now()).await.unwrap();
    assert_eq!(first.created(), 2);

    // Noon in Berlin: the morning session has started, the afternoon one has not
    h.backend.clear_calls();
    let midday = Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap();
    let second = h.reconciler.run_at(midday).await.unwrap();

    assert!(h.backend.calls().is_empty());
    assert_eq!(second.mutations(), 0);
    assert_eq!(second.unchanged, 1);
    assert_eq!(h.notifier.sent().len(), 2);
}

#[tokio::test]
async fn test_truncated_scrape_keeps_later_events() {
    let earlier = synced_event(
        "evt-earlier",
        "eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
        "Studio C",
        "2024-06-11T09:00:00+02:00",
        "2024-06-11T10:00:00+02:00",
        "",
        "",
    );
    let later = synced_event(
        "evt-later",
        "ffffffffffffffffffffffffffffffff",
        "Studio D",
        "2024-06-20T09:00:00+02:00",
        "2024-06-20T10:00:00+02:00",
        "",
        "",
    );
    let h = harness_with(
        StaticSource::truncated(vec![studio_a()]),
        RecordingBackend::with_events(vec![studio_a_event("evt-1"), earlier, later]),
        RecordingNotifier::default(),
        &test_settings(),
    );

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert_eq!(
        h.backend.calls(),
        vec![CalendarCall::Delete("evt-earlier".to_string())]
    );
    assert_eq!(report.deleted(), 1);
    assert_eq!(report.unchanged, 1);
    assert!(h.backend.events().iter().any(|e| e.id == "evt-later"));
}

#[tokio::test]
async fn test_truncated_scrape_without_upcoming_deletes_nothing() {
    let h = harness_with(
        StaticSource::truncated(vec![raw("01.05.2024", "09:00", "10:00", "Studio A", "X", "")]),
        RecordingBackend::with_events(vec![studio_a_event("evt-1")]),
        RecordingNotifier::default(),
        &test_settings(),
    );

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert!(h.backend.calls().is_empty());
    assert_eq!(report.mutations(), 0);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_notification_failure_keeps_the_mutation() {
    let h = harness_with(
        StaticSource::new(vec![studio_a()]),
        RecordingBackend::default(),
        RecordingNotifier::failing(),
        &test_settings(),
    );

    let report = h.reconciler.run_at(test_now()).await.unwrap();

    assert_eq!(report.created(), 1);
    assert_eq!(report.notification_failures(), 1);
    assert!(report.failed().is_empty());
    assert_eq!(h.backend.events().len(), 1);
}

#[tokio::test]
async fn test_configured_priority_and_locale_are_used() {
    let settings = SyncSettings {
        notification_priority: 1,
        notification_locale: "de".to_string(),
        ..SyncSettings::default()
    };
    let h = harness_with(
        StaticSource::new(vec![studio_a()]),
        RecordingBackend::default(),
        RecordingNotifier::default(),
        &settings,
    );

    h.reconciler.run_at(test_now()).await.unwrap();

    let sent = h.notifier.sent();
    assert_eq!(sent[0].priority, Priority::new(1));
    assert_eq!(sent[0].title, "Neuer Termin");
    assert_eq!(sent[0].body, "Studio A\n12.06.2024, 09:00 - 11:00 Uhr\nX");
}

#[tokio::test]
async fn test_overnight_appointment_ends_next_day() {
    let h = harness(
        vec![raw("12.06.2024", "22:00", "01:00", "Night Studio", "Z", "")],
        vec![],
    );

    h.reconciler.run_at(test_now()).await.unwrap();

    let calls = h.backend.calls();
    let CalendarCall::Create(draft) = &calls[0] else {
        panic!("expected a create");
    };
    assert_eq!(draft.start, berlin("2024-06-12T22:00:00+02:00"));
    assert_eq!(draft.end, berlin("2024-06-13T01:00:00+02:00"));
}

#[test]
fn test_unknown_timezone_is_rejected() {
    let settings = SyncSettings {
        timezone: "Mars/Olympus".to_string(),
        ..SyncSettings::default()
    };
    let result = Reconciler::new(
        Arc::new(StaticSource::new(vec![])),
        Arc::new(RecordingBackend::default()),
        Arc::new(RecordingNotifier::default()),
        &settings,
    );
    assert!(matches!(result, Err(Error::Config(_))));
}
