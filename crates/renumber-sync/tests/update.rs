mod common;

use common::{person, FakePeople, RecordingPause};
use renumber_core::{parse_mappings, MappingColumns, MappingFile};
use renumber_sync::people::{PersonName, PhoneNumber};
use renumber_sync::{RetryPolicy, UpdateEvent, UpdateOptions, UpdateReport, Updater};
use std::time::Duration;

fn mappings(csv: &str) -> MappingFile {
    parse_mappings(csv.as_bytes(), &MappingColumns::default()).expect("mappings")
}

fn run(
    api: &mut FakePeople,
    pause: &mut RecordingPause,
    options: UpdateOptions,
    csv: &str,
) -> (UpdateReport, Vec<UpdateEvent>) {
    let mut events = Vec::new();
    let report = Updater::new(api, pause, RetryPolicy::default(), options)
        .run(&mappings(csv), &mut |event| events.push(event.clone()));
    (report, events)
}

#[test]
fn updates_matching_contact_with_fetched_etag() {
    let mut api = FakePeople::default()
        .with_contact("9876543210", person("people/c1", "etag-1", &["9876543210"]));
    let mut pause = RecordingPause::default();

    let (report, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\n9876543210,9123456789\n",
    );

    assert_eq!(api.updates.len(), 1);
    let (resource_name, fields, body) = &api.updates[0];
    assert_eq!(resource_name, "people/c1");
    assert_eq!(fields, "phoneNumbers");
    assert_eq!(body.etag, "etag-1");
    assert_eq!(body.phone_numbers, vec![PhoneNumber::mobile("9123456789")]);

    assert_eq!(report.updated, 1);
    assert_eq!(
        events,
        vec![UpdateEvent::Updated {
            old: "9876543210".to_string(),
            new: "9123456789".to_string(),
            resource_name: "people/c1".to_string(),
            display_name: None,
            updated_count: 1,
        }]
    );
    assert_eq!(pause.delays, vec![Duration::from_secs(2)]);
}

#[test]
fn skips_contact_that_lacks_the_old_number() {
    let mut api = FakePeople::default()
        .with_contact("9876543210", person("people/c1", "etag-1", &["1112223333"]));
    let mut pause = RecordingPause::default();

    let (report, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\n9876543210,9123456789\n",
    );

    assert!(api.updates.is_empty());
    assert_eq!(report.updated, 0);
    assert_eq!(report.mismatched, 1);
    assert!(matches!(events[0], UpdateEvent::Mismatched { .. }));
    assert!(pause.delays.is_empty());
}

#[test]
fn formatted_numbers_on_both_sides_are_normalized() {
    let mut api = FakePeople::default()
        .with_contact("98765 43210", person("people/c4", "etag-4", &["+91 98765-43210", "080 1234"]));
    let mut pause = RecordingPause::default();

    let (report, _) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\n+91-98765-43210,+91 91234 56789\n",
    );

    assert_eq!(report.updated, 1);
    let (_, _, body) = &api.updates[0];
    assert_eq!(body.phone_numbers, vec![PhoneNumber::mobile("9123456789")]);
    assert_eq!(api.people["people/c4"].phone_numbers.len(), 1);
}

#[test]
fn missing_contacts_are_reported_and_the_batch_continues() {
    let mut api = FakePeople::default()
        .with_contact("1112223333", person("people/c2", "etag-2", &["111-222-3333"]));
    let mut pause = RecordingPause::default();

    let (report, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\n9876543210,9123456789\n,5556667777\n1112223333,4445556666\n",
    );

    assert_eq!(report.rows, 3);
    assert_eq!(report.skipped_rows, 1);
    assert_eq!(report.not_found, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(
        events[0],
        UpdateEvent::NotFound {
            old: "9876543210".to_string()
        }
    );
    assert!(matches!(
        &events[1],
        UpdateEvent::Updated { updated_count: 1, .. }
    ));
}

#[test]
fn row_failure_is_contained() {
    let mut api = FakePeople::default()
        .with_contact("9876543210", person("people/c1", "etag-1", &["9876543210"]))
        .with_contact("1112223333", person("people/c2", "etag-2", &["1112223333"]));
    api.get_statuses.insert("people/c1".to_string(), 403);
    let mut pause = RecordingPause::default();

    let (report, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\n9876543210,9123456789\n1112223333,4445556666\n",
    );

    assert_eq!(report.failed_rows, 1);
    assert_eq!(report.updated, 1);
    match &events[0] {
        UpdateEvent::RowFailed { old, line, error } => {
            assert_eq!(old, "9876543210");
            assert_eq!(*line, 1);
            assert!(error.contains("403"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(api.updates.len(), 1);
}

#[test]
fn rate_limit_exhaustion_on_get_fails_only_that_row() {
    let mut api = FakePeople::default()
        .with_contact("9876543210", person("people/c1", "etag-1", &["9876543210"]));
    api.get_statuses.insert("people/c1".to_string(), 429);
    let mut pause = RecordingPause::default();

    let (report, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\n9876543210,9123456789\n",
    );

    assert_eq!(report.failed_rows, 1);
    assert_eq!(api.gets.len(), 5);
    assert_eq!(
        pause.delays,
        [2, 4, 8, 16, 30].map(Duration::from_secs).to_vec()
    );
    assert!(matches!(
        &events[0],
        UpdateEvent::RowFailed { error, .. } if error.contains("rate limiting")
    ));
}

#[test]
fn rate_limit_exhaustion_on_update_call_fails_only_that_row() {
    let mut api = FakePeople::default()
        .with_contact("9876543210", person("people/c1", "etag-1", &["9876543210"]))
        .with_contact("9000000001", person("people/c2", "etag-2", &["9000000001"]));
    api.update_statuses.insert("people/c1".to_string(), 429);
    let mut pause = RecordingPause::default();

    let (report, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\n9876543210,9123456789\n9000000001,9000000002\n",
    );

    let first_row_updates = api
        .updates
        .iter()
        .filter(|(resource_name, _, _)| resource_name == "people/c1")
        .count();
    assert_eq!(first_row_updates, 5);
    assert_eq!(api.gets.iter().filter(|rn| *rn == "people/c1").count(), 1);
    assert_eq!(report.failed_rows, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(
        pause.delays,
        [2, 4, 8, 16, 30, 2].map(Duration::from_secs).to_vec()
    );
    assert!(matches!(
        &events[0],
        UpdateEvent::RowFailed { error, line: 1, .. } if error.contains("rate limiting")
    ));
    assert!(matches!(
        &events[1],
        UpdateEvent::Updated { resource_name, .. } if resource_name == "people/c2"
    ));
}

#[test]
fn stale_etag_is_rejected_remotely_and_reported() {
    let mut api = FakePeople::default()
        .with_contact("9876543210", person("people/c1", "etag-1", &["9876543210"]));
    api.edited_after_get.insert("people/c1".to_string());
    let mut pause = RecordingPause::default();

    let (report, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\n9876543210,9123456789\n",
    );

    assert_eq!(api.updates.len(), 1);
    assert_eq!(api.updates[0].2.etag, "etag-1");
    assert_eq!(report.updated, 0);
    assert_eq!(report.failed_rows, 1);
    assert!(matches!(
        &events[0],
        UpdateEvent::RowFailed { error, .. } if error.contains("etag mismatch")
    ));
    assert_eq!(api.people["people/c1"].phone_numbers[0].value, "9876543210");
}

#[test]
fn dry_run_verifies_without_writing() {
    let mut api = FakePeople::default()
        .with_contact("9876543210", person("people/c1", "etag-1", &["9876543210"]));
    let mut pause = RecordingPause::default();

    let (report, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions {
            dry_run: true,
            ..UpdateOptions::default()
        },
        "Old Mobile No.,New Mobile No.\n9876543210,9123456789\n",
    );

    assert!(api.updates.is_empty());
    assert!(report.dry_run);
    assert_eq!(report.would_update, 1);
    assert_eq!(report.updated, 0);
    assert!(matches!(events[0], UpdateEvent::WouldUpdate { .. }));
    assert!(pause.delays.is_empty());
}

#[test]
fn old_number_without_digits_is_not_found() {
    let mut api = FakePeople::default();
    let mut pause = RecordingPause::default();

    let (report, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\nunknown,9123456789\n",
    );

    assert_eq!(report.not_found, 1);
    assert_eq!(report.failed_rows, 0);
    assert!(api.searches.is_empty());
    assert_eq!(
        events,
        vec![UpdateEvent::NotFound {
            old: "unknown".to_string()
        }]
    );
}

#[test]
fn new_number_without_digits_fails_the_row() {
    let mut api = FakePeople::default()
        .with_contact("9876543210", person("people/c1", "etag-1", &["9876543210"]));
    let mut pause = RecordingPause::default();

    let (report, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\n9876543210,n/a\n",
    );

    assert_eq!(report.failed_rows, 1);
    assert!(api.searches.is_empty());
    assert!(api.updates.is_empty());
    assert!(matches!(
        &events[0],
        UpdateEvent::RowFailed { old, error, .. }
            if old == "9876543210" && error.contains("no digits")
    ));
}

#[test]
fn events_carry_the_contact_display_name() {
    let mut named = person("people/c1", "etag-1", &["9123456780"]);
    named.names = vec![PersonName {
        display_name: Some("Ada Lovelace".to_string()),
    }];
    let mut api = FakePeople::default().with_contact("9876543210", named);
    let mut pause = RecordingPause::default();

    let (_, events) = run(
        &mut api,
        &mut pause,
        UpdateOptions::default(),
        "Old Mobile No.,New Mobile No.\n9876543210,9123456789\n",
    );

    assert_eq!(
        events,
        vec![UpdateEvent::Mismatched {
            old: "9876543210".to_string(),
            resource_name: "people/c1".to_string(),
            display_name: Some("Ada Lovelace".to_string()),
        }]
    );
}
