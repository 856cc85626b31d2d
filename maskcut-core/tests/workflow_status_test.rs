//! Integration tests for the bounded status broadcast log.

use maskcut_core::models::{MaskingJobState, MaskingStatusEvent};
use maskcut_core::workflow::StatusBroadcaster;
use std::sync::{Arc, Mutex};

fn event(n: usize, state: MaskingJobState) -> MaskingStatusEvent {
    MaskingStatusEvent::new(format!("job-{n}"), state)
}

#[test]
fn test_capacity_is_never_exceeded() {
    let broadcaster = StatusBroadcaster::new(50);
    for i in 0..500 {
        broadcaster.publish(event(i, MaskingJobState::Queued));
        assert!(broadcaster.len() <= 50);
    }

    assert_eq!(broadcaster.len(), 50);
    assert_eq!(broadcaster.eviction_count(), 450);

    // The oldest events are the ones that went.
    let snapshot = broadcaster.snapshot();
    assert_eq!(snapshot.first().unwrap().job_id, "job-450");
    assert_eq!(snapshot.last().unwrap().job_id, "job-499");
}

#[test]
fn test_snapshot_unaffected_by_later_publishes() {
    let broadcaster = StatusBroadcaster::new(8);
    broadcaster.publish(event(0, MaskingJobState::Queued));
    broadcaster.publish(event(0, MaskingJobState::Running));

    let frozen = broadcaster.snapshot();
    for i in 1..20 {
        broadcaster.publish(event(i, MaskingJobState::Queued));
    }

    assert_eq!(frozen.len(), 2);
    assert_eq!(frozen[0].state, MaskingJobState::Queued);
    assert_eq!(frozen[1].state, MaskingJobState::Running);
}

#[test]
fn test_all_listeners_see_event_n_before_any_sees_n_plus_one() {
    let broadcaster = StatusBroadcaster::new(16);

    // A shared interleaving log: entries are (listener, event) pairs in
    // delivery order.
    let log: Arc<Mutex<Vec<(usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
    for listener in 0..3 {
        let log = log.clone();
        broadcaster.on_status(move |event| {
            log.lock().unwrap().push((listener, event.job_id.clone()));
        });
    }

    for i in 0..4 {
        broadcaster.publish(event(i, MaskingJobState::Queued));
    }

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 12);
    for (chunk_index, chunk) in log.chunks(3).enumerate() {
        let expected_job = format!("job-{chunk_index}");
        assert_eq!(
            chunk.iter().map(|(l, _)| *l).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(chunk.iter().all(|(_, job)| *job == expected_job));
    }
}

#[test]
fn test_snapshots_stay_ordered_under_concurrent_publishing() {
    let broadcaster = Arc::new(StatusBroadcaster::new(64));

    let publisher = {
        let broadcaster = broadcaster.clone();
        std::thread::spawn(move || {
            for i in 0..5000 {
                broadcaster.publish(event(i, MaskingJobState::Queued));
            }
        })
    };

    // Poll snapshots while the publisher runs; every snapshot must be a
    // contiguous ascending window of the publish sequence.
    let ascending_window = |snapshot: &[MaskingStatusEvent]| {
        let numbers: Vec<usize> = snapshot
            .iter()
            .map(|e| e.job_id.strip_prefix("job-").unwrap().parse().unwrap())
            .collect();
        numbers.windows(2).all(|pair| pair[0] + 1 == pair[1])
    };

    while !publisher.is_finished() {
        assert!(ascending_window(&broadcaster.snapshot()));
    }
    publisher.join().unwrap();

    let final_snapshot = broadcaster.snapshot();
    assert_eq!(final_snapshot.len(), 64);
    assert!(ascending_window(&final_snapshot));
    assert_eq!(final_snapshot.last().unwrap().job_id, "job-4999");
}

#[test]
fn test_snapshot_events_serialize_on_the_status_wire() {
    let broadcaster = StatusBroadcaster::new(4);
    let mut failed = event(1, MaskingJobState::Failed);
    failed.error_code = Some("E_CANCELLED".to_string());
    failed.message = Some("Job was cancelled before execution.".to_string());
    broadcaster.publish(failed);

    let snapshot = broadcaster.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"state\":\"failed\""));
    assert!(json.contains("\"errorCode\":\"E_CANCELLED\""));
}
