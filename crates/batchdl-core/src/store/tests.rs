use super::*;
use crate::job::JobStatus;
use tokio_util::sync::CancellationToken;

fn ids(store: &JobStore) -> Vec<JobId> {
    store.jobs().iter().map(|j| j.id).collect()
}

#[test]
fn add_filters_blank_comment_and_invalid_lines() {
    let mut store = JobStore::new();
    let added = store.add([
        "",
        "   ",
        "# favourites",
        "not a url",
        "https://www.youtube.com/watch?v=a",
        "  https://www.youtube.com/watch?v=b  ",
    ]);
    assert_eq!(added, 2);
    let urls: Vec<&str> = store.jobs().iter().map(|j| j.url.as_str()).collect();
    assert_eq!(
        urls,
        ["https://www.youtube.com/watch?v=a", "https://www.youtube.com/watch?v=b"]
    );
    assert!(store.jobs().iter().all(|j| j.status == JobStatus::Pending));
}

#[test]
fn add_is_idempotent() {
    let mut store = JobStore::new();
    let lines = ["https://example.com/1", "https://example.com/2"];
    assert_eq!(store.add(lines), 2);
    assert_eq!(store.add(lines), 0);
    assert_eq!(store.len(), 2);
}

#[test]
fn add_dedups_within_one_call_and_across_statuses() {
    let mut store = JobStore::new();
    assert_eq!(
        store.add(["https://example.com/1", "https://example.com/1"]),
        1
    );
    let id = ids(&store)[0];
    store.patch(id, &JobPatch::completed());
    assert_eq!(store.add(["https://example.com/1"]), 0);
    assert_eq!(store.len(), 1);
}

#[test]
fn urls_stay_unique_over_many_adds() {
    let mut store = JobStore::new();
    for round in 0..5 {
        let lines: Vec<String> = (0..10)
            .map(|i| format!("https://example.com/{}", (i + round * 3) % 12))
            .collect();
        store.add(&lines);
    }
    let mut urls: Vec<&str> = store.jobs().iter().map(|j| j.url.as_str()).collect();
    let total = urls.len();
    urls.sort_unstable();
    urls.dedup();
    assert_eq!(urls.len(), total);
    assert_eq!(total, 12);
}

#[test]
fn ids_are_never_reused() {
    let mut store = JobStore::new();
    store.add(["https://example.com/1"]);
    let first = ids(&store)[0];
    store.remove(first);
    store.add(["https://example.com/1"]);
    let second = ids(&store)[0];
    assert_ne!(first, second);
    store.clear_all();
    store.add(["https://example.com/1"]);
    assert!(ids(&store)[0] > second);
}

#[test]
fn remove_is_idempotent() {
    let mut store = JobStore::new();
    store.add(["https://example.com/1", "https://example.com/2"]);
    let id = ids(&store)[0];
    assert!(store.remove(id));
    assert!(!store.remove(id));
    assert!(!store.remove(JobId::from(999)));
    assert_eq!(store.len(), 1);
}

#[test]
fn clear_completed_keeps_other_statuses() {
    let mut store = JobStore::new();
    store.add([
        "https://example.com/1",
        "https://example.com/2",
        "https://example.com/3",
    ]);
    let ids = ids(&store);
    store.patch(ids[0], &JobPatch::completed());
    store.patch(ids[1], &JobPatch::failed("boom"));
    assert_eq!(store.clear_completed(), 1);
    let left: Vec<JobId> = store.jobs().iter().map(|j| j.id).collect();
    assert_eq!(left, vec![ids[1], ids[2]]);
}

#[test]
fn clear_all_drops_jobs_and_summary() {
    let mut store = JobStore::new();
    store.add(["https://example.com/list?list=PL1"]);
    let id = ids(&store)[0];
    assert!(store.claim(id));
    store.apply_progress(&ProgressEvent::downloading(id, 5.0, "", "").with_playlist(1, 3));
    assert!(store.playlist_summary().is_some());
    store.clear_all();
    assert!(store.is_empty());
    assert!(store.playlist_summary().is_none());
}

#[test]
fn patch_unknown_id_is_noop() {
    let mut store = JobStore::new();
    store.add(["https://example.com/1"]);
    assert!(!store.patch(JobId::from(42), &JobPatch::completed()));
    assert_eq!(store.jobs()[0].status, JobStatus::Pending);
}

#[test]
fn progress_for_removed_job_is_dropped() {
    let mut store = JobStore::new();
    store.add(["https://example.com/1", "https://example.com/2"]);
    let id = ids(&store)[0];
    store.remove(id);
    let applied = store.apply_progress(
        &ProgressEvent::downloading(id, 50.0, "1MiB/s", "00:01").with_playlist(1, 2),
    );
    assert!(!applied);
    assert_eq!(store.len(), 1);
    assert!(store.get(id).is_none());
    assert!(store.playlist_summary().is_none());
}

#[test]
fn progress_updates_title_and_playlist_summary() {
    let mut store = JobStore::new();
    store.add(["https://www.youtube.com/playlist?list=PL9"]);
    let id = ids(&store)[0];
    store.claim(id);
    store.apply_progress(
        &ProgressEvent::downloading(id, 12.5, "3MiB/s", "00:20")
            .with_title("Track 4")
            .with_playlist(4, 10),
    );
    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Downloading);
    assert_eq!(job.title, "Track 4");
    assert_eq!(job.progress, 12.5);
    assert_eq!(job.speed, "3MiB/s");
    assert_eq!((job.playlist_index, job.playlist_total), (Some(4), Some(10)));
    let summary = store.playlist_summary().unwrap();
    assert_eq!((summary.index, summary.total), (4, 10));
    assert_eq!(summary.title, "Track 4");

    // A later event without a title keeps the reported one.
    store.apply_progress(&ProgressEvent::downloading(id, 20.0, "", ""));
    assert_eq!(store.get(id).unwrap().title, "Track 4");
}

#[test]
fn finished_progress_does_not_clobber_completion() {
    let mut store = JobStore::new();
    store.add(["https://example.com/1"]);
    let id = ids(&store)[0];
    store.patch(id, &JobPatch::completed());
    store.apply_progress(&ProgressEvent::downloading(id, 30.0, "", ""));
    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100.0);
}

#[test]
fn error_progress_can_be_overwritten_by_worker_result() {
    let mut store = JobStore::new();
    store.add(["https://example.com/1"]);
    let id = ids(&store)[0];
    store.claim(id);
    store.apply_progress(&ProgressEvent::failed(id, "engine said no"));
    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error.as_deref(), Some("engine said no"));
    store.patch(id, &JobPatch::completed());
    assert_eq!(store.get(id).unwrap().status, JobStatus::Completed);
}

#[test]
fn late_downloading_event_does_not_reopen_failed_job() {
    let mut store = JobStore::new();
    store.add(["https://example.com/1"]);
    let id = ids(&store)[0];
    assert!(store.claim(id));
    store.patch(id, &JobPatch::failed("network error"));

    let applied = store.apply_progress(&ProgressEvent::downloading(id, 40.0, "1MiB/s", "00:03"));
    assert!(!applied);
    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error.as_deref(), Some("network error"));
    assert_eq!(job.progress, 0.0);
    assert!(job.status.is_eligible());
}

#[test]
fn downloading_event_for_queued_job_is_dropped() {
    let mut store = JobStore::new();
    store.add(["https://www.youtube.com/playlist?list=PL2"]);
    let id = ids(&store)[0];
    let applied =
        store.apply_progress(&ProgressEvent::downloading(id, 10.0, "", "").with_playlist(1, 4));
    assert!(!applied);
    assert_eq!(store.get(id).unwrap().status, JobStatus::Pending);
    assert!(store.playlist_summary().is_none());
}

#[test]
fn claim_takes_pending_jobs_once() {
    let mut store = JobStore::new();
    store.add(["https://example.com/1", "https://example.com/2"]);
    let ids = ids(&store);
    assert!(store.claim(ids[0]));
    assert!(!store.claim(ids[0]));
    assert_eq!(store.get(ids[0]).unwrap().status, JobStatus::Downloading);

    store.patch(ids[1], &JobPatch::failed("boom"));
    assert!(!store.claim(ids[1]));
    assert!(!store.claim(JobId::from(99)));
}

#[test]
fn begin_batch_resets_failed_and_skips_completed() {
    let mut store = JobStore::new();
    store.add([
        "https://example.com/a",
        "https://example.com/b",
        "https://example.com/c",
    ]);
    let ids = ids(&store);
    store.patch(ids[0], &JobPatch::completed());
    store.patch(
        ids[1],
        &JobPatch {
            progress: Some(60.0),
            playlist_index: Some(1),
            playlist_total: Some(2),
            ..JobPatch::failed("network error")
        },
    );

    let queued = store.begin_batch();
    let queued_ids: Vec<JobId> = queued.iter().map(|q| q.id).collect();
    assert_eq!(queued_ids, vec![ids[1], ids[2]]);

    let a = store.get(ids[0]).unwrap();
    assert_eq!(a.status, JobStatus::Completed);
    assert_eq!(a.progress, 100.0);

    let b = store.get(ids[1]).unwrap();
    assert_eq!(b.status, JobStatus::Pending);
    assert_eq!(b.progress, 0.0);
    assert!(b.error.is_none());
    assert!(b.playlist_index.is_none() && b.playlist_total.is_none());
}

#[test]
fn begin_batch_skips_in_flight_jobs() {
    let mut store = JobStore::new();
    store.add(["https://example.com/a", "https://example.com/b"]);
    let ids = ids(&store);
    store.patch(ids[0], &JobPatch::started());
    assert_eq!(store.eligible_count(), 1);
    let queued = store.begin_batch();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].id, ids[1]);
    assert_eq!(store.get(ids[0]).unwrap().status, JobStatus::Downloading);
}

#[tokio::test]
async fn handle_round_trip() {
    let handle = StoreHandle::spawn();
    let added = handle
        .add(vec!["https://example.com/1", "https://example.com/2", "# x"])
        .await
        .unwrap();
    assert_eq!(added, 2);
    assert_eq!(handle.add(vec!["https://example.com/1"]).await.unwrap(), 0);

    let jobs = handle.snapshot().await.unwrap();
    assert_eq!(jobs.len(), 2);
    let first = jobs[0].id;

    handle.patch(first, JobPatch::completed()).unwrap();
    let got = handle.get(first).await.unwrap().unwrap();
    assert_eq!(got.status, JobStatus::Completed);

    assert_eq!(handle.clear_completed().await.unwrap(), 1);
    assert_eq!(handle.snapshot().await.unwrap().len(), 1);
}

#[tokio::test]
async fn handle_tolerates_stale_progress() {
    let handle = StoreHandle::spawn();
    handle.add(vec!["https://example.com/1"]).await.unwrap();
    let id = handle.snapshot().await.unwrap()[0].id;
    handle.remove(id).unwrap();
    handle
        .apply_progress(ProgressEvent::downloading(id, 10.0, "", ""))
        .unwrap();
    assert!(handle.get(id).await.unwrap().is_none());
    assert!(handle.snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn handle_playlist_summary_lifecycle() {
    let handle = StoreHandle::spawn();
    handle
        .add(vec!["https://www.youtube.com/playlist?list=PLx"])
        .await
        .unwrap();
    let id = handle.snapshot().await.unwrap()[0].id;
    assert!(handle.claim(id, &CancellationToken::new()).await.unwrap());
    handle
        .apply_progress(ProgressEvent::downloading(id, 1.0, "", "").with_playlist(2, 7))
        .unwrap();
    let summary = handle.playlist_summary().await.unwrap().unwrap();
    assert_eq!((summary.index, summary.total), (2, 7));
    handle.clear_playlist_summary().unwrap();
    assert!(handle.playlist_summary().await.unwrap().is_none());
}

#[tokio::test]
async fn handle_claim_is_refused_after_cancel() {
    let handle = StoreHandle::spawn();
    handle
        .add(vec!["https://example.com/1", "https://example.com/2"])
        .await
        .unwrap();
    let jobs = handle.snapshot().await.unwrap();
    let cancel = CancellationToken::new();

    assert!(handle.claim(jobs[0].id, &cancel).await.unwrap());
    cancel.cancel();
    assert!(!handle.claim(jobs[1].id, &cancel).await.unwrap());
    assert_eq!(
        handle.get(jobs[1].id).await.unwrap().unwrap().status,
        JobStatus::Pending
    );
}
