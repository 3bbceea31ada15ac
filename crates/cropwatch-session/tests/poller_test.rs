//! Job poller session lifecycle

use std::sync::Arc;
use std::time::Duration;

use cropwatch_client::MemoryJobApi;
use cropwatch_core::config::PollSettings;
use cropwatch_core::models::{JobId, JobStatus};
use cropwatch_session::JobPoller;

fn poller(api: &MemoryJobApi) -> JobPoller {
    JobPoller::new(Arc::new(api.clone()), PollSettings::default())
}

#[tokio::test(start_paused = true)]
async fn test_polling_stops_after_completed() {
    let api = MemoryJobApi::new();
    api.script_statuses(
        "job-1",
        &[JobStatus::Pending, JobStatus::Processing, JobStatus::Completed],
    );
    let poller = poller(&api);

    poller.start(JobId::new("job-1"));
    let result = poller.wait_for_terminal().await.unwrap();
    assert_eq!(result.status, JobStatus::Completed);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.fetch_count("job-1"), 3);
    assert!(!poller.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_polling_interval_is_three_seconds() {
    let api = MemoryJobApi::new();
    api.script_statuses("job-1", &[JobStatus::Processing]);
    let poller = poller(&api);

    poller.start(JobId::new("job-1"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(api.fetch_count("job-1"), 1);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(api.fetch_count("job-1"), 2);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(api.fetch_count("job-1"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_restart_keeps_one_timer_and_drops_stale_results() {
    let api = MemoryJobApi::new();
    api.script_statuses("A", &[JobStatus::Completed])
        .delay_fetches("A", Duration::from_secs(1))
        .script_statuses("B", &[JobStatus::Processing]);
    let poller = poller(&api);

    poller.start(JobId::new("A"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    poller.start(JobId::new("B"));

    // A's response lands after B took over
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(poller.tracked(), Some(JobId::new("B")));
    let snapshot = poller.snapshot().unwrap();
    assert_eq!(snapshot.job_id, JobId::new("B"));
    assert_eq!(snapshot.status, JobStatus::Processing);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.fetch_count("A"), 1);
    // One fetch at start plus one per elapsed interval
    assert_eq!(api.fetch_count("B"), 11);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_do_not_stop_polling() {
    let api = MemoryJobApi::new();
    api.script_statuses("job-1", &[JobStatus::Processing, JobStatus::Completed])
        .fail_next_fetches(2);
    let poller = poller(&api);

    poller.start(JobId::new("job-1"));
    let result = poller.wait_for_terminal().await.unwrap();

    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(api.fetch_count("job-1"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_failed_is_terminal() {
    let api = MemoryJobApi::new();
    api.script_statuses("job-1", &[JobStatus::Processing, JobStatus::Failed]);
    let poller = poller(&api);

    poller.start(JobId::new("job-1"));
    let result = poller.wait_for_terminal().await.unwrap();

    assert_eq!(result.status, JobStatus::Failed);
    let err = result.failure().unwrap();
    assert!(err.to_string().contains("Analysis failed"));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.fetch_count("job-1"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_none_after_stop() {
    let api = MemoryJobApi::new();
    api.script_statuses("job-1", &[JobStatus::Processing]);
    let poller = poller(&api);
    poller.start(JobId::new("job-1"));

    let waiter = {
        let poller = poller.clone();
        tokio::spawn(async move { poller.wait_for_terminal().await })
    };
    tokio::time::sleep(Duration::from_secs(4)).await;
    poller.stop();

    assert!(waiter.await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_immediate_completion_is_never_masked_by_pending() {
    for round in 0..500 {
        let api = MemoryJobApi::new();
        let job_id = format!("job-{round}");
        api.script_statuses(&job_id, &[JobStatus::Completed]);
        let poller = poller(&api);

        poller.start(JobId::new(job_id.as_str()));
        let result = tokio::time::timeout(Duration::from_secs(5), poller.wait_for_terminal())
            .await
            .expect("completed job should be observed");

        assert_eq!(result.unwrap().status, JobStatus::Completed);
        assert!(!poller.is_active());
    }
}
