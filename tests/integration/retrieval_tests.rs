//! Integration tests for the retrieval queue
//!
//! Savers here are test doubles that record concurrency or block on a gate, so
//! pause and stop can be exercised at known points of a run.

use async_trait::async_trait;
use lesson_harvest::config::RetrievalConfig;
use lesson_harvest::retrieval::{FileSaver, ResourceSaver, RetrievalQueue, RunState};
use lesson_harvest::{
    filter_by_kinds, HarvestError, ProgressReporter, ResourceDescriptor, ResourceKind,
    RetrievalState, RetrievalSummary,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(max_concurrent: usize) -> RetrievalConfig {
    RetrievalConfig {
        max_concurrent,
        download_delay_ms: 0,
        ..RetrievalConfig::default()
    }
}

fn items(count: u32) -> Vec<ResourceDescriptor> {
    (1..=count)
        .map(|unit| {
            ResourceDescriptor::lesson(
                ResourceKind::OriginalBook,
                format!("https://courses.example.com/api/aluno/pdf/download/{}", unit),
                unit,
            )
        })
        .collect()
}

/// Records the highest number of saves in flight
#[derive(Default)]
struct TrackingSaver {
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl ResourceSaver for TrackingSaver {
    async fn save(&self, url: &str, _file_name: &str) -> Result<(), HarvestError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(10)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if url.contains("fail") {
            Err(HarvestError::Retrieval {
                url: url.to_string(),
                reason: "HTTP 500".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Announces each save and then blocks until a permit is released
struct GatedSaver {
    started: mpsc::UnboundedSender<String>,
    gate: Arc<Semaphore>,
}

#[async_trait]
impl ResourceSaver for GatedSaver {
    async fn save(&self, _url: &str, file_name: &str) -> Result<(), HarvestError> {
        let _ = self.started.send(file_name.to_string());
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        Ok(())
    }
}

fn gated() -> (GatedSaver, mpsc::UnboundedReceiver<String>, Arc<Semaphore>) {
    let (started, rx) = mpsc::unbounded_channel();
    let gate = Arc::new(Semaphore::new(0));
    (
        GatedSaver {
            started,
            gate: gate.clone(),
        },
        rx,
        gate,
    )
}

#[derive(Default)]
struct CountingReporter {
    items: AtomicUsize,
    failures: AtomicUsize,
    summaries: Mutex<Vec<RetrievalSummary>>,
}

impl ProgressReporter for CountingReporter {
    fn on_item_complete(&self, _item: &ResourceDescriptor, error: Option<&HarvestError>) {
        self.items.fetch_add(1, Ordering::SeqCst);
        if error.is_some() {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_complete(&self, summary: RetrievalSummary) {
        self.summaries.lock().unwrap().push(summary);
    }
}

/// Polls `status` until `done` holds or a second passes
async fn wait_for_status(queue: &RetrievalQueue, done: impl Fn(&lesson_harvest::QueueStatus) -> bool) {
    for _ in 0..200 {
        if done(&queue.status()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("queue never reached the expected status: {:?}", queue.status());
}

#[tokio::test]
async fn test_concurrency_never_exceeds_limit() {
    let saver = Arc::new(TrackingSaver::default());
    let queue = RetrievalQueue::new(saver.clone(), test_config(3));

    let summary = queue.start(items(12)).await;

    assert_eq!(summary.completed, 12);
    assert_eq!(saver.calls.load(Ordering::SeqCst), 12);
    let max_active = saver.max_active.load(Ordering::SeqCst);
    assert!(max_active <= 3, "saw {} saves in flight", max_active);
    assert!(max_active > 1);
}

#[tokio::test]
async fn test_failures_are_counted_and_reported() {
    let mut work = items(4);
    work[1].source_url = "https://courses.example.com/fail/2".to_string();
    work[3].source_url = "https://courses.example.com/fail/4".to_string();

    let reporter = Arc::new(CountingReporter::default());
    let queue = RetrievalQueue::new(Arc::new(TrackingSaver::default()), test_config(2))
        .with_reporter(reporter.clone());

    let summary = queue.start(work).await;

    assert_eq!(summary.total, 4);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.completed + summary.failed, summary.total);

    assert_eq!(reporter.items.load(Ordering::SeqCst), 4);
    assert_eq!(reporter.failures.load(Ordering::SeqCst), 2);
    assert_eq!(reporter.summaries.lock().unwrap().as_slice(), &[summary]);

    let finished = queue.finished_items();
    assert_eq!(finished.len(), 4);
    for item in finished {
        let expected = if item.source_url.contains("fail") {
            RetrievalState::Failed
        } else {
            RetrievalState::Downloaded
        };
        assert_eq!(item.state, expected);
    }
}

#[tokio::test]
async fn test_stop_discards_unclaimed_items() {
    let (saver, mut started, gate) = gated();
    let queue = RetrievalQueue::new(Arc::new(saver), test_config(2));

    let runner = queue.clone();
    let handle = tokio::spawn(async move { runner.start(items(6)).await });

    // Both workers are now blocked inside a save
    started.recv().await.unwrap();
    started.recv().await.unwrap();

    queue.stop();
    let status = queue.status();
    assert_eq!(status.pending_count, 0);
    assert_eq!(status.active_count, 2);
    assert_eq!(status.run_state, RunState::Stopped);

    gate.add_permits(2);
    let summary = handle.await.unwrap();

    assert_eq!(summary.total, 6);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped(), 4);
    assert!(started.try_recv().is_err());
}

#[tokio::test]
async fn test_pause_holds_workers_until_resume() {
    let (saver, mut started, gate) = gated();
    let queue = RetrievalQueue::new(Arc::new(saver), test_config(1));

    let runner = queue.clone();
    let handle = tokio::spawn(async move { runner.start(items(3)).await });

    assert_eq!(started.recv().await.unwrap(), "Unit01_LivroEletronico_Original.pdf");

    queue.pause();
    gate.add_permits(1);
    wait_for_status(&queue, |s| s.completed_count == 1 && s.active_count == 0).await;

    // Paused: nothing new is claimed
    tokio::time::sleep(Duration::from_millis(20)).await;
    let status = queue.status();
    assert_eq!(status.run_state, RunState::Paused);
    assert_eq!(status.pending_count, 2);
    assert!(started.try_recv().is_err());

    queue.resume();
    gate.add_permits(2);
    let summary = handle.await.unwrap();

    assert_eq!(summary.completed, 3);
    assert_eq!(started.recv().await.unwrap(), "Unit02_LivroEletronico_Original.pdf");
    assert_eq!(started.recv().await.unwrap(), "Unit03_LivroEletronico_Original.pdf");
}

#[tokio::test]
async fn test_pause_after_last_claim_still_finishes() {
    let (saver, mut started, gate) = gated();
    let queue = RetrievalQueue::new(Arc::new(saver), test_config(1));

    let runner = queue.clone();
    let handle = tokio::spawn(async move { runner.start(items(1)).await });

    started.recv().await.unwrap();
    queue.pause();
    gate.add_permits(1);

    let summary = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("start should resolve once nothing is pending")
        .unwrap();

    assert_eq!(summary.completed, 1);
    let status = queue.status();
    assert_eq!(status.pending_count, 0);
    assert_eq!(status.active_count, 0);
    assert_eq!(status.run_state, RunState::Paused);
}

#[tokio::test]
async fn test_stop_releases_paused_workers() {
    let (saver, mut started, gate) = gated();
    let queue = RetrievalQueue::new(Arc::new(saver), test_config(2));

    let runner = queue.clone();
    let handle = tokio::spawn(async move { runner.start(items(5)).await });

    started.recv().await.unwrap();
    started.recv().await.unwrap();
    queue.pause();
    gate.add_permits(2);
    wait_for_status(&queue, |s| s.active_count == 0).await;

    queue.stop();
    let summary = handle.await.unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.skipped(), 3);
    assert_eq!(queue.status().run_state, RunState::Stopped);
}

#[tokio::test]
async fn test_reset_allows_another_run() {
    let queue = RetrievalQueue::new(Arc::new(TrackingSaver::default()), test_config(2));

    let first = queue.start(items(3)).await;
    assert_eq!(first.completed, 3);

    queue.reset();
    let status = queue.status();
    assert_eq!(status.completed_count, 0);
    assert_eq!(status.pending_count, 0);
    assert_eq!(status.run_state, RunState::Running);
    assert!(queue.finished_items().is_empty());

    let second = queue.start(items(2)).await;
    assert_eq!(second.total, 2);
    assert_eq!(second.completed, 2);
}

#[tokio::test]
async fn test_selected_kinds_are_saved_to_disk() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/video/7/download/resumo"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"summary".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/video/8/download/resumo"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"second".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base = mock_server.uri();
    let scanned = vec![
        ResourceDescriptor::lesson(
            ResourceKind::OriginalBook,
            format!("{}/api/aluno/pdf/download/1", base),
            1,
        ),
        ResourceDescriptor::video(
            ResourceKind::Summary,
            format!("{}/api/video/7/download/resumo", base),
            1,
            1,
        ),
        ResourceDescriptor::video(
            ResourceKind::SlideDeck,
            format!("{}/api/video/7/download/slideshow", base),
            1,
            2,
        ),
        ResourceDescriptor::video(
            ResourceKind::Summary,
            format!("{}/api/video/8/download/resumo", base),
            2,
            1,
        ),
    ];

    let selected = filter_by_kinds(&scanned, &[ResourceKind::Summary]);
    assert_eq!(selected.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let saver = FileSaver::new(reqwest::Client::new(), dir.path());
    let queue = RetrievalQueue::new(Arc::new(saver), test_config(2));

    let summary = queue.start(selected).await;
    assert_eq!(summary.completed, 2);

    assert_eq!(
        std::fs::read(dir.path().join("Unit01_V01_Resumo.pdf")).unwrap(),
        b"summary"
    );
    assert_eq!(
        std::fs::read(dir.path().join("Unit02_V01_Resumo.pdf")).unwrap(),
        b"second"
    );
    assert!(!dir.path().join("Unit01_LivroEletronico_Original.pdf").exists());
    assert!(!dir.path().join("Unit01_V02_Slides.pdf").exists());

    // The scan result itself is left untouched
    assert!(scanned.iter().all(|r| r.state == RetrievalState::Pending));
}
