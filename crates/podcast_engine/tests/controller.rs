use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use podcast_core::{
    Msg, Phase, ResultHandoff, SourceFile, StatusReport, TaskId, TaskStatus, TrackerSettings,
    TrackerViewModel,
};
use podcast_engine::{ApiError, FailureKind, TaskApi, TaskController, TrackerSink};
use pretty_assertions::assert_eq;
use url::Url;

/// Answers polls from a script; the last entry repeats forever.
#[derive(Default)]
struct ScriptedApi {
    statuses: Mutex<VecDeque<Result<StatusReport, ApiError>>>,
    fail_create: Mutex<Option<ApiError>>,
    create_delay: Mutex<Duration>,
    creates: AtomicUsize,
    polls: AtomicUsize,
}

impl ScriptedApi {
    fn with_statuses(statuses: Vec<Result<StatusReport, ApiError>>) -> Arc<Self> {
        let api = Self::default();
        api.push(statuses);
        Arc::new(api)
    }

    fn push(&self, statuses: Vec<Result<StatusReport, ApiError>>) {
        self.statuses.lock().unwrap().extend(statuses);
    }

    fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TaskApi for ScriptedApi {
    async fn create_task(&self, _file: &SourceFile) -> Result<TaskId, ApiError> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *self.create_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        match self.fail_create.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(TaskId::new(format!("t-{n}"))),
        }
    }

    async fn task_status(&self, _task_id: &TaskId) -> Result<StatusReport, ApiError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().cloned().unwrap()
        }
    }

    async fn fetch_artifact(&self, _location: &Url) -> Result<Vec<u8>, ApiError> {
        Ok(b"ID3".to_vec())
    }

    async fn check_health(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[derive(Default)]
struct Recording {
    views: Vec<TrackerViewModel>,
    handoffs: Vec<ResultHandoff>,
}

#[derive(Clone, Default)]
struct RecordingSink(Arc<Mutex<Recording>>);

impl TrackerSink for RecordingSink {
    fn render(&mut self, view: &TrackerViewModel) {
        self.0.lock().unwrap().views.push(view.clone());
    }

    fn handoff(&mut self, result: &ResultHandoff) {
        self.0.lock().unwrap().handoffs.push(result.clone());
    }
}

fn running(progress: f64, message: &str) -> Result<StatusReport, ApiError> {
    Ok(StatusReport {
        status: TaskStatus::Running,
        progress: Some(progress),
        message: message.to_string(),
    })
}

fn finished(status: TaskStatus, message: &str) -> Result<StatusReport, ApiError> {
    Ok(StatusReport {
        status,
        progress: Some(if status == TaskStatus::Completed { 1.0 } else { 0.0 }),
        message: message.to_string(),
    })
}

fn network_error() -> Result<StatusReport, ApiError> {
    Err(ApiError {
        kind: FailureKind::Network,
        message: "connection refused".to_string(),
    })
}

fn pdf(name: &str) -> Option<SourceFile> {
    Some(SourceFile::new(name, b"%PDF-1.7".to_vec()))
}

fn controller(api: Arc<ScriptedApi>) -> (TaskController, RecordingSink) {
    podcast_logging::initialize_for_tests();
    let sink = RecordingSink::default();
    let settings = TrackerSettings::new(Url::parse("http://localhost:8000/").unwrap());
    let controller = TaskController::new(api, settings, Box::new(sink.clone()));
    (controller, sink)
}

fn assert_monotonic(views: &[TrackerViewModel]) {
    for pair in views.windows(2) {
        assert!(
            pair[1].displayed_progress >= pair[0].displayed_progress,
            "progress went from {} to {}",
            pair[0].displayed_progress,
            pair[1].displayed_progress
        );
    }
}

#[tokio::test(start_paused = true)]
async fn tracks_a_task_to_completion_and_hands_off_once() {
    let api = ScriptedApi::with_statuses(vec![
        running(0.1, "Extracting text"),
        running(0.5, "Generating script"),
        finished(TaskStatus::Completed, "Podcast created successfully"),
    ]);
    let (mut controller, sink) = controller(api.clone());

    controller.submit(pdf("notes.pdf"));
    assert_eq!(controller.state().phase(), Phase::Uploading);
    let phase = controller.run_until_settled().await;

    assert_eq!(phase, Phase::Completed);
    assert_eq!(api.creates(), 1);
    assert_eq!(api.polls(), 3);

    let recording = sink.0.lock().unwrap();
    assert_eq!(recording.handoffs.len(), 1);
    assert_eq!(
        recording.handoffs[0].playback_url().as_str(),
        "http://localhost:8000/get_podcast/t-1"
    );
    let last = recording.views.last().unwrap();
    assert_eq!(last.phase, Phase::Completed);
    assert_eq!(last.percent, 100);
    assert_eq!(last.displayed_progress, 1.0);
    assert_monotonic(&recording.views);
    assert!(recording
        .views
        .iter()
        .any(|view| view.status_message == "Generating script"));
}

#[tokio::test(start_paused = true)]
async fn no_polls_follow_a_server_failure() {
    let api = ScriptedApi::with_statuses(vec![finished(TaskStatus::Failed, "bad input")]);
    let (mut controller, sink) = controller(api.clone());

    controller.submit(pdf("notes.pdf"));
    assert_eq!(controller.run_until_settled().await, Phase::Failed);
    assert_eq!(controller.state().view().error.as_deref(), Some("bad input"));

    tokio::time::sleep(Duration::from_secs(30)).await;
    controller.drain_pending();
    assert_eq!(api.polls(), 1);
    assert!(sink.0.lock().unwrap().handoffs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn non_pdf_never_reaches_the_server() {
    let api = ScriptedApi::with_statuses(vec![running(0.1, "unused")]);
    let (mut controller, sink) = controller(api.clone());

    controller.submit(Some(SourceFile::new("notes.txt", b"plain".to_vec())));
    assert_eq!(controller.run_until_settled().await, Phase::Idle);

    assert_eq!(api.creates(), 0);
    assert_eq!(api.polls(), 0);
    let recording = sink.0.lock().unwrap();
    let notice = recording.views.last().unwrap().notice.clone();
    assert!(notice.unwrap().contains("PDF"));
}

#[tokio::test(start_paused = true)]
async fn failed_upload_is_reported_without_polling() {
    let api = ScriptedApi::with_statuses(vec![running(0.1, "unused")]);
    *api.fail_create.lock().unwrap() = Some(ApiError {
        kind: FailureKind::HttpStatus(500),
        message: "Internal Server Error".to_string(),
    });
    let (mut controller, _sink) = controller(api.clone());

    controller.submit(pdf("notes.pdf"));
    assert_eq!(controller.run_until_settled().await, Phase::Failed);
    assert_eq!(api.polls(), 0);
    assert_eq!(controller.state().active_task_id(), None);
    assert_eq!(controller.state().view().percent, 20);
}

#[tokio::test(start_paused = true)]
async fn upload_ramp_reaches_its_ceiling_after_a_quick_failure() {
    let api = ScriptedApi::with_statuses(vec![running(0.1, "unused")]);
    *api.fail_create.lock().unwrap() = Some(ApiError {
        kind: FailureKind::HttpStatus(500),
        message: "Internal Server Error".to_string(),
    });
    *api.create_delay.lock().unwrap() = Duration::from_millis(60);
    let (mut controller, sink) = controller(api.clone());

    controller.submit(pdf("notes.pdf"));
    assert_eq!(controller.run_until_settled().await, Phase::Failed);

    tokio::time::sleep(Duration::from_secs(2)).await;
    controller.drain_pending();
    let view = controller.state().view();
    assert_eq!(view.phase, Phase::Failed);
    assert_eq!(view.percent, 20);
    assert!(!view.animating);
    assert_eq!(view.error.as_deref(), Some("http status 500: Internal Server Error"));

    let recording = sink.0.lock().unwrap();
    assert_monotonic(&recording.views);
    let failed_at = recording
        .views
        .iter()
        .position(|view| view.phase == Phase::Failed)
        .unwrap();
    assert!(recording.views[failed_at].percent < 20);
    assert_eq!(recording.views.last().unwrap().percent, 20);
}

#[tokio::test(start_paused = true)]
async fn discard_mid_tracking_stops_polling() {
    let api = ScriptedApi::with_statuses(vec![running(0.3, "Working")]);
    let (mut controller, sink) = controller(api.clone());

    let tx = controller.sender();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let _ = tx.send(Msg::Discard);
    });

    controller.submit(pdf("notes.pdf"));
    assert_eq!(controller.run_until_settled().await, Phase::Idle);
    let polls_at_discard = api.polls();
    assert!(polls_at_discard >= 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    controller.drain_pending();
    assert_eq!(api.polls(), polls_at_discard);
    assert_eq!(controller.state().phase(), Phase::Idle);
    assert_eq!(controller.state().view().percent, 0);
    assert!(sink.0.lock().unwrap().handoffs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn resubmitting_after_completion_restarts_from_zero() {
    let api = ScriptedApi::with_statuses(vec![finished(
        TaskStatus::Completed,
        "Podcast created successfully",
    )]);
    let (mut controller, sink) = controller(api.clone());

    controller.submit(pdf("first.pdf"));
    assert_eq!(controller.run_until_settled().await, Phase::Completed);
    sink.0.lock().unwrap().views.clear();

    controller.submit(pdf("second.pdf"));
    {
        let recording = sink.0.lock().unwrap();
        let first = recording.views.first().unwrap();
        assert_eq!(first.phase, Phase::Uploading);
        assert_eq!(first.percent, 0);
        assert_eq!(first.result, None);
    }
    assert_eq!(controller.run_until_settled().await, Phase::Completed);

    let recording = sink.0.lock().unwrap();
    assert_monotonic(&recording.views);
    assert_eq!(recording.handoffs.len(), 2);
    assert_eq!(
        recording.handoffs[1].task_id(),
        &TaskId::new("t-2")
    );
}

#[tokio::test(start_paused = true)]
async fn repeated_poll_errors_fail_the_session() {
    let api = ScriptedApi::with_statuses(vec![network_error()]);
    let (mut controller, sink) = controller(api.clone());

    controller.submit(pdf("notes.pdf"));
    assert_eq!(controller.run_until_settled().await, Phase::Failed);

    assert_eq!(api.polls(), 4);
    let recording = sink.0.lock().unwrap();
    assert!(recording
        .views
        .iter()
        .any(|view| view.status_message == "Error checking status (retry 3/3)"));
    let error = recording.views.last().unwrap().error.clone().unwrap();
    assert!(error.starts_with("Error checking status: "));
}

#[tokio::test(start_paused = true)]
async fn transient_poll_error_recovers() {
    let api = ScriptedApi::with_statuses(vec![
        running(0.2, "Working"),
        network_error(),
        finished(TaskStatus::Completed, "done"),
    ]);
    let (mut controller, sink) = controller(api.clone());

    controller.submit(pdf("notes.pdf"));
    assert_eq!(controller.run_until_settled().await, Phase::Completed);
    assert_eq!(api.polls(), 3);
    assert_eq!(sink.0.lock().unwrap().handoffs.len(), 1);
}
