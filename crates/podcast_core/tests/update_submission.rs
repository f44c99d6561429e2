use std::sync::Once;
use std::time::Duration;

use podcast_core::{
    update, ClientTaskState, Effect, Msg, Phase, SourceFile, TaskId, TrackerSettings,
};
use pretty_assertions::assert_eq;
use url::Url;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(podcast_logging::initialize_for_tests);
}

fn settings() -> TrackerSettings {
    TrackerSettings::new(Url::parse("http://localhost:8000/").unwrap())
}

fn pdf(name: &str) -> SourceFile {
    SourceFile::new(name, b"%PDF-1.7 body".to_vec())
}

fn submit(state: ClientTaskState, file: SourceFile) -> (ClientTaskState, Vec<Effect>) {
    update(state, Msg::SubmitRequested(Some(file)))
}

#[test]
fn text_file_is_rejected_without_any_request() {
    init_logging();
    let (mut state, effects) = submit(ClientTaskState::new(settings()), pdf("notes.txt"));

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, Phase::Idle);
    assert!(view.notice.unwrap().contains("Please upload a PDF file"));
    assert!(state.consume_dirty());
}

#[test]
fn missing_file_is_rejected_without_any_request() {
    init_logging();
    let (state, effects) = update(ClientTaskState::new(settings()), Msg::SubmitRequested(None));

    assert!(effects.is_empty());
    assert_eq!(state.view().notice.as_deref(), Some("Please select a PDF file"));
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn pdf_starts_upload_ramp_and_creation_request() {
    init_logging();
    let file = pdf("notes.pdf");
    let (state, effects) = submit(ClientTaskState::new(settings()), file.clone());

    let generation = state.generation();
    assert_eq!(
        effects,
        vec![
            Effect::BeginSession { generation },
            Effect::AnimateTo {
                generation,
                target: 20,
                duration: Duration::from_millis(400),
            },
            Effect::CreateTask { generation, file },
        ]
    );
    let view = state.view();
    assert_eq!(view.phase, Phase::Uploading);
    assert_eq!(view.status_message, "Uploading PDF...");
    assert_eq!(view.percent, 0);
    assert_eq!(view.task_id, None);
}

#[test]
fn task_created_starts_tracking_with_an_immediate_poll() {
    init_logging();
    let (state, _) = submit(ClientTaskState::new(settings()), pdf("notes.pdf"));
    let generation = state.generation();

    let (state, effects) = update(
        state,
        Msg::TaskCreated {
            generation,
            task_id: TaskId::new("t-1"),
        },
    );

    assert_eq!(state.phase(), Phase::Tracking);
    assert_eq!(state.active_task_id(), Some(&TaskId::new("t-1")));
    assert_eq!(
        effects,
        vec![Effect::PollStatus {
            generation,
            task_id: TaskId::new("t-1"),
            delay: Duration::ZERO,
        }]
    );
}

#[test]
fn second_submission_is_rejected_while_one_is_in_flight() {
    init_logging();
    let (state, _) = submit(ClientTaskState::new(settings()), pdf("a.pdf"));
    let generation = state.generation();

    let (state, effects) = submit(state, pdf("b.pdf"));
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Uploading);
    assert_eq!(state.generation(), generation);
    assert!(state.view().notice.unwrap().contains("already being generated"));

    let (state, _) = update(
        state,
        Msg::TaskCreated {
            generation,
            task_id: TaskId::new("t-1"),
        },
    );
    let (state, effects) = submit(state, pdf("c.pdf"));
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Tracking);
    assert_eq!(state.active_task_id(), Some(&TaskId::new("t-1")));
}

#[test]
fn creation_failure_is_terminal_and_tracks_nothing() {
    init_logging();
    let (state, _) = submit(ClientTaskState::new(settings()), pdf("notes.pdf"));
    let generation = state.generation();

    let (state, effects) = update(
        state,
        Msg::SubmissionFailed {
            generation,
            message: "http status 500".to_string(),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, Phase::Failed);
    assert_eq!(view.task_id, None);
    assert_eq!(view.error.as_deref(), Some("http status 500"));
    assert_eq!(view.status_message, "Error: http status 500");

    // A late creation answer for the failed upload does not revive it.
    let (state, effects) = update(
        state,
        Msg::TaskCreated {
            generation,
            task_id: TaskId::new("late"),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Failed);
}

#[test]
fn upload_ramp_keeps_running_after_creation_failure() {
    init_logging();
    let (state, _) = submit(ClientTaskState::new(settings()), pdf("notes.pdf"));
    let generation = state.generation();
    let (state, _) = update(state, Msg::ProgressFrame { generation, percent: 3.0 });
    let (state, _) = update(
        state,
        Msg::SubmissionFailed {
            generation,
            message: "http status 500".to_string(),
        },
    );
    assert_eq!(state.phase(), Phase::Failed);
    assert!(state.is_animating());

    let (state, _) = update(state, Msg::ProgressFrame { generation, percent: 11.0 });
    let (state, effects) = update(
        state,
        Msg::AnimationSettled {
            generation,
            percent: 20.0,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Failed);
    assert_eq!(state.view().percent, 20);
    assert!(!state.is_animating());
}

#[test]
fn new_submission_after_failure_resets_implicitly() {
    init_logging();
    let (state, _) = submit(ClientTaskState::new(settings()), pdf("notes.pdf"));
    let first = state.generation();
    let (state, _) = update(
        state,
        Msg::SubmissionFailed {
            generation: first,
            message: "network error".to_string(),
        },
    );

    let (state, effects) = submit(state, pdf("notes.pdf"));
    assert_eq!(effects.len(), 3);
    assert_eq!(state.phase(), Phase::Uploading);
    assert!(state.generation() > first);
    assert_eq!(state.view().error, None);
}

#[test]
fn sign_in_is_required_when_configured() {
    init_logging();
    let mut settings = settings();
    settings.require_auth = true;

    let (state, effects) = submit(ClientTaskState::new(settings), pdf("notes.pdf"));
    assert!(effects.is_empty());
    assert!(state.view().notice.unwrap().contains("sign in"));

    let (state, _) = update(state, Msg::IdentityChanged { signed_in: true });
    let (state, effects) = submit(state, pdf("notes.pdf"));
    assert_eq!(effects.len(), 3);
    assert_eq!(state.phase(), Phase::Uploading);
}
