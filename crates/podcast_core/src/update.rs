use podcast_logging::{podcast_debug, podcast_info, podcast_warn};

use crate::{
    percent_from_fraction, validate_source, ClientTaskState, Effect, Msg, Phase, ResultHandoff,
    SourceFile, StatusReport, TaskId, TaskStatus,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages tagged with a generation other than the current one belong to a
/// discarded session and are dropped.
pub fn update(mut state: ClientTaskState, msg: Msg) -> (ClientTaskState, Vec<Effect>) {
    let effects = match msg {
        Msg::IdentityChanged { signed_in } => {
            state.set_signed_in(signed_in);
            Vec::new()
        }
        Msg::SubmitRequested(file) => submit(&mut state, file),
        Msg::TaskCreated {
            generation,
            task_id,
        } if state.is_current(generation) && state.phase() == Phase::Uploading => {
            podcast_info!("Task {} created, tracking", task_id);
            state.start_tracking(task_id.clone());
            vec![Effect::PollStatus {
                generation,
                task_id,
                delay: std::time::Duration::ZERO,
            }]
        }
        Msg::SubmissionFailed {
            generation,
            message,
        } if state.is_current(generation) && state.phase() == Phase::Uploading => {
            podcast_warn!("Submission failed: {}", message);
            state.set_status_message(format!("Error: {message}"));
            state.fail(message);
            Vec::new()
        }
        Msg::StatusReceived { generation, report }
            if state.is_current(generation) && state.phase() == Phase::Tracking =>
        {
            apply_status(&mut state, generation, report)
        }
        Msg::PollFailed {
            generation,
            message,
        } if state.is_current(generation) && state.phase() == Phase::Tracking => {
            poll_failed(&mut state, generation, message)
        }
        // A failed session still finishes the ramp that was running.
        Msg::ProgressFrame {
            generation,
            percent,
        } if state.is_current(generation) && state.phase() != Phase::Idle => {
            state.advance_display(percent);
            Vec::new()
        }
        Msg::AnimationSettled {
            generation,
            percent,
        } if state.is_current(generation) && state.phase() != Phase::Idle => {
            state.advance_display(percent);
            settle(&mut state)
        }
        Msg::Discard => {
            podcast_debug!("Discarding tracked task (phase {:?})", state.phase());
            state.reset();
            vec![Effect::CancelTracking]
        }
        Msg::TaskCreated { .. }
        | Msg::SubmissionFailed { .. }
        | Msg::StatusReceived { .. }
        | Msg::PollFailed { .. }
        | Msg::ProgressFrame { .. }
        | Msg::AnimationSettled { .. } => {
            podcast_debug!("Dropping message from a previous session");
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut ClientTaskState, file: Option<SourceFile>) -> Vec<Effect> {
    if state.phase().is_active() {
        state.set_notice("A podcast is already being generated; discard it before starting another");
        return Vec::new();
    }
    if let Err(err) = validate_source(file.as_ref(), &state.submission_rules()) {
        podcast_info!("Submission rejected locally: {}", err);
        state.set_notice(err.to_string());
        return Vec::new();
    }
    let Some(file) = file else {
        return Vec::new();
    };

    let generation = state.begin_upload();
    let settings = state.settings();
    let ceiling = settings.upload_ceiling.min(100);
    let upload_ramp = settings.upload_ramp;
    state.request_percent(ceiling);
    podcast_info!("Uploading {} ({} bytes)", file.name, file.bytes.len());

    vec![
        Effect::BeginSession { generation },
        Effect::AnimateTo {
            generation,
            target: ceiling,
            duration: upload_ramp,
        },
        Effect::CreateTask { generation, file },
    ]
}

fn apply_status(state: &mut ClientTaskState, generation: u64, report: StatusReport) -> Vec<Effect> {
    state.clear_poll_failures();
    state.set_status_message(report.message.clone());

    match report.status {
        TaskStatus::Completed => {
            podcast_info!("Server reports completion");
            state.request_percent(100);
            state.await_completion();
            vec![Effect::AnimateTo {
                generation,
                target: 100,
                duration: state.settings().completion_animation,
            }]
        }
        TaskStatus::Failed => {
            podcast_warn!("Server reports failure: {}", report.message);
            state.set_status_message(format!("Error: {}", report.message));
            state.fail(report.message);
            Vec::new()
        }
        TaskStatus::Queued | TaskStatus::Running => {
            let mut effects = Vec::with_capacity(2);
            if let Some(progress) = report.progress {
                let target = percent_from_fraction(progress);
                if state.request_percent(target) {
                    effects.push(Effect::AnimateTo {
                        generation,
                        target,
                        duration: state.settings().progress_animation,
                    });
                }
            }
            if let Some(task_id) = state.active_task_id().cloned() {
                effects.push(Effect::PollStatus {
                    generation,
                    task_id,
                    delay: state.settings().poll.interval,
                });
            }
            effects
        }
    }
}

fn poll_failed(state: &mut ClientTaskState, generation: u64, message: String) -> Vec<Effect> {
    let failures = state.record_poll_failure();
    let policy = state.settings().poll.clone();
    if failures > policy.max_retries {
        podcast_warn!("Giving up after {} failed polls: {}", failures, message);
        state.set_status_message(format!("Error checking status: {message}"));
        state.fail(format!("Error checking status: {message}"));
        return Vec::new();
    }

    podcast_warn!(
        "Poll failed ({}/{}): {}",
        failures,
        policy.max_retries,
        message
    );
    state.set_status_message(format!(
        "Error checking status (retry {failures}/{})",
        policy.max_retries
    ));
    match state.active_task_id().cloned() {
        Some(task_id) => vec![Effect::PollStatus {
            generation,
            task_id,
            delay: policy.delay_after_failures(failures),
        }],
        None => Vec::new(),
    }
}

/// Finishes a completed task once the bar has visibly reached 100%.
fn settle(state: &mut ClientTaskState) -> Vec<Effect> {
    if !state.is_awaiting_completion() || state.displayed_percent() < 100.0 {
        return Vec::new();
    }
    let Some(task_id) = state.active_task_id().cloned() else {
        return Vec::new();
    };

    match handoff_for(state, &task_id) {
        Ok(result) => {
            podcast_info!("Result available at {}", result.playback_url());
            state.complete(result.clone());
            vec![Effect::Handoff(result)]
        }
        Err(err) => {
            podcast_warn!("Completed task has an unusable result location: {}", err);
            state.fail(err.to_string());
            Vec::new()
        }
    }
}

fn handoff_for(
    state: &ClientTaskState,
    task_id: &TaskId,
) -> Result<ResultHandoff, crate::EndpointError> {
    let settings = state.settings();
    ResultHandoff::for_task(&settings.server, settings.endpoints, task_id)
}
