use std::time::Duration;

use podcast_core::{Msg, ProgressRamp};
use podcast_logging::podcast_trace;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
enum AnimatorCommand {
    RaiseTo { target: f64, duration: Duration },
}

/// Drives the progress bar of one session.
///
/// Runs a single ramp at a time; raising the target while a ramp is in flight
/// bends the running ramp upward instead of starting a second one. Every value
/// is reported as `Msg::ProgressFrame`, and the end of each ramp as
/// `Msg::AnimationSettled`.
#[derive(Debug, Clone)]
pub struct ProgressAnimator {
    cmd_tx: mpsc::UnboundedSender<AnimatorCommand>,
}

impl ProgressAnimator {
    /// Spawns the animator task on the current tokio runtime.
    pub fn spawn(
        generation: u64,
        tick: Duration,
        cancel: CancellationToken,
        msg_tx: mpsc::UnboundedSender<Msg>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let state = AnimatorState {
            generation,
            tick,
            current: 0.0,
            ramp: None,
            msg_tx,
        };
        tokio::spawn(run(state, cmd_rx, cancel));
        Self { cmd_tx }
    }

    /// Raises the animation endpoint to `target` percent over `duration`.
    pub fn raise_to(&self, target: u8, duration: Duration) {
        let _ = self.cmd_tx.send(AnimatorCommand::RaiseTo {
            target: f64::from(target.min(100)),
            duration,
        });
    }
}

struct AnimatorState {
    generation: u64,
    tick: Duration,
    current: f64,
    ramp: Option<ProgressRamp>,
    msg_tx: mpsc::UnboundedSender<Msg>,
}

impl AnimatorState {
    fn apply(&mut self, command: AnimatorCommand) {
        let AnimatorCommand::RaiseTo { target, duration } = command;
        if let Some(ramp) = self.ramp.as_mut() {
            if ramp.retarget(target, duration) {
                podcast_trace!("Animation retargeted to {}%", target);
            }
        } else if target > self.current {
            self.ramp = Some(ProgressRamp::new(self.current, target, duration, self.tick));
        } else {
            let _ = self.msg_tx.send(Msg::AnimationSettled {
                generation: self.generation,
                percent: self.current,
            });
        }
    }

    fn step(&mut self) {
        let Some(ramp) = self.ramp.as_mut() else {
            return;
        };
        if let Some(percent) = ramp.next() {
            self.current = percent;
            let _ = self.msg_tx.send(Msg::ProgressFrame {
                generation: self.generation,
                percent,
            });
        }
        if ramp.is_finished() {
            self.ramp = None;
            let _ = self.msg_tx.send(Msg::AnimationSettled {
                generation: self.generation,
                percent: self.current,
            });
        }
    }
}

async fn run(
    mut state: AnimatorState,
    mut cmd_rx: mpsc::UnboundedReceiver<AnimatorCommand>,
    cancel: CancellationToken,
) {
    loop {
        if state.ramp.is_some() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(state.tick) => {}
            }
            while let Ok(command) = cmd_rx.try_recv() {
                state.apply(command);
            }
            state.step();
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                command = cmd_rx.recv() => match command {
                    Some(command) => state.apply(command),
                    None => break,
                },
            }
        }
    }
}
