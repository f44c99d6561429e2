use std::io::{self, Write};

use podcast_core::{Phase, ResultHandoff, TrackerViewModel};
use podcast_engine::TrackerSink;

const BAR_WIDTH: usize = 30;

/// Single-line progress display, redrawn in place with `\r`.
pub(crate) struct TerminalSink<W: Write> {
    out: W,
    last_line: String,
    last_notice: Option<String>,
    line_open: bool,
    outcome_reported: bool,
}

impl TerminalSink<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_line: String::new(),
            last_notice: None,
            line_open: false,
            outcome_reported: false,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn finish_line(&mut self) {
        if self.line_open {
            let _ = writeln!(self.out);
            self.line_open = false;
        }
    }
}

impl<W: Write> TrackerSink for TerminalSink<W> {
    fn render(&mut self, view: &TrackerViewModel) {
        if view.notice != self.last_notice {
            if let Some(notice) = &view.notice {
                self.finish_line();
                let _ = writeln!(self.out, "{notice}");
            }
            self.last_notice = view.notice.clone();
        }
        if !view.phase.is_terminal() {
            self.outcome_reported = false;
        }
        if view.phase == Phase::Idle {
            self.finish_line();
            self.last_line.clear();
            return;
        }

        let line = render_line(view);
        if line != self.last_line {
            let _ = write!(self.out, "\r{line:<80}");
            let _ = self.out.flush();
            self.line_open = true;
            self.last_line = line;
        }
        if view.phase.is_terminal() && !view.animating && !self.outcome_reported {
            self.outcome_reported = true;
            self.finish_line();
            if let Some(error) = &view.error {
                let _ = writeln!(self.out, "Failed: {error}");
            }
        }
    }

    fn handoff(&mut self, result: &ResultHandoff) {
        self.finish_line();
        let _ = writeln!(self.out, "Podcast ready: {}", result.playback_url());
    }
}

pub(crate) fn render_line(view: &TrackerViewModel) -> String {
    let filled = usize::from(view.percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%  {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        view.percent,
        view.status_message
    )
}
