//! Per-record selection.
//!
//! Every record starts `Pending` and ends `Included` or `Skipped`. In batch
//! mode everything is included; in interactive mode a [`DecisionSource`]
//! is asked for each record until it answers "abort remaining".

use std::io::{BufRead, Write};

use colored::Colorize;

use crate::domain::{AppError, Decision, DisplayZone, Recording, Result, SelectionState};

use super::formatter::{format_duration, format_recorded_at};

/// What the operator is shown for a pending record.
#[derive(Debug, Clone, Copy)]
pub struct PendingRecord<'a> {
    pub recording: &'a Recording,
    pub label: &'a str,
}

/// Supplies include/skip/abort decisions.
pub trait DecisionSource {
    /// Decide the fate of one pending record.
    ///
    /// # Errors
    /// Returns error if the decision cannot be obtained.
    fn decide(&mut self, pending: &PendingRecord<'_>) -> Result<Decision>;
}

enum Mode {
    Batch,
    Interactive(Box<dyn DecisionSource>),
}

/// Sequences decisions and records the resulting states.
pub struct SelectionController {
    mode: Mode,
    aborted: bool,
    outcomes: Vec<(i64, SelectionState)>,
}

impl SelectionController {
    /// Includes every record without asking.
    #[must_use]
    pub fn batch() -> Self {
        Self {
            mode: Mode::Batch,
            aborted: false,
            outcomes: Vec::new(),
        }
    }

    /// Asks `source` about each record.
    #[must_use]
    pub fn interactive(source: Box<dyn DecisionSource>) -> Self {
        Self {
            mode: Mode::Interactive(source),
            aborted: false,
            outcomes: Vec::new(),
        }
    }

    /// Moves a pending record to its terminal state.
    ///
    /// # Errors
    /// Returns error if the decision source fails.
    pub fn select(&mut self, pending: &PendingRecord<'_>) -> Result<SelectionState> {
        let state = match &mut self.mode {
            Mode::Batch => SelectionState::Included,
            Mode::Interactive(_) if self.aborted => SelectionState::Skipped,
            Mode::Interactive(source) => match source.decide(pending)? {
                Decision::Include => SelectionState::Included,
                Decision::Skip => SelectionState::Skipped,
                Decision::AbortRemaining => {
                    tracing::info!("Operator stopped; remaining recordings are skipped");
                    self.aborted = true;
                    SelectionState::Skipped
                }
            },
        };

        debug_assert!(state.is_terminal());
        tracing::debug!(id = pending.recording.id, ?state, "Selection decided");
        self.outcomes.push((pending.recording.id, state));

        Ok(state)
    }

    /// Whether the operator chose to abort the remaining records.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Decided states in read order.
    #[must_use]
    pub fn outcomes(&self) -> &[(i64, SelectionState)] {
        &self.outcomes
    }
}

/// Line-based prompt on a reader/writer pair, normally stdin/stdout.
///
/// Empty line or `y` includes, `n`/`s` skips, `q` aborts the rest.
/// End of input counts as abort.
pub struct PromptDecisions<R, W> {
    input: R,
    output: W,
    zone: DisplayZone,
}

impl<R: BufRead, W: Write> PromptDecisions<R, W> {
    /// Create a prompt over the given streams.
    pub const fn new(input: R, output: W, zone: DisplayZone) -> Self {
        Self {
            input,
            output,
            zone,
        }
    }

    fn ask(&mut self, pending: &PendingRecord<'_>) -> std::io::Result<Option<String>> {
        let rec = pending.recording;
        let date = rec
            .recorded_datetime()
            .map_or_else(|| "-".to_string(), |dt| format_recorded_at(dt, self.zone));
        let duration = rec
            .duration_seconds
            .map_or_else(|| "-".to_string(), format_duration);

        write!(
            self.output,
            "{}  {}  {}  {} ",
            date,
            duration,
            pending.label.cyan(),
            "Export? [Y/n/q]".bold()
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_lowercase()))
    }
}

impl<R: BufRead, W: Write> DecisionSource for PromptDecisions<R, W> {
    fn decide(&mut self, pending: &PendingRecord<'_>) -> Result<Decision> {
        loop {
            let answer = self.ask(pending).map_err(|e| AppError::Interaction {
                message: e.to_string(),
            })?;

            match answer.as_deref() {
                None | Some("q" | "quit") => return Ok(Decision::AbortRemaining),
                Some("" | "y" | "yes") => return Ok(Decision::Include),
                Some("n" | "no" | "s" | "skip") => return Ok(Decision::Skip),
                Some(other) => {
                    tracing::debug!(input = other, "Unrecognized answer, asking again");
                }
            }
        }
    }
}

/// Replays a fixed list of decisions; aborts once exhausted.
#[cfg(test)]
pub struct ScriptedDecisions {
    script: std::collections::VecDeque<Decision>,
}

#[cfg(test)]
impl ScriptedDecisions {
    pub fn new(script: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl DecisionSource for ScriptedDecisions {
    fn decide(&mut self, _pending: &PendingRecord<'_>) -> Result<Decision> {
        Ok(self.script.pop_front().unwrap_or(Decision::AbortRemaining))
    }
}
