//! Interactive session over one [`StageOrchestrator`]
//!
//! Input is read as a block of lines ended by an empty line. After each
//! report the user picks the next step from a small command set.

use dossier_core::error::PROVIDER_FAILURE_MESSAGE;
use dossier_core::{Normalized, Normalizer, StageOrchestrator, SubmitOutcome};
use std::io::{BufRead, Write};

use crate::terminal::{format_preview, print_error, print_info, print_stage};

const COMMAND_PROMPT: &str = "analyze | show | reset | new | quit > ";

/// Commands available once input has been submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Analyze,
    Show,
    Reset,
    New,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "" => Command::Empty,
            "a" | "analyze" => Command::Analyze,
            "s" | "show" => Command::Show,
            "r" | "reset" => Command::Reset,
            "n" | "new" => Command::New,
            "q" | "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(line.trim().to_string()),
        }
    }
}

/// Subject to submit for some input: the extracted `name` when there is
/// one, otherwise the input itself.
pub fn subject_for(input: &str, normalized: &Normalized) -> String {
    match normalized.record().and_then(|record| record.get("name")) {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => input.trim().to_string(),
    }
}

pub struct Repl<'a, R> {
    orchestrator: &'a StageOrchestrator,
    normalizer: Normalizer,
    reader: R,
}

impl<'a, R: BufRead> Repl<'a, R> {
    pub fn new(orchestrator: &'a StageOrchestrator, reader: R) -> Self {
        Self {
            orchestrator,
            normalizer: Normalizer::default(),
            reader,
        }
    }

    /// Run until `quit` or end of input. `prefill` is used as the first input.
    pub async fn run(&mut self, prefill: Option<String>) -> anyhow::Result<()> {
        let mut pending = prefill;

        'input: loop {
            let input = match pending.take() {
                Some(text) => text,
                None => {
                    print_info("Enter company details, then an empty line to submit:");
                    match self.read_block()? {
                        Some(text) => text,
                        None => break,
                    }
                }
            };

            if !self.submit(&input).await {
                continue;
            }

            loop {
                print!("{}", COMMAND_PROMPT);
                std::io::stdout().flush()?;
                let Some(line) = self.read_line()? else {
                    break 'input;
                };

                match Command::parse(&line) {
                    Command::Analyze => self.analyze().await,
                    Command::Show => self.show_latest(),
                    Command::Reset => {
                        self.orchestrator.reset();
                        print_info("Run cleared.");
                        continue 'input;
                    }
                    Command::New => continue 'input,
                    Command::Quit => break 'input,
                    Command::Empty => {}
                    Command::Unknown(other) => print_error(&format!("Unknown command: {}", other)),
                }
            }
        }

        Ok(())
    }

    /// Submit stage 1. Returns false when the input was rejected outright.
    async fn submit(&mut self, input: &str) -> bool {
        let normalized = self.normalizer.normalize(input);
        if !input.trim().is_empty() {
            println!("{}", format_preview(&normalized));
        }
        let subject = subject_for(input, &normalized);

        match self.orchestrator.submit(&subject).await {
            Ok(outcome) => {
                self.show_outcome(outcome);
                true
            }
            Err(e) => {
                print_error(&e.user_message());
                false
            }
        }
    }

    async fn analyze(&mut self) {
        match self.orchestrator.submit_analysis().await {
            Ok(outcome) => self.show_outcome(outcome),
            Err(e) => print_error(&e.user_message()),
        }
    }

    fn show_outcome(&self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Completed(result) if result.is_success() => print_stage(&result),
            SubmitOutcome::Completed(result) => {
                print_error(
                    result
                        .error_message
                        .as_deref()
                        .unwrap_or(PROVIDER_FAILURE_MESSAGE),
                );
                if self.orchestrator.snapshot().run.report_content().is_some() {
                    print_info("The report is still available: type `show` or retry `analyze`.");
                }
            }
            SubmitOutcome::Ignored => print_info("A request is already in flight."),
            SubmitOutcome::Superseded => print_info("Result discarded; the run was reset."),
        }
    }

    fn show_latest(&self) {
        let snapshot = self.orchestrator.snapshot();
        match snapshot.run.latest_output() {
            Some(result) => print_stage(result),
            None => print_info("Nothing to show yet."),
        }
    }

    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Lines up to the first empty one. `None` only at end of input.
    fn read_block(&mut self) -> std::io::Result<Option<String>> {
        let mut lines = Vec::new();
        loop {
            match self.read_line()? {
                Some(line) if line.trim().is_empty() => break,
                Some(line) => lines.push(line),
                None if lines.is_empty() => return Ok(None),
                None => break,
            }
        }
        Ok(Some(lines.join("\n")))
    }
}
