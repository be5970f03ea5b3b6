//! CLI input surface — stdin/stdout interview for local use.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::Result;
use crate::interview::{
    render, status_line, Block, InterviewSession, OfferContent, PromptScript, Snapshot, Speaker,
    Status,
};

/// What to do with one line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction {
    /// Forward this response to the session.
    Submit(String),
    /// Nothing to send.
    Ignore,
    /// The session is not taking input right now.
    Busy,
    /// Leave the interview.
    Quit,
    /// Dump the current snapshot.
    Debug,
}

/// Interpret a line of input against the current snapshot.
///
/// Commands work in any phase; responses are only forwarded while the session
/// accepts input.
pub fn interpret_line(line: &str, snapshot: &Snapshot) -> LineAction {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "/quit" | "/exit" => return LineAction::Quit,
        "/debug" => return LineAction::Debug,
        "" => return LineAction::Ignore,
        _ => {}
    }
    if !snapshot.accepts_input() {
        return LineAction::Busy;
    }
    LineAction::Submit(trimmed.to_string())
}

/// Runs an interview session in the terminal.
pub struct CliSurface {
    offer: OfferContent,
    respondent_name: String,
}

impl CliSurface {
    pub fn new(offer: OfferContent, respondent_name: impl Into<String>) -> Self {
        Self {
            offer,
            respondent_name: respondent_name.into(),
        }
    }

    /// Drive `session` until the offer is shown, the user quits, or stdin
    /// closes. The session is torn down on return.
    pub async fn run(&self, session: InterviewSession) -> Result<()> {
        let script = Arc::clone(session.script());
        let mut snapshots = session.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut view = View::default();

        let initial = snapshots.borrow_and_update().clone();
        view.update(self, &script, &initial);

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    view.update(self, &script, &snapshot);
                    if snapshot.offer_revealed {
                        break;
                    }
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        tracing::debug!("stdin closed");
                        break;
                    };
                    let snapshot = session.snapshot();
                    match interpret_line(&line, &snapshot) {
                        LineAction::Submit(text) => {
                            let outcome = session.submit(text).await;
                            tracing::debug!(?outcome, "Response submitted");
                        }
                        LineAction::Ignore => eprint!("> "),
                        LineAction::Busy => eprintln!("(one moment...)"),
                        LineAction::Quit => {
                            eprintln!("Leaving the interview.");
                            break;
                        }
                        LineAction::Debug => match serde_json::to_string_pretty(&snapshot) {
                            Ok(json) => println!("{json}"),
                            Err(e) => tracing::warn!("Failed to serialize snapshot: {}", e),
                        },
                    }
                }
            }
        }

        session.teardown();
        Ok(())
    }
}

/// Tracks what has already been printed.
#[derive(Default)]
struct View {
    printed: usize,
    status: Option<Status>,
}

impl View {
    fn update(&mut self, cli: &CliSurface, script: &PromptScript, snapshot: &Snapshot) {
        let blocks = render(snapshot, script, &cli.offer, &cli.respondent_name);
        for block in blocks.iter().skip(self.printed) {
            // The terminal already echoed what the user typed.
            if matches!(block, Block::Message { speaker: Speaker::Respondent, .. }) {
                continue;
            }
            println!("\n{block}");
        }
        self.printed = blocks.len();

        let status = status_line(snapshot);
        if status != self.status {
            if let Some(status) = status {
                eprintln!("{}", status.text());
            }
            self.status = status;
        }
        if snapshot.accepts_input() {
            eprint!("\n> ");
        }
    }
}
