//! Guided intake interview — scripted prompts, one at a time.
//!
//! The interviewer shows a prompt, waits for a response, "thinks" for a moment,
//! then shows the next prompt. Prompts are grouped into named sections whose
//! dividers appear as the conversation crosses into them. After the last
//! response a closing message is shown and, after a longer pause, the
//! coaching-plan offer is revealed. There is no language understanding: every
//! interviewer line comes from the script.

pub mod machine;
pub mod offer;
pub mod render;
pub mod scheduler;
pub mod script;
pub mod session;
pub mod state;

pub use machine::{reduce, replay, Effect, Event, Outcome, Rejection, Transition};
pub use offer::OfferContent;
pub use render::{progress_percent, render, status_line, Block, Status};
pub use scheduler::{TimerKind, TurnScheduler};
pub use script::{Prompt, PromptScript, ScriptDefinition, SectionBoundary};
pub use session::InterviewSession;
pub use state::{ConversationState, Phase, SectionMarker, Snapshot, Speaker, TranscriptEntry};
