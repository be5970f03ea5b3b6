//! Transition function for the interview.
//!
//! `reduce` is pure: given the same state, script, and event it always returns
//! the same transition. Timestamps travel inside events so replaying a recorded
//! event sequence rebuilds an identical state. Side effects (timers, logging)
//! are returned as [`Effect`]s for the session driver to execute.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::script::PromptScript;
use super::state::{ConversationState, Phase, SectionMarker, Speaker};

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The respondent submitted an answer.
    Submit { text: String, at: DateTime<Utc> },
    /// The thinking delay elapsed.
    ThinkingElapsed { at: DateTime<Utc> },
    /// The offer reveal delay elapsed.
    RevealOffer,
}

impl Event {
    pub fn submit(text: impl Into<String>) -> Self {
        Self::Submit {
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn thinking_elapsed() -> Self {
        Self::ThinkingElapsed { at: Utc::now() }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::ThinkingElapsed { .. } => "thinking_elapsed",
            Self::RevealOffer => "reveal_offer",
        }
    }
}

/// Work the driver must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the thinking timer; it should deliver `ThinkingElapsed`.
    ScheduleThinking,
    /// Start the offer reveal timer; it should deliver `RevealOffer`.
    ScheduleOfferReveal,
    /// A section boundary was crossed.
    SectionStarted { section_id: String },
}

/// Why an event changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Submission text was empty after trimming.
    EmptyResponse,
    /// The event is not valid in the current phase.
    WrongPhase(Phase),
    /// The session was torn down.
    SessionClosed,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyResponse => write!(f, "empty response"),
            Self::WrongPhase(phase) => write!(f, "not accepted while {phase}"),
            Self::SessionClosed => write!(f, "session closed"),
        }
    }
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum Outcome {
    Accepted,
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// The new state plus what should happen next.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: ConversationState,
    pub effects: Vec<Effect>,
    pub outcome: Outcome,
}

impl Transition {
    fn rejected(state: &ConversationState, reason: Rejection) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
            outcome: Outcome::Rejected(reason),
        }
    }

    fn accepted(state: ConversationState, effects: Vec<Effect>) -> Self {
        Self {
            state,
            effects,
            outcome: Outcome::Accepted,
        }
    }
}

/// Apply `event` to `state`.
///
/// Invalid events are rejected without touching the state; rejection is an
/// expected outcome, not an error.
pub fn reduce(state: &ConversationState, script: &PromptScript, event: Event) -> Transition {
    let transition = match event {
        Event::Submit { text, at } => submit(state, script, &text, at),
        Event::ThinkingElapsed { at } => resolve_thinking(state, script, at),
        Event::RevealOffer => reveal_offer(state),
    };
    debug_assert!(
        !transition.outcome.is_accepted() || state.phase.can_transition_to(transition.state.phase),
        "illegal phase transition {} -> {}",
        state.phase,
        transition.state.phase
    );
    transition
}

fn submit(
    state: &ConversationState,
    script: &PromptScript,
    text: &str,
    at: DateTime<Utc>,
) -> Transition {
    if !state.phase.accepts_input() {
        return Transition::rejected(state, Rejection::WrongPhase(state.phase));
    }
    let text = text.trim();
    if text.is_empty() {
        return Transition::rejected(state, Rejection::EmptyResponse);
    }

    let mut next = state.clone();
    let mut effects = Vec::with_capacity(2);

    next.append(Speaker::Respondent, text.to_string(), at);
    next.current_prompt_index += 1;

    // Boundaries are strictly increasing and the index moves one step at a
    // time, so at most the boundary at the new index can be uncrossed.
    if let Some(section) = script.section_starting_at(next.current_prompt_index) {
        if !next.has_crossed(&section.section_id) {
            next.crossed_sections.push(section.section_id.clone());
            next.section_markers.push(SectionMarker {
                section_id: section.section_id.clone(),
                position: next.transcript.len(),
            });
            effects.push(Effect::SectionStarted {
                section_id: section.section_id.clone(),
            });
        }
    }

    next.phase = Phase::Thinking;
    effects.push(Effect::ScheduleThinking);
    Transition::accepted(next, effects)
}

fn resolve_thinking(
    state: &ConversationState,
    script: &PromptScript,
    at: DateTime<Utc>,
) -> Transition {
    if state.phase != Phase::Thinking {
        return Transition::rejected(state, Rejection::WrongPhase(state.phase));
    }

    let mut next = state.clone();
    match script.prompt(next.current_prompt_index) {
        Some(prompt) => {
            next.append(Speaker::Prompter, prompt.text.clone(), at);
            next.phase = Phase::AwaitingInput;
            Transition::accepted(next, Vec::new())
        }
        None => {
            // The closing entry lands before the completion flag is set.
            next.append(Speaker::Prompter, script.closing().to_string(), at);
            next.is_complete = true;
            next.phase = Phase::Complete;
            Transition::accepted(next, vec![Effect::ScheduleOfferReveal])
        }
    }
}

fn reveal_offer(state: &ConversationState) -> Transition {
    if state.phase != Phase::Complete {
        return Transition::rejected(state, Rejection::WrongPhase(state.phase));
    }
    let mut next = state.clone();
    next.offer_revealed = true;
    next.phase = Phase::OfferRevealed;
    Transition::accepted(next, Vec::new())
}

/// Fold a sequence of events over a fresh state, discarding effects.
///
/// Useful for rebuilding a state from a recorded event log.
pub fn replay(
    script: &PromptScript,
    started_at: DateTime<Utc>,
    events: impl IntoIterator<Item = Event>,
) -> ConversationState {
    events
        .into_iter()
        .fold(ConversationState::new(script, started_at), |state, event| {
            let name = event.name();
            let transition = reduce(&state, script, event);
            if let Outcome::Rejected(reason) = transition.outcome {
                tracing::trace!(event = name, %reason, "Replay skipped rejected event");
            }
            transition.state
        })
}
