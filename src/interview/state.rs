//! Conversation state — phase, transcript, and crossed sections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::script::PromptScript;

/// The phases of an interview.
///
/// Progresses AwaitingInput ⇄ Thinking until the script runs out, then
/// Thinking → Complete → OfferRevealed. `Complete` covers the window in which
/// the offer reveal is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// A prompt is showing and the respondent may answer.
    AwaitingInput,
    /// A response was accepted; the next prompt is being "thought about".
    Thinking,
    /// The closing message was delivered; the offer reveal is pending.
    Complete,
    /// The offer is showing. Nothing else happens in this session.
    OfferRevealed,
}

impl Phase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, target),
            (AwaitingInput, Thinking)
                | (Thinking, AwaitingInput)
                | (Thinking, Complete)
                | (Complete, OfferRevealed)
        )
    }

    /// Whether the interview is over (no further submissions accepted).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::OfferRevealed)
    }

    /// Whether a submission would be accepted in this phase.
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::AwaitingInput)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::AwaitingInput
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingInput => "awaiting_input",
            Self::Thinking => "thinking",
            Self::Complete => "complete",
            Self::OfferRevealed => "offer_revealed",
        };
        write!(f, "{s}")
    }
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Prompter,
    Respondent,
}

/// One turn in the conversation. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Monotonic; equal to the entry's position in the transcript.
    pub id: u64,
    pub speaker: Speaker,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A section divider placed before the transcript entry at `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMarker {
    pub section_id: String,
    pub position: usize,
}

/// Full conversation state. Mutated only through [`super::machine::reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    pub(crate) phase: Phase,
    pub(crate) transcript: Vec<TranscriptEntry>,
    pub(crate) section_markers: Vec<SectionMarker>,
    pub(crate) crossed_sections: Vec<String>,
    pub(crate) current_prompt_index: usize,
    pub(crate) script_len: usize,
    pub(crate) is_complete: bool,
    pub(crate) offer_revealed: bool,
}

impl ConversationState {
    /// Fresh state: first prompt already shown, first section already crossed.
    pub fn new(script: &PromptScript, at: DateTime<Utc>) -> Self {
        let first_section = script.first_section();
        let mut state = Self {
            phase: Phase::default(),
            transcript: Vec::with_capacity(script.len() * 2 + 1),
            section_markers: vec![SectionMarker {
                section_id: first_section.section_id.clone(),
                position: 0,
            }],
            crossed_sections: vec![first_section.section_id.clone()],
            current_prompt_index: 0,
            script_len: script.len(),
            is_complete: false,
            offer_revealed: false,
        };
        if let Some(first) = script.prompt(0) {
            state.append(Speaker::Prompter, first.text.clone(), at);
        }
        state
    }

    pub(crate) fn append(&mut self, speaker: Speaker, text: String, at: DateTime<Utc>) {
        let id = self.transcript.len() as u64;
        self.transcript.push(TranscriptEntry {
            id,
            speaker,
            text,
            created_at: at,
        });
    }

    pub(crate) fn has_crossed(&self, section_id: &str) -> bool {
        self.crossed_sections.iter().any(|s| s == section_id)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn section_markers(&self) -> &[SectionMarker] {
        &self.section_markers
    }

    pub fn crossed_sections(&self) -> &[String] {
        &self.crossed_sections
    }

    pub fn current_prompt_index(&self) -> usize {
        self.current_prompt_index
    }

    /// The "thinking" lock.
    pub fn is_awaiting_response(&self) -> bool {
        self.phase == Phase::Thinking
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn offer_revealed(&self) -> bool {
        self.offer_revealed
    }

    /// Read-only copy for renderers.
    pub fn snapshot(&self, session_id: Uuid) -> Snapshot {
        Snapshot {
            session_id,
            phase: self.phase,
            transcript: self.transcript.clone(),
            section_markers: self.section_markers.clone(),
            crossed_sections: self.crossed_sections.clone(),
            current_prompt_index: self.current_prompt_index,
            script_len: self.script_len,
            is_awaiting_response: self.is_awaiting_response(),
            is_complete: self.is_complete,
            offer_revealed: self.offer_revealed,
        }
    }
}

/// What a renderer gets after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub session_id: Uuid,
    pub phase: Phase,
    pub transcript: Vec<TranscriptEntry>,
    pub section_markers: Vec<SectionMarker>,
    pub crossed_sections: Vec<String>,
    pub current_prompt_index: usize,
    pub script_len: usize,
    pub is_awaiting_response: bool,
    pub is_complete: bool,
    pub offer_revealed: bool,
}

impl Snapshot {
    /// Whether the input surface should be enabled.
    pub fn accepts_input(&self) -> bool {
        self.phase.accepts_input()
    }

    /// Number of entries spoken by `speaker`.
    pub fn count(&self, speaker: Speaker) -> usize {
        self.transcript.iter().filter(|e| e.speaker == speaker).count()
    }
}
