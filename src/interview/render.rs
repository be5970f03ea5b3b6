//! Transcript rendering — a pure function of a snapshot plus static content.
//!
//! Rendering is append-only as the conversation advances: the blocks for a
//! later snapshot always start with the blocks of an earlier one, so a
//! terminal can print just the new tail.

use std::fmt;

use serde::Serialize;

use super::offer::OfferContent;
use super::script::PromptScript;
use super::state::{Snapshot, Speaker};

/// One visual element of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Welcome {
        text: String,
    },
    SectionDivider {
        title: String,
        subtitle: Option<String>,
    },
    Message {
        speaker: Speaker,
        text: String,
    },
    Offer {
        headline: String,
        modules: Vec<String>,
        call_to_action: String,
    },
}

/// Transient indicator shown below the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The next prompt is on its way.
    Typing,
    /// Completed; the offer is about to appear.
    Analyzing,
}

impl Status {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Typing => "...",
            Self::Analyzing => "Analyzing your responses...",
        }
    }
}

/// Render the transcript with section dividers interleaved.
pub fn render(
    snapshot: &Snapshot,
    script: &PromptScript,
    offer: &OfferContent,
    respondent_name: &str,
) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(snapshot.transcript.len() + snapshot.section_markers.len() + 2);

    if let Some(intro) = script.intro() {
        blocks.push(Block::Welcome {
            text: intro.to_string(),
        });
    }

    let mut markers = snapshot.section_markers.iter().peekable();
    for (position, entry) in snapshot.transcript.iter().enumerate() {
        while let Some(marker) = markers.next_if(|m| m.position <= position) {
            blocks.extend(divider(script, &marker.section_id));
        }
        blocks.push(Block::Message {
            speaker: entry.speaker,
            text: entry.text.clone(),
        });
    }
    // Markers for a prompt that has not arrived yet.
    for marker in markers {
        blocks.extend(divider(script, &marker.section_id));
    }

    if snapshot.offer_revealed {
        blocks.push(Block::Offer {
            headline: offer.headline_for(respondent_name),
            modules: offer.modules.clone(),
            call_to_action: offer.call_to_action.clone(),
        });
    }

    blocks
}

fn divider(script: &PromptScript, section_id: &str) -> Option<Block> {
    script.section(section_id).map(|s| Block::SectionDivider {
        title: s.title.clone(),
        subtitle: s.subtitle.clone(),
    })
}

/// The transient indicator for a snapshot, if any.
pub fn status_line(snapshot: &Snapshot) -> Option<Status> {
    if snapshot.is_awaiting_response {
        Some(Status::Typing)
    } else if snapshot.is_complete && !snapshot.offer_revealed {
        Some(Status::Analyzing)
    } else {
        None
    }
}

/// Share of prompts answered, capped at 100.
pub fn progress_percent(snapshot: &Snapshot) -> u8 {
    if snapshot.script_len == 0 {
        return 100;
    }
    let pct = snapshot.current_prompt_index * 100 / snapshot.script_len;
    pct.min(100) as u8
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Welcome { text } => write!(f, "{text}"),
            Self::SectionDivider { title, subtitle } => {
                write!(f, "──── {} ────", title.to_uppercase())?;
                if let Some(subtitle) = subtitle {
                    write!(f, "\n     {subtitle}")?;
                }
                Ok(())
            }
            Self::Message { speaker, text } => match speaker {
                Speaker::Prompter => write!(f, "Interviewer: {text}"),
                Speaker::Respondent => write!(f, "You: {text}"),
            },
            Self::Offer {
                headline,
                modules,
                call_to_action,
            } => {
                writeln!(f, "{headline}")?;
                for (i, module) in modules.iter().enumerate() {
                    writeln!(f, "  MODULE {}: {module}", i + 1)?;
                }
                write!(f, "[ {call_to_action} ]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::interview::machine::{reduce, Event};
    use crate::interview::script::SectionBoundary;
    use crate::interview::state::ConversationState;

    fn two_section_script() -> PromptScript {
        PromptScript::new(
            vec!["P0".into(), "P1".into(), "P2".into(), "P3".into()],
            vec![
                SectionBoundary::new("a", "Alpha", Some("first"), 0),
                SectionBoundary::new("b", "Beta", None, 2),
            ],
            "Done",
        )
        .unwrap()
        .with_intro("Welcome")
    }

    fn advance(state: ConversationState, script: &PromptScript, event: Event) -> ConversationState {
        reduce(&state, script, event).state
    }

    fn titles(blocks: &[Block]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| match b {
                Block::Welcome { .. } => "welcome".to_string(),
                Block::SectionDivider { title, .. } => format!("#{title}"),
                Block::Message { text, .. } => text.clone(),
                Block::Offer { .. } => "offer".to_string(),
            })
            .collect()
    }

    #[test]
    fn initial_render_has_welcome_divider_and_first_prompt() {
        let script = two_section_script();
        let state = ConversationState::new(&script, Utc::now());
        let blocks = render(&state.snapshot(Uuid::nil()), &script, &OfferContent::default(), "Sam");

        assert_eq!(titles(&blocks), ["welcome", "#Alpha", "P0"]);
    }

    #[test]
    fn divider_precedes_prompt_of_new_section() {
        let script = two_section_script();
        let mut state = ConversationState::new(&script, Utc::now());
        state = advance(state, &script, Event::submit("r0"));
        state = advance(state, &script, Event::thinking_elapsed());
        state = advance(state, &script, Event::submit("r1"));

        // Thinking: divider already shown, prompt still pending.
        let blocks = render(&state.snapshot(Uuid::nil()), &script, &OfferContent::default(), "Sam");
        assert_eq!(titles(&blocks), ["welcome", "#Alpha", "P0", "r0", "P1", "r1", "#Beta"]);

        state = advance(state, &script, Event::thinking_elapsed());
        let after = render(&state.snapshot(Uuid::nil()), &script, &OfferContent::default(), "Sam");
        assert_eq!(
            titles(&after),
            ["welcome", "#Alpha", "P0", "r0", "P1", "r1", "#Beta", "P2"]
        );
        assert!(after.starts_with(&blocks), "rendering must be append-only");
    }

    #[test]
    fn offer_only_after_reveal() {
        let script = PromptScript::new(
            vec!["Only".into()],
            vec![SectionBoundary::new("a", "Alpha", None, 0)],
            "Done",
        )
        .unwrap();
        let offer = OfferContent::default();
        let mut state = ConversationState::new(&script, Utc::now());
        state = advance(state, &script, Event::submit("answer"));
        state = advance(state, &script, Event::thinking_elapsed());

        let snap = state.snapshot(Uuid::nil());
        assert_eq!(status_line(&snap), Some(Status::Analyzing));
        assert!(!render(&snap, &script, &offer, "Sam")
            .iter()
            .any(|b| matches!(b, Block::Offer { .. })));

        state = advance(state, &script, Event::RevealOffer);
        let snap = state.snapshot(Uuid::nil());
        assert_eq!(status_line(&snap), None);
        match render(&snap, &script, &offer, "Sam").last().unwrap() {
            Block::Offer { headline, modules, .. } => {
                assert!(headline.starts_with("Sam,"));
                assert_eq!(modules.len(), 3);
            }
            other => panic!("expected offer block, got {other:?}"),
        }
    }

    #[test]
    fn status_and_progress_follow_state() {
        let script = two_section_script();
        let state = ConversationState::new(&script, Utc::now());
        let snap = state.snapshot(Uuid::nil());
        assert_eq!(status_line(&snap), None);
        assert_eq!(progress_percent(&snap), 0);

        let state = advance(state, &script, Event::submit("r0"));
        let snap = state.snapshot(Uuid::nil());
        assert_eq!(status_line(&snap), Some(Status::Typing));
        assert_eq!(progress_percent(&snap), 25);
    }

    #[test]
    fn blocks_display_for_terminal() {
        let divider = Block::SectionDivider {
            title: "The Catalyst".into(),
            subtitle: Some("What changed".into()),
        };
        assert_eq!(divider.to_string(), "──── THE CATALYST ────\n     What changed");

        let msg = Block::Message {
            speaker: Speaker::Respondent,
            text: "hi".into(),
        };
        assert_eq!(msg.to_string(), "You: hi");

        let offer = Block::Offer {
            headline: "Ready?".into(),
            modules: vec!["One".into()],
            call_to_action: "Go".into(),
        };
        assert_eq!(offer.to_string(), "Ready?\n  MODULE 1: One\n[ Go ]");
    }
}
