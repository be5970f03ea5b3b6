//! Prompt script — the static, ordered questions that drive an interview.
//!
//! A script is validated once at construction. Everything downstream relies on
//! the invariants checked here: at least one prompt, a first section starting
//! at prompt 0, strictly increasing section starts that all point at a prompt.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScriptError;

/// One question in the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// 0-based position in the script.
    pub index: usize,
    /// Text shown to the respondent.
    pub text: String,
}

/// A named phase of the conversation starting at a given prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBoundary {
    /// Stable identifier, e.g. "catalyst".
    pub section_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Index of the first prompt in this section.
    pub starts_at: usize,
}

impl SectionBoundary {
    pub fn new(
        section_id: impl Into<String>,
        title: impl Into<String>,
        subtitle: Option<&str>,
        starts_at: usize,
    ) -> Self {
        Self {
            section_id: section_id.into(),
            title: title.into(),
            subtitle: subtitle.map(String::from),
            starts_at,
        }
    }
}

/// Serialized form of a script, as read from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDefinition {
    /// Shown above the transcript before the first prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    pub prompts: Vec<String>,
    pub sections: Vec<SectionBoundary>,
    /// Delivered once after the last response, before completion is surfaced.
    pub closing: String,
}

/// A validated prompt script.
#[derive(Debug, Clone)]
pub struct PromptScript {
    intro: Option<String>,
    prompts: Vec<Prompt>,
    sections: Vec<SectionBoundary>,
    closing: String,
    /// `section_at[i]` is the slot in `sections` of the boundary starting at
    /// prompt `i`, if any. Length is `prompts.len() + 1`.
    section_at: Vec<Option<usize>>,
}

impl PromptScript {
    /// Build a script, rejecting any definition that breaks the script
    /// invariants.
    pub fn new(
        prompts: Vec<String>,
        sections: Vec<SectionBoundary>,
        closing: impl Into<String>,
    ) -> Result<Self, ScriptError> {
        Self::from_definition(ScriptDefinition {
            intro: None,
            prompts,
            sections,
            closing: closing.into(),
        })
    }

    /// Validate a deserialized definition.
    pub fn from_definition(def: ScriptDefinition) -> Result<Self, ScriptError> {
        if def.prompts.is_empty() {
            return Err(ScriptError::Empty);
        }
        if let Some(index) = def.prompts.iter().position(|p| p.trim().is_empty()) {
            return Err(ScriptError::BlankPrompt { index });
        }
        if def.closing.trim().is_empty() {
            return Err(ScriptError::BlankClosing);
        }

        match def.sections.first() {
            None => return Err(ScriptError::MissingFirstSection),
            Some(first) if first.starts_at != 0 => {
                return Err(ScriptError::FirstSectionNotAtZero {
                    starts_at: first.starts_at,
                });
            }
            Some(_) => {}
        }

        let len = def.prompts.len();
        let mut section_at = vec![None; len + 1];
        for (slot, section) in def.sections.iter().enumerate() {
            if section.section_id.trim().is_empty() {
                return Err(ScriptError::BlankSectionId { slot });
            }
            if def.sections[..slot]
                .iter()
                .any(|s| s.section_id == section.section_id)
            {
                return Err(ScriptError::DuplicateSection {
                    section_id: section.section_id.clone(),
                });
            }
            if slot > 0 && section.starts_at <= def.sections[slot - 1].starts_at {
                return Err(ScriptError::SectionsOutOfOrder {
                    section_id: section.section_id.clone(),
                    starts_at: section.starts_at,
                });
            }
            if section.starts_at >= len {
                return Err(ScriptError::SectionPastEnd {
                    section_id: section.section_id.clone(),
                    starts_at: section.starts_at,
                    len,
                });
            }
            section_at[section.starts_at] = Some(slot);
        }

        let prompts = def
            .prompts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Prompt { index, text })
            .collect();

        Ok(Self {
            intro: def.intro,
            prompts,
            sections: def.sections,
            closing: def.closing,
            section_at,
        })
    }

    /// Parse and validate a JSON script definition.
    pub fn from_json_str(json: &str) -> Result<Self, ScriptError> {
        let def: ScriptDefinition =
            serde_json::from_str(json).map_err(|e| ScriptError::Parse(e.to_string()))?;
        Self::from_definition(def)
    }

    /// Load a JSON script definition from disk.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|e| ScriptError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Attach a welcome intro.
    pub fn with_intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = Some(intro.into());
        self
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Always false for a validated script; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn prompt(&self, index: usize) -> Option<&Prompt> {
        self.prompts.get(index)
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn sections(&self) -> &[SectionBoundary] {
        &self.sections
    }

    pub fn intro(&self) -> Option<&str> {
        self.intro.as_deref()
    }

    pub fn closing(&self) -> &str {
        &self.closing
    }

    /// The first section. Always present on a validated script.
    pub fn first_section(&self) -> &SectionBoundary {
        &self.sections[0]
    }

    /// The boundary that starts exactly at prompt `index`.
    pub fn section_starting_at(&self, index: usize) -> Option<&SectionBoundary> {
        self.section_at
            .get(index)
            .copied()
            .flatten()
            .map(|slot| &self.sections[slot])
    }

    /// Look up a section by id.
    pub fn section(&self, section_id: &str) -> Option<&SectionBoundary> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    /// Back to the serializable form.
    pub fn to_definition(&self) -> ScriptDefinition {
        ScriptDefinition {
            intro: self.intro.clone(),
            prompts: self.prompts.iter().map(|p| p.text.clone()).collect(),
            sections: self.sections.clone(),
            closing: self.closing.clone(),
        }
    }

    /// The built-in career intake interview.
    ///
    /// Each prompt after the first carries a short acknowledgement of the
    /// previous answer; there is no language understanding behind it.
    pub fn career_intake() -> Self {
        let def = ScriptDefinition {
            intro: Some(
                "Intake Interview: Understanding Your Situation. A brief conversation to \
                 understand where you are, what's changed, and where you want to go. \
                 About 15 minutes, confidential."
                    .to_string(),
            ),
            prompts: CAREER_INTAKE_PROMPTS.iter().map(|p| p.to_string()).collect(),
            sections: vec![
                SectionBoundary::new("context", "Your Context", Some("Current situation"), 0),
                SectionBoundary::new("catalyst", "The Catalyst", Some("What changed"), 2),
                SectionBoundary::new("vision", "Your Vision", Some("Where you want to go"), 4),
            ],
            closing: CAREER_INTAKE_CLOSING.to_string(),
        };
        match Self::from_definition(def) {
            Ok(script) => script,
            Err(e) => unreachable!("built-in career intake script is invalid: {e}"),
        }
    }
}

const CAREER_INTAKE_PROMPTS: [&str; 7] = [
    "Let's start with the basics. Tell me about your current role. What company are you with, and what's your title?",
    "That's helpful context. How long have you been in this position, and how long with the company overall?",
    "I see. Now, what's prompting you to think about your career right now? Something must have shifted. What changed?",
    "That makes sense. On a scale of 1-10, how urgent does this feel to you? And what's driving that sense of urgency?",
    "I appreciate you sharing that. Here's an important question: if you could wave a magic wand and have your ideal outcome in 6 months, what would that look like?",
    "That's a clear picture. Now, what's the biggest thing holding you back from making a change right now?",
    "Thank you for being so open. Before I share my analysis, is there anything else about your situation I should understand?",
];

const CAREER_INTAKE_CLOSING: &str =
    "Perfect. I have a clear picture now. Give me a moment to analyze what you've shared...";
