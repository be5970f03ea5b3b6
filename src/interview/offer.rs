//! The coaching-plan offer revealed after the interview completes.

use serde::{Deserialize, Serialize};

/// Placeholder replaced with the respondent's name in the headline.
const NAME_PLACEHOLDER: &str = "{name}";

/// Static offer content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferContent {
    /// Headline; `{name}` is replaced with the respondent's name.
    pub headline: String,
    /// Coaching modules, in order.
    pub modules: Vec<String>,
    pub call_to_action: String,
}

impl OfferContent {
    /// Headline addressed to `name`.
    pub fn headline_for(&self, name: &str) -> String {
        self.headline.replace(NAME_PLACEHOLDER, name)
    }
}

impl Default for OfferContent {
    fn default() -> Self {
        Self {
            headline: "{name}, are you ready to see your personalized coaching plan?".to_string(),
            modules: vec![
                "The Performance Paradox".to_string(),
                "The Family Factor".to_string(),
                "The Decisive Move".to_string(),
            ],
            call_to_action: "See my plan".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_is_personalized() {
        let offer = OfferContent::default();
        assert_eq!(
            offer.headline_for("Sarah"),
            "Sarah, are you ready to see your personalized coaching plan?"
        );
        assert_eq!(offer.modules.len(), 3);
    }

    #[test]
    fn headline_without_placeholder_is_unchanged() {
        let offer = OfferContent {
            headline: "Your plan is ready".to_string(),
            ..Default::default()
        };
        assert_eq!(offer.headline_for("Sarah"), "Your plan is ready");
    }
}
