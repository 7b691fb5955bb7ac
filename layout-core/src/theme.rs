//! Global style tokens and their propagation into section content.

use serde::{Deserialize, Serialize};

use crate::section::{Section, SectionKind};

/// Menu-wide style tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleTokens {
    /// Page background.
    pub background_color: String,
    /// Card and block background.
    pub card_color: String,
    /// Body text color.
    pub text_color: String,
    /// Accent color used by headers.
    pub primary_color: String,
    /// Shadow depth of cards.
    pub elevation: u8,
    /// Corner radius in pixels.
    pub border_radius: f32,
}

impl Default for StyleTokens {
    fn default() -> Self {
        Self {
            background_color: "#FFFFFF".to_string(),
            card_color: "#F5F5F5".to_string(),
            text_color: "#212121".to_string(),
            primary_color: "#1976D2".to_string(),
            elevation: 1,
            border_radius: 8.0,
        }
    }
}

/// Applies style tokens to sections without touching geometry or text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThemeApplier;

impl ThemeApplier {
    /// Return restyled copies of `sections`.
    ///
    /// Only color and corner-radius fields change. Sections without content
    /// pass through unchanged.
    #[must_use]
    pub fn apply(sections: &[Section], tokens: &StyleTokens) -> Vec<Section> {
        sections
            .iter()
            .map(|section| Self::apply_one(section, tokens))
            .collect()
    }

    fn apply_one(section: &Section, tokens: &StyleTokens) -> Section {
        let mut styled = section.clone();
        let Some(content) = styled.content.as_mut() else {
            return styled;
        };
        let (background, text) = match section.kind {
            SectionKind::Category => (&tokens.primary_color, &tokens.card_color),
            SectionKind::Items => (&tokens.background_color, &tokens.text_color),
            SectionKind::Ad | SectionKind::Promotion | SectionKind::Special => {
                (&tokens.card_color, &tokens.text_color)
            }
        };
        content.background_color.clone_from(background);
        content.text_color.clone_from(text);
        content.border_radius = tokens.border_radius;
        styled
    }
}
