//! Input validation for untrusted data.
//!
//! Everything arriving over HTTP is checked here before it reaches an engine.

use layout_core::SectionContent;
use thiserror::Error;

/// Maximum length for menu keys.
pub const MAX_MENU_KEY_LEN: usize = 64;
/// Maximum length for section IDs (`category-` / `items-` prefixes included).
pub const MAX_SECTION_ID_LEN: usize = 128;
/// Maximum text length of a section.
pub const MAX_TEXT_LEN: usize = 4096;
/// Maximum length of an image reference.
pub const MAX_IMAGE_URL_LEN: usize = 2048;
/// Maximum length of a designer label.
pub const MAX_TITLE_LEN: usize = 256;
/// Maximum item columns.
pub const MAX_COLUMNS: usize = 12;

/// Validation error types.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Menu key exceeds maximum length.
    #[error("menu_key too long (max {MAX_MENU_KEY_LEN} chars)")]
    MenuKeyTooLong,
    /// Menu key is empty or contains invalid characters.
    #[error("menu_key contains invalid characters")]
    MenuKeyInvalidChars,
    /// Section ID exceeds maximum length.
    #[error("section_id too long (max {MAX_SECTION_ID_LEN} chars)")]
    SectionIdTooLong,
    /// Section ID is empty or contains invalid characters.
    #[error("section_id contains invalid characters")]
    SectionIdInvalidChars,
    /// Text exceeds maximum length.
    #[error("text too long (max {MAX_TEXT_LEN} bytes)")]
    TextTooLong,
    /// Image reference exceeds maximum length.
    #[error("image_url too long (max {MAX_IMAGE_URL_LEN} bytes)")]
    ImageUrlTooLong,
    /// Title exceeds maximum length.
    #[error("title too long (max {MAX_TITLE_LEN} bytes)")]
    TitleTooLong,
    /// Color is not a `#RGB`, `#RRGGBB` or `#RRGGBBAA` hex string.
    #[error("invalid color: {0}")]
    InvalidColor(String),
    /// A numeric style value is negative or not finite.
    #[error("invalid {0}: must be finite and non-negative")]
    InvalidMeasure(&'static str),
    /// Pointer coordinates are not finite.
    #[error("pointer coordinates must be finite")]
    InvalidPointer,
    /// Column count out of range.
    #[error("columns must be between 1 and {MAX_COLUMNS}")]
    InvalidColumns,
    /// A required request field is missing.
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Check if a character is valid for IDs (alphanumeric, hyphen, or underscore).
fn is_valid_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Validate a menu key.
///
/// Valid menu keys:
/// - 1-64 characters
/// - Alphanumeric, hyphen, underscore only
///
/// # Errors
///
/// Returns [`ValidationError::MenuKeyTooLong`] if the key exceeds 64 characters.
/// Returns [`ValidationError::MenuKeyInvalidChars`] if the key is empty or
/// contains invalid characters.
pub fn validate_menu_key(key: &str) -> Result<(), ValidationError> {
    if key.len() > MAX_MENU_KEY_LEN {
        return Err(ValidationError::MenuKeyTooLong);
    }
    if key.is_empty() || !key.chars().all(is_valid_id_char) {
        return Err(ValidationError::MenuKeyInvalidChars);
    }
    Ok(())
}

/// Validate a section ID.
///
/// # Errors
///
/// Returns [`ValidationError::SectionIdTooLong`] or
/// [`ValidationError::SectionIdInvalidChars`].
pub fn validate_section_id(id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_SECTION_ID_LEN {
        return Err(ValidationError::SectionIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::SectionIdInvalidChars);
    }
    Ok(())
}

/// Validate a hex color.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidColor`].
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| {
            matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
        });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor(color.to_string()))
    }
}

fn validate_measure(name: &'static str, value: f32) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidMeasure(name))
    }
}

/// Validate section content before it is stored.
///
/// # Errors
///
/// Returns the first failing check.
pub fn validate_content(content: &SectionContent) -> Result<(), ValidationError> {
    if content.text.len() > MAX_TEXT_LEN
        || content.subtitle.as_ref().is_some_and(|s| s.len() > MAX_TEXT_LEN)
    {
        return Err(ValidationError::TextTooLong);
    }
    if content
        .image_url
        .as_ref()
        .is_some_and(|u| u.len() > MAX_IMAGE_URL_LEN)
    {
        return Err(ValidationError::ImageUrlTooLong);
    }
    validate_color(&content.background_color)?;
    validate_color(&content.text_color)?;
    validate_measure("font_size", content.font_size)?;
    validate_measure("border_radius", content.border_radius)?;
    validate_measure("padding", content.padding)?;
    Ok(())
}

/// Validate a designer label.
///
/// # Errors
///
/// Returns [`ValidationError::TitleTooLong`].
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.len() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

/// Validate pointer coordinates.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPointer`] for NaN or infinite values.
pub fn validate_pointer(x: f32, y: f32) -> Result<(), ValidationError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::InvalidPointer)
    }
}

/// Validate an item column count.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidColumns`].
pub fn validate_columns(columns: usize) -> Result<(), ValidationError> {
    if (1..=MAX_COLUMNS).contains(&columns) {
        Ok(())
    } else {
        Err(ValidationError::InvalidColumns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_menu_keys() {
        assert!(validate_menu_key("dinner").is_ok());
        assert!(validate_menu_key("lunch-2024").is_ok());
        assert!(validate_menu_key("menu_v2").is_ok());
        assert!(validate_menu_key("A").is_ok());
    }

    #[test]
    fn test_invalid_menu_keys() {
        assert!(validate_menu_key("").is_err());
        assert!(validate_menu_key("has spaces").is_err());
        assert!(validate_menu_key("../../../etc/passwd").is_err());
        assert!(validate_menu_key("path\\traversal").is_err());
        assert!(validate_menu_key("contains<script>").is_err());
    }

    #[test]
    fn test_menu_key_boundary() {
        let at_limit = "x".repeat(MAX_MENU_KEY_LEN);
        assert!(validate_menu_key(&at_limit).is_ok());

        let over_limit = "x".repeat(MAX_MENU_KEY_LEN + 1);
        assert!(matches!(
            validate_menu_key(&over_limit),
            Err(ValidationError::MenuKeyTooLong)
        ));
    }

    #[test]
    fn test_section_ids() {
        assert!(validate_section_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_section_id("category-mains").is_ok());
        assert!(validate_section_id("items-mains").is_ok());
        assert!(validate_section_id("").is_err());
        assert!(validate_section_id("a/b").is_err());
    }

    #[test]
    fn test_colors() {
        assert!(validate_color("#fff").is_ok());
        assert!(validate_color("#1976D2").is_ok());
        assert!(validate_color("#1976D2CC").is_ok());
        assert!(validate_color("1976D2").is_err());
        assert!(validate_color("#12345").is_err());
        assert!(validate_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_content() {
        assert!(validate_content(&SectionContent::text("Happy hour")).is_ok());

        let long = SectionContent::text("x".repeat(MAX_TEXT_LEN + 1));
        assert!(matches!(
            validate_content(&long),
            Err(ValidationError::TextTooLong)
        ));

        let mut negative = SectionContent::text("x");
        negative.padding = -1.0;
        assert!(matches!(
            validate_content(&negative),
            Err(ValidationError::InvalidMeasure("padding"))
        ));

        let mut nan = SectionContent::text("x");
        nan.font_size = f32::NAN;
        assert!(validate_content(&nan).is_err());
    }

    #[test]
    fn test_pointer_and_columns() {
        assert!(validate_pointer(-10.0, 400.0).is_ok());
        assert!(validate_pointer(f32::INFINITY, 0.0).is_err());
        assert!(validate_columns(1).is_ok());
        assert!(validate_columns(MAX_COLUMNS).is_ok());
        assert!(validate_columns(0).is_err());
        assert!(validate_columns(MAX_COLUMNS + 1).is_err());
    }
}
