//! Text sanitization for catalog cell content
//!
//! Catalog cells are compared verbatim against stored reservation keys, so
//! their text is normalized aggressively: HTML entities are decoded and
//! every whitespace character is removed.

/// Remove every whitespace character, keeping all other characters in order
///
/// Uses the Unicode definition of whitespace, so non-breaking spaces and
/// line separators are removed along with tabs and newlines.
///
/// # Examples
///
/// ```
/// use classhold::parser::sanitize::strip_whitespace;
///
/// assert_eq!(strip_whitespace(" 6:00 PM\n\t"), "6:00PM");
/// ```
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Decode HTML entities (named and numeric)
///
/// # Examples
///
/// ```
/// use classhold::parser::sanitize::decode_html_entities;
///
/// assert_eq!(decode_html_entities("Yoga &amp; Pilates"), "Yoga & Pilates");
/// ```
pub fn decode_html_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Decode entities, then strip whitespace
///
/// Decoding runs first so that `&nbsp;` and friends are removed too.
///
/// # Examples
///
/// ```
/// use classhold::parser::sanitize::clean_cell_text;
///
/// assert_eq!(clean_cell_text("Hot&nbsp;Yoga &amp; Core"), "HotYoga&Core");
/// ```
pub fn clean_cell_text(text: &str) -> String {
    strip_whitespace(&decode_html_entities(text))
}
