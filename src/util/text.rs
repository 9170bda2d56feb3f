/// Collapses every run of whitespace (spaces, tabs, newlines) into a single
/// space and trims the ends.
///
/// Scraped heading text tends to carry the indentation of the markup it was
/// extracted from; this normalizes it into one readable line.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
