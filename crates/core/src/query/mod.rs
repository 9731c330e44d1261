//! Upstream search expression building.
//!
//! Three shapes: a category query passes the stored hint through verbatim,
//! a primary user search is title-scoped via the `intitle:` operator, and a
//! loose fallback is used when the primary query under-returns.

/// Language restriction applied to every upstream call.
pub const DEFAULT_LANG: &str = "en";
/// Country applied to every upstream call.
pub const DEFAULT_COUNTRY: &str = "US";
/// Upstream page size.
pub const DEFAULT_MAX_RESULTS: u32 = 40;
/// Print type filter.
pub const DEFAULT_PRINT_TYPE: &str = "books";
/// Upstream result ordering.
pub const DEFAULT_ORDER_BY: &str = "relevance";

/// Category query: the hint verbatim, trimmed. Empty hint means the caller
/// must treat the refresh as a no-op.
pub fn build_category_query(query_hint: &str) -> String {
    query_hint.trim().to_string()
}

/// Primary strict search query: `intitle:"<text>"` with quotes escaped.
pub fn build_primary_query(user_text: &str) -> String {
    let trimmed = user_text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("intitle:\"{}\"", escape_quotes(trimmed))
}

/// Enhanced search query restricting by author as well when one is given:
/// `intitle:"<text>" inauthor:"<author>"`.
pub fn build_enhanced_query(user_text: &str, author: Option<&str>) -> String {
    let trimmed = user_text.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match author.map(str::trim).filter(|a| !a.is_empty()) {
        Some(author) => format!(
            "intitle:\"{}\" inauthor:\"{}\"",
            escape_quotes(trimmed),
            escape_quotes(author)
        ),
        None => build_primary_query(trimmed),
    }
}

/// Fallback query: the raw trimmed text, unrestricted. Only used when the
/// primary query under-returns.
pub fn build_fallback_query(user_text: &str) -> String {
    user_text.trim().to_string()
}

fn escape_quotes(text: &str) -> String {
    text.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_query_verbatim() {
        assert_eq!(build_category_query(" subject:romance "), "subject:romance");
        assert_eq!(build_category_query("   "), "");
    }

    #[test]
    fn test_primary_query_title_scoped() {
        assert_eq!(build_primary_query(" dune "), "intitle:\"dune\"");
        assert_eq!(build_primary_query(""), "");
    }

    #[test]
    fn test_primary_query_escapes_quotes() {
        assert_eq!(
            build_primary_query("the \"real\" story"),
            "intitle:\"the \\\"real\\\" story\""
        );
    }

    #[test]
    fn test_enhanced_query_with_author() {
        assert_eq!(
            build_enhanced_query("dune", Some("Frank Herbert")),
            "intitle:\"dune\" inauthor:\"Frank Herbert\""
        );
    }

    #[test]
    fn test_enhanced_query_without_author_matches_primary() {
        assert_eq!(build_enhanced_query("dune", None), build_primary_query("dune"));
        assert_eq!(build_enhanced_query("dune", Some("  ")), "intitle:\"dune\"");
    }

    #[test]
    fn test_fallback_query_raw() {
        assert_eq!(build_fallback_query(" dune messiah "), "dune messiah");
    }
}
