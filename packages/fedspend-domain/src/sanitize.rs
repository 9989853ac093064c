use std::sync::LazyLock;

use regex::Regex;

/// Characters reserved by the search engine's query syntax.
static RESERVED: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"[/:\]\[{}()*+?.\\^$|'"<>!=&~-]"#).expect("valid regex"));

/// Strips search-engine query syntax from user-supplied text before it is
/// embedded in a query body.
pub fn es_sanitize(input: &str) -> String {
	RESERVED.replace_all(input, "").into_owned()
}

/// City names are indexed upper-cased; normalize lookups the same way.
pub fn normalize_city_name(city: &str) -> String {
	es_sanitize(city).to_uppercase()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_reserved_characters() {
		assert_eq!(es_sanitize(r#"Spring*field (IL)?"#), "Springfield IL");
		assert_eq!(es_sanitize("plain text"), "plain text");
	}

	#[test]
	fn city_names_are_uppercased() {
		assert_eq!(normalize_city_name("Springfield"), "SPRINGFIELD");
		assert_eq!(normalize_city_name(r#"o'fallon"#), "OFALLON");
	}
}
