/// Textual representations a county or congressional district code may take in
/// storage. The upstream broker is inconsistent about numeric formatting, so a
/// code like "01" may be stored as "1", "01", or "1.0".
///
/// A value that does not coerce to an integer is returned as-is, e.g. "ZZ" for
/// an area without a congressional code.
pub fn code_variants(raw: &str) -> Vec<String> {
	match raw.trim().parse::<i64>() {
		Ok(code) => vec![code.to_string(), raw.to_string(), format!("{code}.0")],
		Err(_) => vec![raw.to_string()],
	}
}
