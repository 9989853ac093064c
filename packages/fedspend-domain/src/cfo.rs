//! Default presentation order for toptier agencies: the CFO Act agencies come
//! first in their fixed order, every other agency follows alphabetically by
//! name. Used instead of database order wherever agency lists are returned
//! unsorted.

/// Toptier codes of the CFO Act agencies, in presentation order.
const CFO_AGENCY_CODES: &[&str] = &[
	"012", // Agriculture
	"013", // Commerce
	"097", // Defense
	"091", // Education
	"089", // Energy
	"075", // Health and Human Services
	"070", // Homeland Security
	"086", // Housing and Urban Development
	"014", // Interior
	"015", // Justice
	"016", // Labor
	"019", // State
	"069", // Transportation
	"020", // Treasury
	"036", // Veterans Affairs
	"068", // Environmental Protection Agency
	"080", // National Aeronautics and Space Administration
	"072", // Agency for International Development
	"047", // General Services Administration
	"049", // National Science Foundation
	"031", // Nuclear Regulatory Commission
	"024", // Office of Personnel Management
	"073", // Small Business Administration
	"028", // Social Security Administration
];

pub fn cfo_rank(toptier_code: &str) -> Option<usize> {
	CFO_AGENCY_CODES.iter().position(|code| *code == toptier_code)
}

/// Sorts `items` in place into CFO presentation order. `code` and `name`
/// extract the toptier code and display name of an item.
pub fn presentation_sort<T>(items: &mut [T], code: impl Fn(&T) -> &str, name: impl Fn(&T) -> &str) {
	items.sort_by(|a, b| {
		let rank_a = cfo_rank(code(a));
		let rank_b = cfo_rank(code(b));

		match (rank_a, rank_b) {
			(Some(a), Some(b)) => a.cmp(&b),
			(Some(_), None) => std::cmp::Ordering::Less,
			(None, Some(_)) => std::cmp::Ordering::Greater,
			(None, None) => name(a).cmp(name(b)).then_with(|| code(a).cmp(code(b))),
		}
	});
}
