use std::collections::BTreeMap;

use time::Date;

use crate::location::NormalizedLocations;

/// How location columns are addressed in SQL.
///
/// `Joined` targets the normalized schema where transactions join a location
/// row per scope; `Denormalized` targets the flattened search table where the
/// same values live on prefixed columns of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
	Joined,
	Denormalized,
}

/// Which location of a transaction a filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationScope {
	PlaceOfPerformance,
	RecipientLocation,
}
impl LocationScope {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"pop" | "place_of_performance" => Some(Self::PlaceOfPerformance),
			"recipient_location" => Some(Self::RecipientLocation),
			_ => None,
		}
	}

	/// Relation name in joined mode.
	pub fn relation(self) -> &'static str {
		match self {
			Self::PlaceOfPerformance => "place_of_performance",
			Self::RecipientLocation => "recipient_location",
		}
	}

	/// Column prefix in denormalized mode, also the field prefix in the
	/// search index.
	pub fn prefix(self) -> &'static str {
		match self {
			Self::PlaceOfPerformance => "pop",
			Self::RecipientLocation => "recipient_location",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocationField {
	CountryCode,
	StateCode,
	Zip5,
	CountyCode,
	CongressionalCode,
}
impl LocationField {
	fn column(self, mode: AddressingMode) -> &'static str {
		match self {
			// The joined schema kept the legacy column name.
			Self::CountryCode => match mode {
				AddressingMode::Joined => "location_country_code",
				AddressingMode::Denormalized => "country_code",
			},
			Self::StateCode => "state_code",
			Self::Zip5 => "zip5",
			Self::CountyCode => "county_code",
			Self::CongressionalCode => "congressional_code",
		}
	}
}

fn column(scope: LocationScope, field: LocationField, mode: AddressingMode) -> String {
	match mode {
		AddressingMode::Joined => format!("{}.{}", scope.relation(), field.column(mode)),
		AddressingMode::Denormalized => format!("{}_{}", scope.prefix(), field.column(mode)),
	}
}

/// Boolean predicate tree over transaction rows. Rendering to SQL is a
/// separate step so trees can be combined and inspected first.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	And(Vec<Predicate>),
	Or(Vec<Predicate>),
	Not(Box<Predicate>),
	Exact { column: String, value: String },
	InText { column: String, values: Vec<String> },
	InIds { column: String, ids: Vec<i64> },
	DateRange { column: String, start: Date, end: Date },
	/// Matches no rows. Produced when a city filter resolved to zero ids.
	MatchNothing,
}
impl Predicate {
	pub fn to_sql(&self) -> SqlPredicate {
		let mut binds = Vec::new();
		let clause = render(self, &mut binds);

		SqlPredicate { clause, binds }
	}
}

/// Rendered predicate: a clause with `$n` placeholders plus the values to
/// bind, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPredicate {
	pub clause: String,
	pub binds: Vec<Bind>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
	Text(String),
	TextArray(Vec<String>),
	IdArray(Vec<i64>),
	Date(Date),
}

fn render(predicate: &Predicate, binds: &mut Vec<Bind>) -> String {
	match predicate {
		Predicate::And(items) => render_group(items, " AND ", "TRUE", binds),
		Predicate::Or(items) => render_group(items, " OR ", "FALSE", binds),
		Predicate::Not(inner) => format!("NOT ({})", render(inner, binds)),
		Predicate::Exact { column, value } => {
			binds.push(Bind::Text(value.clone()));

			format!("{column} = ${}", binds.len())
		},
		Predicate::InText { column, values } =>
			if values.is_empty() {
				"FALSE".to_string()
			} else {
				binds.push(Bind::TextArray(values.clone()));

				format!("{column} = ANY(${})", binds.len())
			},
		Predicate::InIds { column, ids } =>
			if ids.is_empty() {
				"FALSE".to_string()
			} else {
				binds.push(Bind::IdArray(ids.clone()));

				format!("{column} = ANY(${})", binds.len())
			},
		Predicate::DateRange { column, start, end } => {
			binds.push(Bind::Date(*start));

			let start_placeholder = binds.len();

			binds.push(Bind::Date(*end));

			format!("({column} >= ${start_placeholder} AND {column} <= ${})", binds.len())
		},
		Predicate::MatchNothing => "FALSE".to_string(),
	}
}

fn render_group(
	items: &[Predicate],
	separator: &str,
	empty: &str,
	binds: &mut Vec<Bind>,
) -> String {
	match items {
		[] => empty.to_string(),
		[only] => render(only, binds),
		_ => {
			let rendered =
				items.iter().map(|item| render(item, binds)).collect::<Vec<_>>().join(separator);

			format!("({rendered})")
		},
	}
}

/// City names resolved to transaction ids, keyed by `(country, state)`.
/// Groups with no entry (or an empty id set) compile to [`Predicate::MatchNothing`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedCities {
	sets: BTreeMap<(String, Option<String>), Vec<i64>>,
}
impl ResolvedCities {
	pub fn insert(
		&mut self,
		country: &str,
		state: Option<&str>,
		ids: impl IntoIterator<Item = i64>,
	) {
		let set =
			self.sets.entry((country.to_string(), state.map(str::to_string))).or_default();

		set.extend(ids);
		set.sort_unstable();
		set.dedup();
	}

	fn ids_for(&self, country: &str, state: Option<&str>) -> Option<&[i64]> {
		self.sets
			.get(&(country.to_string(), state.map(str::to_string)))
			.map(Vec::as_slice)
			.filter(|ids| !ids.is_empty())
	}
}

/// Compiles the nested location structure into a predicate tree.
///
/// Countries OR together; within a country the zip, state, and city branches
/// OR together under an ANDed country match; within a state the county,
/// district, and city branches OR together under an ANDed state match. A
/// state with no inner filters matches the whole state.
pub fn compile_locations(
	locations: &NormalizedLocations,
	scope: LocationScope,
	mode: AddressingMode,
	id_column: &str,
	cities: &ResolvedCities,
) -> Predicate {
	if locations.is_empty() {
		return Predicate::And(Vec::new());
	}

	let mut country_branches = Vec::new();

	for (country, bucket) in locations.countries() {
		let country_match = Predicate::Exact {
			column: column(scope, LocationField::CountryCode, mode),
			value: country.to_string(),
		};
		let mut inner = Vec::new();

		if !bucket.zips.is_empty() {
			inner.push(Predicate::InText {
				column: column(scope, LocationField::Zip5, mode),
				values: bucket.zips.clone(),
			});
		}

		for (state, state_bucket) in &bucket.states {
			let state_match = Predicate::Exact {
				column: column(scope, LocationField::StateCode, mode),
				value: state.clone(),
			};
			let mut parts = Vec::new();

			if !state_bucket.counties.is_empty() {
				parts.push(Predicate::InText {
					column: column(scope, LocationField::CountyCode, mode),
					values: state_bucket.counties.clone(),
				});
			}
			if !state_bucket.districts.is_empty() {
				parts.push(Predicate::InText {
					column: column(scope, LocationField::CongressionalCode, mode),
					values: state_bucket.districts.clone(),
				});
			}
			if !state_bucket.cities.is_empty() {
				parts.push(city_predicate(cities, country, Some(state), id_column));
			}

			inner.push(if parts.is_empty() {
				state_match
			} else {
				Predicate::And(vec![state_match, Predicate::Or(parts)])
			});
		}

		if !bucket.cities.is_empty() {
			inner.push(city_predicate(cities, country, None, id_column));
		}

		country_branches.push(if inner.is_empty() {
			country_match
		} else {
			Predicate::And(vec![country_match, Predicate::Or(inner)])
		});
	}

	Predicate::Or(country_branches)
}

fn city_predicate(
	cities: &ResolvedCities,
	country: &str,
	state: Option<&str>,
	id_column: &str,
) -> Predicate {
	match cities.ids_for(country, state) {
		Some(ids) => Predicate::InIds { column: id_column.to_string(), ids: ids.to_vec() },
		None => Predicate::MatchNothing,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::location::LocationFilterRequest;

	fn normalized(requests: &[LocationFilterRequest]) -> NormalizedLocations {
		NormalizedLocations::build(requests).expect("valid filters")
	}

	#[test]
	fn county_filter_compiles_to_nested_clause() {
		let locations = normalized(&[LocationFilterRequest {
			country: Some("USA".to_string()),
			state: Some("VA".to_string()),
			county: vec!["059".to_string()],
			..Default::default()
		}]);
		let sql = compile_locations(
			&locations,
			LocationScope::PlaceOfPerformance,
			AddressingMode::Denormalized,
			"transaction_id",
			&ResolvedCities::default(),
		)
		.to_sql();

		assert_eq!(
			sql.clause,
			"(pop_country_code = $1 AND (pop_state_code = $2 AND pop_county_code = ANY($3)))",
		);
		assert_eq!(
			sql.binds,
			vec![
				Bind::Text("USA".to_string()),
				Bind::Text("VA".to_string()),
				Bind::TextArray(vec!["59".to_string(), "059".to_string(), "59.0".to_string()]),
			],
		);
	}

	#[test]
	fn joined_mode_differs_only_in_column_addressing() {
		let locations = normalized(&[LocationFilterRequest {
			country: Some("USA".to_string()),
			state: Some("VA".to_string()),
			county: vec!["059".to_string()],
			..Default::default()
		}]);
		let cities = ResolvedCities::default();
		let joined = compile_locations(
			&locations,
			LocationScope::PlaceOfPerformance,
			AddressingMode::Joined,
			"transactions.id",
			&cities,
		)
		.to_sql();
		let denormalized = compile_locations(
			&locations,
			LocationScope::PlaceOfPerformance,
			AddressingMode::Denormalized,
			"transaction_id",
			&cities,
		)
		.to_sql();

		assert_eq!(
			joined.clause,
			"(place_of_performance.location_country_code = $1 AND \
			(place_of_performance.state_code = $2 AND place_of_performance.county_code = ANY($3)))",
		);
		assert_eq!(joined.binds, denormalized.binds);
	}

	#[test]
	fn unresolved_city_matches_no_rows() {
		let locations = normalized(&[LocationFilterRequest {
			country: Some("USA".to_string()),
			city: Some("Springfield".to_string()),
			..Default::default()
		}]);
		let sql = compile_locations(
			&locations,
			LocationScope::PlaceOfPerformance,
			AddressingMode::Denormalized,
			"transaction_id",
			&ResolvedCities::default(),
		)
		.to_sql();

		assert_eq!(sql.clause, "(pop_country_code = $1 AND FALSE)");
	}

	#[test]
	fn resolved_city_ids_are_sorted_and_deduplicated() {
		let mut cities = ResolvedCities::default();

		cities.insert("USA", Some("IL"), [7, 3, 7, 1]);

		let locations = normalized(&[LocationFilterRequest {
			country: Some("USA".to_string()),
			state: Some("IL".to_string()),
			city: Some("Chicago".to_string()),
			..Default::default()
		}]);
		let sql = compile_locations(
			&locations,
			LocationScope::PlaceOfPerformance,
			AddressingMode::Denormalized,
			"transaction_id",
			&cities,
		)
		.to_sql();

		assert_eq!(
			sql.clause,
			"(pop_country_code = $1 AND (pop_state_code = $2 AND transaction_id = ANY($3)))",
		);
		assert_eq!(sql.binds[2], Bind::IdArray(vec![1, 3, 7]));
	}

	#[test]
	fn zips_or_with_states_under_the_country_match() {
		let locations = normalized(&[
			LocationFilterRequest {
				country: Some("USA".to_string()),
				zip: Some("22201".to_string()),
				..Default::default()
			},
			LocationFilterRequest {
				country: Some("USA".to_string()),
				state: Some("VA".to_string()),
				..Default::default()
			},
		]);
		let sql = compile_locations(
			&locations,
			LocationScope::PlaceOfPerformance,
			AddressingMode::Denormalized,
			"transaction_id",
			&ResolvedCities::default(),
		)
		.to_sql();

		assert_eq!(
			sql.clause,
			"(pop_country_code = $1 AND (pop_zip5 = ANY($2) OR pop_state_code = $3))",
		);
	}

	#[test]
	fn empty_locations_compile_to_a_no_op() {
		let sql = compile_locations(
			&NormalizedLocations::default(),
			LocationScope::PlaceOfPerformance,
			AddressingMode::Denormalized,
			"transaction_id",
			&ResolvedCities::default(),
		)
		.to_sql();

		assert_eq!(sql.clause, "TRUE");
		assert!(sql.binds.is_empty());
	}

	#[test]
	fn not_wraps_the_inner_clause() {
		let sql = Predicate::Not(Box::new(Predicate::Exact {
			column: "pop_state_code".to_string(),
			value: "VA".to_string(),
		}))
		.to_sql();

		assert_eq!(sql.clause, "NOT (pop_state_code = $1)");
	}
}
