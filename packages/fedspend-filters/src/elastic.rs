//! Search-engine side of filter compilation. Produces `serde_json` bodies;
//! issuing them is the transport layer's job.
//!
//! Monetary sums are aggregated in integer cents (`_value * 100`) so that
//! float accumulation error cannot leak into reported totals.

use serde_json::{Value, json};
use time::Date;

use fedspend_domain::sanitize::{es_sanitize, normalize_city_name};

use crate::{
	Result,
	location::NormalizedLocations,
	predicate::LocationScope,
	time_period::{TimePeriodFilter, format_date, resolve_time_periods},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgencyType {
	Funding,
	Awarding,
}
impl AgencyType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Funding => "funding",
			Self::Awarding => "awarding",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgencyTier {
	Toptier,
	Subtier,
}
impl AgencyTier {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Toptier => "toptier",
			Self::Subtier => "subtier",
		}
	}
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AgencyFilter {
	#[serde(rename = "type")]
	pub agency_type: AgencyType,
	pub tier: AgencyTier,
	pub name: String,
}

/// Award-level filters shared by the search endpoints. Unknown keys are
/// rejected at the request boundary, not here.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct AwardFilters {
	#[serde(default)]
	pub time_period: Vec<TimePeriodFilter>,
	#[serde(default)]
	pub award_type_codes: Vec<String>,
	#[serde(default)]
	pub agencies: Vec<AgencyFilter>,
	#[serde(default)]
	pub def_codes: Vec<String>,
	pub query: Option<String>,
	#[serde(default)]
	pub place_of_performance_locations: Vec<crate::location::LocationFilterRequest>,
	#[serde(default)]
	pub recipient_locations: Vec<crate::location::LocationFilterRequest>,
}

/// Compiles award filters into the query section of a search request.
/// `query_fields` names the fields a free-text `query` matches against and is
/// endpoint-specific.
pub fn compile_search_query(
	filters: &AwardFilters,
	query_fields: &[&str],
	min_date: Date,
	max_date: Date,
) -> Result<Value> {
	let mut must = Vec::new();
	let mut filter = Vec::new();

	if !filters.time_period.is_empty() {
		let ranges = resolve_time_periods(&filters.time_period, min_date, max_date)?;
		let should = ranges
			.into_iter()
			.map(|range| {
				json!({
					"range": {
						"action_date": {
							"gte": format_date(range.start),
							"lte": format_date(range.end),
						},
					},
				})
			})
			.collect::<Vec<_>>();

		filter.push(json!({ "bool": { "should": should, "minimum_should_match": 1 } }));
	}
	if !filters.award_type_codes.is_empty() {
		filter.push(json!({ "terms": { "type": filters.award_type_codes } }));
	}
	for agency in &filters.agencies {
		let field = format!(
			"{}_{}_agency_name.keyword",
			agency.agency_type.as_str(),
			agency.tier.as_str(),
		);

		must.push(json!({ "match": { field: agency.name } }));
	}
	if !filters.def_codes.is_empty() {
		filter.push(json!({ "terms": { "disaster_emergency_fund_codes": filters.def_codes } }));
	}
	if let Some(query) = filters.query.as_deref().filter(|query| !query.is_empty()) {
		must.push(json!({
			"multi_match": { "query": es_sanitize(query), "fields": query_fields },
		}));
	}
	for (scope, locations) in [
		(LocationScope::PlaceOfPerformance, &filters.place_of_performance_locations),
		(LocationScope::RecipientLocation, &filters.recipient_locations),
	] {
		if !locations.is_empty() {
			filter.push(compile_location_clause(
				&NormalizedLocations::build(locations)?,
				scope,
			));
		}
	}

	Ok(json!({ "bool": { "must": must, "filter": filter } }))
}

/// Search-index rendering of the location structure. Mirrors the relational
/// predicate tree, with city names matched directly on the normalized
/// `city_name` keyword field instead of going through id resolution.
pub fn compile_location_clause(locations: &NormalizedLocations, scope: LocationScope) -> Value {
	let prefix = scope.prefix();
	let mut country_branches = Vec::new();

	for (country, bucket) in locations.countries() {
		let country_match = json!({ "match": { format!("{prefix}_country_code"): country } });
		let mut inner = Vec::new();

		if !bucket.zips.is_empty() {
			inner.push(json!({ "terms": { format!("{prefix}_zip5"): bucket.zips } }));
		}

		for (state, state_bucket) in &bucket.states {
			let state_match = json!({ "match": { format!("{prefix}_state_code"): state } });
			let mut parts = Vec::new();

			if !state_bucket.counties.is_empty() {
				parts.push(json!({
					"terms": { format!("{prefix}_county_code"): state_bucket.counties },
				}));
			}
			if !state_bucket.districts.is_empty() {
				parts.push(json!({
					"terms": { format!("{prefix}_congressional_code"): state_bucket.districts },
				}));
			}
			if !state_bucket.cities.is_empty() {
				parts.push(city_terms(prefix, &state_bucket.cities));
			}

			inner.push(if parts.is_empty() {
				state_match
			} else {
				json!({ "bool": {
					"must": [state_match],
					"filter": [{ "bool": { "should": parts, "minimum_should_match": 1 } }],
				} })
			});
		}

		if !bucket.cities.is_empty() {
			inner.push(city_terms(prefix, &bucket.cities));
		}

		country_branches.push(if inner.is_empty() {
			country_match
		} else {
			json!({ "bool": {
				"must": [country_match],
				"filter": [{ "bool": { "should": inner, "minimum_should_match": 1 } }],
			} })
		});
	}

	json!({ "bool": { "should": country_branches, "minimum_should_match": 1 } })
}

fn city_terms(prefix: &str, cities: &[String]) -> Value {
	let normalized =
		cities.iter().map(|city| normalize_city_name(city)).collect::<Vec<_>>();

	json!({ "terms": { format!("{prefix}_city_name.keyword"): normalized } })
}

/// `size: 0` body carrying only a query and aggregations.
pub fn aggregation_body(query: Value, aggs: Value) -> Value {
	json!({ "size": 0, "query": query, "aggs": aggs })
}

pub fn terms_aggregation(field: &str, size: u64) -> Value {
	json!({ "terms": { "field": field, "size": size } })
}

/// Sum aggregation scaled to integer cents. Read results back through
/// [`cents_to_amount`].
pub fn cents_sum_aggregation(field: &str) -> Value {
	json!({ "sum": { "field": field, "script": "_value * 100" } })
}

pub fn cents_to_amount(cents: f64) -> f64 {
	cents.round() / 100.0
}

pub fn round2(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

/// Lookup query for one city group: exact match on the normalized city name
/// plus its country and optional state context. Every field is sanitized the
/// way the index stores it; city and state codes are upper-cased.
pub fn city_lookup_query(
	scope: LocationScope,
	city: &str,
	country: &str,
	state: Option<&str>,
) -> Value {
	let prefix = scope.prefix();
	let mut must = vec![
		json!({ "match": { format!("{prefix}_city_name.keyword"): normalize_city_name(city) } }),
		json!({ "match": { format!("{prefix}_country_code"): es_sanitize(country) } }),
	];

	if let Some(state) = state {
		must.push(json!({
			"match": { format!("{prefix}_state_code"): es_sanitize(state).to_uppercase() },
		}));
	}

	json!({ "bool": { "must": must } })
}

/// Body that buckets a city's matching records by id. `bucket_size` bounds
/// how many distinct ids one lookup can return.
pub fn city_id_aggregation_body(
	scope: LocationScope,
	id_field: &str,
	city: &str,
	country: &str,
	state: Option<&str>,
	bucket_size: u64,
) -> Value {
	aggregation_body(
		city_lookup_query(scope, city, country, state),
		json!({ "id_groups": terms_aggregation(id_field, bucket_size) }),
	)
}

/// Body for a deterministic `search_after` scan over a city's records.
pub fn city_scan_body(
	scope: LocationScope,
	city: &str,
	country: &str,
	state: Option<&str>,
	page_size: u64,
) -> Value {
	json!({
		"size": page_size,
		"query": city_lookup_query(scope, city, country, state),
		"_source": ["award_id", "transaction_id"],
		"sort": [{ "award_id": "asc" }, { "transaction_id": "asc" }],
	})
}
