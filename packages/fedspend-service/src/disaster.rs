//! Disaster-funding endpoints. Award amounts roll up relationally over the
//! award financial records; CFDA program spending buckets come from the
//! search cluster, summed in integer cents and read back as 2-decimal values.

use serde_json::json;

use fedspend_elastic::response;
use fedspend_filters::{
	AwardFilters,
	elastic::{aggregation_body, cents_sum_aggregation, cents_to_amount, compile_search_query, round2, terms_aggregation},
};
use fedspend_storage::queries;

use crate::{ServiceError, ServiceResult, SpendService};

const CFDA_BUCKET_SIZE: u64 = 10_000;
const CFDA_QUERY_FIELDS: &[&str] = &["cfda_title", "cfda_number"];

#[derive(Debug, Clone, serde::Deserialize)]
pub struct DisasterFilter {
	#[serde(default)]
	pub def_codes: Vec<String>,
	#[serde(default)]
	pub award_type_codes: Vec<String>,
	pub query: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct AwardAmountRequest {
	pub filter: DisasterFilter,
}

#[derive(Debug, PartialEq, serde::Serialize)]
pub struct AwardAmountResponse {
	pub award_count: i64,
	pub obligation: f64,
	pub outlay: f64,
}

#[derive(Debug, serde::Deserialize)]
pub struct CfdaSpendingRequest {
	pub filter: DisasterFilter,
}

#[derive(Debug, PartialEq, serde::Serialize)]
pub struct CfdaSpendingRow {
	pub id: i64,
	pub code: String,
	pub description: String,
	pub count: u64,
	pub obligation: f64,
	pub outlay: f64,
}

#[derive(Debug, Default, PartialEq, serde::Serialize)]
pub struct Totals {
	pub award_count: u64,
	pub obligation: f64,
	pub outlay: f64,
}

#[derive(Debug, serde::Serialize)]
pub struct CfdaSpendingResponse {
	pub totals: Totals,
	pub results: Vec<CfdaSpendingRow>,
}

pub async fn award_amount(
	svc: &SpendService,
	request: AwardAmountRequest,
) -> ServiceResult<AwardAmountResponse> {
	require_def_codes(&request.filter)?;

	let row = queries::disaster_award_amounts(
		&svc.db,
		&request.filter.def_codes,
		&request.filter.award_type_codes,
	)
	.await?;

	Ok(AwardAmountResponse {
		award_count: row.award_count,
		obligation: round2(row.obligation),
		outlay: round2(row.outlay),
	})
}

pub async fn cfda_spending(
	svc: &SpendService,
	request: CfdaSpendingRequest,
) -> ServiceResult<CfdaSpendingResponse> {
	require_def_codes(&request.filter)?;

	let (min_date, max_date) = svc.search_bounds()?;
	let filters = AwardFilters {
		def_codes: request.filter.def_codes.clone(),
		award_type_codes: request.filter.award_type_codes.clone(),
		query: request.filter.query.clone(),
		..Default::default()
	};
	let query = compile_search_query(&filters, CFDA_QUERY_FIELDS, min_date, max_date)?;
	let mut terms = terms_aggregation("cfda_agg_key", CFDA_BUCKET_SIZE);

	terms["aggs"] = json!({
		"sum_obligation": cents_sum_aggregation("obligation"),
		"sum_outlay": cents_sum_aggregation("outlay"),
	});

	let body = aggregation_body(query, json!({ "group_by_agg_key": terms }));
	let response = svc.es.search(&svc.transactions_index(), &body).await?;

	// Zero matches is a legitimate empty result, not a fault.
	if response::total_hits(&response) == 0 {
		return Ok(CfdaSpendingResponse { totals: Totals::default(), results: Vec::new() });
	}

	let mut results = Vec::new();

	for bucket in response::buckets(&response, "group_by_agg_key") {
		results.push(parse_bucket(bucket)?);
	}

	results.sort_by(|a, b| a.code.cmp(&b.code));

	let totals = Totals {
		award_count: results.iter().map(|row| row.count).sum(),
		obligation: round2(results.iter().map(|row| row.obligation).sum()),
		outlay: round2(results.iter().map(|row| row.outlay).sum()),
	};

	Ok(CfdaSpendingResponse { totals, results })
}

fn require_def_codes(filter: &DisasterFilter) -> ServiceResult<()> {
	if filter.def_codes.is_empty() {
		return Err(ServiceError::InvalidRequest {
			message: "Missing required filter: def_codes.".to_string(),
		});
	}

	Ok(())
}

/// Bucket keys on `cfda_agg_key` are JSON-encoded program descriptors.
#[derive(Debug, serde::Deserialize)]
struct CfdaKey {
	id: i64,
	code: String,
	description: String,
}

fn parse_bucket(bucket: &serde_json::Value) -> ServiceResult<CfdaSpendingRow> {
	let raw_key = bucket["key"].as_str().ok_or_else(|| ServiceError::Search {
		message: "CFDA bucket key is not a string".to_string(),
	})?;
	let key: CfdaKey = serde_json::from_str(raw_key).map_err(|err| ServiceError::Search {
		message: format!("CFDA bucket key is not a program descriptor: {err}"),
	})?;

	Ok(CfdaSpendingRow {
		id: key.id,
		code: key.code,
		description: key.description,
		count: bucket["doc_count"].as_u64().unwrap_or(0),
		obligation: cents_to_amount(response::sum_value(bucket, "sum_obligation")),
		outlay: cents_to_amount(response::sum_value(bucket, "sum_outlay")),
	})
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn def_codes_are_required() {
		let filter = DisasterFilter {
			def_codes: Vec::new(),
			award_type_codes: Vec::new(),
			query: None,
		};

		assert!(require_def_codes(&filter).is_err());
	}

	#[test]
	fn buckets_parse_cents_back_to_amounts() {
		let bucket = json!({
			"key": r#"{"id": 42, "code": "10.001", "description": "Research Grants"}"#,
			"doc_count": 7,
			"sum_obligation": { "value": 123456.0 },
			"sum_outlay": { "value": 50.0 },
		});
		let row = parse_bucket(&bucket).expect("valid bucket");

		assert_eq!(
			row,
			CfdaSpendingRow {
				id: 42,
				code: "10.001".to_string(),
				description: "Research Grants".to_string(),
				count: 7,
				obligation: 1234.56,
				outlay: 0.5,
			},
		);
	}

	#[test]
	fn malformed_bucket_keys_are_rejected() {
		let bucket = json!({ "key": "not json", "doc_count": 1 });

		assert!(parse_bucket(&bucket).is_err());
	}
}
