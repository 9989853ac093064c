//! Readers for the handful of response shapes the service consumes.

use serde_json::Value;

const NO_VALUES: &[Value] = &[];

/// Handles both the bare-number and `{"value": n, "relation": ...}` forms of
/// `hits.total`.
pub fn total_hits(response: &Value) -> u64 {
	let total = &response["hits"]["total"];

	total.as_u64().or_else(|| total["value"].as_u64()).unwrap_or(0)
}

pub fn hits(response: &Value) -> &[Value] {
	response["hits"]["hits"].as_array().map(Vec::as_slice).unwrap_or(NO_VALUES)
}

pub fn buckets<'a>(response: &'a Value, aggregation: &str) -> &'a [Value] {
	response["aggregations"][aggregation]["buckets"]
		.as_array()
		.map(Vec::as_slice)
		.unwrap_or(NO_VALUES)
}

pub fn sum_value(bucket: &Value, aggregation: &str) -> f64 {
	bucket[aggregation]["value"].as_f64().unwrap_or(0.0)
}
