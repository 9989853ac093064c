//! City-name resolution against the search cluster. Relational rows carry
//! free-form city text, so city filters resolve to id sets (or a staged hit
//! table) via the index instead of being matched in SQL.

use std::collections::BTreeSet;

use serde_json::Value;

use fedspend_elastic::{ElasticClient, SearchAfterScan, response};
use fedspend_filters::{LocationScope, elastic as search};
use fedspend_storage::queries;

use crate::{ServiceError, ServiceResult, SpendService};

/// Resolves one city name to the set of ids whose records match it. Takes
/// owned arguments so lookups can run as spawned tasks. An empty set is a
/// legitimate outcome and must stay empty downstream, never relax into an
/// unconstrained filter.
#[allow(clippy::too_many_arguments)]
pub async fn lookup_city_ids(
	es: ElasticClient,
	index: String,
	scope: LocationScope,
	id_field: String,
	city: String,
	country: String,
	state: Option<String>,
	bucket_size: u64,
) -> ServiceResult<BTreeSet<i64>> {
	let body = search::city_id_aggregation_body(
		scope,
		&id_field,
		&city,
		&country,
		state.as_deref(),
		bucket_size,
	);
	let response = es.search(&index, &body).await?;
	let ids = response::buckets(&response, "id_groups")
		.iter()
		.filter_map(|bucket| bucket["key"].as_i64())
		.collect::<BTreeSet<_>>();

	tracing::debug!(city, country, state, ids = ids.len(), "resolved city ids");

	Ok(ids)
}

/// Drains a sorted scan of one city's records into the staging table, in
/// pages. Returns how many (award, transaction) pairs were newly staged.
pub async fn materialize_city_hits(
	svc: &SpendService,
	scope: LocationScope,
	city: &str,
	country: &str,
	state: Option<&str>,
) -> ServiceResult<u64> {
	let body = search::city_scan_body(
		scope,
		city,
		country,
		state,
		u64::from(svc.cfg.storage.elasticsearch.scan_page_size),
	);
	let mut scan = SearchAfterScan::new(svc.es.clone(), svc.transactions_index(), body);
	let mut staged = 0;

	while let Some(page) = scan.next_page().await? {
		let hits = page.iter().filter_map(hit_ids).collect::<Vec<_>>();

		if hits.len() != page.len() {
			return Err(ServiceError::Search {
				message: "scan hit is missing award_id or transaction_id".to_string(),
			});
		}

		staged += queries::insert_city_hits(&svc.db, &hits).await?;
	}

	Ok(staged)
}

fn hit_ids(hit: &Value) -> Option<(i64, i64)> {
	let source = &hit["_source"];

	Some((source["award_id"].as_i64()?, source["transaction_id"].as_i64()?))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn hit_ids_require_both_fields() {
		assert_eq!(
			hit_ids(&json!({ "_source": { "award_id": 1, "transaction_id": 10 } })),
			Some((1, 10)),
		);
		assert_eq!(hit_ids(&json!({ "_source": { "award_id": 1 } })), None);
		assert_eq!(hit_ids(&json!({})), None);
	}
}
