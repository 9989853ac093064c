//! Bridges the pure location compiler and the city resolver: collects every
//! city group in a filter set, resolves them against the search cluster with
//! bounded concurrency, and hands the compiler a deterministic id map.

use std::sync::Arc;

use tokio::{sync::Semaphore, task::JoinSet};

use fedspend_filters::{
	AddressingMode, LocationFilterRequest, LocationScope, NormalizedLocations, Predicate,
	ResolvedCities, compile_locations,
};

use crate::{ServiceError, ServiceResult, SpendService, city};

pub async fn compile_location_predicate(
	svc: &SpendService,
	requests: &[LocationFilterRequest],
	scope: LocationScope,
	mode: AddressingMode,
	id_column: &str,
	id_field: &str,
) -> ServiceResult<Predicate> {
	let locations = NormalizedLocations::build(requests)?;
	let cities = resolve_cities(svc, &locations, scope, id_field).await?;

	Ok(compile_locations(&locations, scope, mode, id_column, &cities))
}

/// Resolves every (country, state, city) lookup in the tree. Lookups run
/// concurrently up to the configured limit; results land in a sorted map so
/// join order cannot leak into the compiled predicate. Any failed lookup
/// aborts the whole resolution.
async fn resolve_cities(
	svc: &SpendService,
	locations: &NormalizedLocations,
	scope: LocationScope,
	id_field: &str,
) -> ServiceResult<ResolvedCities> {
	let mut lookups = Vec::new();

	for (country, bucket) in locations.countries() {
		for city in &bucket.cities {
			lookups.push((country.to_string(), None, city.clone()));
		}
		for (state, state_bucket) in &bucket.states {
			for city in &state_bucket.cities {
				lookups.push((country.to_string(), Some(state.clone()), city.clone()));
			}
		}
	}

	let mut cities = ResolvedCities::default();

	if lookups.is_empty() {
		return Ok(cities);
	}

	let limit = svc.cfg.storage.elasticsearch.city_lookup_concurrency.max(1) as usize;
	let semaphore = Arc::new(Semaphore::new(limit));
	let mut join_set = JoinSet::new();

	for (country, state, city) in lookups {
		let es = svc.es.clone();
		let index = svc.transactions_index();
		let id_field = id_field.to_string();
		let bucket_size = u64::from(svc.cfg.storage.elasticsearch.city_id_bucket_size);
		let semaphore = semaphore.clone();

		join_set.spawn(async move {
			let _permit = semaphore.acquire_owned().await.map_err(|err| {
				ServiceError::Search { message: format!("City lookup was cancelled: {err}.") }
			})?;
			let ids = city::lookup_city_ids(
				es,
				index,
				scope,
				id_field,
				city,
				country.clone(),
				state.clone(),
				bucket_size,
			)
			.await?;

			Ok::<_, ServiceError>((country, state, ids))
		});
	}

	while let Some(joined) = join_set.join_next().await {
		let (country, state, ids) = joined.map_err(|err| ServiceError::Search {
			message: format!("City lookup task failed: {err}."),
		})??;

		cities.insert(&country, state.as_deref(), ids);
	}

	Ok(cities)
}
