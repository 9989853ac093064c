use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub elasticsearch: Elasticsearch,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Elasticsearch {
	pub url: String,
	/// Index name root; queries address the whole family via "<root>*".
	pub transactions_index_root: String,
	pub timeout_ms: u64,
	/// Total attempts per request, transient failures included.
	pub retries: u32,
	/// Terms-aggregation bucket size for city-name id lookups.
	pub city_id_bucket_size: u32,
	pub scan_page_size: u32,
	pub city_lookup_concurrency: u32,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Fallback start for open-ended time-period filters, "YYYY-MM-DD".
	pub min_action_date: String,
	/// Fallback end for open-ended time-period filters, "YYYY-MM-DD".
	pub max_action_date: String,
}
