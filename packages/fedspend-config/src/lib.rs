mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Elasticsearch, Postgres, Search, Service, Storage};

use std::{fs, path::Path};

use time::{Date, format_description::well_known::Iso8601};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.elasticsearch.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.elasticsearch.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.elasticsearch.transactions_index_root.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.elasticsearch.transactions_index_root must be non-empty.".to_string(),
		});
	}
	if cfg.storage.elasticsearch.retries == 0 {
		return Err(Error::Validation {
			message: "storage.elasticsearch.retries must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.elasticsearch.city_id_bucket_size == 0 {
		return Err(Error::Validation {
			message: "storage.elasticsearch.city_id_bucket_size must be greater than zero."
				.to_string(),
		});
	}
	if cfg.storage.elasticsearch.scan_page_size == 0 {
		return Err(Error::Validation {
			message: "storage.elasticsearch.scan_page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.elasticsearch.city_lookup_concurrency == 0 {
		return Err(Error::Validation {
			message: "storage.elasticsearch.city_lookup_concurrency must be greater than zero."
				.to_string(),
		});
	}

	let min = parse_date("search.min_action_date", &cfg.search.min_action_date)?;
	let max = parse_date("search.max_action_date", &cfg.search.max_action_date)?;

	if min > max {
		return Err(Error::Validation {
			message: "search.min_action_date must not be later than search.max_action_date."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	while cfg.storage.elasticsearch.url.ends_with('/') {
		cfg.storage.elasticsearch.url.pop();
	}
}

fn parse_date(label: &str, raw: &str) -> Result<Date> {
	Date::parse(raw, &Iso8601::DEFAULT).map_err(|_| Error::Validation {
		message: format!("{label} must be a YYYY-MM-DD date."),
	})
}
