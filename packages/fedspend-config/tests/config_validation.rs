use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use fedspend_config::Error;

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_temp_config(contents: &str) -> PathBuf {
	let stamp = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("Clock went backwards.")
		.as_nanos();
	let unique = COUNTER.fetch_add(1, Ordering::SeqCst);
	let path =
		env::temp_dir().join(format!("fedspend-config-test-{stamp}-{unique}.toml"));

	fs::write(&path, contents).expect("Failed to write temp config.");

	path
}

fn load(contents: &str) -> fedspend_config::Result<fedspend_config::Config> {
	let path = write_temp_config(contents);
	let result = fedspend_config::load(&path);

	let _ = fs::remove_file(&path);

	result
}

fn with_value(edit: impl FnOnce(&mut toml::map::Map<String, Value>)) -> String {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let root = value.as_table_mut().expect("Sample config must be a table.");

	edit(root);

	toml::to_string(&value).expect("Failed to render sample config.")
}

#[test]
fn sample_config_loads_and_normalizes_url() {
	let cfg = load(SAMPLE_CONFIG_TOML).expect("Sample config must load.");

	// Trailing slash on the search engine URL is stripped.
	assert_eq!(cfg.storage.elasticsearch.url, "http://127.0.0.1:9200");
	assert_eq!(cfg.storage.elasticsearch.retries, 5);
	assert_eq!(cfg.search.min_action_date, "2007-10-01");
}

#[test]
fn zero_retries_are_rejected() {
	let toml = with_value(|root| {
		root["storage"]["elasticsearch"]
			.as_table_mut()
			.expect("elasticsearch table")
			.insert("retries".to_string(), Value::Integer(0));
	});

	assert!(matches!(load(&toml), Err(Error::Validation { .. })));
}

#[test]
fn malformed_dates_are_rejected() {
	let toml = with_value(|root| {
		root["search"]
			.as_table_mut()
			.expect("search table")
			.insert("min_action_date".to_string(), Value::String("October 1".to_string()));
	});

	assert!(matches!(load(&toml), Err(Error::Validation { .. })));
}

#[test]
fn inverted_date_bounds_are_rejected() {
	let toml = with_value(|root| {
		let search = root["search"].as_table_mut().expect("search table");

		search.insert("min_action_date".to_string(), Value::String("2026-01-01".to_string()));
		search.insert("max_action_date".to_string(), Value::String("2007-10-01".to_string()));
	});

	assert!(matches!(load(&toml), Err(Error::Validation { .. })));
}

#[test]
fn missing_file_is_a_read_error() {
	let path = env::temp_dir().join("fedspend-config-test-missing.toml");

	assert!(matches!(fedspend_config::load(&path), Err(Error::ReadConfig { .. })));
}
