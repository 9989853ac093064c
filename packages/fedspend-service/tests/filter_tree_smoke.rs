use fedspend_config::{Config, Elasticsearch, Postgres, Search, Service, Storage};
use fedspend_elastic::ElasticClient;
use fedspend_service::{ChildLayers, SpendService, account_tree};
use fedspend_storage::db::Db;
use fedspend_testkit::TestDatabase;

fn config(dsn: &str) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: dsn.to_string(), pool_max_conns: 2 },
			// The tree endpoints never touch the search cluster.
			elasticsearch: Elasticsearch {
				url: "http://127.0.0.1:9".to_string(),
				transactions_index_root: "transactions".to_string(),
				timeout_ms: 1_000,
				retries: 1,
				city_id_bucket_size: 500_000,
				scan_page_size: 100,
				city_lookup_concurrency: 1,
			},
		},
		search: Search {
			min_action_date: "2007-10-01".to_string(),
			max_action_date: "2025-09-30".to_string(),
		},
	}
}

async fn seed(db: &Db) {
	for sql in [
		"INSERT INTO toptier_agencies (toptier_code, name, abbreviation)
		 VALUES ('097', 'Department of Defense', 'DOD'),
		        ('013', 'Department of Commerce', 'DOC')",
		"INSERT INTO federal_accounts (federal_account_code, account_title, agency_identifier, main_account_code)
		 VALUES ('097-0100', 'Operation and Maintenance', '097', '0100'),
		        ('013-0500', 'Census Operations', '013', '0500')",
		"INSERT INTO treasury_accounts (tas_rendering_label, account_title, agency_id, main_account_code, federal_account_code)
		 VALUES ('097-X-0100-000', 'Operation and Maintenance', '097', '0100', '097-0100'),
		        ('013-X-0500-000', 'Census Operations', '013', '0500', '013-0500')",
		"INSERT INTO financial_accounts_by_awards
		 	(award_id, award_type, treasury_account_id, disaster_emergency_fund_code,
		 	 transaction_obligated_amount, gross_outlay_amount_by_award_cpe)
		 VALUES (1, 'A', 1, 'L', 100.00, 50.00),
		        (2, 'B', 2, 'M', 200.00, 100.00)",
	] {
		sqlx::query(sql).execute(&db.pool).await.expect("Failed to seed test data.");
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FEDSPEND_PG_DSN to run."]
async fn deep_filter_matches_keep_their_ancestors() {
	let Some(base_dsn) = fedspend_testkit::env_dsn() else {
		eprintln!(
			"Skipping deep_filter_matches_keep_their_ancestors; set FEDSPEND_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = config(test_db.dsn());
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");
	seed(&db).await;

	let es = ElasticClient::new(&cfg.storage.elasticsearch).expect("Failed to build client.");
	let svc = SpendService::new(cfg, db, es);

	// "0100" matches only the 097 federal-account code and treasury label;
	// the owning agency survives even though the filter misses it by name.
	let tree = account_tree::filter_tree(&svc, &[], ChildLayers::All, Some("0100"))
		.await
		.expect("Failed to search the tree.");

	assert_eq!(tree.len(), 1);
	assert_eq!(tree[0].id, "097");

	let accounts = tree[0].children.as_deref().expect("children");

	assert_eq!(accounts.len(), 1);
	assert_eq!(accounts[0].id, "097-0100");

	let treasuries = accounts[0].children.as_deref().expect("children");

	assert_eq!(treasuries.len(), 1);
	assert_eq!(treasuries[0].id, "097-X-0100-000");

	// A filter matching only an agency name keeps that agency; nothing
	// beneath it matches, so its child list is empty.
	let by_name = account_tree::filter_tree(&svc, &[], ChildLayers::All, Some("commerce"))
		.await
		.expect("Failed to search the tree.");

	assert_eq!(by_name.len(), 1);
	assert_eq!(by_name[0].id, "013");
	assert_eq!(by_name[0].children.as_deref(), Some(&[][..]));

	let no_match = account_tree::filter_tree(&svc, &[], ChildLayers::All, Some("no such account"))
		.await
		.expect("Failed to search the tree.");

	assert!(no_match.is_empty());

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
