pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_toptier_agencies.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_toptier_agencies.sql")),
				"tables/002_federal_accounts.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_federal_accounts.sql")),
				"tables/003_treasury_accounts.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_treasury_accounts.sql")),
				"tables/004_financial_accounts_by_awards.sql" => out.push_str(include_str!(
					"../../../sql/tables/004_financial_accounts_by_awards.sql"
				)),
				"tables/005_transactions.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_transactions.sql")),
				"tables/006_transaction_locations.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_transaction_locations.sql")),
				"tables/007_transaction_search.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_transaction_search.sql")),
				"tables/008_city_transaction_hits.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_city_transaction_hits.sql")),
				other => panic!("Unknown include in init.sql: {other}"),
			}

			out.push('\n');
		} else {
			out.push_str(line);
			out.push('\n');
		}
	}

	out
}
