use fedspend_filters::{AddressingMode, Bind, SqlPredicate};

use crate::{
	Result,
	db::Db,
	models::{FabaAmountRow, FederalAccountRow, MonthlySpendingRow, ToptierAgencyRow, TreasuryAccountRow},
};

/// Agencies that own at least one treasury account with award financial
/// activity. `filter` substring-matches name, abbreviation, or code, with
/// LIKE metacharacters treated literally. Agencies listed in `include_codes`
/// survive the filter regardless, so ancestors of deeper matches are kept
/// when the tree is built from the bottom up. Without a filter every agency
/// is returned and `include_codes` has no effect.
pub async fn toptier_agencies(
	db: &Db,
	filter: Option<&str>,
	include_codes: &[String],
) -> Result<Vec<ToptierAgencyRow>> {
	let mut sql = String::from(
		"\
SELECT ta.toptier_code, ta.name, ta.abbreviation
FROM toptier_agencies ta
WHERE EXISTS (
	SELECT 1
	FROM treasury_accounts tas
	JOIN financial_accounts_by_awards faba ON faba.treasury_account_id = tas.treasury_account_id
	WHERE tas.agency_id = ta.toptier_code
)",
	);

	if filter.is_some() {
		let mut group = String::from(
			"ta.name ILIKE $1 OR ta.abbreviation ILIKE $1 OR ta.toptier_code ILIKE $1",
		);

		if !include_codes.is_empty() {
			group.push_str(" OR ta.toptier_code = ANY($2)");
		}

		sql.push_str(&format!("\n\tAND ({group})"));
	}

	sql.push_str("\nORDER BY ta.toptier_code");

	let mut query = sqlx::query_as::<_, ToptierAgencyRow>(&sql);

	if let Some(filter) = filter {
		query = query.bind(like_pattern(filter));

		if !include_codes.is_empty() {
			query = query.bind(include_codes.to_vec());
		}
	}

	Ok(query.fetch_all(&db.pool).await?)
}

/// Federal accounts with award financial activity, optionally constrained to
/// one agency. `filter` and `include_codes` behave as in [`toptier_agencies`].
pub async fn federal_accounts(
	db: &Db,
	agency_identifier: Option<&str>,
	filter: Option<&str>,
	include_codes: &[String],
) -> Result<Vec<FederalAccountRow>> {
	let mut sql = String::from(
		"\
SELECT fa.federal_account_code, fa.account_title, fa.agency_identifier
FROM federal_accounts fa
WHERE EXISTS (
	SELECT 1
	FROM treasury_accounts tas
	JOIN financial_accounts_by_awards faba ON faba.treasury_account_id = tas.treasury_account_id
	WHERE tas.federal_account_code = fa.federal_account_code
)",
	);
	let mut placeholder = 0;

	if agency_identifier.is_some() {
		placeholder += 1;

		sql.push_str(&format!("\n\tAND fa.agency_identifier = ${placeholder}"));
	}
	if filter.is_some() {
		placeholder += 1;

		let mut group = format!(
			"fa.federal_account_code ILIKE ${placeholder} OR fa.account_title ILIKE ${placeholder}",
		);

		if !include_codes.is_empty() {
			group.push_str(&format!(" OR fa.federal_account_code = ANY(${})", placeholder + 1));
		}

		sql.push_str(&format!("\n\tAND ({group})"));
	}

	sql.push_str("\nORDER BY fa.federal_account_code");

	let mut query = sqlx::query_as::<_, FederalAccountRow>(&sql);

	if let Some(agency_identifier) = agency_identifier {
		query = query.bind(agency_identifier);
	}
	if let Some(filter) = filter {
		query = query.bind(like_pattern(filter));

		if !include_codes.is_empty() {
			query = query.bind(include_codes.to_vec());
		}
	}

	Ok(query.fetch_all(&db.pool).await?)
}

/// Treasury accounts with award financial activity, optionally constrained by
/// owning agency and federal account. The deepest requested tier applies
/// `filter` directly; there is nothing beneath it to rescue.
pub async fn treasury_accounts(
	db: &Db,
	agency_id: Option<&str>,
	federal_account_code: Option<&str>,
	filter: Option<&str>,
) -> Result<Vec<TreasuryAccountRow>> {
	let mut sql = String::from(
		"\
SELECT
	tas.tas_rendering_label,
	tas.account_title,
	tas.agency_id,
	tas.main_account_code,
	tas.federal_account_code
FROM treasury_accounts tas
WHERE EXISTS (
	SELECT 1
	FROM financial_accounts_by_awards faba
	WHERE faba.treasury_account_id = tas.treasury_account_id
)",
	);
	let mut placeholder = 0;

	if agency_id.is_some() {
		placeholder += 1;

		sql.push_str(&format!("\n\tAND tas.agency_id = ${placeholder}"));
	}
	if federal_account_code.is_some() {
		placeholder += 1;

		sql.push_str(&format!("\n\tAND tas.federal_account_code = ${placeholder}"));
	}
	if filter.is_some() {
		placeholder += 1;

		sql.push_str(&format!(
			"\n\tAND (tas.tas_rendering_label ILIKE ${placeholder} OR tas.account_title ILIKE ${placeholder})",
		));
	}

	sql.push_str("\nORDER BY tas.tas_rendering_label");

	let mut query = sqlx::query_as::<_, TreasuryAccountRow>(&sql);

	if let Some(agency_id) = agency_id {
		query = query.bind(agency_id);
	}
	if let Some(federal_account_code) = federal_account_code {
		query = query.bind(federal_account_code);
	}
	if let Some(filter) = filter {
		query = query.bind(like_pattern(filter));
	}

	Ok(query.fetch_all(&db.pool).await?)
}

/// Leaf-account count for a toptier node: treasury accounts under the agency
/// with financial activity, not financial record rows.
pub async fn count_treasury_accounts_for_agency(db: &Db, agency_id: &str) -> Result<i64> {
	let count: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM treasury_accounts tas
WHERE tas.agency_id = $1
	AND EXISTS (
		SELECT 1
		FROM financial_accounts_by_awards faba
		WHERE faba.treasury_account_id = tas.treasury_account_id
	)",
	)
	.bind(agency_id)
	.fetch_one(&db.pool)
	.await?;

	Ok(count)
}

pub async fn count_treasury_accounts_for_federal_account(
	db: &Db,
	federal_account_code: &str,
) -> Result<i64> {
	let count: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM treasury_accounts tas
WHERE tas.federal_account_code = $1
	AND EXISTS (
		SELECT 1
		FROM financial_accounts_by_awards faba
		WHERE faba.treasury_account_id = tas.treasury_account_id
	)",
	)
	.bind(federal_account_code)
	.fetch_one(&db.pool)
	.await?;

	Ok(count)
}

/// Obligation summed per calendar month under a compiled predicate. In joined
/// mode the predicate addresses the two location relations by alias.
pub async fn spending_by_month(
	db: &Db,
	mode: AddressingMode,
	predicate: &SqlPredicate,
) -> Result<Vec<MonthlySpendingRow>> {
	let from = match mode {
		AddressingMode::Denormalized => "transaction_search",
		AddressingMode::Joined =>
			"\
transactions
LEFT JOIN transaction_locations AS place_of_performance
	ON place_of_performance.location_id = transactions.pop_location_id
LEFT JOIN transaction_locations AS recipient_location
	ON recipient_location.location_id = transactions.recipient_location_id",
	};
	let sql = format!(
		"\
SELECT
	date_trunc('month', action_date)::date AS month_start,
	COALESCE(SUM(generated_pragmatic_obligation), 0)::float8 AS amount
FROM {from}
WHERE {clause}
GROUP BY 1
ORDER BY 1",
		clause = predicate.clause,
	);
	let query = bind_all(sqlx::query_as::<_, MonthlySpendingRow>(&sql), &predicate.binds);

	Ok(query.fetch_all(&db.pool).await?)
}

/// Distinct-award count plus obligation and outlay sums over award financial
/// rows tagged with the given disaster fund codes.
pub async fn disaster_award_amounts(
	db: &Db,
	def_codes: &[String],
	award_type_codes: &[String],
) -> Result<FabaAmountRow> {
	let mut sql = String::from(
		"\
SELECT
	COUNT(DISTINCT award_id) AS award_count,
	COALESCE(SUM(transaction_obligated_amount), 0)::float8 AS obligation,
	COALESCE(SUM(gross_outlay_amount_by_award_cpe), 0)::float8 AS outlay
FROM financial_accounts_by_awards
WHERE disaster_emergency_fund_code = ANY($1)",
	);

	if !award_type_codes.is_empty() {
		sql.push_str("\n\tAND award_type = ANY($2)");
	}

	let mut query = sqlx::query_as::<_, FabaAmountRow>(&sql).bind(def_codes.to_vec());

	if !award_type_codes.is_empty() {
		query = query.bind(award_type_codes.to_vec());
	}

	Ok(query.fetch_one(&db.pool).await?)
}

/// Bulk-inserts scan results into the city staging table. Returns how many
/// pairs were new.
pub async fn insert_city_hits(db: &Db, hits: &[(i64, i64)]) -> Result<u64> {
	if hits.is_empty() {
		return Ok(0);
	}

	let award_ids = hits.iter().map(|(award_id, _)| *award_id).collect::<Vec<_>>();
	let transaction_ids =
		hits.iter().map(|(_, transaction_id)| *transaction_id).collect::<Vec<_>>();
	let result = sqlx::query(
		"\
INSERT INTO city_transaction_hits (award_id, transaction_id)
SELECT award_id, transaction_id
FROM UNNEST($1::BIGINT[], $2::BIGINT[]) AS hits (award_id, transaction_id)
ON CONFLICT DO NOTHING",
	)
	.bind(award_ids)
	.bind(transaction_ids)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}

fn bind_all<'q>(
	query: sqlx::query::QueryAs<'q, sqlx::Postgres, MonthlySpendingRow, sqlx::postgres::PgArguments>,
	binds: &'q [Bind],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, MonthlySpendingRow, sqlx::postgres::PgArguments> {
	let mut query = query;

	for bind in binds {
		query = match bind {
			Bind::Text(value) => query.bind(value),
			Bind::TextArray(values) => query.bind(values),
			Bind::IdArray(ids) => query.bind(ids),
			Bind::Date(date) => query.bind(*date),
		};
	}

	query
}

/// `ILIKE` pattern that substring-matches `filter`. LIKE metacharacters in
/// the user's text must match themselves, so they are escaped with the
/// default `\` escape character.
fn like_pattern(filter: &str) -> String {
	let mut escaped = String::with_capacity(filter.len());

	for ch in filter.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			escaped.push('\\');
		}

		escaped.push(ch);
	}

	format!("%{escaped}%")
}
