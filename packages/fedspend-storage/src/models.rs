use time::Date;

#[derive(Debug, sqlx::FromRow)]
pub struct ToptierAgencyRow {
	pub toptier_code: String,
	pub name: String,
	pub abbreviation: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct FederalAccountRow {
	pub federal_account_code: String,
	pub account_title: String,
	pub agency_identifier: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct TreasuryAccountRow {
	pub tas_rendering_label: String,
	pub account_title: Option<String>,
	pub agency_id: String,
	pub main_account_code: String,
	pub federal_account_code: String,
}

/// One calendar month of summed obligation, `month_start` being the first of
/// the month. Fiscal grouping happens in the service layer.
#[derive(Debug, sqlx::FromRow)]
pub struct MonthlySpendingRow {
	pub month_start: Date,
	pub amount: f64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct FabaAmountRow {
	pub award_count: i64,
	pub obligation: f64,
	pub outlay: f64,
}
