//! Obligation totals grouped by fiscal period. Executes relationally against
//! the denormalized transaction table; monthly rows come back from storage
//! and roll up to the requested fiscal grouping here so period math lives in
//! one place.

use std::collections::BTreeMap;

use fedspend_domain::fiscal::{Grouping, fiscal_month, fiscal_quarter, fiscal_year};
use fedspend_filters::{
	AddressingMode, AwardFilters, DateRange, LocationScope, Predicate, elastic::round2,
	resolve_time_periods,
};
use fedspend_storage::{models::MonthlySpendingRow, queries};

use crate::{ServiceError, ServiceResult, SpendService, locations};

#[derive(Debug, serde::Deserialize)]
pub struct SpendingOverTimeRequest {
	pub group: String,
	#[serde(default)]
	pub filters: AwardFilters,
}

#[derive(Debug, serde::Serialize)]
pub struct SpendingOverTimeResponse {
	pub group: String,
	pub results: Vec<TimeGroupResult>,
}

#[derive(Debug, PartialEq, serde::Serialize)]
pub struct TimeGroupResult {
	pub time_period: TimePeriodKey,
	pub aggregated_amount: f64,
}

/// Period fields are strings in the public contract.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TimePeriodKey {
	pub fiscal_year: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub quarter: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub month: Option<String>,
}

pub async fn spending_over_time(
	svc: &SpendService,
	request: SpendingOverTimeRequest,
) -> ServiceResult<SpendingOverTimeResponse> {
	let group = Grouping::parse(&request.group).ok_or_else(|| ServiceError::InvalidRequest {
		message: format!("'{}' is not a valid group; use fiscal_year, quarter, or month.", request.group),
	})?;

	reject_unsupported_filters(&request.filters)?;

	let (min_date, max_date) = svc.search_bounds()?;
	let mode = AddressingMode::Denormalized;
	let mut parts = Vec::new();
	let ranges = if request.filters.time_period.is_empty() {
		vec![DateRange { start: min_date, end: max_date }]
	} else {
		resolve_time_periods(&request.filters.time_period, min_date, max_date)?
	};

	parts.push(Predicate::Or(
		ranges
			.into_iter()
			.map(|range| Predicate::DateRange {
				column: "action_date".to_string(),
				start: range.start,
				end: range.end,
			})
			.collect(),
	));

	for (scope, requests) in [
		(LocationScope::PlaceOfPerformance, &request.filters.place_of_performance_locations),
		(LocationScope::RecipientLocation, &request.filters.recipient_locations),
	] {
		if !requests.is_empty() {
			parts.push(
				locations::compile_location_predicate(
					svc,
					requests,
					scope,
					mode,
					"transaction_id",
					"transaction_id",
				)
				.await?,
			);
		}
	}

	let predicate = Predicate::And(parts).to_sql();
	let rows = queries::spending_by_month(&svc.db, mode, &predicate).await?;

	Ok(SpendingOverTimeResponse {
		group: group.as_str().to_string(),
		results: rollup(&rows, group),
	})
}

/// This endpoint runs relationally; filters that only exist in the search
/// index are rejected instead of silently ignored.
fn reject_unsupported_filters(filters: &AwardFilters) -> ServiceResult<()> {
	let unsupported = [
		(!filters.award_type_codes.is_empty(), "award_type_codes"),
		(!filters.agencies.is_empty(), "agencies"),
		(!filters.def_codes.is_empty(), "def_codes"),
		(filters.query.is_some(), "query"),
	];

	for (present, name) in unsupported {
		if present {
			return Err(ServiceError::InvalidRequest {
				message: format!("Filter '{name}' is not supported by spending_over_time."),
			});
		}
	}

	Ok(())
}

/// Sums monthly rows into fiscal periods, newest period first. Keys are
/// (fiscal year, period), so ordering is total and ties cannot occur.
fn rollup(rows: &[MonthlySpendingRow], group: Grouping) -> Vec<TimeGroupResult> {
	let mut totals: BTreeMap<(i32, i32), f64> = BTreeMap::new();

	for row in rows {
		let year = fiscal_year(row.month_start);
		let period = match group {
			Grouping::FiscalYear => 0,
			Grouping::Quarter => fiscal_quarter(row.month_start),
			Grouping::Month => fiscal_month(row.month_start),
		};

		*totals.entry((year, period)).or_default() += row.amount;
	}

	totals
		.into_iter()
		.rev()
		.map(|((year, period), amount)| TimeGroupResult {
			time_period: TimePeriodKey {
				fiscal_year: year.to_string(),
				quarter: matches!(group, Grouping::Quarter).then(|| period.to_string()),
				month: matches!(group, Grouping::Month).then(|| period.to_string()),
			},
			aggregated_amount: round2(amount),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;

	fn row(month_start: time::Date, amount: f64) -> MonthlySpendingRow {
		MonthlySpendingRow { month_start, amount }
	}

	#[test]
	fn fiscal_year_rollup_crosses_the_october_boundary() {
		let rows = [
			row(date!(2020 - 09 - 01), 100.0),
			row(date!(2020 - 10 - 01), 40.0),
			row(date!(2020 - 11 - 01), 2.5),
		];
		let results = rollup(&rows, Grouping::FiscalYear);

		assert_eq!(results.len(), 2);
		// Newest fiscal year first.
		assert_eq!(results[0].time_period.fiscal_year, "2021");
		assert_eq!(results[0].aggregated_amount, 42.5);
		assert_eq!(results[0].time_period.quarter, None);
		assert_eq!(results[1].time_period.fiscal_year, "2020");
		assert_eq!(results[1].aggregated_amount, 100.0);
	}

	#[test]
	fn quarter_rollup_groups_three_months() {
		let rows = [
			row(date!(2020 - 10 - 01), 1.0),
			row(date!(2020 - 11 - 01), 2.0),
			row(date!(2020 - 12 - 01), 4.0),
			row(date!(2021 - 01 - 01), 8.0),
		];
		let results = rollup(&rows, Grouping::Quarter);

		assert_eq!(results.len(), 2);
		assert_eq!(results[0].time_period.quarter.as_deref(), Some("2"));
		assert_eq!(results[0].aggregated_amount, 8.0);
		assert_eq!(results[1].time_period.quarter.as_deref(), Some("1"));
		assert_eq!(results[1].aggregated_amount, 7.0);
	}

	#[test]
	fn month_rollup_reports_fiscal_months() {
		let rows = [row(date!(2020 - 10 - 01), 1.125)];
		let results = rollup(&rows, Grouping::Month);

		assert_eq!(results[0].time_period.fiscal_year, "2021");
		assert_eq!(results[0].time_period.month.as_deref(), Some("1"));
		assert_eq!(results[0].aggregated_amount, 1.13);
	}

	#[test]
	fn search_only_filters_are_rejected() {
		let filters = AwardFilters {
			def_codes: vec!["L".to_string()],
			..Default::default()
		};

		assert!(reject_unsupported_filters(&filters).is_err());
		assert!(reject_unsupported_filters(&AwardFilters::default()).is_ok());
	}
}
