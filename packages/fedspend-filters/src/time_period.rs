use time::Date;

use crate::{Error, Result};

/// Closed date range over `action_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
	pub start: Date,
	pub end: Date,
}

/// Raw time-period clause as submitted; open ends fall back to the configured
/// min/max dates at resolution time.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TimePeriodFilter {
	pub start_date: Option<String>,
	pub end_date: Option<String>,
}

pub fn resolve_time_periods(
	filters: &[TimePeriodFilter],
	min_date: Date,
	max_date: Date,
) -> Result<Vec<DateRange>> {
	let mut ranges = Vec::with_capacity(filters.len());

	for filter in filters {
		let start = match filter.start_date.as_deref() {
			Some(raw) => parse_date(raw)?,
			None => min_date,
		};
		let end = match filter.end_date.as_deref() {
			Some(raw) => parse_date(raw)?,
			None => max_date,
		};

		if start > end {
			return Err(Error::InvalidFilter {
				message: format!("time period starts after it ends: {raw_range:?}", raw_range = (
					filter.start_date.as_deref(),
					filter.end_date.as_deref(),
				)),
			});
		}

		ranges.push(DateRange { start, end });
	}

	Ok(merge_date_ranges(ranges))
}

/// Combines overlapping ranges. Adjacent fiscal years do not overlap
/// (FY2010 ends 2010-09-30, FY2011 starts 2010-10-01) but are intended to
/// combine, so ranges whose gap is at most one day are merged.
pub fn merge_date_ranges(mut ranges: Vec<DateRange>) -> Vec<DateRange> {
	if ranges.is_empty() {
		return ranges;
	}

	ranges.sort_by_key(|range| (range.start, range.end));

	let mut merged: Vec<DateRange> = Vec::with_capacity(ranges.len());
	let mut saved = ranges[0];

	for range in ranges.into_iter().skip(1) {
		if range.start <= saved.end.saturating_add(time::Duration::days(1)) {
			saved.end = saved.end.max(range.end);
		} else {
			merged.push(saved);
			saved = range;
		}
	}

	merged.push(saved);

	merged
}

pub(crate) fn parse_date(raw: &str) -> Result<Date> {
	Date::parse(raw, &time::format_description::well_known::Iso8601::DEFAULT).map_err(|_| {
		Error::InvalidFilter { message: format!("'{raw}' is not a YYYY-MM-DD date.") }
	})
}

pub(crate) fn format_date(date: Date) -> String {
	format!("{:04}-{:02}-{:02}", date.year(), date.month() as u8, date.day())
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;

	#[test]
	fn adjacent_fiscal_years_merge() {
		let merged = merge_date_ranges(vec![
			DateRange { start: date!(2009 - 10 - 01), end: date!(2010 - 09 - 30) },
			DateRange { start: date!(2010 - 10 - 01), end: date!(2011 - 09 - 30) },
		]);

		assert_eq!(
			merged,
			vec![DateRange { start: date!(2009 - 10 - 01), end: date!(2011 - 09 - 30) }],
		);
	}

	#[test]
	fn disjoint_ranges_stay_separate() {
		let merged = merge_date_ranges(vec![
			DateRange { start: date!(2012 - 01 - 01), end: date!(2012 - 03 - 31) },
			DateRange { start: date!(2009 - 10 - 01), end: date!(2010 - 09 - 30) },
		]);

		assert_eq!(merged.len(), 2);
		assert_eq!(merged[0].start, date!(2009 - 10 - 01));
	}

	#[test]
	fn contained_ranges_collapse() {
		let merged = merge_date_ranges(vec![
			DateRange { start: date!(2010 - 01 - 01), end: date!(2010 - 12 - 31) },
			DateRange { start: date!(2010 - 03 - 01), end: date!(2010 - 06 - 30) },
		]);

		assert_eq!(
			merged,
			vec![DateRange { start: date!(2010 - 01 - 01), end: date!(2010 - 12 - 31) }],
		);
	}

	#[test]
	fn open_ends_fall_back_to_configured_bounds() {
		let filters = [TimePeriodFilter {
			start_date: None,
			end_date: Some("2015-09-30".to_string()),
		}];
		let resolved =
			resolve_time_periods(&filters, date!(2007 - 10 - 01), date!(2025 - 09 - 30))
				.expect("valid periods");

		assert_eq!(
			resolved,
			vec![DateRange { start: date!(2007 - 10 - 01), end: date!(2015 - 09 - 30) }],
		);
	}

	#[test]
	fn inverted_ranges_are_rejected() {
		let filters = [TimePeriodFilter {
			start_date: Some("2015-01-01".to_string()),
			end_date: Some("2014-01-01".to_string()),
		}];

		assert!(
			resolve_time_periods(&filters, date!(2007 - 10 - 01), date!(2025 - 09 - 30)).is_err()
		);
	}
}
