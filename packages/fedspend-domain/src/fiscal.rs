//! Federal fiscal calendar math. The fiscal year starts on October 1, so every
//! fiscal key is derived from the calendar date shifted forward by 3 months.

use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
	FiscalYear,
	Quarter,
	Month,
}
impl Grouping {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"fy" | "fiscal_year" => Some(Self::FiscalYear),
			"q" | "quarter" => Some(Self::Quarter),
			"m" | "month" => Some(Self::Month),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::FiscalYear => "fiscal_year",
			Self::Quarter => "quarter",
			Self::Month => "month",
		}
	}
}

pub fn fiscal_year(date: Date) -> i32 {
	let (year, _) = shifted(date);

	year
}

pub fn fiscal_quarter(date: Date) -> i32 {
	(fiscal_month(date) - 1) / 3 + 1
}

/// Month within the fiscal year; October is 1, September is 12.
pub fn fiscal_month(date: Date) -> i32 {
	let (_, month) = shifted(date);

	month
}

fn shifted(date: Date) -> (i32, i32) {
	let month = date.month() as i32 + 3;

	if month > 12 { (date.year() + 1, month - 12) } else { (date.year(), month) }
}
