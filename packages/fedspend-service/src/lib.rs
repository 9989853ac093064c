//! Request orchestration: compiles filters, fans out to the relational store
//! and the search cluster, and shapes results into the public contracts.

pub mod account_tree;
pub mod city;
pub mod disaster;
pub mod locations;
pub mod spending_over_time;

use time::Date;

pub use account_tree::{ChildLayers, TreeNode};
pub use disaster::{
	AwardAmountRequest, AwardAmountResponse, CfdaSpendingRequest, CfdaSpendingResponse,
	CfdaSpendingRow, DisasterFilter, Totals,
};
pub use spending_over_time::{
	SpendingOverTimeRequest, SpendingOverTimeResponse, TimeGroupResult, TimePeriodKey,
};

use fedspend_config::Config;
use fedspend_elastic::ElasticClient;
use fedspend_storage::db::Db;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub struct SpendService {
	pub cfg: Config,
	pub db: Db,
	pub es: ElasticClient,
}
impl SpendService {
	pub fn new(cfg: Config, db: Db, es: ElasticClient) -> Self {
		Self { cfg, db, es }
	}

	/// Queries address the whole index family, not one concrete index.
	pub(crate) fn transactions_index(&self) -> String {
		format!("{}*", self.cfg.storage.elasticsearch.transactions_index_root)
	}

	/// Fallback bounds for open-ended time periods. The raw strings were
	/// validated at config load.
	pub(crate) fn search_bounds(&self) -> ServiceResult<(Date, Date)> {
		let parse = |raw: &str| {
			Date::parse(raw, &time::format_description::well_known::Iso8601::DEFAULT).map_err(
				|err| ServiceError::Precondition {
					message: format!("Configured search bound '{raw}' is invalid: {err}."),
				},
			)
		};

		Ok((parse(&self.cfg.search.min_action_date)?, parse(&self.cfg.search.max_action_date)?))
	}
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Precondition { message: String },
	Search { message: String },
	Storage { message: String },
}
impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Precondition { message } => write!(f, "Precondition violated: {message}"),
			Self::Search { message } => write!(f, "Search error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<fedspend_storage::Error> for ServiceError {
	fn from(err: fedspend_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<fedspend_elastic::Error> for ServiceError {
	fn from(err: fedspend_elastic::Error) -> Self {
		Self::Search { message: err.to_string() }
	}
}

impl From<fedspend_filters::Error> for ServiceError {
	fn from(err: fedspend_filters::Error) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
