//! Compiles declarative award filters into backend queries: a boolean
//! predicate tree over the relational schema and an equivalent search-engine
//! query with aggregation buckets. Compilation is pure; resolving city names
//! to record ids is the caller's job (see `ResolvedCities`).

pub mod elastic;
pub mod location;
pub mod predicate;
pub mod time_period;

mod error;

pub use elastic::{AgencyFilter, AgencyTier, AgencyType, AwardFilters, compile_search_query};
pub use error::{Error, Result};
pub use location::{LocationFilterRequest, NormalizedLocations};
pub use predicate::{
	AddressingMode, Bind, LocationScope, Predicate, ResolvedCities, SqlPredicate,
	compile_locations,
};
pub use time_period::{DateRange, TimePeriodFilter, merge_date_ranges, resolve_time_periods};
