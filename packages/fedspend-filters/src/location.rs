use std::collections::BTreeMap;

use fedspend_domain::code_variants::code_variants;

use crate::{Error, Result};

/// One user-supplied location clause. `country` is required; `county` and
/// `district` require `state`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct LocationFilterRequest {
	pub country: Option<String>,
	pub state: Option<String>,
	pub zip: Option<String>,
	#[serde(default)]
	pub county: Vec<String>,
	#[serde(default)]
	pub district: Vec<String>,
	pub city: Option<String>,
}

/// Per-state filter values. County and district codes are stored already
/// expanded into their storage variants ("01" → "1", "01", "1.0").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateBucket {
	pub counties: Vec<String>,
	pub districts: Vec<String>,
	pub cities: Vec<String>,
}
impl StateBucket {
	pub fn is_empty(&self) -> bool {
		self.counties.is_empty() && self.districts.is_empty() && self.cities.is_empty()
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryBucket {
	pub zips: Vec<String>,
	/// City filters given without a state attach at the country level.
	pub cities: Vec<String>,
	pub states: BTreeMap<String, StateBucket>,
}

/// Location clauses merged into one nested country → state structure.
/// Successive `add` calls only ever extend buckets, never replace them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedLocations {
	countries: BTreeMap<String, CountryBucket>,
}
impl NormalizedLocations {
	pub fn build(requests: &[LocationFilterRequest]) -> Result<Self> {
		let mut normalized = Self::default();

		for request in requests {
			normalized.add(request)?;
		}

		Ok(normalized)
	}

	pub fn add(&mut self, request: &LocationFilterRequest) -> Result<()> {
		let country = validate(request)?;
		let bucket = self.countries.entry(country.to_string()).or_default();

		if let Some(zip) = request.zip.as_deref() {
			bucket.zips.push(zip.to_string());
		}

		match request.state.as_deref() {
			Some(state) => {
				let state_bucket = bucket.states.entry(state.to_string()).or_default();

				for county in &request.county {
					state_bucket.counties.extend(code_variants(county));
				}
				for district in &request.district {
					state_bucket.districts.extend(code_variants(district));
				}
				if let Some(city) = request.city.as_deref() {
					state_bucket.cities.push(city.to_string());
				}
			},
			None =>
				if let Some(city) = request.city.as_deref() {
					bucket.cities.push(city.to_string());
				},
		}

		Ok(())
	}

	pub fn countries(&self) -> impl Iterator<Item = (&str, &CountryBucket)> {
		self.countries.iter().map(|(country, bucket)| (country.as_str(), bucket))
	}

	pub fn is_empty(&self) -> bool {
		self.countries.is_empty()
	}
}

fn validate(request: &LocationFilterRequest) -> Result<&str> {
	let Some(country) = request.country.as_deref().filter(|country| !country.is_empty()) else {
		return Err(Error::MissingCountry);
	};

	if request.state.is_none() && (!request.county.is_empty() || !request.district.is_empty()) {
		return Err(Error::MissingState);
	}

	Ok(country)
}
