pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid filter: missing necessary location field: country.")]
	MissingCountry,
	#[error("Invalid filter: missing necessary location field: state.")]
	MissingState,
	#[error("Invalid filter: {message}")]
	InvalidFilter { message: String },
}
