pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Http(#[from] reqwest::Error),
	#[error("search request failed with status {status}: {body}")]
	Status { status: u16, body: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("search failed after {attempts} attempts")]
	Exhausted {
		attempts: u32,
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Transport failures and server-side errors are worth another attempt;
	/// 4xx statuses and malformed bodies are not.
	pub(crate) fn is_retryable(&self) -> bool {
		match self {
			Self::Http(_) => true,
			Self::Status { status, .. } => *status >= 500,
			_ => false,
		}
	}
}
