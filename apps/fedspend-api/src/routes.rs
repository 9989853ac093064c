use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use fedspend_service::{
	AwardAmountRequest, AwardAmountResponse, CfdaSpendingRequest, CfdaSpendingResponse,
	ChildLayers, ServiceError, SpendingOverTimeRequest, SpendingOverTimeResponse, TreeNode,
	account_tree, disaster, spending_over_time,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/v2/search/spending_over_time", post(spending_over_time_handler))
		.route("/api/v2/disaster/award/amount", post(award_amount))
		.route("/api/v2/disaster/cfda/spending", post(cfda_spending))
		.route("/api/v2/references/filter_tree/tas", post(filter_tree))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn spending_over_time_handler(
	State(state): State<AppState>,
	Json(payload): Json<SpendingOverTimeRequest>,
) -> Result<Json<SpendingOverTimeResponse>, ApiError> {
	let response = spending_over_time::spending_over_time(&state.service, payload).await?;
	Ok(Json(response))
}

async fn award_amount(
	State(state): State<AppState>,
	Json(payload): Json<AwardAmountRequest>,
) -> Result<Json<AwardAmountResponse>, ApiError> {
	let response = disaster::award_amount(&state.service, payload).await?;
	Ok(Json(response))
}

async fn cfda_spending(
	State(state): State<AppState>,
	Json(payload): Json<CfdaSpendingRequest>,
) -> Result<Json<CfdaSpendingResponse>, ApiError> {
	let response = disaster::cfda_spending(&state.service, payload).await?;
	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct FilterTreeRequest {
	#[serde(default)]
	path: Vec<String>,
	#[serde(default = "default_child_layers")]
	child_layers: i64,
	filter: Option<String>,
}

fn default_child_layers() -> i64 {
	-1
}

#[derive(Debug, Serialize)]
struct FilterTreeResponse {
	results: Vec<TreeNode>,
}

async fn filter_tree(
	State(state): State<AppState>,
	Json(payload): Json<FilterTreeRequest>,
) -> Result<Json<FilterTreeResponse>, ApiError> {
	let child_layers = ChildLayers::parse(payload.child_layers).ok_or_else(|| {
		json_error(
			StatusCode::BAD_REQUEST,
			"invalid_request",
			format!("child_layers must be 0, 1, 2, or -1, got {}.", payload.child_layers),
		)
	})?;
	let results = account_tree::filter_tree(
		&state.service,
		&payload.path,
		child_layers,
		payload.filter.as_deref(),
	)
	.await?;
	Ok(Json(FilterTreeResponse { results }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::InvalidRequest { .. } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::Precondition { .. } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_server_error", message),
			ServiceError::Search { .. } =>
				json_error(StatusCode::SERVICE_UNAVAILABLE, "search_unavailable", message),
			ServiceError::Storage { .. } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };
		(self.status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tree_requests_default_to_the_root_with_all_layers() {
		let request: FilterTreeRequest = serde_json::from_str("{}").expect("valid request");

		assert!(request.path.is_empty());
		assert_eq!(request.child_layers, -1);
		assert_eq!(request.filter, None);
	}

	#[test]
	fn service_errors_map_to_their_status_codes() {
		let cases = [
			(ServiceError::InvalidRequest { message: "bad".to_string() }, StatusCode::BAD_REQUEST),
			(
				ServiceError::Precondition { message: "broken".to_string() },
				StatusCode::INTERNAL_SERVER_ERROR,
			),
			(
				ServiceError::Search { message: "down".to_string() },
				StatusCode::SERVICE_UNAVAILABLE,
			),
			(
				ServiceError::Storage { message: "down".to_string() },
				StatusCode::INTERNAL_SERVER_ERROR,
			),
		];

		for (error, status) in cases {
			assert_eq!(ApiError::from(error).status, status);
		}
	}
}
