use serde_json::Value;

use crate::{Error, Result, client::ElasticClient, response};

/// Deterministic deep pagination over a sorted query. The body must carry a
/// total-order `sort`; each page's last sort key becomes the next page's
/// `search_after` cursor.
#[derive(Debug)]
pub struct SearchAfterScan {
	client: ElasticClient,
	index: String,
	body: Value,
	cursor: Option<Value>,
	finished: bool,
}
impl SearchAfterScan {
	pub fn new(client: ElasticClient, index: impl Into<String>, body: Value) -> Self {
		Self { client, index: index.into(), body, cursor: None, finished: false }
	}

	/// Fetches the next page of hits, or `None` once the scan is drained.
	/// A query matching nothing drains on the first call.
	pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
		if self.finished {
			return Ok(None);
		}

		let mut body = self.body.clone();

		if let Some(cursor) = &self.cursor {
			body["search_after"] = cursor.clone();
		}

		let response = self.client.search(&self.index, &body).await?;
		let hits = response::hits(&response);

		if hits.is_empty() {
			self.finished = true;

			return Ok(None);
		}

		let Some(cursor) = hits.last().and_then(|hit| hit.get("sort")).cloned() else {
			return Err(Error::InvalidResponse {
				message: "scan hit is missing its sort key".to_string(),
			});
		};

		tracing::debug!(index = %self.index, hits = hits.len(), "scanned page");

		self.cursor = Some(cursor);

		Ok(Some(hits.to_vec()))
	}
}
