use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Thin JSON client for the transaction search cluster. Cheap to clone; all
/// clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ElasticClient {
	http: Client,
	base_url: String,
	retries: u32,
}
impl ElasticClient {
	pub fn new(cfg: &fedspend_config::Elasticsearch) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { http, base_url: cfg.url.clone(), retries: cfg.retries.max(1) })
	}

	/// Runs a `_search` against `index`, retrying transport failures and 5xx
	/// responses up to the configured attempt count.
	pub async fn search(&self, index: &str, body: &Value) -> Result<Value> {
		let url = format!("{}/{index}/_search", self.base_url);
		let mut attempt = 0;

		loop {
			attempt += 1;

			match self.try_search(&url, body).await {
				Ok(json) => return Ok(json),
				Err(error) if error.is_retryable() && attempt < self.retries => {
					tracing::warn!(%url, attempt, %error, "search attempt failed, retrying");
				},
				Err(error) if error.is_retryable() =>
					return Err(Error::Exhausted { attempts: attempt, source: Box::new(error) }),
				Err(error) => return Err(error),
			}
		}
	}

	async fn try_search(&self, url: &str, body: &Value) -> Result<Value> {
		let response = self.http.post(url).json(body).send().await?;
		let status = response.status();

		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();

			return Err(Error::Status { status: status.as_u16(), body });
		}

		Ok(response.json().await?)
	}
}
