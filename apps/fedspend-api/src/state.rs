use std::sync::Arc;

use fedspend_elastic::ElasticClient;
use fedspend_service::SpendService;
use fedspend_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SpendService>,
}
impl AppState {
	pub async fn new(config: fedspend_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let es = ElasticClient::new(&config.storage.elasticsearch)?;
		let service = SpendService::new(config, db, es);

		Ok(Self { service: Arc::new(service) })
	}
}
