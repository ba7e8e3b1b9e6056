//! Lambda entry point for the estimates backend.

use aws_config::BehaviorVersion;
use lambda_http::{run, service_fn, Error as LambdaError, Request};
use linksaver_common::defaults::TABLE_NAME_ENV;
use linksaver_handler::dispatch;
use linksaver_handler::store::DynamoStore;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time() // CloudWatch adds the ingestion time
        .with_target(false)
        .init();

    let table_name = std::env::var(TABLE_NAME_ENV)
        .map_err(|_| format!("{TABLE_NAME_ENV} environment variable not set"))?;
    info!(table = %table_name, "Handler starting");

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let store = DynamoStore::new(aws_sdk_dynamodb::Client::new(&config), table_name);

    run(service_fn(|request: Request| async {
        Ok::<_, LambdaError>(dispatch(&store, request).await)
    }))
    .await
}
