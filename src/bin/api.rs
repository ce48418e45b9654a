use diligence_report_orchestrator::{
    api::{start_server, ApiState},
    config::AppConfig,
    limiter::RateLimiter,
    openai::OpenAiClient,
    orchestrator::Orchestrator,
    render::HtmlRenderer,
    retrieval::{InMemorySnippetStore, NeighborHttpIndex, RetrievalClient},
    retry::RetryPolicy,
    storage::{BucketHttpStore, InMemoryObjectStore, ObjectStore},
    store::{InMemoryReportStore, PostgresReportStore, ReportStore},
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();
    let config = AppConfig::from_env();

    if config.openai_api_key.is_empty() {
        warn!("OPENAI_API_KEY not set; generation requests will fail until configured");
    }

    info!("Diligence Report Orchestrator - API Server");
    info!("Port: {}", config.api_port);

    // Shared OpenAI client (chat + embeddings)
    let openai = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.embedding_model.clone(),
    ));

    let limiter = Arc::new(RateLimiter::new(
        config.max_concurrent_generations,
        config.section_delay,
    ));
    let retry = RetryPolicy {
        max_attempts: config.retry_max_attempts,
        delay: config.retry_delay,
    };

    let mut orchestrator = Orchestrator::new(openai.clone(), limiter, retry);

    match &config.retrieval {
        Some(retrieval) => {
            info!(
                endpoint = %retrieval.endpoint_resource_name,
                index = %retrieval.deployed_index_id,
                "Vector retrieval enabled"
            );
            let index = Arc::new(NeighborHttpIndex::new(
                retrieval.endpoint_resource_name.clone(),
                retrieval.deployed_index_id.clone(),
            ));
            let client = Arc::new(RetrievalClient::new(
                openai.clone(),
                index,
                Arc::new(InMemorySnippetStore::new()),
            ));
            orchestrator = orchestrator.with_retrieval(client, retrieval.top_k);
        }
        None => {
            warn!("Retrieval endpoint/index not configured; reports run without vector context");
        }
    }

    let store: Arc<dyn ReportStore> = match &config.database_url {
        Some(url) => {
            info!("Report store backend: postgres");
            Arc::new(PostgresReportStore::connect_lazy(url)?)
        }
        None => {
            info!("Report store backend: in-memory");
            Arc::new(InMemoryReportStore::new())
        }
    };

    let objects: Arc<dyn ObjectStore> = match &config.bucket {
        Some(bucket) => {
            info!(bucket = %bucket.bucket, "Document storage backend: bucket");
            Arc::new(BucketHttpStore::new(bucket))
        }
        None => {
            info!("Document storage backend: in-memory");
            Arc::new(InMemoryObjectStore::new())
        }
    };

    let state = ApiState {
        orchestrator: Arc::new(orchestrator),
        store,
        renderer: Arc::new(HtmlRenderer),
        objects,
    };

    info!("Orchestrator initialized, starting API server");

    start_server(state, config.api_port).await?;

    Ok(())
}
