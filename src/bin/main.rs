use diligence_report_orchestrator::{
    limiter::RateLimiter,
    models::ReportRequest,
    openai::MockTextGenerator,
    orchestrator::Orchestrator,
    retry::RetryPolicy,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("Diligence Report Orchestrator starting (demo run, mock backend)");

    // Create components
    let generator = Arc::new(MockTextGenerator::new(
        "### Demo Section\n\nGenerated placeholder prose. \u{1F7E2} Strong",
    ));
    let limiter = Arc::new(RateLimiter::unthrottled());
    let orchestrator = Orchestrator::new(generator, limiter, RetryPolicy::immediate(3));

    // Sample request
    let request = ReportRequest {
        company: Some("Acme".to_string()),
        industry: Some("Fintech".to_string()),
        funding_stage: Some("Seed".to_string()),
        founder_name: Some("Jordan Reyes".to_string()),
        pitch_deck_text: Some("Acme automates reconciliation for mid-market lenders.".to_string()),
        ..Default::default()
    };

    info!(
        company = request.company.as_deref().unwrap_or(""),
        "Running report orchestration"
    );

    let cancel = CancellationToken::new();
    match orchestrator.generate_report(&request, &cancel).await {
        Ok(report) => {
            println!("\n=== REPORT GENERATION RESULT ===");
            for (key, status) in report.statuses() {
                println!("  {:30} {:?}", key.storage_key(), status);
            }
            println!(
                "\nFully generated: {} ({} failed)",
                report.fully_generated(),
                report.failed_count()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Report orchestration failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
