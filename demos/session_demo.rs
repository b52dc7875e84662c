//! Session walkthrough against a running InvestAfrik backend
//!
//! Usage:
//!   INVESTAFRIK_BASE_URL=http://localhost:8000 ACCESS_TOKEN=... REFRESH_TOKEN=... \
//!     cargo run --example session_demo

use investafrik_rs_client::format::{days_remaining, format_currency, funding_percentage};
use investafrik_rs_client::{
    AppContext, ChannelNavigator, ClientConfig, FileStorage, NotificationEvent, PageCsrf,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::from_env()?;
    let storage_path = std::env::var("CREDENTIALS_FILE")
        .unwrap_or_else(|_| "investafrik-credentials.json".to_string());
    let csrf = match std::env::var("CSRF_COOKIE") {
        Ok(cookies) => PageCsrf::new().with_cookies(cookies),
        Err(_) => PageCsrf::new(),
    };
    let (navigator, mut navigations) = ChannelNavigator::new();

    println!("=== InvestAfrik Client Example ===");
    println!("Base URL: {}", config.base_url);
    println!("Auth mode: {:?}", config.auth_mode);
    println!();

    let ctx = AppContext::init(
        config,
        Arc::new(FileStorage::new(storage_path)),
        Arc::new(csrf),
        Arc::new(navigator),
    )?;

    if let (Ok(access), Ok(refresh)) = (std::env::var("ACCESS_TOKEN"), std::env::var("REFRESH_TOKEN")) {
        ctx.credentials().set(&access, &refresh)?;
        println!("✓ Credentials stored");
    }
    println!("Authenticated: {}", ctx.is_authenticated());
    println!();

    let mut events = ctx.notifications().subscribe();

    match ctx.api().get("/api/projects/").await {
        Ok(response) if response.status().is_success() => {
            let projects: Vec<serde_json::Value> = response.json().await?;
            ctx.notifications().success(format!("{} projets chargés", projects.len()));

            for project in projects.iter().take(5) {
                let title = project["title"].as_str().unwrap_or("?");
                let raised = project["amount_raised"].as_f64().unwrap_or(0.0);
                let goal = project["funding_goal"].as_f64().unwrap_or(0.0);
                let end = project["end_date"].as_str().unwrap_or("");
                println!(
                    "  - {title}: {} / {} ({:.0}%), {} jours restants",
                    format_currency(raised, "XAF"),
                    format_currency(goal, "XAF"),
                    funding_percentage(raised, goal),
                    days_remaining(end).unwrap_or(0)
                );
            }
        }
        Ok(response) => {
            ctx.notifications()
                .warning(format!("Réponse inattendue: {}", response.status()));
        }
        Err(e) => {
            ctx.notifications().error(format!("Erreur: {e}"));
        }
    }

    while let Ok(event) = events.try_recv() {
        if let NotificationEvent::Shown(n) = event {
            println!("[{:?}] {}", n.kind, n.message);
        }
    }
    while let Ok(path) = navigations.try_recv() {
        println!("→ navigate to {path}");
    }

    ctx.shutdown();

    println!();
    println!("Done!");

    Ok(())
}
