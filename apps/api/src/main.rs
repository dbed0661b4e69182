mod config;
mod content;
mod entities;
mod errors;
mod llm_client;
mod pipeline;
mod routes;
mod similarity;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::content::{ContentExtractor, GoogleTranslator, PdftoppmRenderer, TesseractCli};
use crate::entities::inference::InferenceClient;
use crate::entities::prompts::PromptTemplate;
use crate::llm_client::build_provider;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-ner v{}", env!("CARGO_PKG_VERSION"));

    // Few-shot examples are loaded once; a missing fixture aborts startup
    let template = PromptTemplate::from_fixture(config.reply_format, &config.few_shot_path)?;
    info!(
        "Prompt template ready ({} examples, format: {})",
        template.example_count(),
        config.reply_format.as_str()
    );

    let provider = build_provider(config.llm.clone())?;
    let inference = InferenceClient::new(provider, Arc::new(template));
    info!(
        "LLM client initialized (provider: {}, model: {})",
        inference.provider_name(),
        inference.model()
    );

    let translator = GoogleTranslator::new(
        config.translate_api_url.clone(),
        config.translate_api_key.clone(),
        config.translate_timeout,
    )?;
    let extractor = ContentExtractor::new(
        Arc::new(PdftoppmRenderer::new(
            config.pdftoppm_path.clone(),
            config.render_dpi,
        )),
        Arc::new(TesseractCli::new(
            config.tesseract_path.clone(),
            config.ocr_lang.clone(),
        )),
        Arc::new(translator),
    );

    let state = AppState {
        extractor,
        inference,
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
