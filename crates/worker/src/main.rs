use clap::Parser;
use pepe_core::ingest::extract::ExtractOptions;
use pepe_core::ingest::metrics::{fetch_snapshot, HttpMetricsSource};
use pepe_core::ingest::news::{apply_fallback, scrape_news, GoogleNewsScraper};
use pepe_core::domain::report::{DigestResponse, Report};
use pepe_core::llm::error::LlmDiagnosticsError;
use pepe_core::llm::prompt::{build_prompt, PromptStyle};
use pepe_core::pipeline::Pipeline;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "pepe_worker")]
struct Args {
    /// Use the news-digest prompt instead of asking for a trading call.
    #[arg(long)]
    digest: bool,

    /// Fetch metrics and news, print the prompt, and skip the model call.
    #[arg(long)]
    dry_run: bool,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = pepe_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let style = if args.digest {
        PromptStyle::Digest
    } else {
        PromptStyle::Advice
    };

    if args.dry_run {
        let metrics = HttpMetricsSource::from_settings(&settings)?;
        let news = GoogleNewsScraper::from_settings(&settings)?;
        let opts = ExtractOptions::from_env();

        let (snapshot, items) = tokio::join!(fetch_snapshot(&metrics), scrape_news(&news, &opts));
        let items = apply_fallback(items, settings.news_fallback);

        tracing::info!(dry_run = true, news = items.len(), ?style, "skipping model call");
        println!("{}", build_prompt(&snapshot, &items, style));
        return Ok(());
    }

    let pipeline = Pipeline::from_settings(&settings)?;
    match pipeline.run(style).await {
        Ok(report) => {
            tracing::info!(
                recommendation = %report.trading_advice.recommendation,
                news = report.google_news.len(),
                "report written"
            );
            println!("{}", render(report, style, args.pretty)?);
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
                tracing::error!(
                    stage = diag.stage.as_str(),
                    status = ?diag.status,
                    raw_body = diag.raw_body.as_deref().unwrap_or(""),
                    "model call failed"
                );
            }
            println!("{}", serde_json::json!({ "error": err.to_string() }));
            Err(err)
        }
    }
}

/// Digest runs print the same shape `/api/pepe-news` serves.
fn render(report: Report, style: PromptStyle, pretty: bool) -> serde_json::Result<String> {
    let value = match style {
        PromptStyle::Advice => serde_json::to_value(report)?,
        PromptStyle::Digest => serde_json::to_value(DigestResponse::from(report))?,
    };
    if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
}

fn init_sentry(settings: &pepe_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
