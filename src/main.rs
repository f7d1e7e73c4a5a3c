use btp_quotes::{
    config::{database, settings},
    core::{quote::Quote, report, store, validation},
    errors::{Error, Result},
};
use chrono::Utc;
use dotenvy::dotenv;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load application settings
    let config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    // 4. Read the quote payload
    let path = env::args().nth(1).ok_or_else(|| Error::Config {
        message: "usage: btp-quotes <quote.json>".to_string(),
    })?;
    let payload = std::fs::read_to_string(&path)
        .inspect_err(|e| error!("Failed to read {path}: {e}"))?;
    let mut raw: serde_json::Value = serde_json::from_str(&payload)?;
    config.defaults.fill_payload(&mut raw);
    let mut quote: Quote = serde_json::from_value(raw)?;
    info!(
        rows = quote.line_items().len(),
        total_incl_tax = %quote.total_incl_tax(),
        "Quote loaded from {path}"
    );

    for issue in validation::validate_quote(&quote) {
        warn!("{issue}");
    }

    // 5. Initialize database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;

    // 6. Fill in what the payload left out, then store
    let today = Utc::now().date_naive();
    if quote.number.trim().is_empty() {
        quote.number = store::next_quote_number(&db, &config.numbering.quote, today).await?;
        info!(number = %quote.number, "Assigned quote number");
    }
    config.defaults.fill_validity(&mut quote);

    let saved = store::save_quote(&db, &quote).await?;
    let id = saved.id.ok_or_else(|| Error::QuoteNotSaved {
        number: saved.number.clone(),
    })?;

    // 7. Summarize, counting invoices already issued against this quote
    let summary = report::generate_quote_report(&db, id).await?;
    for line in &summary.lines {
        info!("{}", report::format_report_line(line));
    }
    info!(
        number = %summary.number,
        total_excl_tax = %summary.total_excl_tax,
        total_tax = %summary.total_tax,
        total_incl_tax = %summary.total_incl_tax,
        deposit = %summary.deposit_amount,
        billed = %report::format_progress_bar(summary.billed_percent, None),
        "Quote saved"
    );

    println!("{}", serde_json::to_string_pretty(&saved)?);
    Ok(())
}
