use clap::Parser;
use ev_registry::config::AppConfig;
use ev_registry::utils::{logger, validation::Validate};
use ev_registry::{ConversionPipeline, EtlEngine, LocalStorage, ShortRowPolicy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "convert-rows")]
#[command(about = "Reshape a column-oriented JSON export into a list of documents keyed by column name")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input export (overrides convert.input_path)
    #[arg(short, long)]
    input: Option<String>,

    /// Output file (overrides convert.output_path)
    #[arg(short, long)]
    output: Option<String>,

    /// What to do with rows shorter than the column list
    #[arg(long, value_enum)]
    short_rows: Option<ShortRowPolicy>,

    /// Parse and transform only, write nothing
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    logger::init_logger(args.verbose, args.log_json);
    tracing::info!("🚀 Starting convert-rows");

    let mut config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    // 套用命令列覆蓋設定
    if let Some(input) = args.input {
        config.convert.input_path = input;
    }
    if let Some(output) = args.output {
        config.convert.output_path = output;
    }
    if let Some(policy) = args.short_rows {
        config.convert.short_rows = policy;
        tracing::info!("🔧 Short row policy overridden to: {:?}", policy);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    tracing::debug!("Convert settings: {:?}", config.convert);

    // 路徑以目前工作目錄為基準
    let storage = LocalStorage::new(".");
    let pipeline = ConversionPipeline::new(storage, config.convert.clone());
    let engine = EtlEngine::new(pipeline);

    let result = if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        engine.dry_run().await
    } else {
        engine.run().await
    };

    match result {
        Ok(report) => {
            if args.dry_run {
                println!(
                    "🔍 Dry run: {} rows x {} columns would be written to {}",
                    report.rows_read, report.column_count, config.convert.output_path
                );
            } else {
                println!("Data has been formatted successfully.");
                println!(
                    "📁 {} documents saved to: {}",
                    report.documents_written, report.output_path
                );
            }
            if report.padded_rows > 0 {
                println!("⚠️ {} short rows were padded with null", report.padded_rows);
            }
            tracing::info!(
                "✅ Finished at {} ({} ms)",
                report.finished_at.to_rfc3339(),
                (report.finished_at - report.started_at).num_milliseconds()
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
