use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ev_registry::app::dashboard::{LookupView, UpdateView};
use ev_registry::app::render::{self, OutputFormat};
use ev_registry::config::AppConfig;
use ev_registry::core::query::{VehicleFilter, VehicleUpdate};
use ev_registry::core::DocumentStore;
use ev_registry::domain::model::Document;
use ev_registry::utils::logger;
use ev_registry::utils::validation::{validate_positive_number, Validate};
use ev_registry::{Dashboard, EtlError, JsonFileStore, LocalStorage};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "evdash")]
#[command(about = "Explore and edit electric vehicle registration records")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the collections (overrides store.data_dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a converted document file into the collection, replacing its contents
    Import { file: PathBuf },

    #[command(flatten)]
    View(ViewCommand),
}

#[derive(Subcommand, Debug)]
enum ViewCommand {
    /// Vehicle details for a VIN (first 10 characters)
    Lookup { vin: String },

    /// VIN retrieval by make, model, ZIP code and model year
    Find(FindArgs),

    /// Update EV information for a VIN; blank fields are left unchanged
    Update(UpdateArgs),

    /// Most registered make/model pairs
    PopularModels {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Registrations per county
    AdoptionByCounty {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Args, Debug)]
struct FindArgs {
    #[arg(long)]
    make: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    zip_code: Option<String>,
    #[arg(long = "year")]
    model_year: Option<String>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    vin: String,
    #[arg(long)]
    make: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long = "year")]
    model_year: Option<String>,
    #[arg(long)]
    zip_code: Option<String>,
    /// Electric range
    #[arg(long)]
    electric_range: Option<String>,
    /// Base MSRP
    #[arg(long)]
    base_msrp: Option<String>,
}

impl From<FindArgs> for VehicleFilter {
    fn from(args: FindArgs) -> Self {
        VehicleFilter {
            make: args.make,
            model: args.model,
            zip_code: args.zip_code,
            model_year: args.model_year,
        }
    }
}

impl UpdateArgs {
    fn into_parts(self) -> (String, VehicleUpdate) {
        let update = VehicleUpdate {
            make: self.make,
            model: self.model,
            model_year: self.model_year,
            zip_code: self.zip_code,
            electric_range: self.electric_range,
            base_msrp: self.base_msrp,
        };
        (self.vin, update)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.log_json);

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<EtlError>() {
            Some(etl) => {
                tracing::error!(
                    "❌ {} (Category: {:?}, Severity: {:?})",
                    etl,
                    etl.category(),
                    etl.severity()
                );
                eprintln!("❌ {}", etl.user_friendly_message());
                eprintln!("💡 {}", etl.recovery_suggestion());
                std::process::exit(etl.exit_code());
            }
            None => {
                eprintln!("❌ {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.store.data_dir = data_dir;
    }
    config.validate()?;
    tracing::debug!("Configuration: {:?}", config);

    let storage = LocalStorage::new(config.store.data_dir.clone());
    let collection_file = config.store.collection_file();
    let identifier_field = config.store.identifier_field.clone();

    let view = match cli.command {
        Command::Import { file } => {
            return import(&file, storage, collection_file, identifier_field).await;
        }
        Command::View(view) => view,
    };

    // 儲存端在這裡開啟，結束時隨 store 一起釋放
    let store = JsonFileStore::open(storage, collection_file, identifier_field).await?;
    let dashboard =
        Dashboard::new(&store).with_top_models_limit(config.dashboard.top_models_limit);
    let chart_width = config.dashboard.chart_width;

    match view {
        ViewCommand::Lookup { vin } => match dashboard.vehicle_details(&vin).await? {
            LookupView::Found(details) => {
                println!("Vehicle details found!\n");
                println!("{}", render::render_details(&details));
            }
            LookupView::NotFound { identifier } => {
                println!("No vehicle found with VIN {}.", identifier);
            }
        },
        ViewCommand::Find(args) => {
            let filter = VehicleFilter::from(args);
            let vins = dashboard.vins_by_criteria(&filter).await?;
            if vins.is_empty() {
                println!("No vehicles found matching your criteria.");
            } else {
                println!("Found {} VIN(s) matching your criteria.\n", vins.len());
                println!("{}", render::render_vin_list(&vins));
            }
        }
        ViewCommand::Update(args) => {
            let (vin, update) = args.into_parts();
            let view = dashboard.update_vehicle(&vin, &update).await?;
            println!("{}", render::render_update(&view));
            if matches!(view, UpdateView::Updated { .. }) {
                println!("\nVehicle information updated successfully!");
            }
        }
        ViewCommand::PopularModels { limit, format } => {
            let dashboard = match limit {
                Some(limit) => {
                    validate_positive_number("limit", limit, 1)?;
                    dashboard.with_top_models_limit(limit)
                }
                None => dashboard,
            };
            let models = dashboard.popular_models().await?;
            if models.is_empty() {
                println!("No registrations in the collection.");
            } else {
                println!("{}", render::render_popular_models(&models, format, chart_width)?);
            }
        }
        ViewCommand::AdoptionByCounty { format } => {
            let counties = dashboard.adoption_by_county().await?;
            if counties.is_empty() {
                println!("No registrations in the collection.");
            } else {
                println!("{}", render::render_county_adoption(&counties, format, chart_width)?);
            }
        }
    }

    Ok(())
}

async fn import(
    file: &Path,
    storage: LocalStorage,
    collection_file: String,
    identifier_field: String,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let documents: Vec<Document> =
        serde_json::from_slice(&bytes).map_err(|e| EtlError::MalformedInput {
            message: format!("{} is not a JSON array of objects: {}", file.display(), e),
        })?;

    let imported = documents.len();
    let store =
        JsonFileStore::create(storage, collection_file, identifier_field, documents).await?;
    println!("✅ Imported {} records into {}", imported, store.location());
    Ok(())
}
