use anyhow::{Context, Result};
use clap::Parser;
use docport_importer::{open_store, Config, ImportProgress, Importer, RecordSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docport-import")]
#[command(about = "Upload each top-level entry of a JSON file as a Firestore document")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "docport.toml")]
    config: PathBuf,

    /// JSON file with the records to upload
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Target collection
    #[arg(long)]
    collection: Option<String>,

    /// Service-account key file
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Project id (defaults to the one in the key file)
    #[arg(long)]
    project_id: Option<String>,

    /// Firestore database id
    #[arg(long)]
    database: Option<String>,

    /// Write to a Firestore emulator at host:port
    #[arg(long, env = "FIRESTORE_EMULATOR_HOST")]
    emulator_host: Option<String>,

    /// Validate the input and list the keys without writing
    #[arg(long)]
    dry_run: bool,

    /// Draw a progress bar on stderr
    #[arg(long)]
    progress_bar: bool,
}

impl Cli {
    fn apply(self, mut config: Config) -> Config {
        if let Some(input) = self.input {
            config.import.input = input;
        }
        if let Some(collection) = self.collection {
            config.import.collection = collection;
        }
        if let Some(credentials) = self.credentials {
            config.firestore.credentials = credentials;
        }
        if self.project_id.is_some() {
            config.firestore.project_id = self.project_id;
        }
        if let Some(database) = self.database {
            config.firestore.database = database;
        }
        if self.emulator_host.is_some() {
            config.firestore.emulator_host = self.emulator_host;
        }
        config.import.dry_run |= self.dry_run;
        config.import.progress_bar |= self.progress_bar;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    let mut config = cli.apply(config);
    config.expand_paths()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let records = RecordSet::load(&config.import.input)?;
    tracing::info!(
        "Loaded {} records from {}",
        records.len(),
        config.import.input.display()
    );

    let store = open_store(&config.firestore)?;
    let progress = Arc::new(ImportProgress::new(config.import.progress_bar));
    let importer = Importer::new(store).with_progress(progress);

    if config.import.dry_run {
        let plan = importer.plan(&records, &config.import.collection)?;
        for key in &plan.written {
            println!("Would upload: {}", key);
        }
        tracing::info!(
            "Dry run: {} documents would be written to '{}'",
            plan.count(),
            plan.collection
        );
        return Ok(());
    }

    importer.run(&records, &config.import.collection).await?;
    Ok(())
}
