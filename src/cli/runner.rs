//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, RunArgs, StoreArgs};
use crate::config::IngestConfig;
use crate::database::RecordStore;
use crate::engine::{Pipeline, RunReport};
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::http::HttpClient;
use crate::observe::{Observer, TracingObserver};
use crate::record::{FollowerProfile, FollowerSummary, Record};
use crate::state::StateManager;
use crate::types::SchemaVariant;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Exit status for a successful command
pub const EXIT_OK: i32 = 0;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command and return the process exit status
    pub async fn run(&self, cancel: CancellationToken) -> Result<i32> {
        match self.cli.command() {
            Commands::Run(args) => self.ingest(&args, &cancel).await,
            Commands::InitDb(args) => self.init_db(&args),
            Commands::ShowConfig(args) => self.show_config(&args),
        }
    }

    /// Load the config file (or defaults)
    fn load_config(&self) -> Result<IngestConfig> {
        match &self.cli.config {
            Some(path) => IngestConfig::from_file(path),
            None => Ok(IngestConfig::default()),
        }
    }

    /// Config file plus run overrides, validated
    pub fn effective_config(&self, args: &RunArgs) -> Result<IngestConfig> {
        let mut config = self.load_config()?;
        args.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Print the effective configuration
    fn show_config(&self, args: &RunArgs) -> Result<i32> {
        let config = self.effective_config(args)?;
        print!("{}", config.to_yaml()?);
        Ok(EXIT_OK)
    }

    /// Create the table for the configured shape
    fn init_db(&self, args: &StoreArgs) -> Result<i32> {
        let mut config = self.load_config()?;
        args.apply(&mut config);
        config.validate()?;

        let store = RecordStore::open(&config.store.path, &config.store.table)?;
        store.ensure_schema(config.store.schema)?;
        info!(
            path = %config.store.path.display(),
            table = %config.store.table,
            schema = %config.store.schema,
            "Table ready"
        );
        Ok(EXIT_OK)
    }

    /// Ingest with the record type matching the configured shape
    async fn ingest(&self, args: &RunArgs, cancel: &CancellationToken) -> Result<i32> {
        let config = self.effective_config(args)?;
        let cursor = args.cursor.as_deref();

        let report = match config.store.schema {
            SchemaVariant::Minimal => {
                ingest_as::<FollowerSummary>(&config, cursor, cancel).await?
            }
            SchemaVariant::Extended => {
                ingest_as::<FollowerProfile>(&config, cursor, cancel).await?
            }
        };
        Ok(report.exit_code())
    }
}

/// Wire up fetcher, store and checkpoint, then drive the run to completion.
///
/// An explicit `cursor` wins over a saved checkpoint. Setup problems are
/// returned as errors; everything after the first fetch ends up in the report.
pub async fn ingest_as<R: Record>(
    config: &IngestConfig,
    cursor: Option<&str>,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    let store = RecordStore::open(&config.store.path, &config.store.table)?;
    store.ensure_table::<R>()?;
    let schema = R::VARIANT;
    info!(
        path = %config.store.path.display(),
        table = %config.store.table,
        %schema,
        "Opened database"
    );

    let observer: Arc<dyn Observer> = Arc::new(TracingObserver);
    let client = HttpClient::with_config(config.http_client_config())?;
    let mut fetcher = PageFetcher::new(client, config.page_request()?)
        .with_decoder(config.decoder())
        .with_policy(config.retry_policy())
        .with_observer(Arc::clone(&observer));
    if let Some(limiter) = config.rate_limiter()? {
        fetcher = fetcher.with_rate_limiter(limiter);
    }

    let mut pipeline = Pipeline::<R, _, _>::new(fetcher, store)
        .with_observer(observer)
        .with_config(config.pipeline_config());

    let mut start = cursor.unwrap_or_default().to_string();
    if let Some(path) = &config.run.state_file {
        let state = StateManager::from_file(path)?;
        if cursor.is_none() {
            if let Some(resume) = state.resume_cursor().await {
                info!(cursor = %resume, state_file = %path.display(), "Resuming from checkpoint");
                start = resume;
            }
        }
        pipeline = pipeline.with_state(state);
    }

    info!(actor = %config.api.actor, cursor = %start, "Starting ingestion");
    let report = pipeline.run(&start, cancel).await;
    info!(
        status = %report.status(),
        records_written = report.state.records_written,
        pages = report.state.pages_committed,
        resume_cursor = %report.resume_cursor(),
        duration_ms = report.duration_ms,
        "Run finished"
    );

    Ok(report)
}
