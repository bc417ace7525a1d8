#![forbid(unsafe_code)]

mod args;
mod defaults;
mod input;
mod report;

use args::{CliConfig, Command, InputSource};
use input::InputError;
use report::{CacheInfoReport, LayoutReport, LogObserver};
use std::io::Write;
use std::sync::Arc;
use tl_core::model::DatasetError;
use tl_core::sample::{SampleShape, generate};
use tl_layout::{
    LayeredOracle, LayoutError, Orchestrator, OrchestratorOptions, SessionContext,
};
use tl_storage::{
    CacheOptions, Clock, KvStore, LayoutCache, MemoryKvStore, SqliteKvStore, StoreError,
    SystemClock,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TIERLAYOUT_LOG";

#[derive(Debug)]
enum CliError {
    Input(InputError),
    Dataset(DatasetError),
    Store(StoreError),
    Layout(LayoutError),
    Output(std::io::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Input(_) | Self::Dataset(_) => 2,
            Self::Store(_) | Self::Layout(_) | Self::Output(_) => 1,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Input(err) => err.code(),
            Self::Dataset(err) => err.code(),
            Self::Store(err) => err.code(),
            Self::Layout(err) => err.code(),
            Self::Output(_) => "OUTPUT_IO",
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(err) => write!(f, "{err}"),
            Self::Dataset(err) => write!(f, "invalid dataset: {err}"),
            Self::Store(err) => write!(f, "cannot open layout cache: {err}"),
            Self::Layout(err) => write!(f, "layout failed: {err}"),
            Self::Output(err) => write!(f, "cannot write output: {err}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<InputError> for CliError {
    fn from(value: InputError) -> Self {
        Self::Input(value)
    }
}

impl From<DatasetError> for CliError {
    fn from(value: DatasetError) -> Self {
        Self::Dataset(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<LayoutError> for CliError {
    fn from(value: LayoutError) -> Self {
        Self::Layout(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Output(value)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn write_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)
        .map_err(|err| CliError::Output(std::io::Error::other(err)))?;
    writeln!(out)?;
    Ok(())
}

/// The persistent store, or a process-local one when it cannot be opened.
/// Only the explicit cache commands treat an unusable store as an error.
fn open_store(cfg: &CliConfig) -> Result<Box<dyn KvStore>, CliError> {
    match SqliteKvStore::open(&cfg.storage_dir) {
        Ok(store) => Ok(Box::new(store)),
        Err(err) if cfg.clear_cache || cfg.cache_info => Err(err.into()),
        Err(err) => {
            warn!(
                storage_dir = %cfg.storage_dir.display(),
                code = err.code(),
                error = %err,
                "layout cache unavailable; continuing without persistence"
            );
            Ok(Box::new(MemoryKvStore::new()))
        }
    }
}

fn run(cfg: &CliConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let store = open_store(cfg)?;
    let mut cache = LayoutCache::with_clock(
        store,
        SystemClock,
        CacheOptions {
            fingerprint_mode: cfg.fingerprint_mode,
            ..CacheOptions::default()
        },
    );

    if cfg.clear_cache {
        cache.clear();
        info!(storage_dir = %cfg.storage_dir.display(), "layout cache cleared");
    }
    if cfg.cache_info {
        write_json(out, &CacheInfoReport::new(&cache.info(), SystemClock.now_ms()))?;
    }

    let Some(source) = &cfg.input else {
        return Ok(());
    };
    let (dataset, layout_config) = match source {
        InputSource::File(path) => {
            let document = input::load(path)?;
            (document.dataset, document.layout_config)
        }
        InputSource::Sample => (generate(SampleShape::default()), None),
    };
    if cfg.strict {
        dataset.validate()?;
    }

    let options = OrchestratorOptions {
        strategy: cfg.strategy,
        timeout: cfg.timeout,
        use_cache: cfg.use_cache,
        materialize: tl_core::graph::MaterializeOptions {
            strict_names: cfg.strict,
        },
        config: layout_config.unwrap_or_default(),
        ..OrchestratorOptions::default()
    };
    let mut orchestrator = Orchestrator::new(cache, Arc::new(LayeredOracle::default()), options);
    let mut session = SessionContext::new(dataset);
    let outcome = orchestrator.run(&mut session, &mut LogObserver)?;
    info!(
        source = outcome.source.as_str(),
        nodes = outcome.graph.node_count(),
        edges = outcome.graph.edges.len(),
        "layout done"
    );

    let report = LayoutReport::new(&outcome, session.materialized());
    match &cfg.output {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            write_json(&mut file, &report)?;
        }
        None => write_json(out, &report)?,
    }
    Ok(())
}

fn main() {
    init_tracing();
    let cfg = match args::parse_args() {
        Ok(Command::Help) => {
            print!("{}", args::usage());
            return;
        }
        Ok(Command::Run(cfg)) => cfg,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = run(&cfg, &mut out) {
        eprintln!("{} ({})", err, err.code());
        std::process::exit(err.exit_code());
    }
}

#[cfg(test)]
mod tests;
