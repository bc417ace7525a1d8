#![forbid(unsafe_code)]

use crate::defaults::default_storage_dir_from_start;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tl_layout::ExecutionStrategy;
use tl_storage::FingerprintMode;

pub(crate) fn usage() -> &'static str {
    "tierlayout: lay out a tiered graph dataset and cache the result\n\n\
USAGE:\n\
  tierlayout (--input FILE | --sample) [--output FILE] [--storage-dir DIR]\n\
             [--inline] [--no-cache] [--timeout-ms MS] [--strict]\n\
             [--structural-digest]\n\
  tierlayout --clear-cache [--storage-dir DIR]\n\
  tierlayout --cache-info [--storage-dir DIR]\n\n\
NOTES:\n\
  - FILE is JSON or YAML (by extension, else sniffed). An optional\n\
    `layoutConfig` section overrides node sizes, spacing and direction.\n\
  - The result (positions + render graph) is written as JSON to --output\n\
    or stdout.\n\
  - The cache defaults to <repo-root>/.tierlayout; entries expire after 24h.\n\
  - `--inline` skips the background worker; `--timeout-ms` bounds the\n\
    worker before the synchronous fallback takes over.\n\
  - Logging: TIERLAYOUT_LOG=debug (default: warn), written to stderr.\n"
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum InputSource {
    File(PathBuf),
    Sample,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CliConfig {
    pub(crate) input: Option<InputSource>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) storage_dir: PathBuf,
    pub(crate) strategy: ExecutionStrategy,
    pub(crate) use_cache: bool,
    pub(crate) clear_cache: bool,
    pub(crate) cache_info: bool,
    pub(crate) timeout: Option<Duration>,
    pub(crate) strict: bool,
    pub(crate) fingerprint_mode: FingerprintMode,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Command {
    Help,
    Run(CliConfig),
}

pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_timeout(raw: &str, flag: &str) -> Result<Duration, String> {
    raw.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| format!("{flag} must be an integer (milliseconds)"))
}

pub(crate) fn parse_args() -> Result<Command, String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    parse_args_from(&args, env_var, &cwd)
}

pub(crate) fn parse_args_from(
    args: &[String],
    env: impl Fn(&str) -> Option<String>,
    cwd: &Path,
) -> Result<Command, String> {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(Command::Help);
    }

    let mut input: Option<InputSource> = env("TL_INPUT").map(|v| InputSource::File(v.into()));
    let mut storage_dir: Option<PathBuf> = env("TL_STORAGE_DIR").map(PathBuf::from);
    let mut timeout: Option<Duration> = match env("TL_TIMEOUT_MS") {
        Some(v) => Some(parse_timeout(&v, "TL_TIMEOUT_MS")?),
        None => None,
    };
    let mut output: Option<PathBuf> = None;
    let mut strategy = ExecutionStrategy::Background;
    let mut use_cache = true;
    let mut clear_cache = false;
    let mut cache_info = false;
    let mut strict = false;
    #[cfg_attr(not(feature = "structural-digest"), allow(unused_mut))]
    let mut fingerprint_mode = FingerprintMode::Summary;

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--input" => {
                i += 1;
                let v = args.get(i).ok_or("--input requires FILE")?;
                input = Some(InputSource::File(PathBuf::from(v)));
            }
            "--sample" => input = Some(InputSource::Sample),
            "--output" => {
                i += 1;
                let v = args.get(i).ok_or("--output requires FILE")?;
                output = Some(PathBuf::from(v));
            }
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                storage_dir = Some(PathBuf::from(v));
            }
            "--timeout-ms" => {
                i += 1;
                let v = args.get(i).ok_or("--timeout-ms requires MS")?;
                timeout = Some(parse_timeout(v, "--timeout-ms")?);
            }
            "--inline" => strategy = ExecutionStrategy::Inline,
            "--no-cache" => use_cache = false,
            "--clear-cache" => clear_cache = true,
            "--cache-info" => cache_info = true,
            "--strict" => strict = true,
            #[cfg(feature = "structural-digest")]
            "--structural-digest" => fingerprint_mode = FingerprintMode::Structural,
            #[cfg(not(feature = "structural-digest"))]
            "--structural-digest" => {
                return Err(
                    "--structural-digest requires a build with the `structural-digest` feature"
                        .to_string(),
                );
            }
            other => return Err(format!("unknown argument: {other}\n\n{}", usage())),
        }
        i += 1;
    }

    if input.is_none() && !clear_cache && !cache_info {
        return Err("--input FILE (or TL_INPUT) or --sample is required".to_string());
    }

    Ok(Command::Run(CliConfig {
        input,
        output,
        storage_dir: storage_dir.unwrap_or_else(|| default_storage_dir_from_start(cwd)),
        strategy,
        use_cache,
        clear_cache,
        cache_info,
        timeout,
        strict,
        fingerprint_mode,
    }))
}
