use super::*;
use crate::args::parse_args_from;
use crate::input::{InputFormat, parse};
use crate::report::ts_ms_to_rfc3339;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tl_layout::ExecutionStrategy;
use tl_storage::FingerprintMode;

fn temp_dir(prefix: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("{prefix}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn no_env(_: &str) -> Option<String> {
    None
}

fn config(items: &[&str], storage: &Path) -> CliConfig {
    let mut args = argv(items);
    args.push("--storage-dir".to_string());
    args.push(storage.display().to_string());
    match parse_args_from(&args, no_env, Path::new("/")).expect("args should parse") {
        Command::Run(cfg) => cfg,
        Command::Help => panic!("unexpected help"),
    }
}

#[test]
fn parse_args_flags_and_defaults() {
    let cwd = temp_dir("tl_cli_args");
    let parsed = parse_args_from(
        &argv(&["--input", "graph.yaml", "--inline", "--no-cache", "--timeout-ms", "250"]),
        no_env,
        &cwd,
    )
    .unwrap();
    let Command::Run(cfg) = parsed else {
        panic!("expected a run command");
    };
    assert_eq!(cfg.input, Some(InputSource::File(PathBuf::from("graph.yaml"))));
    assert_eq!(cfg.strategy, ExecutionStrategy::Inline);
    assert!(!cfg.use_cache);
    assert_eq!(cfg.timeout, Some(Duration::from_millis(250)));
    assert_eq!(cfg.fingerprint_mode, FingerprintMode::Summary);
    assert!(cfg.storage_dir.ends_with(".tierlayout"));

    assert_eq!(
        parse_args_from(&argv(&["--sample", "-h"]), no_env, &cwd).unwrap(),
        Command::Help
    );
}

#[test]
fn parse_args_env_fallbacks() {
    let env = |name: &str| match name {
        "TL_INPUT" => Some("from-env.json".to_string()),
        "TL_STORAGE_DIR" => Some("/tmp/tl-store".to_string()),
        "TL_TIMEOUT_MS" => Some("40".to_string()),
        _ => None,
    };
    let Command::Run(cfg) = parse_args_from(&[], env, Path::new("/")).unwrap() else {
        panic!("expected a run command");
    };
    assert_eq!(cfg.input, Some(InputSource::File(PathBuf::from("from-env.json"))));
    assert_eq!(cfg.storage_dir, PathBuf::from("/tmp/tl-store"));
    assert_eq!(cfg.timeout, Some(Duration::from_millis(40)));

    let Command::Run(cfg) =
        parse_args_from(&argv(&["--timeout-ms", "5"]), env, Path::new("/")).unwrap()
    else {
        panic!("expected a run command");
    };
    assert_eq!(cfg.timeout, Some(Duration::from_millis(5)));
}

#[test]
fn parse_args_rejects_bad_usage() {
    let cwd = Path::new("/");
    assert!(parse_args_from(&[], no_env, cwd).is_err());
    assert!(parse_args_from(&argv(&["--input"]), no_env, cwd).is_err());
    assert!(parse_args_from(&argv(&["--sample", "--timeout-ms", "soon"]), no_env, cwd).is_err());
    let err = parse_args_from(&argv(&["--sample", "--bogus"]), no_env, cwd).unwrap_err();
    assert!(err.starts_with("unknown argument: --bogus"));
    assert!(parse_args_from(&argv(&["--cache-info"]), no_env, cwd).is_ok());
    #[cfg(not(feature = "structural-digest"))]
    assert!(parse_args_from(&argv(&["--sample", "--structural-digest"]), no_env, cwd).is_err());
}

#[test]
fn input_accepts_source_field_names_and_layout_config() {
    let json = r#"{
        "graphNodes": [{"id": "n1", "label": "One"}, {"id": "n2", "label": "Two"}],
        "c1Output": [{"id": "c1", "label": "Cat"}],
        "c2Subcategories": [
            {"id": "s1", "c2Name": "Alpha", "c1CategoryId": "c1", "nodeIds": ["n1"]},
            {"id": "s2", "c2Name": "Beta", "c1CategoryId": "c1", "nodeIds": ["n2"]}
        ],
        "c2Relationships": [{"id": "r1", "fromC2": "Alpha", "toC2": "Beta", "label": "uses"}],
        "graphEdges": [{"id": "e1", "source": "n1", "target": "n2"}],
        "layoutConfig": {"nodeSpacing": 40, "direction": "left_to_right"}
    }"#;
    let doc = parse(json, InputFormat::Json).unwrap();
    assert_eq!(doc.dataset.leaves.len(), 2);
    assert_eq!(doc.dataset.subcategories[1].label, "Beta");
    assert_eq!(doc.dataset.intra_tier_relationships.len(), 1);
    assert_eq!(doc.dataset.edges.len(), 1);
    let config = doc.layout_config.unwrap();
    assert_eq!(config.node_spacing, 40.0);
    assert!(config.direction.is_horizontal());
    assert_eq!(config.rank_spacing, 150.0);

    let yaml = "leaves:\n  - id: a\n    label: A\ncategories: []\n";
    let doc = parse(yaml, InputFormat::Yaml).unwrap();
    assert_eq!(doc.dataset.leaves[0].id, "a");
    assert!(doc.layout_config.is_none());

    assert_eq!(
        InputFormat::detect(Path::new("graph"), "  {\"leaves\": []}"),
        InputFormat::Json
    );
    assert_eq!(InputFormat::detect(Path::new("g.YML"), "{"), InputFormat::Yaml);
    assert!(parse("{", InputFormat::Json).is_err());
}

#[test]
fn rfc3339_formatting() {
    assert_eq!(ts_ms_to_rfc3339(0), "1970-01-01T00:00:00Z");
}

#[test]
fn run_computes_then_hits_cache() {
    let storage = temp_dir("tl_cli_run_storage");
    let cfg = config(&["--sample"], &storage);

    let mut first = Vec::new();
    run(&cfg, &mut first).unwrap();
    let report: Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(report["source"], "background");
    assert_eq!(report["nodeCount"], 39);
    assert_eq!(report["edgeCount"], 50);
    assert_eq!(report["graph"]["nodes"].as_array().map(Vec::len), Some(39));
    assert_eq!(
        report["positions"]["leafPositions"].as_array().map(Vec::len),
        Some(30)
    );

    let mut second = Vec::new();
    run(&cfg, &mut second).unwrap();
    let report: Value = serde_json::from_slice(&second).unwrap();
    assert_eq!(report["source"], "cache");

    let mut info = Vec::new();
    run(&config(&["--cache-info"], &storage), &mut info).unwrap();
    let info: Value = serde_json::from_slice(&info).unwrap();
    assert_eq!(info["exists"], true);
    assert!(info["savedAt"].is_string());

    let mut cleared = Vec::new();
    run(&config(&["--clear-cache", "--cache-info"], &storage), &mut cleared).unwrap();
    let cleared: Value = serde_json::from_slice(&cleared).unwrap();
    assert_eq!(cleared["exists"], false);
}

#[test]
fn run_reads_files_and_writes_output() {
    let dir = temp_dir("tl_cli_run_files");
    let input = dir.join("graph.json");
    std::fs::write(
        &input,
        r#"{"leaves": [{"id": "a", "label": "A"}, {"id": "b", "label": "B"}],
            "edges": [{"id": "e", "source": "a", "target": "b"}]}"#,
    )
    .unwrap();
    let output = dir.join("layout.json");
    let cfg = config(
        &[
            "--input",
            &input.display().to_string(),
            "--output",
            &output.display().to_string(),
            "--inline",
            "--strict",
        ],
        &dir.join("store"),
    );

    let mut stdout = Vec::new();
    run(&cfg, &mut stdout).unwrap();
    assert!(stdout.is_empty());
    let report: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["source"], "inline");
    assert_eq!(report["edgeCount"], 1);
}

#[test]
fn unusable_store_still_produces_a_layout() {
    let dir = temp_dir("tl_cli_run_bad_store");
    let not_a_dir = dir.join("plain-file");
    std::fs::write(&not_a_dir, "").unwrap();
    let storage = not_a_dir.join("sub");
    let output = dir.join("layout.json");
    let cfg = config(
        &["--sample", "--inline", "--output", &output.display().to_string()],
        &storage,
    );

    run(&cfg, &mut Vec::new()).unwrap();
    let report: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["source"], "inline");
    assert_eq!(report["nodeCount"], 39);

    let err = run(&config(&["--cache-info"], &storage), &mut Vec::new()).unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert_eq!(err.code(), "IO");
}

#[test]
fn run_reports_invalid_datasets_as_usage_errors() {
    let dir = temp_dir("tl_cli_run_invalid");
    let input = dir.join("graph.yaml");
    std::fs::write(&input, "leaves:\n  - id: a\n    label: A\n  - id: a\n    label: again\n")
        .unwrap();
    let cfg = config(
        &["--input", &input.display().to_string(), "--strict"],
        &dir.join("store"),
    );
    let err = run(&cfg, &mut Vec::new()).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert_eq!(err.code(), "DUPLICATE_ID");

    let missing = config(
        &["--input", &dir.join("absent.json").display().to_string()],
        &dir.join("store"),
    );
    let err = run(&missing, &mut Vec::new()).unwrap_err();
    assert_eq!(err.code(), "INPUT_IO");
}
