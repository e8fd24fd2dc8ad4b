//! CLI-level tests: dump file in, DDL, rows and statistics out.

use clap::Parser;
use spanner_migrate::Cli;
use std::fs;
use std::path::Path;

const DUMP: &str = "SET client_encoding = 'UTF8';\n\
                    CREATE TABLE public.people (\n\
                    \x20   id integer NOT NULL,\n\
                    \x20   name text,\n\
                    \x20   born date\n\
                    );\n\
                    CREATE TABLE public.notes (body text);\n\
                    COPY public.people (id, name, born) FROM stdin;\n\
                    1\tAda\t1815-12-10\n\
                    2\tAlan\tnot a date\n\
                    \\.\n\
                    COPY public.notes (body) FROM stdin;\n\
                    hello\n\
                    \\.\n\
                    ALTER TABLE ONLY public.people ADD CONSTRAINT people_pkey PRIMARY KEY (id);\n";

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["spanner-migrate"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

fn write_dump(dir: &Path) -> String {
    let path = dir.join("dump.sql");
    fs::write(&path, DUMP).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_schema_only_prints_ddl() {
    let dir = tempfile::tempdir().unwrap();
    let dump = write_dump(dir.path());
    let mut out = Vec::new();
    let conv = spanner_migrate::run(&cli(&["--dump", &dump, "--schema-only"]), &mut out).unwrap();

    let ddl = String::from_utf8(out).unwrap();
    assert_eq!(
        ddl,
        "CREATE TABLE notes (\n  body STRING(MAX),\n  synth_id INT64 NOT NULL\n) PRIMARY KEY (synth_id);\n\n\
         CREATE TABLE people (\n  id INT64 NOT NULL,\n  name STRING(MAX),\n  born DATE\n) PRIMARY KEY (id);\n\n"
    );
    assert_eq!(conv.stats().total_rows(), 3);
    assert_eq!(conv.stats().total_good_rows(), 0);
}

#[test]
fn test_rows_and_stats_files() {
    let dir = tempfile::tempdir().unwrap();
    let dump = write_dump(dir.path());
    let rows_path = dir.path().join("rows.jsonl");
    let stats_path = dir.path().join("stats.json");
    let args = cli(&[
        "--dump",
        &dump,
        "--rows-out",
        rows_path.to_str().unwrap(),
        "--emit-stats",
        stats_path.to_str().unwrap(),
        "--quote-identifiers",
    ]);
    let mut out = Vec::new();
    spanner_migrate::run(&args, &mut out).unwrap();

    assert!(String::from_utf8(out)
        .unwrap()
        .contains("PRIMARY KEY (`id`)"));

    let rows = fs::read_to_string(&rows_path).unwrap();
    let rows: Vec<serde_json::Value> = rows
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["table"], "people");
    assert_eq!(rows[0]["values"], serde_json::json!([1, "Ada", "1815-12-10"]));
    assert_eq!(rows[1]["table"], "notes");
    assert_eq!(rows[1]["columns"], serde_json::json!(["body", "synth_id"]));
    assert_eq!(rows[1]["values"], serde_json::json!(["hello", 0]));

    let stats: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&stats_path).unwrap()).unwrap();
    assert_eq!(stats["stats"]["bad_rows"]["people"], 1);
    assert_eq!(stats["stats"]["good_rows"]["people"], 1);
    assert_eq!(stats["stats"]["statements"]["SET"]["skip"], 1);
    assert_eq!(stats["synthetic_keys"]["notes"]["column"], "synth_id");
    assert_eq!(stats["bad_rows"].as_array().map(Vec::len), Some(1));
    assert!(stats["issues"]
        .as_array()
        .unwrap()
        .iter()
        .any(|i| i["column"] == "id" && i["issue"] == "widened"));
}

#[test]
fn test_options_file_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let dump = write_dump(dir.path());
    let config = dir.path().join("options.yaml");
    fs::write(
        &config,
        "timezone: Europe/Paris\nsynthetic_key_column: row_id\nbad_row_byte_budget: 64\n",
    )
    .unwrap();

    let args = cli(&[
        "--dump",
        &dump,
        "--schema-only",
        "--config",
        config.to_str().unwrap(),
        "--bad-row-budget",
        "2KB",
    ]);
    let options = spanner_migrate::config::conv_options(&args).unwrap();
    assert_eq!(options.timezone, "Europe/Paris");
    assert_eq!(options.bad_row_byte_budget, 2048);

    let conv = spanner_migrate::run(&args, &mut Vec::new()).unwrap();
    assert_eq!(conv.synthetic_keys["notes"].column, "row_id");
    assert_eq!(conv.timezone(), chrono_tz::Europe::Paris);
}

#[test]
fn test_invalid_timezone_rejected() {
    let args = cli(&["--dump", "unused.sql", "--timezone", "Nowhere/Special"]);
    let err = spanner_migrate::run(&args, &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("Unknown timezone"));
}

#[test]
fn test_missing_dump_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.sql");
    let args = cli(&["--dump", missing.to_str().unwrap()]);
    let err = spanner_migrate::run(&args, &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("missing.sql"));
}
