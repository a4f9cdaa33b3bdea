use std::io::Write;

use clap::Parser;
use serial_test::serial;

use super::*;

#[test]
fn defaults_use_memory_backend() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert_eq!(settings.store.backend, BackendKind::Memory);
    assert!(settings.store.url.is_none());
    assert_eq!(settings.store.database, "entrystore");
    assert_eq!(settings.cache.capacity.get(), 200);
    assert_eq!(settings.cache.ttl_seconds.get(), 3600);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert_eq!(settings.logging.format, LogFormat::Compact);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.cache.capacity = Some(50);
    raw.logging.level = Some("info".to_string());

    let overrides = Overrides {
        cache_capacity: Some(10),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cache.capacity.get(), 10);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = Overrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.format, LogFormat::Json);
}

#[test]
fn remote_backends_require_url() {
    let mut raw = RawSettings::default();
    raw.store.backend = Some("postgres".to_string());

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "store.url"),
        other => panic!("expected missing url error, got {other:?}"),
    }
}

#[test]
fn unknown_backend_is_rejected() {
    let mut raw = RawSettings::default();
    raw.store.backend = Some("cassandra".to_string());

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, reason }) => {
            assert_eq!(key, "store.backend");
            assert!(reason.contains("cassandra"));
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[test]
fn zero_cache_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds = Some(0);

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "cache.ttl_seconds"),
        other => panic!("expected ttl error, got {other:?}"),
    }
}

#[test]
fn backend_aliases_parse() {
    assert_eq!("MongoDB".parse(), Ok(BackendKind::Document));
    assert_eq!("postgresql".parse(), Ok(BackendKind::Postgres));
    assert_eq!(" memory ".parse(), Ok(BackendKind::Memory));
}

#[test]
#[serial]
fn config_file_is_layered_under_cli() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(
        file,
        "[store]\nbackend = \"document\"\nurl = \"mongodb://localhost:27017\"\ndatabase = \"blogs\"\n\n[cache]\ncapacity = 64"
    )
    .expect("write config");

    let path = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from([
        "entrystore",
        "--config-file",
        path.as_str(),
        "--cache-capacity",
        "32",
        "init",
    ]);

    let settings = load(&args).expect("settings load");
    assert_eq!(settings.store.backend, BackendKind::Document);
    assert_eq!(
        settings.store.url.as_deref(),
        Some("mongodb://localhost:27017")
    );
    assert_eq!(settings.store.database, "blogs");
    assert_eq!(settings.cache.capacity.get(), 32);
}

#[test]
#[serial]
fn environment_overrides_defaults() {
    const KEY: &str = "ENTRYSTORE__CACHE__TTL_SECONDS";
    // SAFETY: every test that reads the process environment runs serially.
    unsafe { std::env::set_var(KEY, "90") };
    let args = CliArgs::parse_from(["entrystore", "list"]);
    let loaded = load(&args);
    // SAFETY: see above.
    unsafe { std::env::remove_var(KEY) };

    let settings = loaded.expect("settings load");
    assert_eq!(settings.cache.ttl_seconds.get(), 90);
    assert_eq!(settings.cache.capacity.get(), 200);
}

#[test]
fn parse_search_arguments() {
    let args = CliArgs::parse_from([
        "entrystore",
        "--site",
        "blog.example",
        "search",
        "cat",
        "elephant",
    ]);

    assert_eq!(args.site.as_deref(), Some("blog.example"));
    match args.command {
        Command::Search { query } => assert_eq!(query, vec!["cat", "elephant"]),
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_add_arguments_with_identity() {
    let args = CliArgs::parse_from([
        "entrystore",
        "add",
        "--title",
        "A Title",
        "--body",
        "Text",
        "--tags",
        "rust, async",
        "--as",
        "p-1",
        "--display-name",
        "Jane Li",
    ]);

    assert_eq!(args.session.person_id.as_deref(), Some("p-1"));
    match args.command {
        Command::Add(add) => {
            assert_eq!(add.title, "A Title");
            assert_eq!(add.tags, "rust, async");
            assert!(add.date.is_none());
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_recent_default_limit() {
    let args = CliArgs::parse_from(["entrystore", "recent"]);
    match args.command {
        Command::Recent { limit } => assert_eq!(limit, 10),
        other => panic!("wrong command parsed: {other:?}"),
    }
}
