//! Collecting todo entries into the per-build registry

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use doctodo::todo::{Marker, TodoDomain, TODO_DEFINED};
use doctodo::{App, BuildContext, Config, Element, OutputFormat, Severity, SourceDoc};

fn app_with(config: Config) -> App {
    App::new(config).expect("app should load")
}

fn texts(build: &BuildContext<'_>) -> Vec<(String, String)> {
    build
        .env()
        .domain::<TodoDomain>()
        .expect("todo domain registered")
        .all_todos()
        .map(|m: &Marker| (m.docname.clone(), m.text()))
        .collect()
}

#[test]
fn test_document_without_todos_has_empty_slot() {
    let app = app_with(Config::default());
    let mut build = BuildContext::new(&app, OutputFormat::Html);
    build
        .update_document(&SourceDoc::inline("plain", "para \"nothing to do\""))
        .unwrap();
    let domain = build.env().domain::<TodoDomain>().unwrap();
    assert_eq!(domain.todos_for("plain").map(|m| m.len()), Some(0));
}

#[test]
fn test_rebuilding_a_document_replaces_its_slot() {
    let app = app_with(Config::default());
    let mut build = BuildContext::new(&app, OutputFormat::Html);
    build
        .update_document(&SourceDoc::inline("a", "@todo \"first\"\n@todo \"second\""))
        .unwrap();
    build
        .update_document(&SourceDoc::inline("a", "@todo \"third\""))
        .unwrap();
    assert_eq!(texts(&build), vec![("a".to_string(), "third".to_string())]);
}

#[test]
fn test_removed_document_drops_its_entries() {
    let app = app_with(Config::default());
    let mut build = BuildContext::new(&app, OutputFormat::Html);
    build
        .read_sources(&[
            SourceDoc::inline("a", "@todo \"in a\""),
            SourceDoc::inline("b", "@todo \"in b\""),
        ])
        .unwrap();
    build.remove_document("a");
    assert_eq!(texts(&build), vec![("b".to_string(), "in b".to_string())]);
    assert!(build.env().domain::<TodoDomain>().unwrap().todos_for("a").is_none());
}

#[test]
fn test_parallel_read_matches_serial_read() {
    let sources: Vec<SourceDoc> = (0..12)
        .map(|i| {
            let body = (0..i % 3)
                .map(|n| format!("@todo \"doc {} entry {}\"", i, n))
                .collect::<Vec<_>>()
                .join("\n");
            SourceDoc::inline(&format!("doc{:02}", i), format!("para \"x\"\n{}", body))
        })
        .collect();

    let serial_app = app_with(Config::default());
    let mut serial = BuildContext::new(&serial_app, OutputFormat::Html);
    serial.read_sources(&sources).unwrap();

    let mut config = Config::default();
    config.build.jobs = 4;
    let parallel_app = app_with(config);
    let mut parallel = BuildContext::new(&parallel_app, OutputFormat::Html);
    parallel.read_sources(&sources).unwrap();

    assert_eq!(texts(&serial), texts(&parallel));
    assert_eq!(texts(&serial).len(), 12);
    assert_eq!(serial.env().docnames(), parallel.env().docnames());
}

#[test]
fn test_marker_records_origin() {
    let app = app_with(Config::default());
    let mut build = BuildContext::new(&app, OutputFormat::Html);
    build
        .update_document(&SourceDoc::new(
            "guide/install",
            "guide/install.tdoc",
            "para \"x\"\n\n@todo [name: \"check paths\"] {\n    para \"Check the paths.\"\n}",
        ))
        .unwrap();
    let domain = build.env().domain::<TodoDomain>().unwrap();
    let marker = &domain.todos_for("guide/install").unwrap()[0];
    assert_eq!(marker.docname, "guide/install");
    assert_eq!(marker.source, "guide/install.tdoc");
    assert_eq!(marker.line, Some(3));
    assert_eq!(marker.target_id, "check-paths");
    assert_eq!(marker.text(), "Check the paths.");
}

#[test]
fn test_todo_defined_is_raised_per_entry() {
    let mut app = app_with(Config::default());
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    app.connect(
        TODO_DEFINED,
        Arc::new(move |todo: &Element| {
            sink.lock().unwrap().push(todo.children[1].astext());
        }),
    )
    .unwrap();

    let mut build = BuildContext::new(&app, OutputFormat::Html);
    build
        .read_sources(&[
            SourceDoc::inline("a", "@todo \"one\"\n@todo \"two\""),
            SourceDoc::inline("b", "@todo \"three\""),
        ])
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["one", "two", "three"]);
}

#[test]
fn test_emit_warnings_reports_each_entry() {
    let config = Config::default().with_value("todo", "emit_warnings", true);
    let app = app_with(config);
    let mut build = BuildContext::new(&app, OutputFormat::Html);
    build
        .read_sources(&[SourceDoc::inline("a", "para \"x\"\n@todo \"Fix X.\"")])
        .unwrap();
    let warnings = build.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert_eq!(warnings[0].to_string(), "a.tdoc:2: WARNING: TODO entry found: Fix X.");
}

#[test]
fn test_broken_todo_creates_no_entry() {
    let app = app_with(Config::default());
    let mut build = BuildContext::new(&app, OutputFormat::Html);
    build
        .read_sources(&[SourceDoc::inline("a", "@todo\n@todo [bogus: x] \"y\"")])
        .unwrap();
    assert!(texts(&build).is_empty());
    assert_eq!(build.warnings().len(), 2);
    assert!(build.warnings().iter().all(|w| w.severity == Severity::Error));
}

#[test]
fn test_stray_characters_are_reported_not_dropped() {
    let app = app_with(Config::default());
    let mut build = BuildContext::new(&app, OutputFormat::Html);
    build
        .read_sources(&[SourceDoc::inline(
            "a",
            "@todo { para \"fix\" ; \"X\" $ }\npara \"\u{e9}\" \u{a7} \"y\"",
        )])
        .unwrap();
    // no entry with silently altered text
    assert!(texts(&build).is_empty());
    let messages: Vec<String> = build.warnings().iter().map(|w| w.to_string()).collect();
    assert_eq!(
        messages,
        vec![
            "a.tdoc:1: SEVERE: Unexpected character ';'",
            "a.tdoc:1: SEVERE: Unexpected character '$'",
            "a.tdoc:2: SEVERE: Unexpected character '\u{a7}'",
        ]
    );
}
