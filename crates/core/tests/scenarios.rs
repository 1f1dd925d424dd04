// End-to-end merge scenarios through the public session API.

use std::collections::HashMap;

use newsmerge_core::config::LabelRule;
use newsmerge_core::session::{DecodedFile, FileOutcome, Session, SessionOptions};
use newsmerge_core::{BatchConfig, Composition, RawRow};

fn row(pairs: &[(&str, &str)]) -> RawRow {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>()
}

fn labeled(name: &str, rows: Vec<RawRow>) -> FileOutcome {
    Ok(DecodedFile {
        name: name.into(),
        label: LabelRule::FilenameDigit.label_for(name),
        rows,
    })
}

// -------------------------------------------------------------------------
// Same title across two files
// -------------------------------------------------------------------------

#[test]
fn same_deal_from_two_analysts_merges() {
    let mut session = Session::default();
    session
        .load(vec![
            labeled("file1.xlsx", vec![row(&[("Title", "Deal A"), ("Company", "Acme")])]),
            labeled("file2.xlsx", vec![row(&[("Title", "deal a "), ("Company", "Acme")])]),
        ])
        .unwrap();

    assert_eq!(session.entries().len(), 1);
    let merged = &session.entries()[0];
    assert_eq!(merged.title, "Deal A");
    assert_eq!(merged.sources, vec!["Analyst 1", "Analyst 2"]);
}

// -------------------------------------------------------------------------
// Missing title
// -------------------------------------------------------------------------

#[test]
fn row_without_title_or_headline_is_untitled() {
    let mut session = Session::default();
    session
        .load(vec![labeled("file2.csv", vec![row(&[("Notes", "orphan note")])])])
        .unwrap();
    assert_eq!(session.entries()[0].title, "Untitled");
}

// -------------------------------------------------------------------------
// Note concatenation
// -------------------------------------------------------------------------

#[test]
fn notes_concatenate_with_source_prefix() {
    let mut session = Session::default();
    session
        .load(vec![
            labeled("a1.csv", vec![row(&[("Title", "Same"), ("Notes", "Alpha")])]),
            labeled("b2.csv", vec![row(&[("Title", "Same"), ("Notes", "Beta")])]),
        ])
        .unwrap();
    assert_eq!(session.entries()[0].notes, "Alpha\n\nAnalyst 2: Beta");
}

// -------------------------------------------------------------------------
// Tag click
// -------------------------------------------------------------------------

#[test]
fn tag_click_returns_exactly_the_tagged_entries() {
    let mut session = Session::default();
    session
        .load(vec![labeled(
            "file1.xlsx",
            vec![
                row(&[("Title", "First Acme item"), ("Company", "Acme")]),
                row(&[("Title", "Globex item"), ("Company", "Globex")]),
                row(&[("Title", "Second Acme item"), ("Company", "Acme")]),
            ],
        )])
        .unwrap();

    session.select_tag("Acme");
    let titles: Vec<_> = session.visible().into_iter().map(|e| e.title.clone()).collect();
    assert_eq!(titles, vec!["First Acme item", "Second Acme item"]);
}

// -------------------------------------------------------------------------
// Manifest-driven session
// -------------------------------------------------------------------------

#[test]
fn manifest_options_drive_the_session() {
    let config = BatchConfig::from_toml(
        r#"
[[files]]
path = "desk.csv"
label = "Desk"

[view]
composition = "intersect"

[tags]
empty = "preserve"
"#,
    )
    .unwrap();

    let mut session = Session::new(SessionOptions::from_config(&config));
    assert_eq!(session.options().composition, Composition::Intersect);

    session
        .load(vec![Ok(DecodedFile {
            name: "desk.csv".into(),
            label: config.label_for(0).unwrap(),
            rows: vec![
                row(&[("Title", "Acme merger"), ("Company", "Acme")]),
                row(&[("Title", "Acme recall"), ("Company", "Acme")]),
                row(&[("Title", "Globex merger"), ("Company", "Globex")]),
            ],
        })])
        .unwrap();

    assert_eq!(session.entries()[0].sources, vec!["Desk"]);
    assert!(session.tags().contains(""));

    session.select_tag("Acme");
    session.set_query("merger");
    let titles: Vec<_> = session.visible().into_iter().map(|e| e.title.clone()).collect();
    assert_eq!(titles, vec!["Acme merger"]);
}
