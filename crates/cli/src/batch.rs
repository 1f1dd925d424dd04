//! `nmerge merge | tags | search | run | validate`: load a batch, pick a view, present it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use newsmerge_config::Settings;
use newsmerge_core::search::search_scored;
use newsmerge_core::session::SessionOptions;
use newsmerge_core::{
    BatchConfig, BatchReport, Composition, DecodeError, FieldAliases, FileOutcome, LabelRule, RawRow, Session,
};
use newsmerge_io::{export_entries, load_batch, load_into, FileSpec};

use crate::render;
use crate::{CliError, InputArgs, OutputArgs, ViewArgs};

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

pub(crate) fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Settings::load_from(path).map_err(|e| CliError::config(e.to_string())),
        None => Ok(Settings::load()),
    }
}

/// Split a `FILE=LABEL` argument.
fn parse_label(pair: &str) -> Result<(&str, &str), CliError> {
    match pair.split_once('=') {
        Some((file, label)) if !file.is_empty() && !label.trim().is_empty() => Ok((file, label)),
        _ => Err(CliError::args(format!("invalid --label '{pair}'"))
            .with_hint("use --label FILE=LABEL, e.g. --label file1.xlsx=\"Desk A\"")),
    }
}

/// File specs from the positional files, with `--label` and `--sheet` applied.
///
/// A `--label` FILE matches an input by its full path or by its file name.
pub(crate) fn file_specs(input: &InputArgs) -> Result<Vec<FileSpec>, CliError> {
    let mut specs: Vec<FileSpec> = input
        .files
        .iter()
        .map(|path| {
            let spec = FileSpec::new(path);
            match &input.sheet {
                Some(sheet) => spec.with_sheet(sheet.clone()),
                None => spec,
            }
        })
        .collect();

    for pair in &input.labels {
        let (file, label) = parse_label(pair)?;
        let mut matched = false;
        for spec in specs.iter_mut() {
            if spec.path == Path::new(file) || spec.display_name() == file {
                spec.label = Some(label.to_string());
                matched = true;
            }
        }
        if !matched {
            return Err(CliError::args(format!(
                "--label {pair}: '{file}' is not one of the input files"
            )));
        }
    }

    Ok(specs)
}

pub(crate) fn labeling(input: &InputArgs, settings: &Settings) -> LabelRule {
    input.labeling.map(LabelRule::from).unwrap_or(settings.labeling)
}

/// Settings first, then command-line flags.
pub(crate) fn session_options(
    settings: &Settings,
    input: &InputArgs,
    compose: Option<Composition>,
) -> Result<SessionOptions, CliError> {
    let mut options = settings.session_options();
    if let Some(threshold) = input.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CliError::args(format!(
                "--threshold must be between 0 and 1, got {threshold}"
            )));
        }
        options.search.threshold = threshold;
    }
    if let Some(policy) = input.empty_tags {
        options.empty_tags = policy.into();
    }
    if let Some(composition) = compose {
        options.composition = composition;
    }
    Ok(options)
}

/// Exit code 3 when nothing decoded, or when `strict` and anything failed.
fn decode_policy(loaded: usize, failures: &[&DecodeError], strict: bool) -> Result<(), CliError> {
    if loaded == 0 {
        if let Some(first) = failures.first() {
            return Err(CliError::decode(format!(
                "no file could be decoded ({} failed)",
                failures.len()
            ))
            .with_hint(format!("first failure: {first}")));
        }
    }
    if strict && !failures.is_empty() {
        let files: Vec<&str> = failures.iter().map(|e| e.file.as_str()).collect();
        return Err(CliError::decode(format!(
            "{} file(s) failed to decode: {}",
            files.len(),
            files.join(", ")
        ))
        .with_hint("drop --strict to merge the files that did decode"));
    }
    Ok(())
}

pub(crate) fn check_decode(report: &BatchReport, strict: bool) -> Result<(), CliError> {
    let failures: Vec<&DecodeError> = report.decode_errors.iter().collect();
    decode_policy(report.files_loaded, &failures, strict)
}

/// Same policy, applied to decode results before any batch starts.
pub(crate) fn check_outcomes(outcomes: &[FileOutcome], strict: bool) -> Result<(), CliError> {
    let failures: Vec<&DecodeError> = outcomes.iter().filter_map(|o| o.as_ref().err()).collect();
    decode_policy(outcomes.len() - failures.len(), &failures, strict)
}

fn load(
    options: SessionOptions,
    specs: &[FileSpec],
    rule: LabelRule,
    strict: bool,
) -> Result<(Session, BatchReport), CliError> {
    let mut session = Session::new(options);
    let report = load_into(&mut session, specs, rule).map_err(|e| CliError::io(e.to_string()))?;
    check_decode(&report, strict)?;
    Ok((session, report))
}

fn apply_view(session: &mut Session, view: &ViewArgs) -> Result<(), CliError> {
    if session.options().composition == Composition::Override && view.tag.is_some() && view.query.is_some() {
        return Err(CliError::args("--tag and --query replace each other in override mode")
            .with_hint("pass --compose intersect to apply both"));
    }
    if let Some(tag) = &view.tag {
        if !session.tags().display_labels().any(|t| t == tag) {
            log::warn!("tag '{tag}' does not occur in this batch");
        }
        session.select_tag(tag.clone());
    }
    if let Some(query) = &view.query {
        session.set_query(query.clone());
    }
    Ok(())
}

/// Export, print and summarize the session's visible entries.
fn present(
    session: &Session,
    report: &BatchReport,
    output: &OutputArgs,
    json: bool,
    scores: bool,
) -> Result<(), CliError> {
    let visible = session.visible();

    if let Some(path) = &output.output {
        export_entries(&visible, path).map_err(CliError::io)?;
        eprintln!("wrote {} entries to {}", visible.len(), path.display());
    }

    if json {
        render::print_json(&render::json_document(report, session.tags(), &visible))?;
    } else if output.output.is_none() {
        if scores {
            let hits = search_scored(session.entries(), &session.view().query, &session.options().search);
            let mut out = std::io::stdout().lock();
            render::write_scored_cards(&mut out, &hits).map_err(|e| CliError::io(e.to_string()))?;
        } else {
            render::print_cards(&visible)?;
        }
    }

    eprintln!("{}", render::summary_line(report, visible.len()));

    if output.fail_empty && visible.is_empty() {
        return Err(CliError::no_results());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

pub(crate) fn cmd_merge(
    settings_path: Option<&Path>,
    input: InputArgs,
    view: ViewArgs,
    output: OutputArgs,
) -> Result<(), CliError> {
    let settings = load_settings(settings_path)?;
    let specs = file_specs(&input)?;
    let options = session_options(&settings, &input, view.compose.map(Composition::from))?;

    let (mut session, report) = load(options, &specs, labeling(&input, &settings), input.strict)?;
    apply_view(&mut session, &view)?;
    present(&session, &report, &output, output.json || settings.json, false)
}

// ---------------------------------------------------------------------------
// tags
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct TagCount<'a> {
    tag: &'a str,
    entries: usize,
}

pub(crate) fn cmd_tags(settings_path: Option<&Path>, input: InputArgs, json: bool) -> Result<(), CliError> {
    let settings = load_settings(settings_path)?;
    let specs = file_specs(&input)?;
    let options = session_options(&settings, &input, None)?;

    let (session, report) = load(options, &specs, labeling(&input, &settings), input.strict)?;

    let counts: Vec<TagCount> = session
        .tags()
        .display_labels()
        .map(|tag| TagCount {
            tag,
            entries: session.entries_with_tag(tag).len(),
        })
        .collect();

    if json || settings.json {
        render::print_json(&counts)?;
    } else {
        for count in &counts {
            println!("{} ({})", count.tag, count.entries);
        }
    }
    eprintln!("{} tags across {} merged entries", counts.len(), report.stats.merged_entries);
    Ok(())
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

pub(crate) fn cmd_search(
    settings_path: Option<&Path>,
    query: String,
    input: InputArgs,
    scores: bool,
    output: OutputArgs,
) -> Result<(), CliError> {
    let settings = load_settings(settings_path)?;
    let specs = file_specs(&input)?;
    let options = session_options(&settings, &input, None)?;

    let (mut session, report) = load(options, &specs, labeling(&input, &settings), input.strict)?;
    session.set_query(query);
    present(&session, &report, &output, output.json || settings.json, scores)
}

// ---------------------------------------------------------------------------
// run / validate
// ---------------------------------------------------------------------------

/// Parse a manifest. Relative file paths resolve against its directory.
fn read_manifest(path: &Path) -> Result<(BatchConfig, PathBuf), CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read manifest {}: {e}", path.display())))?;
    let config = BatchConfig::from_toml(&text).map_err(|e| CliError::config(e.to_string()))?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((config, base_dir))
}

pub(crate) fn cmd_run(
    settings_path: Option<&Path>,
    manifest: PathBuf,
    strict: bool,
    view: ViewArgs,
    output: OutputArgs,
) -> Result<(), CliError> {
    let settings = load_settings(settings_path)?;
    let (config, base_dir) = read_manifest(&manifest)?;
    let specs = FileSpec::from_config(&config, &base_dir);

    let mut options = SessionOptions::from_config(&config);
    if let Some(compose) = view.compose {
        options.composition = compose.into();
    }

    if let Some(name) = &config.name {
        log::info!("running '{}' ({} files)", name, specs.len());
    }
    let (mut session, report) = load(options, &specs, config.view.labeling, strict)?;
    apply_view(&mut session, &view)?;
    present(&session, &report, &output, output.json || settings.json, false)
}

/// Alias columns of `fields` that appear in any decoded row.
fn recognized_columns(rows: &[RawRow], fields: &FieldAliases) -> Vec<String> {
    fields
        .all()
        .filter(|alias| rows.iter().any(|row| row.contains_key(*alias)))
        .map(str::to_string)
        .collect()
}

pub(crate) fn cmd_validate(manifest: PathBuf) -> Result<(), CliError> {
    let (config, base_dir) = read_manifest(&manifest)?;
    let specs = FileSpec::from_config(&config, &base_dir);

    let mut failed = 0;
    for outcome in load_batch(&specs, config.view.labeling) {
        match outcome {
            Ok(file) => {
                let columns = recognized_columns(&file.rows, &config.fields);
                let columns = if columns.is_empty() {
                    "none recognized".to_string()
                } else {
                    columns.join(", ")
                };
                eprintln!(
                    "ok:    {} as '{}' ({} rows; columns: {})",
                    file.name,
                    file.label,
                    file.rows.len(),
                    columns
                );
            }
            Err(err) => {
                failed += 1;
                eprintln!("fail:  {err}");
            }
        }
    }

    if failed > 0 {
        return Err(CliError::decode(format!(
            "{failed} of {} files failed to decode",
            specs.len()
        )));
    }

    let name = config
        .name
        .clone()
        .unwrap_or_else(|| manifest.display().to_string());
    eprintln!("valid: {} ({} files)", name, specs.len());
    Ok(())
}
