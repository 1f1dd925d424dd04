//! `nmerge shell`: one session, many views. Reads commands from stdin.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use newsmerge_core::{LabelRule, Session};
use newsmerge_io::{load_batch, load_into, FileSpec};

use crate::batch::{check_decode, check_outcomes, file_specs, labeling, load_settings, session_options};
use crate::render;
use crate::{CliError, InputArgs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShellCommand {
    Query(String),
    Tag(String),
    Tags,
    Clear,
    Reload,
    Help,
    Quit,
    Unknown(String),
}

impl ShellCommand {
    pub(crate) fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(':') else {
            return Self::Query(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "tag" if !arg.is_empty() => Self::Tag(arg.to_string()),
            "tags" => Self::Tags,
            "clear" => Self::Clear,
            "load" | "reload" => Self::Reload,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

const HELP: &str = "\
  <text>        search (an empty line shows everything)
  :tag NAME     show entries tagged NAME
  :tags         list tags
  :clear        drop the tag and the query
  :load         re-read the files as a new batch
  :quit         leave";

/// Decode every file, then replace the batch. On a decode failure the
/// session keeps the entries, tags and view it had.
fn reload(session: &mut Session, specs: &[FileSpec], rule: LabelRule, strict: bool) -> Result<(), CliError> {
    let outcomes = load_batch(specs, rule);
    check_outcomes(&outcomes, strict)?;

    let ticket = session.begin_batch();
    let report = session
        .complete_batch(ticket, outcomes)
        .map_err(|e| CliError::io(e.to_string()))?;
    eprintln!("{}", render::summary_line(&report, session.visible().len()));
    Ok(())
}

pub(crate) fn cmd_shell(settings_path: Option<&Path>, input: InputArgs) -> Result<(), CliError> {
    let settings = load_settings(settings_path)?;
    let specs = file_specs(&input)?;
    let options = session_options(&settings, &input, None)?;
    let rule = labeling(&input, &settings);

    let mut session = Session::new(options);
    let report = load_into(&mut session, &specs, rule).map_err(|e| CliError::io(e.to_string()))?;
    check_decode(&report, input.strict)?;
    eprintln!("{}", render::summary_line(&report, session.entries().len()));

    let interactive = io::stdin().is_terminal();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut out = io::stdout().lock();
    let io_err = |e: io::Error| CliError::io(e.to_string());

    loop {
        if interactive {
            eprint!("nmerge> ");
            io::stderr().flush().map_err(io_err)?;
        }
        let Some(line) = lines.next() else { break };
        let line = line.map_err(io_err)?;

        match ShellCommand::parse(&line) {
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                eprintln!("{HELP}");
                continue;
            }
            ShellCommand::Unknown(cmd) => {
                eprintln!("unknown command '{cmd}' (:help lists commands)");
                continue;
            }
            ShellCommand::Tags => {
                for tag in session.tags().display_labels() {
                    writeln!(out, "{} ({})", tag, session.entries_with_tag(tag).len()).map_err(io_err)?;
                }
                continue;
            }
            ShellCommand::Reload => {
                if let Err(e) = reload(&mut session, &specs, rule, input.strict) {
                    eprintln!("error: {}", e.message);
                }
                continue;
            }
            ShellCommand::Tag(tag) => {
                if !session.tags().contains(&tag) {
                    eprintln!("no entries tagged '{tag}'");
                }
                session.select_tag(tag);
            }
            ShellCommand::Query(query) => session.set_query(query),
            ShellCommand::Clear => session.clear_view(),
        }

        let visible = session.visible();
        render::write_cards(&mut out, &visible).map_err(io_err)?;
        writeln!(out, "-- {} shown", visible.len()).map_err(io_err)?;
        out.flush().map_err(io_err)?;
    }

    Ok(())
}
