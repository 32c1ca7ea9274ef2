//! Interactive shell for duckpad
//!
//! Reads SQL and dot-commands, runs them against the workbench and prints
//! results through the terminal sink.
//!
//! # Commands
//!
//! ```text
//! .load <table> <path|url> [extension]   Create a table from a file or URL
//! .ext <name>                            Install and load an extension
//! .tables                                List tables
//! .help                                  Show help
//! .exit                                  Exit the shell
//! <sql>                                  Run a SQL statement
//! ```

use std::borrow::Cow;
use std::path::PathBuf;

use colored::Colorize;
use duckpad_engine::Workbench;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::{MatchingBracketValidator, Validator};
use rustyline::{Cmd, CompletionType, Config, Context, EditMode, Editor, KeyEvent};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::commands;
use crate::config::DEFAULT_MAX_HISTORY;
use crate::error::Result;
use crate::render::TerminalSink;

/// Shell configuration
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// History file path
    pub history_file: Option<PathBuf>,
    /// Maximum history entries
    pub max_history: usize,
    /// Prompt string
    pub prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        let history_file = dirs::data_dir().map(|d| d.join("duckpad").join("shell_history"));

        Self {
            history_file,
            max_history: DEFAULT_MAX_HISTORY,
            prompt: "duckpad> ".to_string(),
        }
    }
}

/// Command parsed from one line of input
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Create a table
    Load {
        table: String,
        source: String,
        extension: Option<String>,
    },
    /// Install/load an extension
    Extension(String),
    /// List tables
    Tables,
    /// Show help
    Help,
    /// Exit the shell
    Exit,
    /// SQL statement
    Sql(String),
    /// Malformed dot-command
    Unknown(String),
}

impl Command {
    fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if !trimmed.starts_with('.') {
            return Command::Sql(trimmed.to_string());
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        match parts.first().map(|s| s.to_lowercase()).as_deref() {
            Some(".load") => match parts.as_slice() {
                [_, table, source] => Command::Load {
                    table: table.to_string(),
                    source: source.to_string(),
                    extension: None,
                },
                [_, table, source, extension] => Command::Load {
                    table: table.to_string(),
                    source: source.to_string(),
                    extension: Some(extension.to_string()),
                },
                _ => Command::Unknown(".load: expected <table> <path|url> [extension]".to_string()),
            },
            Some(".ext") | Some(".extension") => match parts.get(1) {
                Some(name) => Command::Extension(name.to_string()),
                None => Command::Unknown(
                    "Please enter an extension name to load (e.g. httpfs, h3, icu).".to_string(),
                ),
            },
            Some(".tables") => Command::Tables,
            Some(".help") | Some(".h") => Command::Help,
            Some(".exit") | Some(".quit") | Some(".q") => Command::Exit,
            Some(cmd) => Command::Unknown(format!("unknown command: {}", cmd)),
            None => Command::Unknown(String::new()),
        }
    }
}

/// Shell helper for completions and hints
struct ReplHelper {
    /// Table names for completion
    tables: Vec<String>,
    /// Matching bracket highlighter
    highlighter: MatchingBracketHighlighter,
    /// History-based hinter
    hinter: HistoryHinter,
    /// Bracket validator
    validator: MatchingBracketValidator,
}

impl rustyline::Helper for ReplHelper {}

impl ReplHelper {
    fn new() -> Self {
        Self {
            tables: Vec::new(),
            highlighter: MatchingBracketHighlighter::new(),
            hinter: HistoryHinter::new(),
            validator: MatchingBracketValidator::new(),
        }
    }

    fn commands() -> &'static [&'static str] {
        &[".load", ".ext", ".tables", ".help", ".exit"]
    }

    fn candidates(&self, line_up_to_cursor: &str) -> (usize, Vec<String>) {
        let start = line_up_to_cursor
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &line_up_to_cursor[start..];

        if start == 0 && word.starts_with('.') {
            let matches = Self::commands()
                .iter()
                .filter(|cmd| cmd.starts_with(word))
                .map(|cmd| cmd.to_string())
                .collect();
            return (start, matches);
        }

        if word.is_empty() {
            return (start, Vec::new());
        }
        let matches = self
            .tables
            .iter()
            .filter(|t| t.starts_with(word))
            .cloned()
            .collect();
        (start, matches)
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> std::result::Result<(usize, Vec<Pair>), ReadlineError> {
        let (start, matches) = self.candidates(&line[..pos]);
        let pairs = matches
            .into_iter()
            .map(|m| Pair {
                display: m.clone(),
                replacement: m,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(prompt.bold().green().to_string())
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.highlighter.highlight_char(line, pos, forced)
    }
}

impl Validator for ReplHelper {
    fn validate(
        &self,
        ctx: &mut rustyline::validate::ValidationContext,
    ) -> rustyline::Result<rustyline::validate::ValidationResult> {
        self.validator.validate(ctx)
    }

    fn validate_while_typing(&self) -> bool {
        self.validator.validate_while_typing()
    }
}

/// Run the interactive shell until `.exit` or end of input.
pub fn run_repl(
    workbench: &Workbench,
    sink: &TerminalSink,
    runtime: &Runtime,
    config: ReplConfig,
) -> Result<()> {
    let rl_config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .max_history_size(config.max_history)?
        .build();

    let mut rl: Editor<ReplHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(rl_config)?;
    rl.set_helper(Some(ReplHelper::new()));

    // Bind Ctrl-C to abort current line
    rl.bind_sequence(KeyEvent::ctrl('c'), Cmd::Interrupt);

    if let Some(ref history_file) = config.history_file {
        if let Some(parent) = history_file.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let _ = rl.load_history(history_file);
    }

    println!();
    println!("{}", "duckpad interactive shell".bold().cyan());
    println!("Type '.help' for commands, '.exit' to quit");
    println!();

    loop {
        match rl.readline(&config.prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                let command = Command::parse(line);
                debug!(?command, "Shell command");
                if command == Command::Exit {
                    break;
                }

                if let Some(tables) = execute(workbench, sink, runtime, command) {
                    if let Some(helper) = rl.helper_mut() {
                        helper.tables = tables;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                sink.error(&format!("{:?}", err));
                break;
            }
        }
    }

    if let Some(ref history_file) = config.history_file {
        let _ = rl.save_history(history_file);
    }

    Ok(())
}

/// Run one command; returns the table names when the catalog was refreshed.
fn execute(
    workbench: &Workbench,
    sink: &TerminalSink,
    runtime: &Runtime,
    command: Command,
) -> Option<Vec<String>> {
    match command {
        Command::Load {
            table,
            source,
            extension,
        } => {
            match runtime.block_on(commands::ingest(
                workbench,
                &table,
                &source,
                extension.as_deref(),
            )) {
                Ok(report) if report.created() => return table_names(workbench, runtime),
                Ok(_) => {}
                Err(e) => sink.error(&e.to_string()),
            }
        }
        Command::Extension(name) => {
            if let Err(e) = runtime.block_on(commands::load_extension(workbench, &name)) {
                sink.error(&e.to_string());
            }
        }
        Command::Tables => match runtime.block_on(commands::list_tables(workbench, sink)) {
            Ok(view) => return Some(view.table_names),
            Err(e) => sink.error(&e.to_string()),
        },
        Command::Sql(sql) => {
            // Failures are already rendered by the workbench.
            if let Ok(outcome) = runtime.block_on(workbench.run_query(&sql)) {
                return outcome.catalog.map(|c| c.table_names);
            }
        }
        Command::Help => print_help(),
        Command::Unknown(msg) => {
            if !msg.is_empty() {
                sink.warn(&msg);
            }
        }
        Command::Exit => {}
    }
    None
}

fn table_names(workbench: &Workbench, runtime: &Runtime) -> Option<Vec<String>> {
    runtime
        .block_on(workbench.with_session(|session| async move {
            duckpad_engine::catalog::refresh_catalog(&session).await
        }))
        .ok()
        .map(|view| view.table_names)
}

fn print_help() {
    println!(
        r#"
duckpad shell commands:

  .load <table> <path|url> [extension]   Create a table from a .csv, .parquet or .json source
  .ext <name>                            Install and load an extension (core, community, default)
  .tables                                List tables
  .help                                  Show this help
  .exit                                  Exit the shell

Anything else is run as SQL, e.g.
  SELECT * FROM sales LIMIT 10;
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sql() {
        assert_eq!(
            Command::parse("  SELECT 1 "),
            Command::Sql("SELECT 1".to_string())
        );
    }

    #[test]
    fn test_parse_load() {
        assert_eq!(
            Command::parse(".load sales ./sales.parquet"),
            Command::Load {
                table: "sales".into(),
                source: "./sales.parquet".into(),
                extension: None,
            }
        );
        assert_eq!(
            Command::parse(".LOAD shapes https://h/s.json spatial"),
            Command::Load {
                table: "shapes".into(),
                source: "https://h/s.json".into(),
                extension: Some("spatial".into()),
            }
        );
        assert!(matches!(Command::parse(".load onlytable"), Command::Unknown(_)));
    }

    #[test]
    fn test_parse_extension() {
        assert_eq!(Command::parse(".ext h3"), Command::Extension("h3".into()));
        assert!(matches!(Command::parse(".ext"), Command::Unknown(m) if m.contains("extension name")));
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(Command::parse(".tables"), Command::Tables);
        assert_eq!(Command::parse(".quit"), Command::Exit);
        assert_eq!(Command::parse(".help"), Command::Help);
        assert!(matches!(Command::parse(".nope"), Command::Unknown(_)));
    }

    #[test]
    fn test_completion_candidates() {
        let mut helper = ReplHelper::new();
        helper.tables = vec!["sales".into(), "staff".into(), "users".into()];

        assert_eq!(helper.candidates(".t"), (0, vec![".tables".to_string()]));
        assert_eq!(
            helper.candidates("SELECT * FROM s"),
            (14, vec!["sales".to_string(), "staff".to_string()])
        );
        assert_eq!(helper.candidates("SELECT "), (7, Vec::<String>::new()));
    }
}
