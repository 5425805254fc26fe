use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use exif_edit::exif::{ExifCommand, ExifTool};
use exif_edit::pipeline::{DateField, EditResult, Operation};
use exif_edit::{config, error, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "exif-edit",
    version,
    about = "Read and edit photo tags, keywords, orientation and dates through exiftool"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Print write commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Keep exiftool's `_original` copy of every edited file
    #[arg(long, global = true)]
    backup: bool,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config.json and exit
    Init,
    /// Check that exiftool can be run
    Check,
    /// Display all tags
    Show {
        /// Include tags with empty values
        #[arg(short, long)]
        all: bool,
        #[command(flatten)]
        targets: Targets,
    },
    /// Print one tag
    Get {
        tag: String,
        #[command(flatten)]
        targets: Targets,
    },
    /// Set one or more tags
    Set {
        /// Assignment as NAME=VALUE (repeatable)
        #[arg(short, long = "tag", value_name = "NAME=VALUE", value_parser = parse_assignment, required = true)]
        tags: Vec<(String, String)>,
        #[command(flatten)]
        targets: Targets,
    },
    /// List or edit IPTC keywords
    #[command(subcommand)]
    Keywords(KeywordsCommand),
    /// Print the orientation, or set it with --set
    Orientation {
        /// New orientation code (1-8)
        #[arg(long, value_name = "CODE", value_parser = clap::value_parser!(u8).range(1..=8))]
        set: Option<u8>,
        #[command(flatten)]
        targets: Targets,
    },
    /// Rotate by a multiple of 90 degrees (positive is clockwise)
    Rotate {
        #[arg(short, long, default_value_t = 90, allow_negative_numbers = true)]
        degrees: i64,
        #[command(flatten)]
        targets: Targets,
    },
    /// Mirror left to right, or top to bottom with --vertical
    Mirror {
        #[arg(long)]
        vertical: bool,
        #[command(flatten)]
        targets: Targets,
    },
    /// Print or set DateTimeOriginal (FileModifyDate with --modified)
    Date {
        /// Use the file modification date
        #[arg(long)]
        modified: bool,
        /// Set to "YYYY:MM:DD" or "YYYY:MM:DD HH:MM:SS"
        #[arg(long, value_name = "DATETIME", conflicts_with = "now")]
        set: Option<String>,
        /// Set to the current time
        #[arg(long)]
        now: bool,
        #[command(flatten)]
        targets: Targets,
    },
}

#[derive(Subcommand, Debug)]
enum KeywordsCommand {
    /// Print the keywords, sorted
    List(Targets),
    /// Append keywords
    Add(KeywordArgs),
    /// Remove keywords if present
    Remove(KeywordArgs),
    /// Replace all keywords
    Set(KeywordArgs),
    /// Remove every keyword
    Clear(Targets),
}

#[derive(Args, Debug)]
struct Targets {
    /// Image files or directories to process
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct KeywordArgs {
    /// Keyword (repeatable)
    #[arg(short, long = "keyword", value_name = "KEYWORD", required = true)]
    keywords: Vec<String>,
    #[command(flatten)]
    targets: Targets,
}

impl Command {
    /// The operation to run and the files to run it on.
    fn into_operation(self) -> Option<(Operation, Vec<PathBuf>)> {
        let (op, targets) = match self {
            Command::Init | Command::Check => return None,
            Command::Show { all, targets } => (Operation::Show { include_empty: all }, targets),
            Command::Get { tag, targets } => (Operation::GetTag(tag), targets),
            Command::Set { tags, targets } => (Operation::SetTags(tags), targets),
            Command::Keywords(cmd) => match cmd {
                KeywordsCommand::List(targets) => (Operation::ListKeywords, targets),
                KeywordsCommand::Add(args) => (Operation::AddKeywords(args.keywords), args.targets),
                KeywordsCommand::Remove(args) => {
                    (Operation::RemoveKeywords(args.keywords), args.targets)
                }
                KeywordsCommand::Set(args) => (Operation::SetKeywords(args.keywords), args.targets),
                KeywordsCommand::Clear(targets) => (Operation::ClearKeywords, targets),
            },
            Command::Orientation { set, targets } => match set {
                Some(code) => (Operation::SetOrientation(code), targets),
                None => (Operation::GetOrientation, targets),
            },
            Command::Rotate { degrees, targets } => (Operation::Rotate(degrees), targets),
            Command::Mirror { vertical, targets } => {
                let op = if vertical {
                    Operation::MirrorVertically
                } else {
                    Operation::MirrorHorizontally
                };
                (op, targets)
            }
            Command::Date {
                modified,
                set,
                now,
                targets,
            } => {
                let field = if modified {
                    DateField::Modified
                } else {
                    DateField::Original
                };
                let op = if now || set.is_some() {
                    Operation::SetDate(field, set)
                } else {
                    Operation::GetDate(field)
                };
                (op, targets)
            }
        };
        Some((op, targets.paths))
    }
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle init
    if matches!(cli.command, Command::Init) {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;

    // Override output settings from CLI flags
    if cli.dry_run {
        config.output.dry_run = true;
    }
    if cli.backup {
        config.output.save_backup = true;
    }

    // Handle check
    if matches!(cli.command, Command::Check) {
        return check(&config);
    }

    let Some((op, paths)) = cli.command.into_operation() else {
        return Ok(());
    };

    // Collect images
    let images = pipeline::collect_images(&paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    if op.is_write() {
        log::info!("Found {} image(s) to process", images.len());
        if config.output.dry_run {
            log::info!("DRY RUN: no files will be modified");
        }
    }

    // Process each image
    let mut results = Vec::new();
    let total = images.len();

    for (i, image_path) in images.iter().enumerate() {
        log::debug!(
            "[{}/{}] Processing: {}",
            i + 1,
            total,
            image_path.display()
        );

        let result = pipeline::apply(image_path, &op, &config);

        if let Some(ref err) = result.error {
            log::error!("  Error: {err}");
        } else if !cli.json {
            print_result(&op, &result);
        }

        results.push(result);
    }

    // JSON output
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    // Summary
    let success = results.iter().filter(|r| r.error.is_none()).count();
    let failed = total - success;
    if op.is_write() || failed > 0 {
        log::info!("Done: {success} succeeded, {failed} failed out of {total} images");
    }
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Report whether exiftool runs, and its version.
fn check(config: &config::Config) -> Result<()> {
    let tool = ExifTool::from_config(config);
    if !tool.is_installed() {
        anyhow::bail!("{}", error::INSTALL_EXIFTOOL_INFO.trim());
    }
    let output = tool.run(&ExifCommand::read().flag("-ver"), None)?;
    println!(
        "exiftool {} ({})",
        output.stdout.trim(),
        config.tool.path
    );
    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Print a successful result in human-readable form.
fn print_result(op: &Operation, result: &EditResult) {
    match (op, &result.output) {
        (Operation::Show { .. }, Some(Value::Object(tags))) => {
            println!();
            println!("{BOLD}File:{RESET} {}", result.path.display());
            println!("{DIM}{}{RESET}", "═".repeat(72));
            if tags.is_empty() {
                println!("  {DIM}(no metadata found){RESET}");
            }
            for (tag, value) in tags {
                print_row(tag, &display_value(value));
            }
            println!();
        }
        (_, Some(value)) => {
            println!("{}: {}", result.path.display(), display_value(value));
        }
        (_, None) => {
            println!("  {GREEN}✓{RESET} {}", result.path.display());
        }
    }
}

/// Strings are printed bare, lists joined, everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print one tag as a `name : value` row, continuation lines indented.
fn print_row(tag: &str, val: &str) {
    let mut lines = wrap_text(val, VAL_WIDTH).into_iter();
    let first = lines.next().unwrap_or_default();
    println!("  {tag:<22} : {first}");
    for line in lines {
        println!("  {INDENT}{line}");
    }
}

/// Split `s` into lines of at most `max_width` characters, breaking between
/// words. A single word longer than that gets a line of its own.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut width = 0;

    for word in s.split_whitespace() {
        let word_width = word.chars().count();
        match lines.last_mut() {
            Some(line) if width > 0 && width + 1 + word_width <= max_width => {
                line.push(' ');
                line.push_str(word);
                width += 1 + word_width;
            }
            _ => {
                lines.push(word.to_string());
                width = word_width;
            }
        }
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("exif-edit").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(
            parse_assignment("Title=a=b").unwrap(),
            ("Title".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("Title=").unwrap(),
            ("Title".to_string(), String::new())
        );
        assert!(parse_assignment("Title").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn keyword_subcommands_map_to_operations() {
        let cli = parse(&["keywords", "add", "-k", "a", "-k", "b", "x.jpg"]);
        let (op, paths) = cli.command.into_operation().unwrap();
        assert_eq!(op, Operation::AddKeywords(vec!["a".into(), "b".into()]));
        assert_eq!(paths, [PathBuf::from("x.jpg")]);
    }

    #[test]
    fn rotate_accepts_negative_degrees() {
        let cli = parse(&["rotate", "--degrees", "-90", "x.jpg"]);
        let (op, _) = cli.command.into_operation().unwrap();
        assert_eq!(op, Operation::Rotate(-90));

        let cli = parse(&["rotate", "x.jpg"]);
        assert_eq!(cli.command.into_operation().unwrap().0, Operation::Rotate(90));
    }

    #[test]
    fn date_reads_unless_setting() {
        let cli = parse(&["date", "x.jpg"]);
        let (op, _) = cli.command.into_operation().unwrap();
        assert_eq!(op, Operation::GetDate(DateField::Original));

        let cli = parse(&["date", "--modified", "--now", "x.jpg"]);
        let (op, _) = cli.command.into_operation().unwrap();
        assert_eq!(op, Operation::SetDate(DateField::Modified, None));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = parse(&["show", "x.jpg", "--json", "--dry-run"]);
        assert!(cli.json);
        assert!(cli.dry_run);
    }

    #[test]
    fn orientation_code_is_range_checked() {
        let args = ["exif-edit", "orientation", "--set", "9", "x.jpg"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn paths_are_required() {
        assert!(Cli::try_parse_from(["exif-edit", "show"]).is_err());
    }

    #[test]
    fn display_values() {
        assert_eq!(display_value(&serde_json::json!("x")), "x");
        assert_eq!(display_value(&serde_json::json!(["a", "b"])), "a, b");
        assert_eq!(display_value(&serde_json::json!(3)), "3");
    }

    #[test]
    fn wrap_long_text() {
        let lines = wrap_text("one two three", 7);
        assert_eq!(lines, ["one two", "three"]);
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        // 7 characters, 14 bytes
        let lines = wrap_text("äöü ßéè", 7);
        assert_eq!(lines, ["äöü ßéè"]);

        let lines = wrap_text("Zürich Genève", 6);
        assert_eq!(lines, ["Zürich", "Genève"]);
    }

    #[test]
    fn wrap_keeps_long_words_whole() {
        assert_eq!(wrap_text("a verylongword b", 4), ["a", "verylongword", "b"]);
        assert_eq!(wrap_text("", 10), [""]);
    }
}
