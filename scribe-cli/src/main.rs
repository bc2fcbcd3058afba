// Command-line interface for scribe
//
// This binary converts between markdown with shortcodes and the rich-document formats, and
// exposes the stages of the pipeline for inspection.
//
// Converting:
//
// The conversion needs a to and from pair. The from can be auto-detected from the file extension,
// while being overwrittable by an explicit --from flag.
// Usage:
//  scribe <input> --to <format> [--from <format>] [--output <file>]   - Convert between formats (default)
//  scribe convert <input> --to <format> [--from <format>] [-o <file>]  - Same as above (explicit)
//  scribe inspect <path> [<transform>]    - Show a pipeline stage (defaults to "tree")
//  scribe roundtrip <path> [--via-html]   - Load and save, failing if the text changes
//  scribe css [--shortcode <name> --attr key=value]  - Editor stylesheet or shortcode preview css
//  scribe --list-formats                  - List formats and transforms
//
// Extra Parameters:
//
// Format-specific parameters can be passed using --extra-<parameter-name> <value>.
// The CLI layer strips the "extra-" prefix and passes the parameters to the format/transform.
// Example:
//  scribe convert page.md --to html --extra-standalone

mod transforms;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use scribe_babel::shortcodes::Attributes;
use scribe_babel::{ConvertOptions, EditSession, FormatRegistry, ShortcodeRegistry};
use scribe_config::{Loader, ScribeConfig};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SCRIBE_LOG";

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
/// - `--extras-<key>` (alias for `--extra-<key>`)
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        let key_opt = if let Some(key) = arg.strip_prefix("--extra-") {
            Some(key)
        } else {
            arg.strip_prefix("--extras-")
        };

        if let Some(key) = key_opt {
            let has_value = args.get(i + 1).is_some_and(|next| !next.starts_with('-'));
            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn build_cli() -> Command {
    Command::new("scribe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert markdown with shortcodes to and from a rich-text document")
        .long_about(
            "scribe loads CMS markdown (shortcodes, raw HTML, template fragments, alerts) into a\n\
            rich-text document tree and writes it back without disturbing what was not edited.\n\n\
            Commands:\n  \
            - convert:   Transform between formats (markdown, html, json, treeviz)\n  \
            - inspect:   View pipeline stages (tokens, store, tree, html, drift)\n  \
            - roundtrip: Check that a file survives load and save unchanged\n  \
            - css:       Print preview styles\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> [value] to pass format-specific options.\n  \
            Boolean flags can omit the value (defaults to 'true').\n\n\
            Logging goes to stderr. Set SCRIBE_LOG (e.g. SCRIBE_LOG=debug) or pass -v.\n\n\
            Examples:\n  \
            scribe page.md --to html                  # Editor HTML to stdout\n  \
            scribe page.md --to html --extra-standalone -o page.html\n  \
            scribe edited.html --to markdown          # Back to markdown\n  \
            scribe inspect page.md tokens             # Tokenized markdown",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available formats and inspect transforms")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a scribe.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log debug output to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("inspect")
                .about("Inspect pipeline stages of a markdown file")
                .long_about(
                    "View a markdown file at different stages of the conversion.\n\n\
                    Transforms:\n  \
                    - tokens:     Markdown with opaque regions replaced by tokens\n  \
                    - store:      Placeholder records as JSON\n  \
                    - tree:       Rich document as a tree visualization (default)\n  \
                    - tree-json:  Rich document as JSON\n  \
                    - html:       Editor HTML\n  \
                    - drift:      Inline shortcodes whose count changes on save\n\n\
                    Examples:\n  \
                    scribe inspect page.md                    # Tree visualization\n  \
                    scribe inspect page.md tree --extra-inlines\n  \
                    scribe inspect page.md store              # Placeholder records",
                )
                .arg(
                    Arg::new("path")
                        .help("Path to the markdown file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("transform")
                        .help("Transform to apply. Defaults to 'tree'")
                        .required(false)
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            transforms::AVAILABLE_TRANSFORMS,
                        ))
                        .index(2)
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .long_about(
                    "Convert documents between different formats.\n\n\
                    Supported formats:\n  \
                    - markdown: Markdown with shortcodes (.md)\n  \
                    - html:     Editor HTML with data attributes (.html)\n  \
                    - json:     Rich document tree and placeholder store (.json)\n  \
                    - treeviz:  Tree visualization (output only)\n\n\
                    The source format is auto-detected from the file extension.\n\
                    Output goes to stdout by default, or use -o to specify a file.",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .required(true)
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("roundtrip")
                .about("Load and save a markdown file, failing if the text changes")
                .arg(
                    Arg::new("path")
                        .help("Path to the markdown file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("via-html")
                        .long("via-html")
                        .help("Pass the document through the editor HTML before saving")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("css")
                .about("Output the editor preview stylesheet, or one shortcode's preview style")
                .arg(
                    Arg::new("shortcode")
                        .long("shortcode")
                        .value_name("NAME")
                        .help("Shortcode whose css template to interpolate"),
                )
                .arg(
                    Arg::new("attr")
                        .long("attr")
                        .value_name("KEY=VALUE")
                        .help("Attribute value for the css template (repeatable)")
                        .action(ArgAction::Append)
                        .requires("shortcode"),
                ),
        )
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let (cleaned_args, extra_params) = parse_extra_args(&args);

    // No subcommand given: treat the first argument as a file and inject "convert"
    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && !["inspect", "convert", "roundtrip", "css", "help"].contains(&cleaned_args[1].as_str())
            {
                let mut new_args = vec![cleaned_args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);
                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    init_logging(matches.get_flag("verbose"));

    let config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));
    let shortcodes = Arc::new(config.shortcode_registry().unwrap_or_else(|err| {
        eprintln!("Invalid shortcode configuration: {err}");
        std::process::exit(1);
    }));
    let options = config.convert_options();

    if matches.get_flag("list-formats") {
        handle_list_formats_command(&shortcodes, &options);
        return;
    }

    match matches.subcommand() {
        Some(("inspect", sub_matches)) => {
            let path = required(sub_matches, "path");
            let transform = sub_matches
                .get_one::<String>("transform")
                .map(|s| s.as_str())
                .unwrap_or(transforms::DEFAULT_TRANSFORM);
            handle_inspect_command(path, transform, &extra_params, &shortcodes, &options);
        }
        Some(("convert", sub_matches)) => {
            let input = required(sub_matches, "input");
            let to = required(sub_matches, "to");
            let registry = FormatRegistry::with_defaults(shortcodes, options);

            let from = match sub_matches.get_one::<String>("from") {
                Some(f) => f.to_string(),
                None => match registry.detect_format_from_filename(input) {
                    Some(detected) => detected,
                    None => {
                        eprintln!("Error: Could not detect format from filename '{input}'");
                        eprintln!("Please specify --from explicitly");
                        std::process::exit(1);
                    }
                },
            };

            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(&registry, input, &from, to, output, &extra_params);
        }
        Some(("roundtrip", sub_matches)) => {
            let path = required(sub_matches, "path");
            let via_html = sub_matches.get_flag("via-html");
            handle_roundtrip_command(path, via_html, shortcodes, options);
        }
        Some(("css", sub_matches)) => {
            let shortcode = sub_matches.get_one::<String>("shortcode").map(|s| s.as_str());
            let attrs: Vec<&str> = sub_matches
                .get_many::<String>("attr")
                .map(|values| values.map(String::as_str).collect())
                .unwrap_or_default();
            handle_css_command(shortcode, &attrs, &shortcodes);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    match matches.get_one::<String>(name) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: missing required argument '{name}'");
            std::process::exit(2);
        }
    }
}

/// Install the stderr log subscriber. `SCRIBE_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

/// Handle the inspect command
fn handle_inspect_command(
    path: &str,
    transform: &str,
    extra_params: &HashMap<String, String>,
    shortcodes: &Arc<ShortcodeRegistry>,
    options: &ConvertOptions,
) {
    let source = read_source(path);
    let output = transforms::execute_transform(&source, transform, extra_params, shortcodes, options)
        .unwrap_or_else(|e| {
            eprintln!("Execution error: {e}");
            std::process::exit(1);
        });
    print!("{output}");
}

/// Handle the convert command
fn handle_convert_command(
    registry: &FormatRegistry,
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
    extra_params: &HashMap<String, String>,
) {
    if let Err(e) = registry.get(from) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = registry.get(to) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let source = read_source(input);
    tracing::debug!(input, from, to, bytes = source.len(), "converting");

    let doc = registry.parse(&source, from).unwrap_or_else(|e| {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    });

    let result = registry
        .serialize_with_options(&doc, to, extra_params)
        .unwrap_or_else(|e| {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        });

    match output {
        Some(path) => {
            fs::write(path, result).unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
        }
        None => print!("{result}"),
    }
}

/// Handle the roundtrip command
fn handle_roundtrip_command(
    path: &str,
    via_html: bool,
    shortcodes: Arc<ShortcodeRegistry>,
    options: ConvertOptions,
) {
    let source = read_source(path);
    let mut session = EditSession::new(shortcodes, options);
    session.load_markdown(&source);
    if via_html {
        let html = session.html();
        session.load_html(&html);
    }
    let saved = session.save();
    tracing::debug!(path, via_html, records = session.store().len(), "round trip saved");

    match first_difference(&source, &saved) {
        None => println!("{path}: unchanged"),
        Some((line, expected, actual)) => {
            eprintln!("{path}:{line}: output differs");
            eprintln!("  - {expected}");
            eprintln!("  + {actual}");
            std::process::exit(1);
        }
    }
}

/// First differing line (1-based) with the source and output text of that line.
fn first_difference(source: &str, saved: &str) -> Option<(usize, String, String)> {
    if source == saved {
        return None;
    }
    let mut left = source.split('\n');
    let mut right = saved.split('\n');
    let mut line = 1;
    loop {
        match (left.next(), right.next()) {
            (Some(a), Some(b)) if a == b => line += 1,
            (None, None) => return Some((line, String::new(), String::new())),
            (a, b) => {
                return Some((
                    line,
                    a.unwrap_or("<end of file>").to_string(),
                    b.unwrap_or("<end of file>").to_string(),
                ))
            }
        }
    }
}

/// Handle the css command
fn handle_css_command(shortcode: Option<&str>, attrs: &[&str], shortcodes: &ShortcodeRegistry) {
    let Some(name) = shortcode else {
        print!("{}", scribe_babel::formats::html::editor_css());
        return;
    };
    if !shortcodes.has(name) {
        eprintln!("Error: shortcode '{name}' is not configured");
        std::process::exit(1);
    }
    let mut attributes = Attributes::new();
    for pair in attrs {
        match pair.split_once('=') {
            Some((key, value)) => attributes.insert(key.trim(), value.trim()),
            None => {
                eprintln!("Invalid attribute '{pair}', expected KEY=VALUE");
                std::process::exit(1);
            }
        }
    }
    println!("{}", shortcodes.generate_css(name, &attributes));
}

/// Handle the list-formats command
fn handle_list_formats_command(shortcodes: &Arc<ShortcodeRegistry>, options: &ConvertOptions) {
    let registry = FormatRegistry::with_defaults(Arc::clone(shortcodes), options.clone());
    println!("Conversion formats:");
    for format_name in registry.list_formats() {
        println!("  {format_name}");
    }

    println!("\nInspect transforms:");
    for transform_name in transforms::AVAILABLE_TRANSFORMS {
        println!("  {transform_name}");
    }

    println!("\nConfigured shortcodes:");
    for name in shortcodes.names() {
        println!("  {name}");
    }
}

fn load_cli_config(explicit_path: Option<&str>) -> ScribeConfig {
    let loader = Loader::new().with_optional_file("scribe.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    tracing::debug!(path = ?explicit_path, "loading configuration");
    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_extra_args_empty() {
        let args = strings(&["scribe", "inspect", "page.md"]);
        let (cleaned, extra) = parse_extra_args(&args);
        assert_eq!(cleaned, args);
        assert!(extra.is_empty());
    }

    #[test]
    fn test_parse_extra_args_mixed_with_regular_args() {
        let args = strings(&[
            "scribe",
            "convert",
            "page.md",
            "--to",
            "html",
            "--extra-standalone",
            "yes",
            "--from",
            "markdown",
        ]);
        let (cleaned, extra) = parse_extra_args(&args);
        assert_eq!(
            cleaned,
            strings(&["scribe", "convert", "page.md", "--to", "html", "--from", "markdown"])
        );
        assert_eq!(extra.get("standalone"), Some(&"yes".to_string()));
    }

    #[test]
    fn test_parse_extra_args_boolean_flags() {
        let args = strings(&["scribe", "inspect", "page.md", "--extra-inlines", "--extras-standalone"]);
        let (cleaned, extra) = parse_extra_args(&args);
        assert_eq!(cleaned, strings(&["scribe", "inspect", "page.md"]));
        assert_eq!(extra.get("inlines"), Some(&"true".to_string()));
        assert_eq!(extra.get("standalone"), Some(&"true".to_string()));
    }

    #[test]
    fn first_difference_reports_line() {
        assert_eq!(first_difference("a\nb\n", "a\nb\n"), None);
        assert_eq!(
            first_difference("a\nb\nc\n", "a\nB\nc\n"),
            Some((2, "b".to_string(), "B".to_string()))
        );
        assert_eq!(
            first_difference("a\n", "a\nextra\n"),
            Some((2, String::new(), "extra".to_string()))
        );
        assert_eq!(
            first_difference("a", "a\n"),
            Some((2, "<end of file>".to_string(), String::new()))
        );
    }

    #[test]
    fn default_config_loads() {
        let config = load_cli_config(None);
        assert!(config.shortcode_registry().is_ok());
        assert_eq!(config.convert_options().summary_delimiter, "===");
    }
}
