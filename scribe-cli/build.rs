use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the transforms from src/transforms.rs
// We need to duplicate this here since build scripts can't access src/ modules
const AVAILABLE_TRANSFORMS: &[&str] = &["tokens", "store", "tree", "tree-json", "html", "drift"];

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let file_arg = |name: &'static str, help: &'static str| {
        Arg::new(name)
            .help(help)
            .required(true)
            .index(1)
            .value_hint(ValueHint::FilePath)
    };

    let mut cmd = Command::new("scribe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert markdown with shortcodes to and from a rich-text document")
        .arg_required_else_help(true)
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available formats and inspect transforms")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .value_hint(ValueHint::FilePath),
        )
        .arg(Arg::new("verbose").long("verbose").short('v').action(ArgAction::SetTrue))
        .subcommand(
            Command::new("inspect")
                .arg(file_arg("path", "Path to the markdown file"))
                .arg(
                    Arg::new("transform")
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            AVAILABLE_TRANSFORMS,
                        ))
                        .index(2),
                ),
        )
        .subcommand(
            Command::new("convert")
                .arg(file_arg("input", "Input file path"))
                .arg(Arg::new("from").long("from"))
                .arg(Arg::new("to").long("to").required(true))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("roundtrip")
                .arg(file_arg("path", "Path to the markdown file"))
                .arg(Arg::new("via-html").long("via-html").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("css")
                .arg(Arg::new("shortcode").long("shortcode"))
                .arg(Arg::new("attr").long("attr").action(ArgAction::Append)),
        );

    // Generate completions for bash
    generate_to(Bash, &mut cmd, "scribe", &outdir)?;

    // Generate completions for zsh
    generate_to(Zsh, &mut cmd, "scribe", &outdir)?;

    // Generate completions for fish
    generate_to(Fish, &mut cmd, "scribe", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
