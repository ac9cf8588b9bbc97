use anyhow::{Context, Result, bail};
use richtext_config::Config;
use richtext_engine::{FormatRegistry, Value, create_from_markup, to_html_string};
use std::{env, path::PathBuf, process};

const USAGE: &str = "Usage: richtext-cli <normalize|text|dump> <file> [--multiline <tag>]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Parse and serialize again.
    Normalize,
    /// Plain text, one line per line separator.
    Text,
    /// The value as JSON.
    Dump,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    file: PathBuf,
    multiline: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut positional = Vec::new();
    let mut multiline = None;
    let mut rest = args.iter();
    while let Some(arg) = rest.next() {
        if arg == "--multiline" {
            let tag = rest.next().context("--multiline needs a tag name")?;
            multiline = Some(tag.clone());
        } else {
            positional.push(arg);
        }
    }

    let [command, file] = positional.as_slice() else {
        bail!("expected a command and a file");
    };
    let command = match command.as_str() {
        "normalize" => Command::Normalize,
        "text" => Command::Text,
        "dump" => Command::Dump,
        other => bail!("unknown command {other:?}"),
    };
    Ok(Args {
        command,
        file: PathBuf::from(file.as_str()),
        multiline,
    })
}

fn render(
    command: Command,
    value: &Value,
    multiline: Option<&str>,
    registry: &FormatRegistry,
) -> Result<String> {
    Ok(match command {
        Command::Normalize => to_html_string(value, multiline, registry),
        Command::Text => value.text_content(),
        Command::Dump => serde_json::to_string_pretty(value).context("Failed to serialize value")?,
    })
}

fn run(args: &Args, config: &Config) -> Result<String> {
    let path = config.resolve_document(&args.file);
    let markup = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut editor = config.editor.clone();
    if let Some(tag) = &args.multiline {
        editor.multiline_tag = Some(tag.clone());
    }
    let settings = editor.settings();
    let registry = config.format_registry();

    let value = create_from_markup(&markup, &settings.create_options(false), &registry);
    log::debug!("read {} characters from {}", value.len(), path.display());
    render(args.command, &value, settings.multiline_tag.as_deref(), &registry)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    let config_path = Config::config_path();
    let config = Config::load()
        .with_context(|| format!("Failed to load config file {}", config_path.display()))?
        .unwrap_or_default();

    println!("{}", run(&args, &config)?);
    Ok(())
}
