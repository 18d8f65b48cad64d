use clap::{Parser, ValueEnum};
use shfront::config::Config;
use shfront::File;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Yaml,
    Debug,
}

#[derive(Parser)]
#[command(name = "shfront")]
#[command(about = "Parse a POSIX shell script and print its syntax tree")]
#[command(version)]
struct Cli {
    /// Parse the script from command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// TOML file with an [aliases] table
    #[arg(long = "aliases")]
    aliases: Option<PathBuf>,

    /// Define an alias, applied after the alias file
    #[arg(long = "alias", value_name = "NAME=VALUE")]
    alias: Vec<String>,

    /// Output format for the tree
    #[arg(long = "format", value_enum, default_value = "json")]
    format: Format,

    /// Script file to parse
    #[arg()]
    script_file: Option<PathBuf>,
}

fn print_tree(file: &File, format: Format) -> Result<(), String> {
    let out = match format {
        Format::Json => serde_json::to_string_pretty(file).map_err(|e| e.to_string())?,
        Format::Yaml => serde_yaml::to_string(file).map_err(|e| e.to_string())?,
        Format::Debug => format!("{:#?}", file),
    };
    println!("{}", out);
    Ok(())
}

fn run(cli: Cli) -> Result<(), String> {
    let mut config = match &cli.aliases {
        Some(path) => Config::load(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    for definition in &cli.alias {
        config.define(definition).map_err(|e| e.to_string())?;
    }

    // Determine script source: -c, file, or stdin
    let result = if let Some(script) = &cli.script {
        shfront::parse("-c", script, Some(&config.aliases))
    } else if let Some(path) = &cli.script_file {
        let file = std::fs::File::open(path)
            .map_err(|e| format!("cannot read script file: {}: {}", path.display(), e))?;
        shfront::parse_reader(&path.display().to_string(), file, Some(&config.aliases))
    } else {
        shfront::parse_reader("stdin", std::io::stdin().lock(), Some(&config.aliases))
    };

    match result {
        Ok(file) => print_tree(&file, cli.format),
        Err(incomplete) => {
            log::debug!(
                "{} commands parsed before the error",
                incomplete.file.commands.len()
            );
            Err(incomplete.error.to_string())
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(message) = run(cli) {
        eprintln!("shfront: {}", message);
        std::process::exit(1);
    }
}
