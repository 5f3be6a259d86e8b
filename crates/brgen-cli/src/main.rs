//! brgen CLI - Command-line interface for the brgen binary format language

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

use brgen_core::ast::dump_tree;
use brgen_core::{Config, Diagnostic, Lexer, ParseOptions, SyntaxTree};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG: &str = "brgen.toml";

#[derive(Parser)]
#[command(name = "brgen")]
#[command(version = brgen_core::VERSION)]
#[command(about = "Front end for the brgen binary format language", long_about = None)]
struct Cli {
    /// Increase log output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Read parser settings from this file instead of ./brgen.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and print its syntax tree
    Parse {
        /// Path to the source file
        file: PathBuf,

        /// Record recoverable errors and keep parsing
        #[arg(long)]
        tolerant: bool,

        /// Attach comments to the tree
        #[arg(long)]
        comments: bool,
    },

    /// Parse a file and report diagnostics only
    Check {
        /// Path to the source file
        file: PathBuf,

        /// Record recoverable errors and keep parsing
        #[arg(long)]
        tolerant: bool,
    },

    /// Print the token stream of a file
    Tokens {
        /// Path to the source file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Parse {
            file,
            tolerant,
            comments,
        } => {
            let mut options = load_options(cli.config.as_deref())?;
            options.error_tolerant |= tolerant;
            options.collect_comments |= comments;
            let source = read_source(&file)?;
            let tree = parse_file(&file, &source, &options)?;
            print!("{}", dump_tree(&tree.ast, tree.root));
            report(&file, &source, &tree.diagnostics);
        }

        Commands::Check { file, tolerant } => {
            let mut options = load_options(cli.config.as_deref())?;
            options.error_tolerant |= tolerant;
            let source = read_source(&file)?;
            let tree = parse_file(&file, &source, &options)?;
            report(&file, &source, &tree.diagnostics);
            if !tree.diagnostics.is_empty() {
                return Err(anyhow::anyhow!(
                    "{} error(s) in '{}'",
                    tree.diagnostics.len(),
                    file.display()
                ));
            }
            println!("{}: ok", file.display());
        }

        Commands::Tokens { file } => {
            let source = read_source(&file)?;
            for token in Lexer::new(&source) {
                println!("{}\t{}\t{}", token.loc.line, token.tag, token);
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins when set; otherwise `-v` picks the level
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_options(path: Option<&Path>) -> Result<ParseOptions> {
    let config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).exists() => Config::load(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("Failed to load config '{DEFAULT_CONFIG}'"))?,
        None => Config::default(),
    };
    log::debug!("parser options: {:?}", config.parser);
    Ok(config.parser)
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file '{}'", path.display()))
}

fn parse_file(path: &Path, source: &str, options: &ParseOptions) -> Result<SyntaxTree> {
    brgen_core::parse_source(source, options).map_err(|err| {
        let rendered = Diagnostic::from(&err).render(source, &path.display().to_string());
        anyhow::anyhow!("Parse error in '{}':\n{rendered}", path.display())
    })
}

fn report(path: &Path, source: &str, diagnostics: &[Diagnostic]) {
    let name = path.display().to_string();
    for diagnostic in diagnostics {
        eprint!("{}", diagnostic.render(source, &name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(["brgen", "-vv", "parse", "a.bgn", "--tolerant"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Parse {
                file,
                tolerant,
                comments,
            } => {
                assert_eq!(file, PathBuf::from("a.bgn"));
                assert!(tolerant);
                assert!(!comments);
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_check_with_config() {
        let cli =
            Cli::try_parse_from(["brgen", "check", "a.bgn", "--config", "cfg.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
        assert!(matches!(cli.command, Commands::Check { tolerant: false, .. }));
    }

    #[test]
    fn test_tokens_requires_file() {
        assert!(Cli::try_parse_from(["brgen", "tokens"]).is_err());
    }

    #[test]
    fn test_load_options_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[parser]\nerror_tolerant = true").unwrap();
        let options = load_options(Some(file.path())).unwrap();
        assert!(options.error_tolerant);
        assert!(!options.collect_comments);
    }

    #[test]
    fn test_parse_file_renders_error() {
        let path = Path::new("bad.bgn");
        let err = parse_file(path, "format A\n  x :u8\n", &ParseOptions::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bad.bgn:1:"));
        assert!(message.contains("format A"));
    }
}
