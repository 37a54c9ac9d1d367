/*!
 * Configuration handling for repotxt
 */

use std::env;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_complete::Shell;

use crate::analyzer::AnalysisRequest;
use crate::error::{AnalysisError, Result};
use crate::filter::{BinaryDetection, FilterConfig};
use crate::tokenizer::Model;

/// Environment variable overriding the server's output root
pub const OUTPUT_DIR_ENV: &str = "REPOTXT_OUTPUT_DIR";
/// Environment variable selecting the server's tokenizer model
pub const MODEL_ENV: &str = "REPOTXT_MODEL";

/// Command-line arguments for repotxt
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "repotxt",
    version = env!("CARGO_PKG_VERSION"),
    about = "Flatten a directory or git repository into one text file for LLM context",
    long_about = "Writes the folder structure and the concatenated contents of every text file in a local folder or remote git repository to a timestamped session folder, optionally truncated to a token budget."
)]
pub struct Args {
    /// Repository URL or local folder to analyze
    #[clap(required_unless_present = "generate")]
    pub source: Option<String>,

    /// Treat the source as a local path, never clone
    #[clap(long)]
    pub local: bool,

    /// Access token for private repositories
    #[clap(short, long)]
    pub token: Option<String>,

    /// Root folder for session output [default: ./repotxt_output]
    #[clap(short, long)]
    pub output_dir: Option<PathBuf>,

    /// List only directories in the folder structure
    #[clap(short, long)]
    pub directories_only: bool,

    /// File suffixes to exclude (e.g. .log .lock)
    #[clap(short, long, num_args = 1..)]
    pub exclude: Vec<String>,

    /// File suffixes to keep; all others are skipped
    #[clap(short, long, num_args = 1..)]
    pub include: Vec<String>,

    /// Include git metadata files and directories
    #[clap(long)]
    pub include_git: bool,

    /// Include LICENSE files
    #[clap(long)]
    pub include_license: bool,

    /// Exclude README files
    #[clap(long)]
    pub exclude_readme: bool,

    /// Token budget for the output, 0 for unlimited
    #[clap(long, default_value_t = 0, allow_negative_numbers = true)]
    pub max_tokens: i64,

    /// Model whose tokenizer counts and truncates tokens
    #[clap(long, value_enum, default_value_t = Model::default())]
    pub model: Model,

    /// How binary files are recognized
    #[clap(long, value_enum, default_value_t = BinaryDetection::default())]
    pub binary_detection: BinaryDetection,

    /// Log progress details to stderr
    #[clap(short, long)]
    pub verbose: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Parameters passed to the analyzer
    pub request: AnalysisRequest,

    /// Tokenizer model
    pub model: Model,

    /// Verbose logging
    pub verbose: bool,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let Some(source) = args.source else {
            crate::bail!(InvalidArgument, "a source URL or path is required");
        };

        let filter = FilterConfig {
            ignore_git: !args.include_git,
            exclude_license: !args.include_license,
            exclude_readme: args.exclude_readme,
            exclude_extensions: args.exclude,
            include_extensions: args.include,
        };

        Ok(Self {
            request: AnalysisRequest {
                source,
                is_local: args.local,
                token: args.token,
                output_dir: args.output_dir,
                directories_only: args.directories_only,
                filter,
                max_tokens: args.max_tokens,
                binary_detection: args.binary_detection,
            },
            model: args.model,
            verbose: args.verbose,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        crate::ensure!(
            !self.request.source.trim().is_empty(),
            InvalidArgument,
            "source must not be empty"
        );

        // An existing output root that is a file would only fail at persist time
        if let Some(dir) = &self.request.output_dir {
            crate::ensure!(
                !dir.is_file(),
                InvalidArgument,
                "output directory is a file: {}",
                dir.display()
            );
        }

        let filters = self
            .request
            .filter
            .include_extensions
            .iter()
            .chain(&self.request.filter.exclude_extensions);
        for ext in filters {
            crate::ensure!(!ext.is_empty(), InvalidArgument, "empty extension filter");
        }

        Ok(())
    }
}

/// Settings of the MCP server, read from the environment
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Output root used when a call does not name one
    pub output_dir: Option<PathBuf>,

    /// Tokenizer model
    pub model: Model,
}

impl ServerConfig {
    /// Read `REPOTXT_OUTPUT_DIR` and `REPOTXT_MODEL`
    pub fn from_env() -> Result<Self> {
        let output_dir = env::var_os(OUTPUT_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        let model = match env::var(MODEL_ENV) {
            Ok(name) if !name.is_empty() => parse_model(&name)?,
            _ => Model::default(),
        };

        Ok(Self { output_dir, model })
    }
}

/// Parse a model name as accepted by `--model`
pub fn parse_model(name: &str) -> Result<Model> {
    <Model as ValueEnum>::from_str(name, true)
        .map_err(|_| AnalysisError::InvalidArgument(format!("unknown model: {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(argv: &[&str]) -> Config {
        let args = Args::try_parse_from(argv).unwrap();
        Config::from_args(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["repotxt", "https://github.com/a/b"]);
        assert_eq!(config.request.source, "https://github.com/a/b");
        assert_eq!(config.request.filter, FilterConfig::default());
        assert_eq!(config.request.max_tokens, 0);
        assert!(config.request.output_dir.is_none());
        assert!(!config.request.is_local);
        assert_eq!(config.model, Model::Gpt4);
        config.validate().unwrap();
    }

    #[test]
    fn test_filter_flags() {
        let config = parse(&[
            "repotxt",
            "./proj",
            "--local",
            "--include-git",
            "--include-license",
            "--exclude-readme",
            "-i",
            ".py",
            ".rs",
            "-e",
            ".lock",
            "--max-tokens",
            "500",
        ]);
        let filter = &config.request.filter;
        assert!(!filter.ignore_git);
        assert!(!filter.exclude_license);
        assert!(filter.exclude_readme);
        assert_eq!(filter.include_extensions, vec![".py", ".rs"]);
        assert_eq!(filter.exclude_extensions, vec![".lock"]);
        assert_eq!(config.request.max_tokens, 500);
        assert!(config.request.is_local);
    }

    #[test]
    fn test_source_required_without_generate() {
        assert!(Args::try_parse_from(["repotxt"]).is_err());
        let args = Args::try_parse_from(["repotxt", "--generate", "bash"]).unwrap();
        assert!(args.source.is_none());
        assert!(Config::from_args(args).is_err());
    }

    #[test]
    fn test_validate_rejects_file_output_dir() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("out");
        std::fs::write(&file, "x").unwrap();

        let config = parse(&["repotxt", ".", "-o", file.to_str().unwrap()]);
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_model() {
        assert_eq!(parse_model("gpt4o").unwrap(), Model::Gpt4o);
        assert!(parse_model("not-a-model").is_err());
    }
}
