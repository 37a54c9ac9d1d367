/*!
 * Analysis orchestration
 *
 * A run moves through acquire, render, truncate, persist and cleanup in
 * that order. Anything failing before persistence aborts the run, and a
 * temporary clone is removed on every way out.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use strum::Display;
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, Result};
use crate::filter::{BinaryDetection, FilterConfig};
use crate::git::{
    authenticated_url, repo_name_from_source, SourceProvider, TempCheckout, DEFAULT_SETTLE_DELAY,
};
use crate::scanner::{ScanStatistics, Scanner};
use crate::tokenizer::{create_tokenizer, truncate_to_budget, Model, Tokenizer};
use crate::types::{AnalysisResult, RenderedOutput};
use crate::writer::{default_output_dir, SessionWriter};

/// Steps of a single analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[strum(to_string = "Resolving source")]
    Acquire,
    #[strum(to_string = "Cloning repository")]
    Clone,
    #[strum(to_string = "Generating folder structure")]
    BuildStructure,
    #[strum(to_string = "Concatenating file contents")]
    BuildContent,
    #[strum(to_string = "Truncating to token budget")]
    Truncate,
    #[strum(to_string = "Writing output")]
    Persist,
    #[strum(to_string = "Cleaning up")]
    Cleanup,
    #[strum(to_string = "Done")]
    Done,
}

/// Receives stage transitions while a run progresses
pub trait AnalysisObserver: Send + Sync {
    /// Called when the run enters `stage`
    fn on_stage(&self, stage: Stage);
}

impl<F> AnalysisObserver for F
where
    F: Fn(Stage) + Send + Sync,
{
    fn on_stage(&self, stage: Stage) {
        self(stage)
    }
}

/// Parameters of one analysis run
#[derive(Clone)]
pub struct AnalysisRequest {
    /// Repository URL or local path
    pub source: String,
    /// Treat `source` as a local path even if it does not exist yet
    pub is_local: bool,
    /// Access token for private HTTPS repositories
    pub token: Option<String>,
    /// Root for session folders; `./repotxt_output` when unset
    pub output_dir: Option<PathBuf>,
    /// Omit files from the structure listing
    pub directories_only: bool,
    /// Inclusion rules
    pub filter: FilterConfig,
    /// Token budget; zero or negative disables truncation
    pub max_tokens: i64,
    /// Binary classification used for the content pass
    pub binary_detection: BinaryDetection,
}

impl AnalysisRequest {
    /// Request with default options for `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            is_local: false,
            token: None,
            output_dir: None,
            directories_only: false,
            filter: FilterConfig::default(),
            max_tokens: 0,
            binary_detection: BinaryDetection::default(),
        }
    }
}

impl std::fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("source", &self.source)
            .field("is_local", &self.is_local)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("output_dir", &self.output_dir)
            .field("directories_only", &self.directories_only)
            .field("filter", &self.filter)
            .field("max_tokens", &self.max_tokens)
            .field("binary_detection", &self.binary_detection)
            .finish()
    }
}

/// Runs analyses against local folders or cloned repositories
pub struct Analyzer<P: SourceProvider> {
    provider: P,
    tokenizer: Option<Box<dyn Tokenizer>>,
    observer: Option<Box<dyn AnalysisObserver>>,
    cleanup_delay: Duration,
}

impl<P: SourceProvider> Analyzer<P> {
    /// Create an analyzer that clones through `provider`.
    ///
    /// No tokenizer is attached; see [`Analyzer::with_model`].
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            tokenizer: None,
            observer: None,
            cleanup_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Use `tokenizer` for counting and truncation
    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    /// Load the tokenizer for `model`.
    ///
    /// A load failure is logged and leaves the analyzer without a
    /// tokenizer, so runs report zero tokens and never truncate.
    pub fn with_model(mut self, model: Model) -> Self {
        self.tokenizer = match create_tokenizer(model) {
            Ok(tokenizer) => Some(tokenizer),
            Err(e) => {
                warn!(%model, error = %e, "Failed to load tokenizer");
                None
            }
        };
        self
    }

    /// Report stage transitions to `observer`
    pub fn with_observer<O: AnalysisObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Pause before removing a temporary clone
    pub fn with_cleanup_delay(mut self, delay: Duration) -> Self {
        self.cleanup_delay = delay;
        self
    }

    /// Context window of the attached tokenizer, if any
    pub fn context_window(&self) -> Option<usize> {
        self.tokenizer.as_ref().map(|t| t.model_context_window())
    }

    /// Run one analysis and persist its output
    pub fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.run_with_stats(request).map(|(result, _)| result)
    }

    /// Like [`Analyzer::run`], also returning traversal counters
    pub fn run_with_stats(
        &self,
        request: &AnalysisRequest,
    ) -> Result<(AnalysisResult, ScanStatistics)> {
        self.notify(Stage::Acquire);
        let output_dir = match &request.output_dir {
            Some(dir) => dir.clone(),
            None => default_output_dir()?,
        };

        let source = Path::new(&request.source);
        let outcome = if request.is_local || source.exists() {
            crate::ensure!(source.exists(), PathNotFound, "{}", request.source);
            let name = local_name(source)?;
            info!(path = %source.display(), "Analyzing local folder");
            self.analyze_root(source, &name, &output_dir, request)
        } else {
            let name = repo_name_from_source(&request.source);
            let checkout = TempCheckout::create(self.cleanup_delay)?;
            let outcome = self
                .clone_into(request, checkout.path())
                .and_then(|()| self.analyze_root(checkout.path(), &name, &output_dir, request));

            self.notify(Stage::Cleanup);
            drop(checkout);
            outcome
        };

        let (result, stats) = outcome?;
        self.notify(Stage::Done);
        info!(
            output = %result.output_file.display(),
            tokens = result.token_count,
            chars = result.char_count,
            files = result.file_count,
            "Analysis complete"
        );

        Ok((result, stats))
    }

    fn clone_into(&self, request: &AnalysisRequest, dest: &Path) -> Result<()> {
        self.notify(Stage::Clone);
        let url = match request.token.as_deref() {
            Some(token) if !token.is_empty() => authenticated_url(&request.source, token)?,
            _ => request.source.clone(),
        };

        // The credential-bearing URL is never logged
        info!(source = %request.source, dest = %dest.display(), "Cloning repository");
        self.provider.fetch(&url, dest)?;
        Ok(())
    }

    fn analyze_root(
        &self,
        root: &Path,
        name: &str,
        output_dir: &Path,
        request: &AnalysisRequest,
    ) -> Result<(AnalysisResult, ScanStatistics)> {
        let scanner = Scanner::new(request.filter.clone())
            .directories_only(request.directories_only)
            .with_detector(request.binary_detection.detector());
        let mut stats = ScanStatistics::default();

        self.notify(Stage::BuildStructure);
        let structure = scanner.structure_with_stats(root, &mut stats)?;

        self.notify(Stage::BuildContent);
        let (content, file_positions) = scanner.concatenate_with_stats(root, &mut stats)?;

        let rendered = RenderedOutput {
            structure,
            content,
            file_positions,
        };
        let file_count = rendered.file_count();
        let mut text = rendered.document();

        // A failed truncation keeps the full text and reports zero tokens
        let mut tokenizer_failed = false;
        if request.max_tokens > 0 {
            self.notify(Stage::Truncate);
            match self.truncate(&text, request.max_tokens) {
                Ok(Some(truncated)) => text = truncated,
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, "Truncation failed, keeping full text");
                    tokenizer_failed = true;
                }
            }
        }

        self.notify(Stage::Persist);
        let session = SessionWriter::new(output_dir).write(name, &text)?;
        let token_count = if tokenizer_failed {
            0
        } else {
            self.count_tokens(&text)
        };

        Ok((
            AnalysisResult {
                repo_name: name.to_string(),
                output_file: session.output_file,
                session_folder: session.folder,
                token_count,
                char_count: text.chars().count(),
                file_count,
            },
            stats,
        ))
    }

    /// Truncated text, `None` when nothing was cut
    fn truncate(&self, text: &str, max_tokens: i64) -> Result<Option<String>> {
        let Some(tokenizer) = &self.tokenizer else {
            warn!("No tokenizer available, output left untruncated");
            return Ok(None);
        };

        Ok(truncate_to_budget(text, max_tokens, tokenizer.as_ref())?)
    }

    fn count_tokens(&self, text: &str) -> usize {
        let Some(tokenizer) = &self.tokenizer else {
            return 0;
        };

        tokenizer.count_tokens(text).unwrap_or_else(|e| {
            let error = AnalysisError::from(e);
            warn!(%error, "Token counting failed, reporting zero");
            0
        })
    }

    fn notify(&self, stage: Stage) {
        debug!(%stage, "Stage");
        if let Some(observer) = &self.observer {
            observer.on_stage(stage);
        }
    }
}

/// Folder name of a local source, resolved through its absolute path
fn local_name(source: &Path) -> Result<String> {
    let abs_path = fs::canonicalize(source)?;
    Ok(abs_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string()))
}
