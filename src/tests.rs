/*!
 * End-to-end tests for scanning and analysis runs
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::{tempdir, TempDir};

use crate::analyzer::{AnalysisRequest, Analyzer};
use crate::error::AnalysisError;
use crate::filter::{ContentSniffer, FilterConfig};
use crate::git::{GitError, GitResult, SourceProvider};
use crate::scanner::Scanner;
use crate::tokenizer::{Tokenizer, TokenizerError, TokenizerResult};

// Helper function to create a small project tree
fn setup_project() -> io::Result<TempDir> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();

    fs::create_dir_all(root.join("src"))?;
    fs::create_dir_all(root.join(".git"))?;
    fs::write(root.join("README.md"), "hello")?;
    fs::write(root.join("LICENSE"), "MIT License")?;
    fs::write(root.join("src/main.py"), "print(1)")?;
    fs::write(root.join(".git/config"), "[core]\n\tbare = false\n")?;
    fs::write(root.join(".gitignore"), "target/\n")?;

    Ok(temp_dir)
}

fn request_for(source: &Path, output_dir: &Path) -> AnalysisRequest {
    let mut request = AnalysisRequest::new(source.to_string_lossy());
    request.output_dir = Some(output_dir.to_path_buf());
    request
}

/// One token per character
struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>> {
        Ok(text.chars().map(u32::from).collect())
    }

    fn decode(&self, tokens: &[u32]) -> TokenizerResult<String> {
        tokens
            .iter()
            .map(|&t| {
                char::from_u32(t)
                    .ok_or_else(|| TokenizerError::DecodeError(format!("bad token {t}")))
            })
            .collect()
    }

    fn model_context_window(&self) -> usize {
        4096
    }
}

/// Fails on every call
struct OfflineTokenizer;

impl Tokenizer for OfflineTokenizer {
    fn encode(&self, _text: &str) -> TokenizerResult<Vec<u32>> {
        Err(TokenizerError::TokenizerError("offline".to_string()))
    }

    fn decode(&self, _tokens: &[u32]) -> TokenizerResult<String> {
        Err(TokenizerError::TokenizerError("offline".to_string()))
    }

    fn model_context_window(&self) -> usize {
        0
    }
}

/// Source provider writing a fixed tree, or failing, and remembering where
#[derive(Clone, Default)]
struct FakeRemote {
    fail: bool,
    dests: Arc<Mutex<Vec<PathBuf>>>,
}

impl SourceProvider for FakeRemote {
    fn fetch(&self, _url: &str, dest: &Path) -> GitResult<()> {
        self.dests.lock().unwrap().push(dest.to_path_buf());
        if self.fail {
            return Err(GitError::InvalidUrl("host unreachable".to_string()));
        }

        fs::create_dir_all(dest.join(".git/objects"))?;
        fs::create_dir_all(dest.join("pkg"))?;
        fs::write(dest.join(".git/HEAD"), "ref: refs/heads/main\n")?;
        fs::write(dest.join("pkg/mod.go"), "package pkg\n")?;
        Ok(())
    }
}

/// Provider for tests that only analyze local folders
struct Offline;

impl SourceProvider for Offline {
    fn fetch(&self, url: &str, _dest: &Path) -> GitResult<()> {
        Err(GitError::InvalidUrl(url.to_string()))
    }
}

#[test]
fn test_default_run_example() {
    let project = setup_project().unwrap();
    let out = tempdir().unwrap();

    let result = Analyzer::new(Offline)
        .run(&request_for(project.path(), out.path()))
        .unwrap();
    let text = fs::read_to_string(&result.output_file).unwrap();

    let (structure, content) = text
        .strip_prefix("Folder structure:\n")
        .and_then(|rest| rest.split_once("\nConcatenated content:\n"))
        .unwrap();

    assert!(structure.contains("├── src/"));
    assert!(structure.contains("main.py"));
    assert!(!structure.contains(".git"));
    assert!(!structure.contains("LICENSE"));

    assert!(content.contains("print(1)"));
    assert!(content.contains("hello"));
    assert!(!content.contains(".git"));
    assert!(!content.contains("bare = false"));
    assert!(!content.contains("MIT License"));

    assert_eq!(result.file_count, 2);
    assert_eq!(result.char_count, text.chars().count());
}

#[test]
fn test_session_layout() {
    let project = setup_project().unwrap();
    let out = tempdir().unwrap();

    let result = Analyzer::new(Offline)
        .run(&request_for(project.path(), out.path()))
        .unwrap();

    let folder_name = result.session_folder.file_name().unwrap().to_string_lossy();
    assert!(folder_name.starts_with(&format!("{}_", result.repo_name)));
    // name + _YYYY_MM_DD_HHMMSS
    assert_eq!(folder_name.len(), result.repo_name.len() + 18);
    assert_eq!(result.session_folder.parent().unwrap(), out.path());
    assert_eq!(
        result.output_file,
        result.session_folder.join(format!("{}.txt", folder_name))
    );
}

#[test]
fn test_concatenation_is_deterministic() {
    let project = setup_project().unwrap();
    for name in ["zeta.txt", "alpha.txt", "Mid.txt"] {
        fs::write(project.path().join("src").join(name), name).unwrap();
    }
    fs::create_dir_all(project.path().join("src/b/c")).unwrap();
    fs::write(project.path().join("src/b/c/deep.txt"), "deep").unwrap();

    let scanner = Scanner::new(FilterConfig::default());
    let first = scanner.render(project.path()).unwrap().0;
    let second = scanner.render(project.path()).unwrap().0;

    assert_eq!(first.content, second.content);
    assert_eq!(first.structure, second.structure);
    assert_eq!(first.file_positions, second.file_positions);
}

#[test]
fn test_license_toggle() {
    let project = setup_project().unwrap();

    let default_content = Scanner::new(FilterConfig::default())
        .concatenate(project.path())
        .unwrap()
        .0;
    assert!(!default_content.contains("MIT License"));

    let filter = FilterConfig {
        exclude_license: false,
        ..FilterConfig::default()
    };
    let (content, positions) = Scanner::new(filter).concatenate(project.path()).unwrap();
    assert!(content.contains("--LICENSE--"));
    assert!(positions.contains_key("LICENSE"));
}

#[test]
fn test_readme_toggle() {
    let project = setup_project().unwrap();

    let (_, positions) = Scanner::new(FilterConfig::default())
        .concatenate(project.path())
        .unwrap();
    assert!(positions.contains_key("README.md"));

    let filter = FilterConfig {
        exclude_readme: true,
        ..FilterConfig::default()
    };
    let rendered = Scanner::new(filter).render(project.path()).unwrap().0;
    assert!(!rendered.content.contains("hello"));
    assert!(!rendered.structure.contains("README.md"));
}

#[test]
fn test_include_suffix_matching() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "alpha").unwrap();
    fs::write(dir.path().join("b.js"), "beta").unwrap();
    fs::write(dir.path().join("c.spy"), "gamma").unwrap();
    fs::write(dir.path().join("happy"), "delta").unwrap();

    let filter = FilterConfig {
        include_extensions: vec![".py".to_string()],
        ..FilterConfig::default()
    };
    let (content, _) = Scanner::new(filter).concatenate(dir.path()).unwrap();

    assert!(content.contains("--a.py--"));
    assert!(!content.contains("c.spy"));
    assert!(!content.contains("b.js"));
    assert!(!content.contains("happy"));

    let dotless = FilterConfig {
        include_extensions: vec!["py".to_string()],
        ..FilterConfig::default()
    };
    let (content, positions) = Scanner::new(dotless).concatenate(dir.path()).unwrap();
    assert!(positions.contains_key("a.py"));
    assert!(positions.contains_key("happy"));
    assert!(!content.contains("c.spy"));
}

#[test]
fn test_binary_listed_but_not_concatenated() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "text").unwrap();
    fs::write(dir.path().join("image.png"), [0x89, b'P', b'N', b'G', 0xff, 0xfe, 0x00]).unwrap();

    let (rendered, stats) = Scanner::new(FilterConfig::default())
        .render(dir.path())
        .unwrap();

    assert!(rendered.structure.contains("├── image.png"));
    assert!(!rendered.content.contains("image.png"));
    assert!(!rendered.file_positions.contains_key("image.png"));
    assert!(rendered.content.contains("--notes.txt--"));
    assert_eq!(stats.binary_skipped, 1);
}

#[test]
fn test_unreadable_file_is_skipped() {
    let dir = tempdir().unwrap();
    // Text for the sniffed prefix, invalid UTF-8 after it
    let mut tail_broken = vec![b'a'; 9000];
    tail_broken.extend_from_slice(&[0xff, 0xfe]);
    fs::write(dir.path().join("a_large.txt"), tail_broken).unwrap();
    fs::write(dir.path().join("b.txt"), "still here").unwrap();

    let (rendered, stats) = Scanner::new(FilterConfig::default())
        .with_detector(Box::new(ContentSniffer))
        .render(dir.path())
        .unwrap();

    assert_eq!(stats.read_errors, 1);
    assert_eq!(stats.binary_skipped, 0);
    assert!(rendered.structure.contains("├── a_large.txt"));
    assert!(!rendered.file_positions.contains_key("a_large.txt"));
    assert!(rendered.content.contains("--b.txt--\n\nstill here"));
}

#[cfg(unix)]
#[test]
fn test_symlinks() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("real")).unwrap();
    fs::write(dir.path().join("real/inner.txt"), "inside").unwrap();
    fs::write(dir.path().join("target.txt"), "pointed at").unwrap();
    symlink(dir.path().join("real"), dir.path().join("linked_dir")).unwrap();
    symlink(dir.path().join("target.txt"), dir.path().join("alias.txt")).unwrap();

    let (rendered, stats) = Scanner::new(FilterConfig::default())
        .render(dir.path())
        .unwrap();

    // Directory links are neither listed nor descended
    assert!(rendered.structure.contains("├── real/"));
    assert!(!rendered.structure.contains("linked_dir"));
    assert!(!rendered.content.contains("linked_dir"));
    assert_eq!(rendered.content.matches("inside").count(), 1);
    assert_eq!(stats.directories, 2);

    // File links read through to their target
    assert!(rendered.structure.contains("├── alias.txt"));
    let alias = &rendered.content[rendered.file_positions["alias.txt"]..];
    assert!(alias.starts_with("\n--alias.txt--\n\npointed at"));
}

#[test]
fn test_file_positions_point_at_headers() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sub/dir")).unwrap();
    fs::write(dir.path().join("main.py"), "print('root')").unwrap();
    fs::write(dir.path().join("sub/helper.py"), "x = 1").unwrap();
    fs::write(dir.path().join("sub/dir/file.py"), "def f():\n    return 'é'\n").unwrap();

    let (content, positions) = Scanner::new(FilterConfig::default())
        .concatenate(dir.path())
        .unwrap();

    assert_eq!(positions.len(), 3);
    assert!(content[positions["main.py"]..].starts_with("\n--main.py--\n"));
    assert!(content[positions["sub/helper.py"]..].starts_with("\n--helper.py--\n"));
    assert!(content[positions["sub/dir/file.py"]..].starts_with("\n--file.py--\n"));
    assert!(content.starts_with("\n---/---\n"));
    assert!(content.contains("\n---sub/dir/---\n"));
}

#[test]
fn test_root_path_with_git_marker_is_not_pruned() {
    let parent = tempdir().unwrap();
    let root = parent.path().join("someone.github.io");
    fs::create_dir_all(root.join("posts")).unwrap();
    fs::write(root.join("posts/first.md"), "# First").unwrap();

    let rendered = Scanner::new(FilterConfig::default())
        .render(&root)
        .unwrap()
        .0;
    assert!(rendered.structure.starts_with("├── someone.github.io/"));
    assert!(rendered.content.contains("# First"));
}

#[test]
fn test_include_git_keeps_metadata() {
    let project = setup_project().unwrap();
    let filter = FilterConfig {
        ignore_git: false,
        ..FilterConfig::default()
    };

    let rendered = Scanner::new(filter).render(project.path()).unwrap().0;
    assert!(rendered.structure.contains("├── .git/"));
    assert!(rendered.content.contains("bare = false"));
    assert!(rendered.file_positions.contains_key(".git/config"));
    assert!(rendered.file_positions.contains_key(".gitignore"));
}

#[test]
fn test_truncation_to_exact_budget() {
    let project = setup_project().unwrap();
    let out = tempdir().unwrap();
    let full = Scanner::new(FilterConfig::default())
        .render(project.path())
        .unwrap()
        .0
        .document();

    let mut request = request_for(project.path(), out.path());
    request.max_tokens = 25;
    let result = Analyzer::new(Offline)
        .with_tokenizer(Box::new(CharTokenizer))
        .run(&request)
        .unwrap();

    let written = fs::read_to_string(&result.output_file).unwrap();
    let expected = CharTokenizer
        .decode(&CharTokenizer.encode(&full).unwrap()[..25])
        .unwrap();
    assert_eq!(written, expected);
    assert_eq!(result.token_count, 25);
    assert_eq!(result.char_count, 25);
}

#[test]
fn test_zero_budget_leaves_text_unchanged() {
    let project = setup_project().unwrap();
    let out = tempdir().unwrap();
    let full = Scanner::new(FilterConfig::default())
        .render(project.path())
        .unwrap()
        .0
        .document();

    let result = Analyzer::new(Offline)
        .with_tokenizer(Box::new(CharTokenizer))
        .run(&request_for(project.path(), out.path()))
        .unwrap();

    let written = fs::read_to_string(&result.output_file).unwrap();
    assert_eq!(written, full);
    assert_eq!(result.token_count, full.chars().count());
}

#[test]
fn test_tokenizer_failure_degrades() {
    let project = setup_project().unwrap();
    let out = tempdir().unwrap();

    let mut request = request_for(project.path(), out.path());
    request.max_tokens = 5;
    let result = Analyzer::new(Offline)
        .with_tokenizer(Box::new(OfflineTokenizer))
        .run(&request)
        .unwrap();

    let written = fs::read_to_string(&result.output_file).unwrap();
    assert!(written.contains("print(1)"));
    assert_eq!(result.token_count, 0);
}

#[test]
fn test_remote_run_uses_and_removes_checkout() {
    let out = tempdir().unwrap();
    let remote = FakeRemote::default();

    let result = Analyzer::new(remote.clone())
        .with_cleanup_delay(Duration::ZERO)
        .run(&request_for(
            Path::new("https://github.com/acme/tools.git"),
            out.path(),
        ))
        .unwrap();

    assert_eq!(result.repo_name, "tools");
    let text = fs::read_to_string(&result.output_file).unwrap();
    assert!(text.contains("package pkg"));
    assert!(!text.contains("refs/heads/main"));

    let dests = remote.dests.lock().unwrap();
    assert_eq!(dests.len(), 1);
    assert!(!dests[0].exists());
}

#[test]
fn test_clone_failure_still_cleans_up() {
    let out = tempdir().unwrap();
    let remote = FakeRemote {
        fail: true,
        ..FakeRemote::default()
    };

    let err = Analyzer::new(remote.clone())
        .with_cleanup_delay(Duration::ZERO)
        .run(&request_for(
            Path::new("https://gitlab.com/acme/missing"),
            out.path(),
        ))
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Acquisition(_)));
    let dests = remote.dests.lock().unwrap();
    assert_eq!(dests.len(), 1);
    assert!(!dests[0].exists());
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_persist_failure_is_fatal() {
    let project = setup_project().unwrap();
    let blocker = tempdir().unwrap();
    let file = blocker.path().join("not-a-dir");
    fs::write(&file, "x").unwrap();

    let err = Analyzer::new(Offline)
        .run(&request_for(project.path(), &file))
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Persist { .. }));
}
