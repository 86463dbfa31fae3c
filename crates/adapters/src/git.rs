//! Git change detection

use async_trait::async_trait;
use crosspost_domain::{ChangeDetector, ChangeError};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Lists files touched by `HEAD`, or by everything after a checkpoint
/// revision when one is given.
///
/// `HEAD` is compared with its first parent, so a merge commit reports the
/// files its branch brought in. Only a root commit falls back to
/// `diff-tree --root`.
pub struct GitChangeDetector {
    repo_dir: PathBuf,
    since: Option<String>,
}

impl GitChangeDetector {
    /// `repo_dir` must be the repository root; git reports paths relative to it
    pub fn new(repo_dir: impl AsRef<Path>) -> Self {
        Self {
            repo_dir: repo_dir.as_ref().to_path_buf(),
            since: None,
        }
    }

    /// Diff against `revision` instead of only the latest commit
    pub fn since(mut self, revision: impl Into<String>) -> Self {
        self.since = Some(revision.into());
        self
    }

    async fn args(&self) -> Result<Vec<&str>, ChangeError> {
        if let Some(revision) = &self.since {
            return Ok(vec!["diff", "--name-only", revision.as_str(), "HEAD"]);
        }

        let has_parent = self
            .git(&["rev-parse", "--verify", "--quiet", "HEAD^1"])
            .await?
            .status
            .success();

        if has_parent {
            Ok(vec!["diff", "--name-only", "HEAD^1", "HEAD"])
        } else {
            Ok(vec![
                "diff-tree",
                "--root",
                "--no-commit-id",
                "--name-only",
                "-r",
                "HEAD",
            ])
        }
    }

    async fn git(&self, args: &[&str]) -> Result<Output, ChangeError> {
        Command::new("git")
            .arg("-C")
            .arg(&self.repo_dir)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ChangeError::Command {
                command: format!("git {}", args.join(" ")),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ChangeDetector for GitChangeDetector {
    async fn changed_paths(&self) -> Result<Vec<String>, ChangeError> {
        let args = self.args().await?;
        let command_line = format!("git {}", args.join(" "));

        let output = self.git(&args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChangeError::Command {
                command: command_line,
                message: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| ChangeError::InvalidOutput(e.to_string()))?;

        let paths: Vec<String> = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        tracing::debug!(command = %command_line, count = paths.len(), "Detected changed paths");
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) -> bool {
        StdCommand::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn commit_all(dir: &Path, message: &str) {
        assert!(git(dir, &["add", "-A"]));
        assert!(git(
            dir,
            &[
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.org",
                "commit",
                "-q",
                "-m",
                message,
            ]
        ));
    }

    fn write(dir: &Path, path: &str, content: &str) {
        let full = dir.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    #[tokio::test]
    async fn test_changed_paths_in_head_and_since() {
        let dir = TempDir::new().unwrap();
        if !git(dir.path(), &["init", "-q"]) {
            // git is not available in this environment
            return;
        }

        write(dir.path(), "_articles/first.md", "one");
        commit_all(dir.path(), "first");
        write(dir.path(), "_articles/second.md", "two");
        write(dir.path(), "README.md", "readme");
        commit_all(dir.path(), "second");
        write(dir.path(), "_articles/third.md", "three");
        commit_all(dir.path(), "third");

        let mut head = GitChangeDetector::new(dir.path())
            .changed_paths()
            .await
            .unwrap();
        head.sort();
        assert_eq!(head, vec!["_articles/third.md"]);

        let mut since = GitChangeDetector::new(dir.path())
            .since("HEAD~2")
            .changed_paths()
            .await
            .unwrap();
        since.sort();
        assert_eq!(
            since,
            vec!["README.md", "_articles/second.md", "_articles/third.md"]
        );
    }

    #[tokio::test]
    async fn test_root_commit_lists_its_files() {
        let dir = TempDir::new().unwrap();
        if !git(dir.path(), &["init", "-q"]) {
            return;
        }

        write(dir.path(), "_articles/first.md", "one");
        commit_all(dir.path(), "first");

        let paths = GitChangeDetector::new(dir.path())
            .changed_paths()
            .await
            .unwrap();
        assert_eq!(paths, vec!["_articles/first.md"]);
    }

    #[tokio::test]
    async fn test_merge_commit_lists_files_from_merged_branch() {
        let dir = TempDir::new().unwrap();
        if !git(dir.path(), &["init", "-q"]) {
            return;
        }

        write(dir.path(), "README.md", "readme");
        commit_all(dir.path(), "initial");

        assert!(git(dir.path(), &["checkout", "-q", "-b", "feature"]));
        write(dir.path(), "_articles/new-post.md", "post");
        commit_all(dir.path(), "add post");

        assert!(git(dir.path(), &["checkout", "-q", "-"]));
        write(dir.path(), "notes.txt", "unrelated");
        commit_all(dir.path(), "unrelated");

        assert!(git(
            dir.path(),
            &[
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.org",
                "merge",
                "-q",
                "--no-ff",
                "-m",
                "Merge feature",
                "feature",
            ]
        ));

        let paths = GitChangeDetector::new(dir.path())
            .changed_paths()
            .await
            .unwrap();
        assert_eq!(paths, vec!["_articles/new-post.md"]);
    }

    #[tokio::test]
    async fn test_not_a_repository() {
        let dir = TempDir::new().unwrap();
        let result = GitChangeDetector::new(dir.path()).changed_paths().await;
        assert!(matches!(result, Err(ChangeError::Command { .. })));
    }
}
