//! Local git history extraction via git2.
//!
//! Walks a repository's commit history and produces the in-memory
//! [`Commit`] collection the analysis engine consumes. Reads messages and
//! author identity only; no diffs, no network, no persistence.

use std::path::Path;

use commitlex_core::{Commit, CommitlexError};
use git2::{Repository, Sort};
use tracing::info;

/// Options for history reading.
///
/// # Examples
///
/// ```
/// use commitlex_ingest::history::HistoryOptions;
///
/// let opts = HistoryOptions::default();
/// assert_eq!(opts.max_commits, 500);
/// assert!(opts.since_days.is_none());
/// assert!(!opts.include_merges);
/// ```
pub struct HistoryOptions {
    /// Stop after this many commits (default: 500).
    pub max_commits: usize,
    /// Only include commits from the last N days (default: no cutoff).
    pub since_days: Option<u64>,
    /// Keep merge commits in the corpus (default: false; merge messages
    /// are mostly boilerplate and skew the frequency tables).
    pub include_merges: bool,
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_commits: 500,
            since_days: None,
            include_merges: false,
            branch: None,
        }
    }
}

/// Read commit history from a local git repository.
///
/// Returns commits in reverse chronological order (newest first) with
/// their full multi-line messages. The repository field of each commit is
/// the work-tree directory name.
///
/// # Errors
///
/// Returns [`CommitlexError::Git`] if the repository cannot be discovered
/// or walked.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use commitlex_ingest::history::{read_history, HistoryOptions};
///
/// let commits = read_history(Path::new("."), &HistoryOptions::default()).unwrap();
/// for c in &commits {
///     println!("{}: {}", &c.hash[..7.min(c.hash.len())], c.message.lines().next().unwrap_or(""));
/// }
/// ```
pub fn read_history(
    repo_path: &Path,
    options: &HistoryOptions,
) -> Result<Vec<Commit>, CommitlexError> {
    let repo = Repository::discover(repo_path)
        .map_err(|e| CommitlexError::Git(format!("failed to open repository: {e}")))?;

    let repository = repo
        .workdir()
        .unwrap_or(repo_path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| repo_path.to_string_lossy().to_string());

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| CommitlexError::Git(format!("failed to create revwalk: {e}")))?;

    revwalk
        .set_sorting(Sort::TIME)
        .map_err(|e| CommitlexError::Git(format!("failed to set sort order: {e}")))?;

    if let Some(ref branch) = options.branch {
        let reference = repo
            .resolve_reference_from_short_name(branch)
            .map_err(|e| CommitlexError::Git(format!("failed to resolve branch '{branch}': {e}")))?;
        let oid = reference
            .target()
            .ok_or_else(|| CommitlexError::Git("branch has no target".into()))?;
        revwalk
            .push(oid)
            .map_err(|e| CommitlexError::Git(format!("failed to push oid: {e}")))?;
    } else {
        revwalk
            .push_head()
            .map_err(|e| CommitlexError::Git(format!("failed to push HEAD: {e}")))?;
    }

    let cutoff = options.since_days.map(compute_cutoff);
    let mut commits = Vec::new();

    for oid_result in revwalk {
        if commits.len() >= options.max_commits {
            break;
        }

        let oid = oid_result.map_err(|e| CommitlexError::Git(format!("revwalk error: {e}")))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| CommitlexError::Git(format!("failed to find commit: {e}")))?;

        let timestamp = commit.time().seconds();
        if let Some(cutoff) = cutoff {
            if timestamp < cutoff {
                break;
            }
        }

        if !options.include_merges && commit.parent_count() > 1 {
            continue;
        }

        let author = commit.author();
        commits.push(Commit {
            hash: oid.to_string(),
            author: author.name().unwrap_or("unknown").to_string(),
            email: author.email().unwrap_or("unknown").to_string(),
            message: commit.message().unwrap_or("").trim_end().to_string(),
            timestamp,
            repository: repository.clone(),
        });
    }

    info!(
        repository = %repository,
        commits = commits.len(),
        "read commit history"
    );
    Ok(commits)
}

fn compute_cutoff(since_days: u64) -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    now - (since_days as i64 * 86400)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Oid, Signature, Time};
    use std::path::PathBuf;

    struct TestRepo {
        dir: tempfile::TempDir,
        repo: Repository,
    }

    impl TestRepo {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let repo = Repository::init(dir.path()).unwrap();
            Self { dir, repo }
        }

        fn path(&self) -> PathBuf {
            self.dir.path().to_path_buf()
        }

        fn commit(&self, author: &str, email: &str, message: &str, timestamp: i64) -> Oid {
            let tree_id = self.repo.treebuilder(None).unwrap().write().unwrap();
            let tree = self.repo.find_tree(tree_id).unwrap();
            let sig = Signature::new(author, email, &Time::new(timestamp, 0)).unwrap();
            let parents: Vec<git2::Commit> = match self.repo.head() {
                Ok(head) => vec![head.peel_to_commit().unwrap()],
                Err(_) => vec![],
            };
            let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
                .unwrap()
        }

        fn merge_commit(&self, message: &str, timestamp: i64) -> Oid {
            let tree_id = self.repo.treebuilder(None).unwrap().write().unwrap();
            let tree = self.repo.find_tree(tree_id).unwrap();
            let sig = Signature::new("merger", "merger@example.com", &Time::new(timestamp, 0))
                .unwrap();
            let head = self.repo.head().unwrap().peel_to_commit().unwrap();
            // Second parent: an orphan root commit that HEAD does not move to.
            let orphan = self
                .repo
                .commit(None, &sig, &sig, "orphan side branch", &tree, &[])
                .unwrap();
            let orphan = self.repo.find_commit(orphan).unwrap();
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&head, &orphan])
                .unwrap()
        }
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    #[test]
    fn reads_commits_newest_first_with_full_messages() {
        let repo = TestRepo::new();
        let base = now();
        repo.commit("alice", "alice@example.com", "fix parser bug\n\nLong body here.\n", base - 100);
        repo.commit("bob", "bob@example.com", "add tests", base - 50);

        let commits = read_history(&repo.path(), &HistoryOptions::default()).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].author, "bob");
        assert_eq!(commits[0].message, "add tests");
        assert_eq!(commits[1].author, "alice");
        assert_eq!(commits[1].message, "fix parser bug\n\nLong body here.");
        assert_eq!(commits[1].email, "alice@example.com");
        assert!(commits[1].hash.len() == 40);
    }

    #[test]
    fn repository_field_is_directory_name() {
        let repo = TestRepo::new();
        repo.commit("alice", "a@x.com", "init", now());
        let commits = read_history(&repo.path(), &HistoryOptions::default()).unwrap();
        let expected = repo.path().file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(commits[0].repository, expected);
    }

    #[test]
    fn max_commits_caps_the_walk() {
        let repo = TestRepo::new();
        let base = now();
        for i in 0..5 {
            repo.commit("alice", "a@x.com", &format!("commit {i}"), base - 100 + i);
        }
        let options = HistoryOptions {
            max_commits: 3,
            ..HistoryOptions::default()
        };
        let commits = read_history(&repo.path(), &options).unwrap();
        assert_eq!(commits.len(), 3);
    }

    #[test]
    fn merge_commits_are_skipped_unless_requested() {
        let repo = TestRepo::new();
        let base = now();
        repo.commit("alice", "a@x.com", "real work", base - 100);
        repo.merge_commit("Merge branch 'feature'", base - 50);

        let commits = read_history(&repo.path(), &HistoryOptions::default()).unwrap();
        assert!(commits.iter().all(|c| !c.message.starts_with("Merge")));

        let options = HistoryOptions {
            include_merges: true,
            ..HistoryOptions::default()
        };
        let commits = read_history(&repo.path(), &options).unwrap();
        assert!(commits.iter().any(|c| c.message.starts_with("Merge")));
    }

    #[test]
    fn since_days_cuts_off_old_commits() {
        let repo = TestRepo::new();
        let base = now();
        repo.commit("alice", "a@x.com", "ancient work", base - 10 * 86400);
        repo.commit("alice", "a@x.com", "recent work", base - 60);

        let options = HistoryOptions {
            since_days: Some(5),
            ..HistoryOptions::default()
        };
        let commits = read_history(&repo.path(), &options).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message, "recent work");
    }

    #[test]
    fn walk_is_time_ordered() {
        // The since_days cutoff breaks on the first too-old commit, so the
        // walk must hand out timestamps in non-increasing order.
        let repo = TestRepo::new();
        let base = now();
        for i in 0..4 {
            repo.commit("alice", "a@x.com", &format!("commit {i}"), base - 400 + i * 100);
        }
        let commits = read_history(&repo.path(), &HistoryOptions::default()).unwrap();
        assert_eq!(commits.len(), 4);
        for pair in commits.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[test]
    fn missing_repository_is_a_git_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_history(dir.path(), &HistoryOptions::default()).unwrap_err();
        assert!(matches!(err, CommitlexError::Git(_)));
    }
}
