//! Git operations for publishing tenant changes
//!
//! The CLI only ever stages everything, commits and pushes the current branch.
//! A failed push is not fatal: the commit is already in the local repository.

use blueprint_common::{Error, Result};
use git2::{
    Commit, Cred, CredentialType, ErrorCode, IndexAddOption, PushOptions, RemoteCallbacks,
    Repository, Signature,
};
use std::path::Path;
use tracing::{debug, info, warn};

/// Give up after this many credential attempts instead of looping on a bad key
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Commit author and committer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// New commit id
    Committed(String),
    /// Working tree matches HEAD
    NothingToCommit,
}

/// Result of committing and pushing a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    NothingToCommit,
    Pushed { commit: String },
    /// Committed locally; the push has to be retried by hand
    PushFailed { commit: String, reason: String },
}

fn git_err(e: git2::Error) -> Error {
    Error::Git(e.message().to_string())
}

fn push_err(e: git2::Error) -> Error {
    Error::Push(e.message().to_string())
}

/// Stage every change under the repository (including deletions) and commit.
pub fn commit_all(repo_root: &Path, message: &str, author: &Author) -> Result<CommitOutcome> {
    let repo = Repository::discover(repo_root).map_err(git_err)?;

    let mut index = repo.index().map_err(git_err)?;
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .map_err(git_err)?;
    index.update_all(["*"].iter(), None).map_err(git_err)?;
    index.write().map_err(git_err)?;
    let tree_id = index.write_tree().map_err(git_err)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(git_err)?),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
        Err(e) => return Err(git_err(e)),
    };

    let unchanged = match &parent {
        Some(commit) => commit.tree_id() == tree_id,
        None => index.is_empty(),
    };
    if unchanged {
        debug!("working tree clean, skipping commit");
        return Ok(CommitOutcome::NothingToCommit);
    }

    let tree = repo.find_tree(tree_id).map_err(git_err)?;
    let signature = Signature::now(&author.name, &author.email).map_err(git_err)?;
    let parents: Vec<&Commit> = parent.iter().collect();
    let oid = repo
        .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .map_err(git_err)?;

    info!(commit = %oid, "committed tenant changes");
    Ok(CommitOutcome::Committed(oid.to_string()))
}

/// Push the current branch to `remote_name`. Network and authentication
/// failures come back as `Error::Push`.
pub fn push(repo_root: &Path, remote_name: &str) -> Result<()> {
    let repo = Repository::discover(repo_root).map_err(git_err)?;

    let head = repo.head().map_err(git_err)?;
    let branch = match head.shorthand() {
        Some(branch) if head.is_branch() => branch.to_string(),
        _ => return Err(Error::Git("HEAD is not on a branch".to_string())),
    };

    let mut remote = repo.find_remote(remote_name).map_err(push_err)?;
    let config = repo.config().map_err(git_err)?;
    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");

    let mut rejected: Option<String> = None;
    {
        let mut attempts = 0;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }

            let username = username_from_url.unwrap_or("git");
            if allowed_types.contains(CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(username);
            }
            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                return Cred::credential_helper(&config, url, username_from_url);
            }
            Cred::default()
        });
        callbacks.push_update_reference(|refname, status| {
            if let Some(message) = status {
                rejected = Some(format!("{refname}: {message}"));
            }
            Ok(())
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);
        remote
            .push(&[refspec.as_str()], Some(&mut options))
            .map_err(push_err)?;
    }

    if let Some(reason) = rejected {
        return Err(Error::Push(format!("remote rejected {reason}")));
    }

    info!(remote = remote_name, branch = %branch, "pushed tenant changes");
    Ok(())
}

/// Commit every change and push it to `remote_name`. Push failures come back
/// as `PublishOutcome::PushFailed`; any other git failure is an error.
pub fn publish(
    repo_root: &Path,
    message: &str,
    author: &Author,
    remote_name: &str,
) -> Result<PublishOutcome> {
    let commit = match commit_all(repo_root, message, author)? {
        CommitOutcome::NothingToCommit => return Ok(PublishOutcome::NothingToCommit),
        CommitOutcome::Committed(id) => id,
    };

    match push(repo_root, remote_name) {
        Ok(()) => Ok(PublishOutcome::Pushed { commit }),
        Err(Error::Push(reason)) => {
            warn!(remote = remote_name, commit = %commit, reason = %reason, "push failed");
            Ok(PublishOutcome::PushFailed { commit, reason })
        }
        Err(e) => Err(e),
    }
}
