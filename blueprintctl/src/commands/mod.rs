pub mod plan;
pub mod tenant;

use crate::output::{self, OutputFormat};
use anyhow::Result;
use blueprintctl::git::{self, Author, PublishOutcome};
use std::path::PathBuf;

/// Settings resolved from flags and the config file, shared by all commands
pub struct Context {
    pub repo_root: PathBuf,
    pub format: OutputFormat,
    pub auto_push: bool,
    pub remote: String,
    pub author: Author,
}

impl Context {
    /// Commit and push the repository when auto-push is on. A failed push is
    /// reported with the commands to finish it by hand.
    pub fn publish(&self, message: &str) -> Result<()> {
        if !self.auto_push {
            return Ok(());
        }

        match git::publish(&self.repo_root, message, &self.author, &self.remote)? {
            PublishOutcome::NothingToCommit => output::print_info("No changes to commit"),
            PublishOutcome::Pushed { commit } => {
                output::print_success(&format!(
                    "Committed {} and pushed to {}",
                    short_id(&commit),
                    self.remote
                ));
            }
            PublishOutcome::PushFailed { commit, reason } => {
                output::print_warning(&format!(
                    "Committed {} but push failed: {}",
                    short_id(&commit),
                    reason
                ));
                output::print_warning("Check your SSH key or credentials, then push manually:");
                eprintln!("   cd {} && git push {}", self.repo_root.display(), self.remote);
            }
        }
        Ok(())
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
