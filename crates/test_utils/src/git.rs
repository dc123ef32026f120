//! Local git repositories used as clone sources.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use git2::{Oid, Repository, Signature};
use tracing::debug;

/// Creates a repository at `dir` with one commit containing `file`.
pub fn init_origin(dir: &Path, file: &str, content: &str) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
    Repository::init(dir).with_context(|| format!("initializing {:?}", dir))?;
    commit_file(dir, file, content, "Initial commit")?;
    debug!("Initialized origin repository at {:?}", dir);
    Ok(())
}

/// Writes `relative_path` in the working tree of the repository at
/// `repo_dir` and commits it on the current branch.
pub fn commit_file(
    repo_dir: &Path,
    relative_path: &str,
    content: &str,
    message: &str,
) -> Result<Oid> {
    let repo = Repository::open(repo_dir).with_context(|| format!("opening {:?}", repo_dir))?;
    let workdir = repo
        .workdir()
        .context("fixture repository must not be bare")?;
    let full_path = workdir.join(relative_path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&full_path, content)?;

    let mut index = repo.index()?;
    index.add_path(Path::new(relative_path))?;
    index.write()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    let signature = Signature::now("Fixture", "fixture@example.com")?;
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(_) => None,
    };
    let parents: Vec<_> = parent.iter().collect();

    let oid = repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )?;
    Ok(oid)
}
