//! Staged output tree
//!
//! Files are written into a hidden staging directory under the output root and
//! only moved over their targets by [`Staging::commit`]. Dropping a `Staging`
//! without committing removes everything it wrote, including any part of the
//! output root that it had to create.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info, warn};

/// Output subdirectories, relative to the output root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Talks,
    Speakers,
    Images,
}

impl OutputKind {
    pub const ALL: [OutputKind; 3] = [OutputKind::Talks, OutputKind::Speakers, OutputKind::Images];

    pub fn dir_name(self) -> &'static str {
        match self {
            OutputKind::Talks => "talks",
            OutputKind::Speakers => "speakers",
            OutputKind::Images => "images",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

pub struct Staging {
    root: PathBuf,
    /// `None` in dry-run mode and after commit
    dir: Option<TempDir>,
    /// Outermost directory of `root` that did not exist before staging
    created: Option<PathBuf>,
}

/// The outermost ancestor of `path` (or `path` itself) that does not exist yet.
fn first_missing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .last()
        .map(Path::to_path_buf)
}

impl Staging {
    /// Create the staging directory inside `root`, creating `root` if needed.
    pub fn create(root: &Path) -> Result<Self> {
        let created = first_missing_ancestor(root);
        std::fs::create_dir_all(root).map_err(|e| Error::write(root, e))?;

        let dir = tempfile::Builder::new()
            .prefix(".hallsync-")
            .tempdir_in(root)
            .map_err(|e| Error::write(root, e))?;

        for kind in OutputKind::ALL {
            let sub = dir.path().join(kind.dir_name());
            std::fs::create_dir(&sub).map_err(|e| Error::write(&sub, e))?;
        }

        debug!("Staging output in {}", dir.path().display());
        Ok(Self {
            root: root.to_path_buf(),
            dir: Some(dir),
            created,
        })
    }

    /// A staging area that records targets but writes nothing.
    pub fn dry_run(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            dir: None,
            created: None,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dir.is_none()
    }

    /// Final location of a file once committed.
    pub fn target(&self, kind: OutputKind, file_name: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(file_name)
    }

    /// Stage one file, returning where it will land on commit.
    pub async fn write(&self, kind: OutputKind, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
        let target = self.target(kind, file_name);

        match &self.dir {
            Some(dir) => {
                let staged = dir.path().join(kind.dir_name()).join(file_name);
                fs::write(&staged, contents)
                    .await
                    .map_err(|e| Error::write(&staged, e))?;
                debug!("Staged {} ({} bytes)", target.display(), contents.len());
            }
            None => info!("[dry-run] Would write {} ({} bytes)", target.display(), contents.len()),
        }

        Ok(target)
    }

    /// Move every staged file over its target. Returns the number of files moved.
    ///
    /// Existing files with other names are left alone.
    pub async fn commit(mut self) -> Result<usize> {
        let Some(dir) = self.dir.take() else {
            return Ok(0);
        };

        let mut moved = 0;
        for kind in OutputKind::ALL {
            let target_dir = self.root.join(kind.dir_name());
            fs::create_dir_all(&target_dir)
                .await
                .map_err(|e| Error::write(&target_dir, e))?;

            let staged_dir = dir.path().join(kind.dir_name());
            let mut entries = fs::read_dir(&staged_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let target = target_dir.join(entry.file_name());
                fs::rename(entry.path(), &target)
                    .await
                    .map_err(|e| Error::write(&target, e))?;
                moved += 1;
            }
        }

        dir.close()?;
        debug!("Committed {} files to {}", moved, self.root.display());
        Ok(moved)
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        if let Err(e) = dir.close() {
            warn!("Failed to remove staging directory: {}", e);
        }

        // Stops at the first directory that is not empty.
        if let Some(created) = &self.created {
            for path in self.root.ancestors() {
                if std::fs::remove_dir(path).is_err() || path == created.as_path() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staging_dirs(root: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(root)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(".hallsync-"))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_nothing_visible_before_commit() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let staging = Staging::create(temp_dir.path())?;

        let target = staging
            .write(OutputKind::Talks, "intro.mdx", b"---\n---\n")
            .await?;
        assert_eq!(target, temp_dir.path().join("talks/intro.mdx"));
        assert!(!target.exists());

        staging.commit().await?;
        assert_eq!(std::fs::read_to_string(&target)?, "---\n---\n");
        assert!(staging_dirs(temp_dir.path()).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_staging_leaves_no_trace() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        {
            let staging = Staging::create(temp_dir.path())?;
            staging
                .write(OutputKind::Speakers, "jane-doe.mdx", b"partial")
                .await?;
            assert_eq!(staging_dirs(temp_dir.path()).len(), 1);
        }

        assert!(staging_dirs(temp_dir.path()).is_empty());
        assert!(!temp_dir.path().join("speakers").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_staging_removes_created_root() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("site/public");
        {
            let staging = Staging::create(&root)?;
            staging.write(OutputKind::Talks, "intro.mdx", b"partial").await?;
            assert!(root.is_dir());
        }

        assert!(!temp_dir.path().join("site").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_keeps_created_root() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("site");
        let staging = Staging::create(&root)?;
        staging.write(OutputKind::Talks, "intro.mdx", b"done").await?;
        staging.commit().await?;

        assert_eq!(std::fs::read_to_string(root.join("talks/intro.mdx"))?, "done");
        assert!(staging_dirs(&root).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_overwrites_same_name_and_keeps_others() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let talks = temp_dir.path().join("talks");
        std::fs::create_dir_all(&talks)?;
        std::fs::write(talks.join("old.mdx"), "old")?;
        std::fs::write(talks.join("intro.mdx"), "stale")?;

        let staging = Staging::create(temp_dir.path())?;
        staging.write(OutputKind::Talks, "intro.mdx", b"fresh").await?;
        staging.write(OutputKind::Images, "jane.png", b"\x89PNG").await?;
        assert_eq!(staging.commit().await?, 2);

        assert_eq!(std::fs::read_to_string(talks.join("intro.mdx"))?, "fresh");
        assert_eq!(std::fs::read_to_string(talks.join("old.mdx"))?, "old");
        assert_eq!(std::fs::read(temp_dir.path().join("images/jane.png"))?, b"\x89PNG");
        assert!(temp_dir.path().join("speakers").is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let staging = Staging::dry_run(temp_dir.path());
        assert!(staging.is_dry_run());

        let target = staging.write(OutputKind::Talks, "a.mdx", b"a").await?;
        assert_eq!(target, temp_dir.path().join("talks/a.mdx"));
        assert_eq!(staging.commit().await?, 0);
        assert_eq!(std::fs::read_dir(temp_dir.path())?.count(), 0);
        Ok(())
    }
}
