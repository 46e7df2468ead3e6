//! A loaded disc: which game it is and the tree built from its manifest

use std::path::{Path, PathBuf};

use bon::Builder;
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::identify::{identify, GameProfile};
use crate::manifest::Manifest;
use crate::tree::FileTree;

/// Where a session reads from
#[derive(Debug, Clone, Builder)]
pub struct SessionOptions {
    /// Extracted disc contents
    #[builder(into)]
    pub source_dir: PathBuf,

    /// Directory holding one manifest per supported release
    #[builder(into)]
    pub manifest_dir: PathBuf,

    /// Allow saving over `source_dir`
    #[builder(default)]
    pub overwrite: bool,
}

#[derive(Debug)]
pub struct Session {
    profile: &'static GameProfile,
    source_dir: PathBuf,
    overwrite: bool,
    tree: FileTree,
}

impl Session {
    /// Identify the disc in `options.source_dir` and build its tree.
    ///
    /// Returns `Ok(None)` when the directory is not a known release.
    #[instrument(skip(options), err, fields(source = %options.source_dir.display()))]
    pub fn load(options: &SessionOptions) -> Result<Option<Session>> {
        let Some(profile) = identify(&options.source_dir) else {
            return Ok(None);
        };

        let manifest = Manifest::read(options.manifest_dir.join(profile.manifest))?;
        let mut tree = FileTree::new();
        manifest.apply(&mut tree, &options.source_dir)?;

        if !profile.complete {
            warn!(game = %profile.game, "support for this release is incomplete");
        }
        info!(game = %profile.game, nodes = tree.len(), "loaded");

        Ok(Some(Session {
            profile,
            source_dir: options.source_dir.clone(),
            overwrite: options.overwrite,
            tree,
        }))
    }

    pub fn profile(&self) -> &'static GameProfile {
        self.profile
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FileTree {
        &mut self.tree
    }

    /// Write the tree to `out`.
    ///
    /// Writing over the source directory is refused unless the session was
    /// loaded with `overwrite` set.
    pub fn save_to(&self, out: impl AsRef<Path>) -> Result<()> {
        let out = out.as_ref();
        if !self.overwrite && same_dir(out, &self.source_dir) {
            return Err(Error::WouldOverwriteSource(out.to_path_buf()));
        }
        self.tree.write_to(out)
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
