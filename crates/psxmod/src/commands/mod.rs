pub mod extract;
pub mod identify;
pub mod rebuild;
pub mod tree;

use std::path::PathBuf;

use clap::Args;
use miette::{miette, Result};
use psx_tree::{Session, SessionOptions};

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Name the release in a disc directory
    Identify(identify::IdentifyArgs),
    /// Print the container tree of a disc
    Tree(tree::TreeArgs),
    /// Write a disc directory back out from its tree
    Rebuild(rebuild::RebuildArgs),
    /// Write every member of one container into a directory
    Extract(extract::ExtractArgs),
}

impl Commands {
    pub fn handle(&self) -> Result<()> {
        match self {
            Commands::Identify(identify) => identify.handle(),
            Commands::Tree(tree) => tree.handle(),
            Commands::Rebuild(rebuild) => rebuild.handle(),
            Commands::Extract(extract) => extract.handle(),
        }
    }
}

/// A disc directory and the manifests that describe it
#[derive(Args)]
pub struct DiscArgs {
    /// Extracted disc contents
    #[arg(short, long, value_name = "DIR")]
    source: PathBuf,

    /// Directory holding the per-release manifests
    #[arg(short, long, value_name = "DIR", env = "PSXMOD_MANIFESTS")]
    manifests: PathBuf,
}

impl DiscArgs {
    pub fn load(&self, overwrite: bool) -> Result<Session> {
        let options = SessionOptions::builder()
            .source_dir(&self.source)
            .manifest_dir(&self.manifests)
            .overwrite(overwrite)
            .build();

        Session::load(&options)?
            .ok_or_else(|| miette!("{} is not a supported release", self.source.display()))
    }
}
