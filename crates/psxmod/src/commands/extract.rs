use std::path::PathBuf;

use clap::Args;
use miette::{Context, Result};
use tracing::info;

use super::DiscArgs;

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    disc: DiscArgs,

    /// Container to extract, such as `CD/FDAT.T/28`
    #[arg(short, long, value_name = "PATH")]
    path: String,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let session = self.disc.load(false)?;
        let tree = session.tree();

        let id = tree.lookup(&self.path)?;

        let written = tree
            .extract_to(id, &self.directory)
            .context(format!("extracting {}", self.path))?;
        for path in &written {
            info!("wrote {}", path.display());
        }
        Ok(())
    }
}
