use std::path::PathBuf;

use clap::Args;
use miette::{Context, Result};
use tracing::info;

use super::DiscArgs;

#[derive(Args)]
pub struct RebuildArgs {
    #[command(flatten)]
    disc: DiscArgs,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow writing over the source directory
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl RebuildArgs {
    pub fn handle(&self) -> Result<()> {
        let session = self.disc.load(self.overwrite)?;

        info!("writing {}", self.directory.display());
        session
            .save_to(&self.directory)
            .context(format!("rebuilding into {}", self.directory.display()))?;
        Ok(())
    }
}
