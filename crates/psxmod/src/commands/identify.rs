use std::path::PathBuf;

use clap::Args;
use miette::{miette, Result};
use owo_colors::OwoColorize;
use psx_tree::identify::identify;

#[derive(Args)]
pub struct IdentifyArgs {
    /// Extracted disc contents
    #[arg(short, long, value_name = "DIR")]
    source: PathBuf,
}

impl IdentifyArgs {
    pub fn handle(&self) -> Result<()> {
        if !self.source.is_dir() {
            return Err(miette!("{} is not a directory", self.source.display()));
        }

        match identify(&self.source) {
            Some(profile) => {
                println!("{} ({})", profile.game.green(), profile.simple());
                println!("manifest: {}", profile.manifest);
                if !profile.complete {
                    println!("{}", "manifest does not cover the whole disc".yellow());
                }
            }
            None => println!("{}", "no supported release found".red()),
        }
        Ok(())
    }
}
