use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use psx_formats::sniff;
use psx_tree::tree::TreeNode;

use super::DiscArgs;

#[derive(Args)]
pub struct TreeArgs {
    #[command(flatten)]
    disc: DiscArgs,

    /// Only print the subtree below this path
    #[arg(short, long, value_name = "PATH")]
    path: Option<String>,

    /// Stop after this many levels
    #[arg(long, value_name = "DEPTH")]
    depth: Option<usize>,
}

impl TreeArgs {
    pub fn handle(&self) -> Result<()> {
        let session = self.disc.load(false)?;
        let tree = session.tree();

        let from = match &self.path {
            Some(path) => tree.lookup(path)?,
            None => tree.root(),
        };

        println!("{}", session.profile().game.bold());
        for (depth, id) in tree.walk(from)? {
            if depth == 0 || self.depth.is_some_and(|max| depth > max) {
                continue;
            }
            let node = tree.node(id)?;
            println!("{}{}", "  ".repeat(depth - 1), describe(node));
        }
        Ok(())
    }
}

fn describe(node: &TreeNode) -> String {
    let label = if node.display_name() != node.name() {
        format!("{} ({})", node.name(), node.display_name())
    } else {
        node.name().to_string()
    };

    if node.is_container() {
        format!(
            "{} {} {}",
            label.cyan(),
            node.format().dimmed(),
            format!("[{} members]", node.children().len()).dimmed()
        )
    } else if node.is_leaf() {
        format!(
            "{} {} {}",
            label,
            node.payload().dimmed(),
            format!("{} bytes, {}", node.data().len(), sniff(node.data())).dimmed()
        )
    } else {
        label.blue().to_string()
    }
}
