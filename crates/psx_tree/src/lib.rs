//! A navigable tree over the nested containers of a PlayStation game disc.
//!
//! Each supported release ships a manifest that lists the files worth
//! opening and how they are stored. Loading a disc identifies the release,
//! reads every listed file and splits containers into members, which may in
//! turn be re-typed as containers themselves. Saving walks the tree back down
//! and joins every container from its current members.
//!
//! ```no_run
//! # fn doit() -> psx_tree::error::Result<()> {
//! use psx_tree::{Session, SessionOptions};
//!
//! let options = SessionOptions::builder()
//!     .source_dir("disc")
//!     .manifest_dir("manifests")
//!     .build();
//!
//! if let Some(session) = Session::load(&options)? {
//!     let tree = session.tree();
//!     if let Some(id) = tree.resolve("CD/FDAT.T/28") {
//!         println!("{}", tree.node(id)?.display_name());
//!     }
//!     session.save_to("out")?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Containers
//!
//! ### T
//!
//! | Offset | Field   | Description                                          |
//! |--------|---------|------------------------------------------------------|
//! | 0x0000 | Count   | 2 bytes: number of entries minus one                 |
//! | 0x0002 | Entries | 2 bytes each: start sector, a `0` ends the table     |
//! | 0x0800 | Members | each starts on a sector boundary                     |
//!
//! Several entries may name the same sector. Those entries all refer to one
//! member. The last entry is where the last member ends. Every member's last
//! word is a checksum over the words before it, seeded with `0x12345678`.
//!
//! ### MIX
//!
//! Sized MIX files prefix every member with its `u32` length and end at a zero
//! length. Size-less MIX files start with a TIM, TMD or VH signature and pack
//! members back to back; each length comes from the member's own header.
//!
//! ### MIMList
//!
//! | Offset | Field   | Description                                          |
//! |--------|---------|------------------------------------------------------|
//! | 0x00   | Count   | 4 bytes                                              |
//! | 0x04   | Members | each starts with its own `u32` length                |

pub mod checksum;
pub mod codec;
pub mod error;
pub mod identify;
pub mod manifest;
pub mod session;
pub mod tree;
pub mod types;

pub use session::{Session, SessionOptions};
pub use tree::{FileTree, NodeId};
pub use types::{DataType, FileFormat};
