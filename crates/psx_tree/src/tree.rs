//! Arena backed tree of disc files and the members decoded from them.
//!
//! Nodes are addressed by [`NodeId`] handles that stay valid while any other
//! part of the tree is rebuilt. Removing a subtree frees its slots for later
//! inserts and bumps each slot's generation, so a stale handle can only ever
//! fail to resolve and never aliases the node that took its place.

use std::path::{Path, PathBuf};

use derive_more::Display;
use indexmap::IndexMap;
use psx_formats::sniff;
use tracing::{debug, info, instrument};

use crate::codec::{self, ContainerKind};
use crate::error::{Error, Result};
use crate::types::{DataType, FileFormat};

#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("#{index}")]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Folder,
    Raw,
    Container(ContainerKind),
}

impl NodeKind {
    pub fn format(&self) -> FileFormat {
        match self {
            NodeKind::Root => FileFormat::Root,
            NodeKind::Folder => FileFormat::Folder,
            NodeKind::Raw => FileFormat::Raw,
            NodeKind::Container(kind) => kind.format(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    name: Box<str>,
    display_name: Option<String>,
    kind: NodeKind,
    payload: DataType,
    data: Vec<u8>,
    parent: Option<NodeId>,
    children: IndexMap<Box<str>, NodeId>,
}

impl TreeNode {
    fn new(name: &str, kind: NodeKind, payload: DataType, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            kind,
            payload,
            data: Vec::new(),
            parent,
            children: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name if one was set, otherwise the node name
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn format(&self) -> FileFormat {
        self.kind.format()
    }

    pub fn payload(&self) -> DataType {
        self.payload
    }

    /// Bytes of a raw leaf. Empty for every other kind.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in on-disc order
    pub fn children(
        &self,
    ) -> impl DoubleEndedIterator<Item = NodeId> + ExactSizeIterator + '_ {
        self.children.values().copied()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Raw)
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container(_))
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<TreeNode>,
}

#[derive(Debug, Clone)]
pub struct FileTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTree {
    pub fn new() -> Self {
        let root = TreeNode::new("", NodeKind::Root, DataType::Root, None);
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(root),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Drop every node and start over with an empty root
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.root)
            .map(|root| root.children.is_empty())
            .unwrap_or(true)
    }

    pub fn node(&self, id: NodeId) -> Result<&TreeNode> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(Error::StaleNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TreeNode> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(Error::StaleNode(id))
    }

    fn insert(&mut self, node: TreeNode) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index) {
            if slot.generation == id.generation && slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent).ok()?.children.get(name).copied()
    }

    /// Look up a slash separated path such as `CD/FDAT.T/28`
    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root, |node, segment| self.child(node, segment))
    }

    /// [`resolve`](Self::resolve), failing when nothing is at `path`
    pub fn lookup(&self, path: &str) -> Result<NodeId> {
        self.resolve(path)
            .ok_or_else(|| Error::PathNotFound(path.to_string()))
    }

    /// Slash separated path of a node, empty for the root
    pub fn path_of(&self, id: NodeId) -> Result<String> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            if node.parent.is_some() {
                segments.push(node.name.as_ref());
            }
            current = node.parent;
        }
        segments.reverse();
        Ok(segments.join("/"))
    }

    /// Nodes below `from` in depth first order, with their depth relative to it
    pub fn walk(&self, from: NodeId) -> Result<Vec<(usize, NodeId)>> {
        let mut out = Vec::new();
        let mut stack = vec![(0, from)];
        while let Some((depth, id)) = stack.pop() {
            let node = self.node(id)?;
            out.push((depth, id));
            stack.extend(node.children().rev().map(|child| (depth + 1, child)));
        }
        Ok(out)
    }

    /// Insert a node and decompose it right away if `format` is a container
    #[instrument(skip(self, data), err, fields(size = data.len()))]
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: &str,
        format: FileFormat,
        payload: DataType,
        data: Vec<u8>,
    ) -> Result<NodeId> {
        let parent_node = self.node(parent)?;
        if !matches!(parent_node.kind, NodeKind::Root | NodeKind::Folder) {
            return Err(Error::NotAFolder(self.path_of(parent)?));
        }
        if parent_node.children.contains_key(name) {
            return Err(Error::DuplicateName(self.join(parent, name)?));
        }

        let kind = match format {
            FileFormat::Folder => NodeKind::Folder,
            FileFormat::Root => {
                return Err(Error::CustomError("only the tree owns a root".into()));
            }
            _ => NodeKind::Raw,
        };

        let decoded = codec::decode(name, format, &data)?;

        let id = self.insert(TreeNode::new(name, kind, payload, Some(parent)));
        self.node_mut(parent)?.children.insert(name.into(), id);

        match decoded {
            Some((kind, members)) => self.attach_members(id, kind, members)?,
            None => self.node_mut(id)?.data = data,
        }

        Ok(id)
    }

    fn attach_members(
        &mut self,
        id: NodeId,
        kind: ContainerKind,
        members: Vec<codec::Member>,
    ) -> Result<()> {
        debug!(node = %id, kind = kind.name(), members = members.len(), "decomposed");

        let node = self.node_mut(id)?;
        node.kind = NodeKind::Container(kind);
        node.data = Vec::new();

        for (index, member) in members.into_iter().enumerate() {
            let name = index.to_string();
            let mut leaf = TreeNode::new(&name, NodeKind::Raw, member.payload, Some(id));
            leaf.data = member.data;
            let child = self.insert(leaf);
            self.node_mut(id)?.children.insert(name.into(), child);
        }

        Ok(())
    }

    fn join(&self, parent: NodeId, name: &str) -> Result<String> {
        let base = self.path_of(parent)?;
        Ok(if base.is_empty() {
            name.to_string()
        } else {
            format!("{base}/{name}")
        })
    }

    fn remove_children(&mut self, id: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children.into_values() {
            self.remove_children(child)?;
            self.release(child);
        }
        Ok(())
    }

    /// Change how a node is stored.
    ///
    /// The node is serialized with its current layout and decoded again with
    /// the new one. If decoding fails the node is left untouched.
    #[instrument(skip(self), err)]
    pub fn set_format(&mut self, id: NodeId, format: FileFormat) -> Result<()> {
        let node = self.node(id)?;
        let current = node.format();
        if current == format {
            return Ok(());
        }
        if matches!(current, FileFormat::Root | FileFormat::Folder)
            || matches!(format, FileFormat::Root | FileFormat::Folder)
        {
            return Err(Error::CustomError(format!(
                "{} cannot change from {current} to {format}",
                self.path_of(id)?
            )));
        }

        let data = self.serialize(id)?;
        let decoded = codec::decode(node.name(), format, &data)?;

        self.remove_children(id)?;
        match decoded {
            Some((kind, members)) => self.attach_members(id, kind, members)?,
            None => {
                let node = self.node_mut(id)?;
                node.kind = NodeKind::Raw;
                node.data = data;
            }
        }

        Ok(())
    }

    pub fn set_payload(&mut self, id: NodeId, payload: DataType) -> Result<()> {
        self.node_mut(id)?.payload = payload;
        Ok(())
    }

    pub fn set_display_name(&mut self, id: NodeId, display_name: Option<String>) -> Result<()> {
        self.node_mut(id)?.display_name = display_name.filter(|name| !name.is_empty());
        Ok(())
    }

    /// Mutable bytes of a raw leaf
    pub fn data_mut(&mut self, id: NodeId) -> Result<&mut Vec<u8>> {
        if !self.node(id)?.is_leaf() {
            return Err(Error::NotALeaf(self.path_of(id)?));
        }
        Ok(&mut self.node_mut(id)?.data)
    }

    /// Bytes of a node as they would be written to disc
    pub fn serialize(&self, id: NodeId) -> Result<Vec<u8>> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Raw => Ok(node.data.clone()),
            NodeKind::Container(kind) => {
                let members = node
                    .children()
                    .map(|child| self.serialize(child))
                    .collect::<Result<Vec<_>>>()?;
                let slices = members.iter().map(Vec::as_slice).collect::<Vec<_>>();
                kind.encode(&slices)
            }
            NodeKind::Root | NodeKind::Folder => Err(Error::NotALeaf(self.path_of(id)?)),
        }
    }

    /// Write every node below the root into `dir`.
    ///
    /// Folders become directories and everything else one file. All files are
    /// serialized before the first one is written.
    #[instrument(skip(self, dir), err, fields(dir = %dir.as_ref().display()))]
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();

        let mut directories = Vec::new();
        let mut files = Vec::new();
        for (depth, id) in self.walk(self.root)? {
            if depth == 0 {
                continue;
            }
            let node = self.node(id)?;
            // members are written as part of their container
            if node
                .parent
                .and_then(|parent| self.node(parent).ok())
                .is_some_and(TreeNode::is_container)
            {
                continue;
            }

            let path = dir.join(self.path_of(id)?);
            match node.kind {
                NodeKind::Folder => directories.push(path),
                _ => files.push((path, self.serialize(id)?)),
            }
        }

        std::fs::create_dir_all(dir)?;
        for path in &directories {
            std::fs::create_dir_all(path)?;
        }
        for (path, data) in &files {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, data)?;
        }

        info!(
            directories = directories.len(),
            files = files.len(),
            "wrote tree"
        );
        Ok(())
    }

    /// Write each member of a container to `dir` as `<name><index>.<ext>`
    #[instrument(skip(self, dir), err, fields(dir = %dir.as_ref().display()))]
    pub fn extract_to(&self, id: NodeId, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let node = self.node(id)?;
        if !node.is_container() {
            return Err(Error::NotAContainer(self.path_of(id)?));
        }

        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(node.children.len());
        for (index, child) in node.children().enumerate() {
            let data = self.serialize(child)?;
            let extension = sniff(&data).extension();
            let path = dir.join(format!("{}{index}.{extension}", node.name()));

            debug!(path = %path.display(), size = data.len(), "extracting");
            std::fs::write(&path, &data)?;
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::*;
    use crate::error::Result;

    #[rustfmt::skip]
    fn sized_mix() -> Vec<u8> {
        vec![
            0x02, 0x00, 0x00, 0x00, 0xAA, 0xBB,
            0x03, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03,
        ]
    }

    fn tree_with_mix() -> Result<(FileTree, NodeId)> {
        let mut tree = FileTree::new();
        let cd = tree.add_node(
            tree.root(),
            "CD",
            FileFormat::Folder,
            DataType::Container,
            Vec::new(),
        )?;
        let mix = tree.add_node(cd, "ITEM.MIX", FileFormat::Mix, DataType::Container, sized_mix())?;
        Ok((tree, mix))
    }

    #[traced_test]
    #[test]
    fn container_is_decomposed_on_insert() -> Result<()> {
        let (tree, mix) = tree_with_mix()?;
        let node = tree.node(mix)?;

        assert!(node.is_container());
        assert!(node.data().is_empty());
        assert_eq!(node.children().len(), 2);
        assert_eq!(tree.resolve("CD/ITEM.MIX/1"), node.children().nth(1));
        assert_eq!(tree.path_of(node.children().nth(1).unwrap())?, "CD/ITEM.MIX/1");
        Ok(())
    }

    #[test]
    fn parent_links_survive_rebuilds() -> Result<()> {
        let (mut tree, mix) = tree_with_mix()?;
        let cd = tree.resolve("CD").unwrap();

        tree.set_format(mix, FileFormat::Raw)?;
        assert_eq!(tree.node(mix)?.parent(), Some(cd));
        assert_eq!(tree.node(mix)?.data(), sized_mix().as_slice());
        assert_eq!(tree.resolve("CD/ITEM.MIX/0"), None);

        tree.set_format(mix, FileFormat::Mix)?;
        let first = tree.resolve("CD/ITEM.MIX/0").unwrap();
        assert_eq!(tree.node(first)?.parent(), Some(mix));
        Ok(())
    }

    #[test]
    fn stale_handles_do_not_resolve() -> Result<()> {
        let (mut tree, mix) = tree_with_mix()?;
        let member = tree.resolve("CD/ITEM.MIX/0").unwrap();

        tree.set_format(mix, FileFormat::Raw)?;
        assert!(matches!(tree.node(member), Err(Error::StaleNode(_))));
        assert!(matches!(
            tree.lookup("CD/ITEM.MIX/0"),
            Err(Error::PathNotFound(path)) if path == "CD/ITEM.MIX/0"
        ));
        Ok(())
    }

    #[test]
    fn failed_format_change_leaves_node() -> Result<()> {
        let (mut tree, mix) = tree_with_mix()?;

        assert!(tree.set_format(mix, FileFormat::MimList).is_err());
        assert_eq!(tree.node(mix)?.format(), FileFormat::Mix);
        assert_eq!(tree.node(mix)?.children().len(), 2);
        Ok(())
    }

    #[test]
    fn edits_flow_into_serialization() -> Result<()> {
        let (mut tree, mix) = tree_with_mix()?;
        let member = tree.resolve("CD/ITEM.MIX/0").unwrap();

        tree.data_mut(member)?.push(0xCC);

        #[rustfmt::skip]
        let expected = vec![
            0x03, 0x00, 0x00, 0x00, 0xAA, 0xBB, 0xCC,
            0x03, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03,
        ];
        assert_eq!(tree.serialize(mix)?, expected);
        assert!(matches!(tree.data_mut(mix), Err(Error::NotALeaf(_))));
        Ok(())
    }

    #[test]
    fn duplicate_names_rejected() -> Result<()> {
        let (mut tree, _) = tree_with_mix()?;
        let cd = tree.resolve("CD").unwrap();

        let err = tree
            .add_node(cd, "ITEM.MIX", FileFormat::Raw, DataType::Unknown, vec![1])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(path) if path == "CD/ITEM.MIX"));
        Ok(())
    }

    #[test]
    fn walk_is_depth_first() -> Result<()> {
        let (tree, _) = tree_with_mix()?;
        let names = tree
            .walk(tree.root())?
            .into_iter()
            .map(|(depth, id)| -> Result<(usize, String)> {
                Ok((depth, tree.node(id)?.name().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(
            names,
            vec![
                (0, "".to_string()),
                (1, "CD".to_string()),
                (2, "ITEM.MIX".to_string()),
                (3, "0".to_string()),
                (3, "1".to_string()),
            ]
        );

        let mix = tree.resolve("CD/ITEM.MIX").unwrap();
        let backwards = tree.node(mix)?.children().rev().collect::<Vec<_>>();
        assert_eq!(
            backwards,
            vec![
                tree.resolve("CD/ITEM.MIX/1").unwrap(),
                tree.resolve("CD/ITEM.MIX/0").unwrap(),
            ]
        );
        Ok(())
    }

    #[test]
    fn retyping_reuses_freed_slots() -> Result<()> {
        let (mut tree, mix) = tree_with_mix()?;
        let slots = tree.slots.len();

        for _ in 0..16 {
            tree.set_format(mix, FileFormat::Raw)?;
            tree.set_format(mix, FileFormat::Mix)?;
        }

        assert_eq!(tree.slots.len(), slots);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.serialize(mix)?, sized_mix());
        Ok(())
    }

    #[test]
    fn reused_slot_rejects_old_handle() -> Result<()> {
        let (mut tree, mix) = tree_with_mix()?;
        let old = [
            tree.resolve("CD/ITEM.MIX/0").unwrap(),
            tree.resolve("CD/ITEM.MIX/1").unwrap(),
        ];

        tree.set_format(mix, FileFormat::Raw)?;
        tree.set_format(mix, FileFormat::Mix)?;
        let new = [
            tree.resolve("CD/ITEM.MIX/0").unwrap(),
            tree.resolve("CD/ITEM.MIX/1").unwrap(),
        ];

        for (old, new) in old.iter().zip(&new) {
            assert_ne!(old, new);
            assert!(matches!(tree.node(*old), Err(Error::StaleNode(id)) if id == *old));
        }
        assert_eq!(tree.node(new[1])?.data(), &[0x01, 0x02, 0x03]);
        Ok(())
    }

    #[test]
    fn display_name_falls_back() -> Result<()> {
        let (mut tree, mix) = tree_with_mix()?;
        assert_eq!(tree.node(mix)?.display_name(), "ITEM.MIX");

        tree.set_display_name(mix, Some("Item models".into()))?;
        assert_eq!(tree.node(mix)?.display_name(), "Item models");

        tree.set_display_name(mix, Some(String::new()))?;
        assert_eq!(tree.node(mix)?.display_name(), "ITEM.MIX");
        Ok(())
    }

    #[test]
    fn extract_rejects_leaves() -> Result<()> {
        let (tree, _) = tree_with_mix()?;
        let member = tree.resolve("CD/ITEM.MIX/0").unwrap();
        let err = tree.extract_to(member, std::env::temp_dir()).unwrap_err();

        assert!(matches!(err, Error::NotAContainer(_)));
        assert!(!err.is_fatal());
        Ok(())
    }

    #[test]
    fn reset_empties_tree() -> Result<()> {
        let (mut tree, _) = tree_with_mix()?;
        assert!(!tree.is_empty());

        tree.reset();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 1);
        Ok(())
    }
}
