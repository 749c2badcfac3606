//! Arena-backed group tree.
//!
//! Groups live in a flat vector and are addressed by [`GroupId`]. A parent
//! owns its children: removing a group frees its whole subtree, and the
//! entries it held are dropped (their secrets zeroized) immediately.

use crate::crypto::ProtectionKey;
use crate::entry::{Entry, EntryRecord};
use crate::error::{Result, VaultError};

/// Separator used when joining group names into a path.
pub const PATH_SEPARATOR: &str = " / ";

/// Index of a group inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// A group as stored in the arena.
#[derive(Debug)]
pub struct GroupNode {
    name: String,
    parent: Option<GroupId>,
    children: Vec<GroupId>,
    entries: Vec<EntryRecord>,
}

impl GroupNode {
    fn new(name: String, parent: Option<GroupId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// The group's own name, not its path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` only for the root.
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Child groups in insertion order.
    pub fn children(&self) -> &[GroupId] {
        &self.children
    }

    /// Stored entries in insertion order, secrets in whatever state the
    /// tree is in.
    pub fn entries(&self) -> &[EntryRecord] {
        &self.entries
    }
}

/// Read-only copy of a group with its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub path: String,
    pub entries: Vec<Entry>,
    pub groups: Vec<Group>,
}

/// The group tree of one database. It has at most one root.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Option<GroupNode>>,
    root: Option<GroupId>,
}

impl Tree {
    /// A tree with no root. Only decoding can produce one of these in
    /// practice.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A tree with a single root group.
    pub fn with_root(name: impl Into<String>) -> Self {
        let mut tree = Self::empty();
        tree.set_root(name);
        tree
    }

    /// Replaces whatever was in the tree with a new root.
    pub fn set_root(&mut self, name: impl Into<String>) -> GroupId {
        self.nodes.clear();
        self.nodes.push(Some(GroupNode::new(name.into(), None)));
        let id = GroupId(0);
        self.root = Some(id);
        id
    }

    /// The root group, or `None` for an uninitialized tree.
    pub fn root(&self) -> Option<GroupId> {
        self.root
    }

    /// Looks up a live group. Removed ids give `None`.
    pub fn group(&self, id: GroupId) -> Option<&GroupNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut GroupNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| VaultError::Validation("group does not exist".into()))
    }

    /// Appends a child group and returns its id.
    pub fn add_group(&mut self, parent: GroupId, name: impl Into<String>) -> Result<GroupId> {
        self.group_mut(parent)?;
        let id = GroupId(self.nodes.len());
        self.nodes.push(Some(GroupNode::new(name.into(), Some(parent))));
        self.group_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Finds a direct child by exact, case-sensitive name.
    pub fn child_named(&self, parent: GroupId, name: &str) -> Option<GroupId> {
        self.group(parent)?
            .children
            .iter()
            .copied()
            .find(|&c| self.group(c).is_some_and(|g| g.name == name))
    }

    /// Appends an entry to `group`.
    pub fn push_entry(&mut self, group: GroupId, entry: EntryRecord) -> Result<()> {
        self.group_mut(group)?.entries.push(entry);
        Ok(())
    }

    /// Removes and returns the entry at `index` in `group`.
    pub fn take_entry(&mut self, group: GroupId, index: usize) -> Result<Option<EntryRecord>> {
        let node = self.group_mut(group)?;
        if index < node.entries.len() {
            Ok(Some(node.entries.remove(index)))
        } else {
            Ok(None)
        }
    }

    /// Removes a non-root group and its whole subtree.
    pub fn remove_group(&mut self, id: GroupId) -> Result<()> {
        if Some(id) == self.root {
            return Err(VaultError::Validation("the root group cannot be removed".into()));
        }
        let parent = self
            .group(id)
            .and_then(GroupNode::parent)
            .ok_or_else(|| VaultError::Validation("group does not exist".into()))?;
        self.group_mut(parent)?.children.retain(|&c| c != id);

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    /// Derived path of a group: ancestor names joined with
    /// [`PATH_SEPARATOR`], the root's own name left out.
    pub fn path_of(&self, id: GroupId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(node) = self.group(cur) else { break };
            if node.parent.is_some() && !node.name.is_empty() {
                names.push(node.name.as_str());
            }
            current = node.parent;
        }
        names.reverse();
        names.join(PATH_SEPARATOR)
    }

    /// Pre-order depth-first list of every live group with its path.
    /// Iterative, so nesting depth is bounded only by memory.
    pub fn walk(&self) -> Vec<(GroupId, String)> {
        let mut out = Vec::new();
        let mut pending: Vec<(GroupId, String)> =
            self.root.map(|r| (r, String::new())).into_iter().collect();
        while let Some((id, path)) = pending.pop() {
            let Some(node) = self.group(id) else { continue };
            for &child in node.children.iter().rev() {
                if let Some(child_node) = self.group(child) {
                    pending.push((child, join_path(&path, &child_node.name)));
                }
            }
            out.push((id, path));
        }
        out
    }

    /// All entries in pre-order with their group path filled in.
    pub fn entries(&self) -> Vec<Entry> {
        self.walk()
            .into_iter()
            .filter_map(|(id, path)| self.group(id).map(|g| (g, path)))
            .flat_map(|(group, path)| {
                group
                    .entries
                    .iter()
                    .map(move |e| e.snapshot(&path))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Nested snapshot of the group `id`.
    pub fn snapshot(&self, id: GroupId) -> Option<Group> {
        let path = self.path_of(id);
        self.snapshot_at(id, path)
    }

    fn snapshot_at(&self, id: GroupId, path: String) -> Option<Group> {
        let node = self.group(id)?;
        let entries = node.entries.iter().map(|e| e.snapshot(&path)).collect();
        let groups = node
            .children
            .iter()
            .filter_map(|&c| {
                let child = self.group(c)?;
                self.snapshot_at(c, join_path(&path, &child.name))
            })
            .collect();
        Some(Group {
            name: node.name.clone(),
            path,
            entries,
            groups,
        })
    }

    /// Number of entries across all live groups.
    pub fn entry_count(&self) -> usize {
        self.nodes.iter().flatten().map(|n| n.entries.len()).sum()
    }

    /// Number of live groups, the root included.
    pub fn group_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Puts every entry secret into its protected form.
    pub fn lock_all(&mut self, key: &ProtectionKey) -> Result<()> {
        for node in self.nodes.iter_mut().flatten() {
            for entry in &mut node.entries {
                entry.password.lock(key)?;
            }
        }
        Ok(())
    }

    /// Restores every entry secret to plaintext.
    pub fn unlock_all(&mut self, key: &ProtectionKey) -> Result<()> {
        for node in self.nodes.iter_mut().flatten() {
            for entry in &mut node.entries {
                entry.password.unlock(key)?;
            }
        }
        Ok(())
    }
}

/// Appends `name` to `parent` using [`PATH_SEPARATOR`]. Unnamed groups do
/// not contribute a segment.
pub fn join_path(parent: &str, name: &str) -> String {
    match (parent.is_empty(), name.is_empty()) {
        (_, true) => parent.to_string(),
        (true, false) => name.to_string(),
        (false, false) => format!("{parent}{PATH_SEPARATOR}{name}"),
    }
}
