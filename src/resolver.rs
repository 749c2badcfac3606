//! Maps group path strings such as `"Work / Email"` to tree nodes.

use crate::error::{Result, VaultError};
use crate::tree::{GroupId, PATH_SEPARATOR, Tree};

/// Literal that always names the root group.
pub const ROOT_ALIAS: &str = "Root";

fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() || path == ROOT_ALIAS {
        return Vec::new();
    }
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Resolves `path`, creating any missing groups along the way.
///
/// Matching is exact and case-sensitive. Calling this twice with the same
/// path returns the same group and creates nothing the second time.
pub fn resolve(tree: &mut Tree, path: &str) -> Result<GroupId> {
    let mut current = tree.root().ok_or(VaultError::UninitializedDatabase)?;
    for name in segments(path) {
        current = match tree.child_named(current, name) {
            Some(child) => child,
            None => {
                log::debug!("Creating group '{}'", name);
                tree.add_group(current, name)?
            }
        };
    }
    Ok(current)
}

/// Resolves `path` without creating anything.
pub fn find(tree: &Tree, path: &str) -> Option<GroupId> {
    let mut current = tree.root()?;
    for name in segments(path) {
        current = tree.child_named(current, name)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_root_alias_resolve_to_root() {
        let mut tree = Tree::with_root("Root");
        let root = tree.root().unwrap();
        assert_eq!(resolve(&mut tree, "").unwrap(), root);
        assert_eq!(resolve(&mut tree, "Root").unwrap(), root);
        assert_eq!(tree.group_count(), 1);
    }

    #[test]
    fn test_resolve_creates_nested_groups() {
        let mut tree = Tree::with_root("Root");
        let b = resolve(&mut tree, "A / B").unwrap();

        assert_eq!(tree.group_count(), 3);
        let root = tree.root().unwrap();
        let a = tree.child_named(root, "A").unwrap();
        assert_eq!(tree.child_named(a, "B"), Some(b));
        assert_eq!(tree.path_of(b), "A / B");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut tree = Tree::with_root("Root");
        let first = resolve(&mut tree, "A / B").unwrap();
        let second = resolve(&mut tree, "A / B").unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.group_count(), 3);
    }

    #[test]
    fn test_resolve_reuses_shared_prefix() {
        let mut tree = Tree::with_root("Root");
        resolve(&mut tree, "A / B").unwrap();
        resolve(&mut tree, "A / C").unwrap();

        let root = tree.root().unwrap();
        assert_eq!(tree.group(root).unwrap().children().len(), 1);
        let a = tree.child_named(root, "A").unwrap();
        assert_eq!(tree.group(a).unwrap().children().len(), 2);
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let mut tree = Tree::with_root("Root");
        let lower = resolve(&mut tree, "work").unwrap();
        let upper = resolve(&mut tree, "Work").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_resolve_without_root_fails() {
        let mut tree = Tree::empty();
        assert!(matches!(
            resolve(&mut tree, "A"),
            Err(VaultError::UninitializedDatabase)
        ));
    }

    #[test]
    fn test_find_does_not_create() {
        let mut tree = Tree::with_root("Root");
        assert!(find(&tree, "A / B").is_none());
        assert_eq!(tree.group_count(), 1);

        let b = resolve(&mut tree, "A / B").unwrap();
        assert_eq!(find(&tree, "A / B"), Some(b));
        assert_eq!(find(&tree, ""), tree.root());
    }
}
