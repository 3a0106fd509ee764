//! Logical path algebra.
//!
//! Disks address their contents with relative POSIX paths: `""` names the
//! disk root, components are separated by single slashes, and no `.` or `..`
//! components survive normalization. Everything here operates on such
//! normalized paths.

use crate::DiskError;

/// Normalizes a slash-separated path.
///
/// Strips leading and trailing separators and collapses runs of them.
/// `.` and `..` components have no meaning inside a disk and are rejected.
pub fn normalize(path: &str) -> Result<String, DiskError> {
    let mut out = String::with_capacity(path.len());
    for component in path.split('/') {
        if component.is_empty() {
            continue;
        }
        if component == "." || component == ".." {
            return Err(DiskError::InvalidPath(path.to_string()));
        }
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(component);
    }
    Ok(out)
}

/// Returns the parent of a path, or `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rfind('/').map_or("", |idx| &path[..idx]))
}

/// Returns the final component of a path. The root has an empty name.
pub fn file_name(path: &str) -> &str {
    path.rfind('/').map_or(path, |idx| &path[idx + 1..])
}

/// Joins a directory path and a child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        dir.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Iterates `path` and its strict ancestors, deepest first.
///
/// The root is not yielded; the walk stops at the first-level component.
pub fn self_and_ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors((!path.is_empty()).then_some(path), |p| {
        parent(p).filter(|q| !q.is_empty())
    })
}

/// Returns `path` and its strict ancestors, shallowest first, root excluded.
pub fn self_and_ancestors_top_down(path: &str) -> Vec<&str> {
    let mut chain: Vec<&str> = self_and_ancestors(path).collect();
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a/b/c").unwrap(), "a/b/c");
        assert_eq!(normalize("/a//b/").unwrap(), "a/b");
        assert_eq!(normalize("").unwrap(), "");
        assert_eq!(normalize("///").unwrap(), "");
        assert!(normalize("a/../b").is_err());
        assert!(normalize("./a").is_err());
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent("a/b/c"), Some("a/b"));
        assert_eq!(parent("a"), Some(""));
        assert_eq!(parent(""), None);
        assert_eq!(file_name("a/b/c"), "c");
        assert_eq!(file_name("a"), "a");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "x"), "x");
        assert_eq!(join("a/b", "x"), "a/b/x");
        assert_eq!(join("a", ""), "a");
    }

    #[test]
    fn test_ancestor_walks() {
        let up: Vec<&str> = self_and_ancestors("a/b/c").collect();
        assert_eq!(up, vec!["a/b/c", "a/b", "a"]);

        assert_eq!(self_and_ancestors_top_down("a/b/c"), vec!["a", "a/b", "a/b/c"]);
        assert!(self_and_ancestors("").next().is_none());
    }
}
