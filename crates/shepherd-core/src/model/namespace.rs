//! Hierarchical class-path helpers.
//!
//! Entity classes are identified by `::`-separated paths. The aggregate
//! boundary only admits targets that live under the root's namespace.

/// Separator between class path segments.
pub const PATH_SEPARATOR: &str = "::";

/// The path with its last segment removed; empty for top-level classes.
#[must_use]
pub fn namespace_of(class: &str) -> &str {
    class
        .rfind(PATH_SEPARATOR)
        .map_or("", |index| &class[..index])
}

/// Whether `target_class` lies within the namespace of the aggregate rooted
/// at `root_class`: either nested one level under the root's own path, or a
/// sibling under a shared non-empty parent prefix.
#[must_use]
pub fn within_namespace(root_class: &str, target_class: &str) -> bool {
    let target_namespace = namespace_of(target_class);
    if target_namespace == root_class {
        return true;
    }

    let root_namespace = namespace_of(root_class);
    !root_namespace.is_empty() && target_namespace == root_namespace
}
