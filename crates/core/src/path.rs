//! Vault path helpers shared by folder routing and ignored-folder filtering.
//!
//! All paths are compared in a canonical form: `/` separators, no repeated
//! separators, no leading or trailing separator.

/// Normalize a vault path to its canonical form.
///
/// Backslashes become `/`, runs of separators collapse, `.` segments are
/// dropped and leading/trailing separators are trimmed.
pub fn normalize_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns `true` when `path` equals `folder` or lies underneath it.
///
/// Both sides are normalized first. An empty folder never matches, so a
/// blank settings entry cannot swallow the whole vault.
pub fn is_within_folder(path: &str, folder: &str) -> bool {
    let folder = normalize_path(folder);
    if folder.is_empty() {
        return false;
    }
    let path = normalize_path(path);
    path == folder
        || path
            .strip_prefix(folder.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unifies_separators() {
        assert_eq!(normalize_path("Blog\\2024\\post.md"), "Blog/2024/post.md");
        assert_eq!(normalize_path("/Blog//post.md/"), "Blog/post.md");
        assert_eq!(normalize_path("./Blog/./post.md"), "Blog/post.md");
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("///"), "");
    }

    #[test]
    fn within_folder_exact_and_nested() {
        assert!(is_within_folder("Private", "Private"));
        assert!(is_within_folder("Private/diary.md", "Private"));
        assert!(is_within_folder("Private/deep/x.md", "/Private/"));
        assert!(is_within_folder("Private\\diary.md", "Private"));
    }

    #[test]
    fn within_folder_rejects_sibling_prefixes() {
        assert!(!is_within_folder("PrivateStuff/x.md", "Private"));
        assert!(!is_within_folder("Notes/Private/x.md", "Private"));
    }

    #[test]
    fn empty_folder_never_matches() {
        assert!(!is_within_folder("anything.md", ""));
        assert!(!is_within_folder("anything.md", "/"));
    }
}
