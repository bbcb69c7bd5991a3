//! Relative path validation and normalization.
//!
//! Module file paths and generated output paths are always relative, use
//! forward slashes, and contain no `.` or `..` components.

/// Check that `path` is already in normalized relative form.
///
/// Returns a human-readable reason when it is not.
pub fn validate_normalized(path: &str) -> Result<(), &'static str> {
  if path.is_empty() {
    return Err("path is empty");
  }
  if path.contains('\\') {
    return Err("path contains a backslash");
  }
  if path.chars().any(char::is_control) {
    return Err("path contains a control character");
  }
  if path.starts_with('/') {
    return Err("path is absolute");
  }
  for component in path.split('/') {
    match component {
      "" => return Err("path contains an empty component"),
      "." | ".." => return Err("path contains a relative component"),
      _ => {}
    }
  }
  Ok(())
}

/// Normalize a relative path.
///
/// Collapses `.` components, duplicate and trailing slashes. Returns `None` if
/// the path is absolute, uses backslashes, escapes its root through `..`, or
/// is empty after normalization.
pub fn normalize(path: &str) -> Option<String> {
  if path.starts_with('/') || path.contains('\\') {
    return None;
  }
  let mut parts: Vec<&str> = Vec::new();
  for component in path.split('/') {
    match component {
      "" | "." => {}
      ".." => {
        parts.pop()?;
      }
      other => parts.push(other),
    }
  }
  if parts.is_empty() {
    return None;
  }
  Some(parts.join("/"))
}

/// Join two relative paths and normalize the result.
///
/// An empty or `.` base yields the normalized `rel`.
pub fn join(base: &str, rel: &str) -> Option<String> {
  match normalize(base) {
    Some(base) => normalize(&format!("{}/{}", base, rel)),
    None if base.is_empty() || base == "." => normalize(rel),
    None => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validate_accepts_normalized_paths() {
    assert!(validate_normalized("a.proto").is_ok());
    assert!(validate_normalized("foo/bar/baz.proto").is_ok());
  }

  #[test]
  fn validate_rejects_unnormalized_paths() {
    assert_eq!(validate_normalized(""), Err("path is empty"));
    assert_eq!(validate_normalized("/abs.proto"), Err("path is absolute"));
    assert_eq!(validate_normalized("a\\b.proto"), Err("path contains a backslash"));
    assert_eq!(validate_normalized("a\nb.proto"), Err("path contains a control character"));
    assert_eq!(validate_normalized("a\rb.proto"), Err("path contains a control character"));
    assert_eq!(validate_normalized("a\tb.proto"), Err("path contains a control character"));
    assert_eq!(validate_normalized("a//b"), Err("path contains an empty component"));
    assert_eq!(validate_normalized("a/"), Err("path contains an empty component"));
    assert_eq!(validate_normalized("./a"), Err("path contains a relative component"));
    assert_eq!(validate_normalized("a/../b"), Err("path contains a relative component"));
  }

  #[test]
  fn normalize_collapses_components() {
    assert_eq!(normalize("a/./b//c/").as_deref(), Some("a/b/c"));
    assert_eq!(normalize("a/x/../b").as_deref(), Some("a/b"));
  }

  #[test]
  fn normalize_rejects_escapes() {
    assert_eq!(normalize("../a"), None);
    assert_eq!(normalize("/a"), None);
    assert_eq!(normalize("."), None);
  }

  #[test]
  fn join_handles_dot_base() {
    assert_eq!(join(".", "a/b.go").as_deref(), Some("a/b.go"));
    assert_eq!(join("", "a/b.go").as_deref(), Some("a/b.go"));
    assert_eq!(join("gen/go", "a/b.go").as_deref(), Some("gen/go/a/b.go"));
    assert_eq!(join("gen", "../../x"), None);
  }
}
