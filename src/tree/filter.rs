// File extension filter for listing leaves

use std::path::Path;

/// Case-insensitive extension match.
///
/// `".stl"`, `"stl"` and `".STL"` all build the same filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extension: String,
}

impl ExtensionFilter {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    /// Extension without the leading dot, lowercased
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_configured_value() {
        assert_eq!(ExtensionFilter::new(".stl").extension(), "stl");
        assert_eq!(ExtensionFilter::new("STL").extension(), "stl");
        assert_eq!(ExtensionFilter::new(".StL"), ExtensionFilter::new("stl"));
    }

    #[test]
    fn test_matches_case_insensitive() {
        let filter = ExtensionFilter::new(".stl");
        assert!(filter.matches(Path::new("a.stl")));
        assert!(filter.matches(Path::new("sub/c.STL")));
        assert!(filter.matches(Path::new("part.Stl")));
    }

    #[test]
    fn test_rejects_other_names() {
        let filter = ExtensionFilter::new(".stl");
        assert!(!filter.matches(Path::new("b.txt")));
        assert!(!filter.matches(Path::new("stl")));
        assert!(!filter.matches(Path::new(".stl")));
        assert!(!filter.matches(Path::new("model.stl.bak")));
        assert!(!filter.matches(Path::new("model.stlx")));
    }
}
