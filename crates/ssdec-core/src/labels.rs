//! Class label resolution.

use std::path::Path;

/// Ordered class-index to name table.
///
/// Loaded from a newline-delimited label file; a missing or empty table is
/// fine, resolution falls back to the numeric index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    names: Vec<String>,
}

impl LabelMap {
    /// An empty map; every class resolves to its numeric index.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse newline-delimited label text. Lines are trimmed, blank lines
    /// skipped.
    pub fn from_lines(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    /// Load labels from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(&text))
    }

    /// Resolve a class index to its label.
    ///
    /// Out-of-range or negative indices resolve to the stringified index;
    /// resolution never fails.
    pub fn resolve(&self, class_id: i64) -> String {
        usize::try_from(class_id)
            .ok()
            .and_then(|i| self.names.get(i))
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }

    /// Label for an index, if present.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the map holds no labels.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn parses_lines_and_skips_blanks() {
        let map = LabelMap::from_lines("cat\n\n  dog  \nbird\n");
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(1), Some("dog"));
    }

    #[test]
    fn resolves_with_numeric_fallback() {
        let map = LabelMap::from_lines("cat\ndog\nbird");
        assert_eq!(map.resolve(0), "cat");
        assert_eq!(map.resolve(7), "7");
        assert_eq!(map.resolve(-1), "-1");
    }

    #[test]
    fn empty_map_always_falls_back() {
        let map = LabelMap::empty();
        assert!(map.is_empty());
        assert_eq!(map.resolve(3), "3");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "person\nbicycle\ncar").unwrap();
        let map = LabelMap::from_file(file.path()).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.resolve(2), "car");
    }
}
