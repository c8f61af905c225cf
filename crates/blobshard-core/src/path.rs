use std::fmt;

/// Hierarchical location of a blob container inside a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BlobPath {
    segments: Vec<String>,
}

impl BlobPath {
    /// The root path.
    pub fn new() -> Self {
        Self::default()
    }

    /// A child path with `segment` appended.
    pub fn add(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments joined with `separator`, no trailing separator.
    pub fn build_as_string(&self, separator: &str) -> String {
        self.segments.join(separator)
    }

    /// Key prefix of everything under this path: `a/b/`, or the empty string
    /// for the root.
    pub fn as_key_prefix(&self) -> String {
        let joined = self.build_as_string("/");
        if joined.is_empty() {
            joined
        } else {
            joined + "/"
        }
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.build_as_string("]["))
    }
}

impl From<&str> for BlobPath {
    /// Split on `/`, ignoring empty segments.
    fn from(s: &str) -> Self {
        Self {
            segments: s
                .split('/')
                .filter(|seg| !seg.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prefix_has_trailing_slash() {
        let path = BlobPath::new().add("a").add("b");
        assert_eq!(path.build_as_string("/"), "a/b");
        assert_eq!(path.as_key_prefix(), "a/b/");
    }

    #[test]
    fn root_key_prefix_is_empty() {
        assert_eq!(BlobPath::new().as_key_prefix(), "");
        assert!(BlobPath::from("").is_root());
    }

    #[test]
    fn parse_ignores_empty_segments() {
        let path = BlobPath::from("/indices//0/");
        assert_eq!(path.segments(), &["indices".to_string(), "0".to_string()]);
        assert_eq!(path.as_key_prefix(), "indices/0/");
    }

    #[test]
    fn add_leaves_parent_untouched() {
        let parent = BlobPath::from("snapshots");
        let child = parent.add("meta");
        assert_eq!(parent.as_key_prefix(), "snapshots/");
        assert_eq!(child.as_key_prefix(), "snapshots/meta/");
    }
}
