//! Parsing options and configuration.

/// Options for parsing presentation packages.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Largest uncompressed size accepted for a single part, in bytes (0 = unlimited)
    pub max_part_bytes: u64,

    /// Largest uncompressed size accepted for the whole package, in bytes (0 = unlimited)
    pub max_package_bytes: u64,

    /// Whether to decode slide shapes and text into the DOM
    pub parse_slides: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-part size limit in MB.
    pub fn with_part_limit_mb(mut self, mb: u64) -> Self {
        self.max_part_bytes = mb * 1024 * 1024;
        self
    }

    /// Set the package size limit in MB.
    pub fn with_package_limit_mb(mut self, mb: u64) -> Self {
        self.max_package_bytes = mb * 1024 * 1024;
        self
    }

    /// Remove both size limits.
    pub fn unlimited(mut self) -> Self {
        self.max_part_bytes = 0;
        self.max_package_bytes = 0;
        self
    }

    /// Only index parts and relationships, skip slide decoding.
    pub fn structure_only(mut self) -> Self {
        self.parse_slides = false;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_part_bytes: 64 * 1024 * 1024,
            max_package_bytes: 512 * 1024 * 1024,
            parse_slides: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .with_part_limit_mb(2)
            .with_package_limit_mb(10)
            .structure_only();

        assert_eq!(options.max_part_bytes, 2 * 1024 * 1024);
        assert_eq!(options.max_package_bytes, 10 * 1024 * 1024);
        assert!(!options.parse_slides);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert!(options.parse_slides);
        assert!(options.max_part_bytes > 0);

        let unlimited = options.unlimited();
        assert_eq!(unlimited.max_part_bytes, 0);
        assert_eq!(unlimited.max_package_bytes, 0);
    }
}
