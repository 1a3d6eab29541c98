//! Layout options and configuration.

/// Options for overflow resolution.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Font size decrement per shrink step, in points
    pub shrink_step: f32,

    /// Global font floor, in points; a placeholder's `min-size` raises it
    pub min_font_size: f32,

    /// Maximum number of continuation slides appended per job
    pub max_continuation_pages: usize,
}

impl LayoutOptions {
    /// Create new layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shrink step.
    pub fn with_shrink_step(mut self, step: f32) -> Self {
        self.shrink_step = step.max(0.1);
        self
    }

    /// Set the global font floor.
    pub fn with_min_font_size(mut self, size: f32) -> Self {
        self.min_font_size = size.max(1.0);
        self
    }

    /// Set the continuation page limit.
    pub fn with_max_continuation_pages(mut self, pages: usize) -> Self {
        self.max_continuation_pages = pages;
        self
    }

    /// Disable pagination.
    pub fn without_pagination(mut self) -> Self {
        self.max_continuation_pages = 0;
        self
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            shrink_step: 1.0,
            min_font_size: 8.0,
            max_continuation_pages: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = LayoutOptions::default();
        assert_eq!(opts.shrink_step, 1.0);
        assert_eq!(opts.min_font_size, 8.0);
        assert_eq!(opts.max_continuation_pages, 8);
    }

    #[test]
    fn test_builder_clamps() {
        let opts = LayoutOptions::new()
            .with_shrink_step(0.0)
            .with_min_font_size(-3.0)
            .without_pagination();
        assert_eq!(opts.shrink_step, 0.1);
        assert_eq!(opts.min_font_size, 1.0);
        assert_eq!(opts.max_continuation_pages, 0);
    }
}
