/// Element budget used when formatting for display.
pub const DEFAULT_MAX_ELEMENT_COUNT: usize = 1024;

/// Options for formatting whole buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Total elements emitted across the whole nested structure before the
    /// remaining dimensions are cut short with `...`.
    pub max_element_count: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_element_count: DEFAULT_MAX_ELEMENT_COUNT,
        }
    }
}

impl FormatOptions {
    /// Emit every element.
    pub fn unlimited() -> Self {
        Self {
            max_element_count: usize::MAX,
        }
    }

    pub fn with_max_element_count(mut self, max_element_count: usize) -> Self {
        self.max_element_count = max_element_count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(FormatOptions::default().max_element_count, 1024);
        assert_eq!(FormatOptions::unlimited().max_element_count, usize::MAX);
        assert_eq!(
            FormatOptions::default()
                .with_max_element_count(4)
                .max_element_count,
            4
        );
    }
}
