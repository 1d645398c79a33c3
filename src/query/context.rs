use crate::config::QueryConfig;

/// Per-level state while building a query and its sub-queries
///
/// `depth` is the number of groups enclosing the level being built, plus
/// one: the top level is depth 1, the inside of a top-level group depth 2.
/// A group found at some level is therefore nested `depth` deep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    pub depth: usize,
    pub depth_limit: usize,
    pub free_tags_count: usize,
    pub resolve_aliases: bool,
    pub return_with_data: bool,
    pub error_on_depth_exceeded: bool,
}

impl ParseContext {
    #[must_use]
    pub fn root(config: &QueryConfig) -> Self {
        Self {
            depth: 1,
            depth_limit: config.effective_depth_limit(),
            free_tags_count: config.free_tags_count,
            resolve_aliases: config.resolve_aliases,
            return_with_data: config.return_with_data,
            error_on_depth_exceeded: config.error_on_depth_exceeded,
        }
    }

    /// Context for the inside of a group at this level
    ///
    /// Sub-queries always carry their partial result on errors, so the
    /// parent can keep what was built before the budget ran out.
    #[must_use]
    pub const fn child(&self, free_tags_count: usize) -> Self {
        Self {
            depth: self.depth + 1,
            free_tags_count,
            return_with_data: true,
            ..*self
        }
    }

    /// Same level, after `levels` enclosing groups were unwrapped
    #[must_use]
    pub const fn deeper(&self, levels: usize) -> Self {
        Self {
            depth: self.depth + levels,
            ..*self
        }
    }

    /// Group levels still available below this one
    #[must_use]
    pub const fn remaining_levels(&self) -> usize {
        (self.depth_limit + 1).saturating_sub(self.depth)
    }

    /// Whether a group found at this level is nested past the limit
    #[must_use]
    pub const fn group_exceeds_limit(&self) -> bool {
        self.depth > self.depth_limit
    }
}
