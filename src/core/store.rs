//! Persistence port for the authoring host.
//!
//! The engine never loads or saves on its own; hosts (browser storage, file
//! pickers, test harnesses) implement [`TreeStore`] and call it themselves.

use crate::schema::tree::DialogueTree;

pub trait TreeStore {
    /// The last saved tree, if any.
    fn load(&self) -> Option<DialogueTree>;
    fn save(&mut self, tree: &DialogueTree);
}

/// Keeps the most recent save in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<DialogueTree>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree(tree: DialogueTree) -> Self {
        Self {
            saved: Some(tree),
            saves: 0,
        }
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl TreeStore for MemoryStore {
    fn load(&self) -> Option<DialogueTree> {
        self.saved.clone()
    }

    fn save(&mut self, tree: &DialogueTree) {
        self.saved = Some(tree.clone());
        self.saves += 1;
    }
}
