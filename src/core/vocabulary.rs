//! Discovery of the flags and state keys a tree refers to.

use std::collections::BTreeSet;

use crate::core::variables::extract_variables;
use crate::schema::prerequisites::Prerequisites;
use crate::schema::tree::DialogueTree;

/// Every flag and state key mentioned anywhere in a tree, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryVocabulary {
    pub flags: BTreeSet<String>,
    pub state_keys: BTreeSet<String>,
}

impl StoryVocabulary {
    /// Walk prerequisites, flag/state changes and `{$$var}` tokens.
    pub fn collect(tree: &DialogueTree) -> Self {
        let mut vocab = Self::default();

        for node in tree.nodes.values() {
            vocab.add_text(&node.text);

            for alternate in node.alternate_texts() {
                vocab.add_text(&alternate.text);
                if let Some(p) = &alternate.prerequisites {
                    vocab.add_prerequisites(p);
                }
            }

            for choice in &node.choices {
                vocab.add_text(&choice.text);
                if let Some(p) = &choice.prerequisites {
                    vocab.add_prerequisites(p);
                }
                for alternate in choice.alternate_destinations() {
                    vocab.add_prerequisites(&alternate.prerequisites);
                }
                if let Some(changes) = &choice.flag_changes {
                    vocab.flags.extend(changes.added().iter().cloned());
                    vocab.flags.extend(changes.removed().iter().cloned());
                }
                for change in choice.state_changes() {
                    vocab.state_keys.insert(change.key.clone());
                }
            }
        }

        vocab
    }

    fn add_text(&mut self, text: &str) {
        self.state_keys.extend(extract_variables(text));
    }

    fn add_prerequisites(&mut self, p: &Prerequisites) {
        self.flags.extend(p.required_flags().iter().cloned());
        self.flags.extend(p.blocked_flags().iter().cloned());
        for condition in p.state_conditions() {
            self.state_keys.insert(condition.key.clone());
        }
    }
}
