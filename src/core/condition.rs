//! Condition evaluation and first-match selection.
//!
//! `first match in authored order` is the only priority rule in the engine:
//! alternate texts, alternate destinations and choice availability all go
//! through [`evaluate`] and [`select_first_match`].

use crate::schema::choice::{AlternateDestination, DialogueChoice};
use crate::schema::prerequisites::{Prerequisites, StateCondition};
use crate::schema::state::{FlagSet, GameState};
use crate::schema::tree::AlternateText;

/// Anything whose availability is decided by optional prerequisites.
pub trait Gated {
    fn prerequisites(&self) -> Option<&Prerequisites>;
}

impl Gated for AlternateText {
    fn prerequisites(&self) -> Option<&Prerequisites> {
        self.prerequisites.as_ref()
    }
}

impl Gated for AlternateDestination {
    fn prerequisites(&self) -> Option<&Prerequisites> {
        Some(&self.prerequisites)
    }
}

impl Gated for DialogueChoice {
    fn prerequisites(&self) -> Option<&Prerequisites> {
        self.prerequisites.as_ref()
    }
}

/// Decide whether `prerequisites` hold for the given flags and state.
///
/// Absent prerequisites always hold. Otherwise every required flag must be
/// set, no blocked flag may be set, and every state condition must hold.
pub fn evaluate(prerequisites: Option<&Prerequisites>, flags: &FlagSet, state: &GameState) -> bool {
    let Some(p) = prerequisites else {
        return true;
    };

    p.required_flags().iter().all(|flag| flags.contains(flag))
        && !p.blocked_flags().iter().any(|flag| flags.contains(flag))
        && p
            .state_conditions()
            .iter()
            .all(|condition| condition_holds(condition, state))
}

/// Compare `state[key]` (0 when absent) against the condition's value.
pub fn condition_holds(condition: &StateCondition, state: &GameState) -> bool {
    condition
        .operator
        .compare(state.get(&condition.key), condition.value)
}

/// First candidate, in iteration order, whose prerequisites hold.
pub fn select_first_match<'a, T, I>(candidates: I, flags: &FlagSet, state: &GameState) -> Option<&'a T>
where
    T: Gated + 'a,
    I: IntoIterator<Item = &'a T>,
{
    candidates
        .into_iter()
        .find(|candidate| evaluate(candidate.prerequisites(), flags, state))
}
