//! Transition edges between states.

use crate::core::{ActionError, Guard, StateId};
use std::fmt;

/// What decides whether a transition is taken.
pub enum TransitionKind<C> {
    /// Taken when the guard holds for the context.
    Guarded(Guard<C>),
    /// Always taken. Must be the last ordinary transition of its source.
    Always,
    /// Taken after the source action failed with this tag.
    Catch(u32),
}

impl<C> Clone for TransitionKind<C> {
    fn clone(&self) -> Self {
        match self {
            TransitionKind::Guarded(guard) => TransitionKind::Guarded(guard.clone()),
            TransitionKind::Always => TransitionKind::Always,
            TransitionKind::Catch(tag) => TransitionKind::Catch(*tag),
        }
    }
}

impl<C> fmt::Debug for TransitionKind<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Guarded(_) => f.write_str("Guarded"),
            TransitionKind::Always => f.write_str("Always"),
            TransitionKind::Catch(tag) => write!(f, "Catch({tag})"),
        }
    }
}

/// An edge from a source state to a result state.
///
/// A missing source makes the transition global: it is considered from
/// every state. A missing result means exit: taking the transition ends
/// the walk.
///
/// # Example
///
/// ```rust
/// use gameflow::core::Guard;
/// use gameflow::graph::Transition;
///
/// let to_exit: Transition<i32> =
///     Transition::guarded("negative", Guard::new(|n: &i32| *n < 0), None, None);
///
/// assert!(to_exit.is_global());
/// assert!(to_exit.is_exit());
/// assert!(to_exit.matches(&-1));
/// assert!(!to_exit.matches(&1));
/// ```
pub struct Transition<C> {
    pub label: Option<String>,
    pub source: Option<StateId>,
    pub result: Option<StateId>,
    pub kind: TransitionKind<C>,
}

impl<C> Transition<C> {
    pub fn guarded(
        label: impl Into<String>,
        guard: Guard<C>,
        source: Option<StateId>,
        result: Option<StateId>,
    ) -> Self {
        Self {
            label: Some(label.into()),
            source,
            result,
            kind: TransitionKind::Guarded(guard),
        }
    }

    /// An always-true transition.
    pub fn direct(source: Option<StateId>, result: Option<StateId>) -> Self {
        Self {
            label: None,
            source,
            result,
            kind: TransitionKind::Always,
        }
    }

    /// A transition taken when the source action fails with `tag`.
    pub fn catching(
        label: impl Into<String>,
        tag: u32,
        source: Option<StateId>,
        result: Option<StateId>,
    ) -> Self {
        Self {
            label: Some(label.into()),
            source,
            result,
            kind: TransitionKind::Catch(tag),
        }
    }

    pub fn is_global(&self) -> bool {
        self.source.is_none()
    }

    pub fn is_exit(&self) -> bool {
        self.result.is_none()
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.kind, TransitionKind::Always)
    }

    pub fn is_exception(&self) -> bool {
        matches!(self.kind, TransitionKind::Catch(_))
    }

    /// The caught tag, for exception transitions.
    pub fn catch_tag(&self) -> Option<u32> {
        match self.kind {
            TransitionKind::Catch(tag) => Some(tag),
            _ => None,
        }
    }

    /// Whether this ordinary transition is taken for the context.
    ///
    /// Exception transitions never match here.
    pub fn matches(&self, context: &C) -> bool {
        match &self.kind {
            TransitionKind::Guarded(guard) => guard.check(context),
            TransitionKind::Always => true,
            TransitionKind::Catch(_) => false,
        }
    }

    /// Whether this exception transition handles the failure.
    pub fn catches(&self, error: &ActionError) -> bool {
        self.catch_tag() == Some(error.tag())
    }

    /// Text shown for the edge: its label, `always` for direct edges, or
    /// `catch:<tag>` for unlabeled exception edges.
    pub fn display_label(&self) -> String {
        match (&self.label, &self.kind) {
            (Some(label), _) => label.clone(),
            (None, TransitionKind::Catch(tag)) => format!("catch:{tag}"),
            (None, _) => "always".to_string(),
        }
    }
}

impl<C> Clone for Transition<C> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            source: self.source,
            result: self.result,
            kind: self.kind.clone(),
        }
    }
}

impl<C> fmt::Debug for Transition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("label", &self.label)
            .field("source", &self.source)
            .field("result", &self.result)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_transition_follows_guard() {
        let t = Transition::guarded(
            "fs>0",
            Guard::new(|fs: &i32| *fs > 0),
            Some(StateId::new(1)),
            Some(StateId::new(2)),
        );
        assert!(t.matches(&1));
        assert!(!t.matches(&0));
        assert!(!t.is_global());
        assert!(!t.is_exit());
    }

    #[test]
    fn direct_transition_always_matches() {
        let t: Transition<i32> = Transition::direct(Some(StateId::new(1)), None);
        assert!(t.is_direct());
        assert!(t.is_exit());
        assert!(t.matches(&-100));
        assert_eq!(t.display_label(), "always");
    }

    #[test]
    fn exception_transition_never_matches_context() {
        let t: Transition<i32> =
            Transition::catching("jam", 9999, Some(StateId::new(1)), Some(StateId::new(2)));
        assert!(t.is_exception());
        assert!(!t.matches(&0));
        assert!(t.catches(&ActionError::new(9999, "jammed")));
        assert!(!t.catches(&ActionError::new(1, "other")));
    }

    #[test]
    fn ordinary_transitions_catch_nothing() {
        let t: Transition<i32> = Transition::direct(Some(StateId::new(1)), None);
        assert!(!t.catches(&ActionError::msg("boom")));
        assert_eq!(t.catch_tag(), None);
    }

    #[test]
    fn unlabeled_exception_displays_tag() {
        let mut t: Transition<()> = Transition::catching("x", 7, None, None);
        t.label = None;
        assert_eq!(t.display_label(), "catch:7");
    }
}
