//! Builder for constructing single transitions.

use crate::builder::error::BuildError;
use crate::core::{Guard, StateId};
use crate::graph::{Transition, TransitionKind};

/// Builder for constructing transitions with a fluent API.
///
/// Leaving out `.from(..)` makes the transition global.
pub struct TransitionBuilder<C> {
    label: Option<String>,
    source: Option<StateId>,
    result: Option<Option<StateId>>,
    kind: Option<TransitionKind<C>>,
}

impl<C: 'static> TransitionBuilder<C> {
    pub fn new() -> Self {
        Self {
            label: None,
            source: None,
            result: None,
            kind: None,
        }
    }

    /// Human-readable label shown in logs and validation messages.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the source state.
    pub fn from(mut self, source: StateId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the result state.
    pub fn to(mut self, result: StateId) -> Self {
        self.result = Some(Some(result));
        self
    }

    /// End the walk when this transition is taken.
    pub fn to_exit(mut self) -> Self {
        self.result = Some(None);
        self
    }

    pub fn guard(mut self, guard: Guard<C>) -> Self {
        self.kind = Some(TransitionKind::Guarded(guard));
        self
    }

    /// Guard the transition with a closure.
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(predicate))
    }

    /// Always take this transition.
    pub fn always(mut self) -> Self {
        self.kind = Some(TransitionKind::Always);
        self
    }

    /// Take this transition when the source action fails with `tag`.
    pub fn catching(mut self, tag: u32) -> Self {
        self.kind = Some(TransitionKind::Catch(tag));
        self
    }

    pub fn build(self) -> Result<Transition<C>, BuildError> {
        let result = self.result.ok_or(BuildError::MissingResult)?;
        let kind = self.kind.ok_or(BuildError::MissingKind)?;

        Ok(Transition {
            label: self.label,
            source: self.source,
            result,
            kind,
        })
    }
}

impl<C: 'static> Default for TransitionBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_result() {
        let result = TransitionBuilder::<i32>::new()
            .from(StateId::new(1))
            .always()
            .build();
        assert!(matches!(result, Err(BuildError::MissingResult)));
    }

    #[test]
    fn builder_requires_kind() {
        let result = TransitionBuilder::<i32>::new()
            .from(StateId::new(1))
            .to_exit()
            .build();
        assert!(matches!(result, Err(BuildError::MissingKind)));
    }

    #[test]
    fn fluent_api_builds_guarded_transition() {
        let transition = TransitionBuilder::new()
            .label("fs>0")
            .from(StateId::new(1))
            .to(StateId::new(2))
            .when(|fs: &i32| *fs > 0)
            .build()
            .unwrap();

        assert_eq!(transition.label.as_deref(), Some("fs>0"));
        assert_eq!(transition.result, Some(StateId::new(2)));
        assert!(transition.matches(&3));
        assert!(!transition.matches(&0));
    }

    #[test]
    fn missing_source_makes_global() {
        let transition = TransitionBuilder::<i32>::new()
            .catching(9999)
            .to_exit()
            .build()
            .unwrap();
        assert!(transition.is_global());
        assert!(transition.is_exit());
        assert_eq!(transition.catch_tag(), Some(9999));
    }
}
