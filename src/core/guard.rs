//! Guard predicates for controlling transitions.
//!
//! Guards are pure boolean functions over the execution context. A guarded
//! transition is taken when its guard holds for the context as it stands
//! after the source state's action has run.

use std::fmt;
use std::sync::Arc;

type Predicate<C> = dyn Fn(&C) -> bool + Send + Sync;

/// Pure predicate that decides whether a transition is taken.
///
/// # Example
///
/// ```rust
/// use gameflow::core::Guard;
///
/// struct Spin {
///     free_spins: i32,
/// }
///
/// let has_free_spins = Guard::new(|ctx: &Spin| ctx.free_spins > 0);
///
/// assert!(has_free_spins.check(&Spin { free_spins: 3 }));
/// assert!(!has_free_spins.check(&Spin { free_spins: 0 }));
/// ```
pub struct Guard<C> {
    predicate: Arc<Predicate<C>>,
}

impl<C> Guard<C> {
    /// Create a guard from a predicate.
    ///
    /// The predicate should be deterministic and free of side effects.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// A guard that always holds.
    pub fn always() -> Self
    where
        C: 'static,
    {
        Guard::new(|_| true)
    }

    /// Evaluate the guard against a context.
    pub fn check(&self, context: &C) -> bool {
        (self.predicate)(context)
    }

    /// Whether both guards share the same predicate.
    pub(crate) fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Guard {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
