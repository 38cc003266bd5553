//! Structural self-checks for graphs and the buffers derived from them.
//!
//! Checks run after structural mutations (sort, contraction) in debug builds,
//! and in release builds with the `strict-invariants` feature.

use crate::multicut_error::MulticutError;

/// A type whose internal consistency can be verified on demand.
pub trait DebugInvariants {
    /// Return the first violated invariant, if any.
    fn validate_invariants(&self) -> Result<(), MulticutError>;

    /// Panic on a violated invariant when checks are enabled; a no-op
    /// otherwise.
    #[inline]
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self, std::any::type_name::<Self>());
    }
}

/// Validate `$value` after the operation named by `$op`, panicking with both
/// when checks are enabled.
///
/// ```ignore
/// debug_invariants!(&out, "Graph::contract");
/// ```
#[macro_export]
macro_rules! debug_invariants {
    ($value:expr, $op:expr) => {
        if cfg!(any(debug_assertions, feature = "strict-invariants")) {
            if let Err(e) = $crate::debug_invariants::DebugInvariants::validate_invariants($value) {
                panic!("[invariants] after {}: {}", $op, e);
            }
        }
    };
}
