//! Invariant checks shared by the topology store and the fracture descriptor.
//!
//! Checks are always available through [`DebugInvariants::validate_invariants`];
//! the panicking form only fires in debug builds or with the
//! `check-invariants` / `strict-invariants` features.

use crate::mesh_error::MeshFractureError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), MeshFractureError>;

    /// Panic on a broken invariant when invariant checking is enabled.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(
            self.validate_invariants(),
            "{}",
            std::any::type_name::<Self>()
        );
    }
}

/// Run a fallible check and panic with context on error when invariant
/// checking is enabled; compiles to nothing otherwise.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!("[invariants] {}: {}", format_args!($($ctx)*), e);
        }
    };
}
