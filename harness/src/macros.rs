//! Macros for harness error handling.
//!
//! Provides convenience macros for creating and returning
//! [`crate::error::HarnessError`] instances with reduced boilerplate.

/// Creates a [`crate::error::HarnessError`] from error kind and description.
///
/// An optional third argument supplies dynamic detail, and `source:` attaches
/// an originating error.
#[macro_export]
macro_rules! harness_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::HarnessError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::HarnessError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::HarnessError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::HarnessError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates and returns a [`crate::error::HarnessError`] from the current function.
///
/// Combines error creation with early return. Supports the same optional detail
/// and source arguments as [`harness_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::harness_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::harness_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::harness_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::harness_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
