//! Error handling foundation.
//!
//! Only the `Result` alias lives here. Domain error enums belong to the
//! crate that raises them; callers attach layer-appropriate context with
//! rootcause's `.context()` while an error travels up.

use rootcause::Report;

/// Result alias over rootcause's `Report`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
