//! Exit codes for `uberjar`.
//! These codes are part of the public contract; scripts branch on them.
//! Failure codes are defined in `uberjar_core::error`.

pub use uberjar_core::error::{EXIT_CONFIG_ERROR, EXIT_INPUT_ERROR, EXIT_WRITE_FAILURE};

pub const EXIT_SUCCESS: i32 = 0;
