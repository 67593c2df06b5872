//! Bazel interaction module.

mod detect;
mod executor;

pub use detect::find_bazel;
pub use executor::{parse_info_output, BazelExecutor, BazelInfo, Verbosity};
