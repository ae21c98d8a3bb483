//! CLI command implementations.
//!
//! Each submodule implements one stage of the batch:
//! - [`extract`] - Grid extraction into the dataset
//! - [`check`] - The missing-field, below-average and follow-up checks
//! - [`dates`] - Date label listing for one sheet

pub mod check;
pub mod dates;
pub mod extract;

pub use check::CheckCommand;
pub use dates::DatesCommand;
pub use extract::ExtractCommand;
