pub mod feed;
pub mod options;
pub mod selection;
pub mod sync;

pub use feed::{ProductFeed, ViewState};
pub use options::{derive_options, OptionSet, ReferenceData};
pub use selection::FilterSelection;
