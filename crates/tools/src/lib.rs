//! Repository inspection tools for the reviewer model.
//!
//! The model may ask to read files, search the code, list directories and
//! look at the pull request's metadata. [`ToolDispatcher`] parses each
//! request into a [`ReviewTool`], runs it against the local checkout, and
//! always answers with bounded text: failures are described, never raised.

pub mod bounds;
pub mod checkout;
pub mod dispatcher;
pub mod list_directory;
pub mod pr_context;
pub mod read_file;
pub mod search_code;

pub use checkout::Checkout;
pub use dispatcher::{ReviewTool, ToolDispatcher};
pub use search_code::{CodeSearch, SearchQuery, SearchStrategy};
