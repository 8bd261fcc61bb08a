//! Save handling: filtering save events and running the formatter.

pub mod invoker;
pub mod router;

pub use invoker::{FormatInvoker, FormatRequest, FormatResult};
pub use router::{is_supported, SaveEventRouter, SaveOutcome, SavedDocument, SUPPORTED_LANGUAGES};
