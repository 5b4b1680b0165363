pub mod document;
pub mod events;
pub mod render;
pub mod app;

pub use document::{Document, DocumentError, Page};
pub use events::{Event, EventKind, FormSubmission};
pub use app::{App, AppError, INVALID_INPUT_MESSAGE};
