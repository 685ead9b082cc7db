//! Groupcrop frontend collaborators.
//!
//! Everything the core stays free of: argument parsing, the tag-question
//! configuration, image decoding/encoding, the CSV crop and group logs,
//! and the session orchestrator that wires it all to the queue.

pub mod config;
pub mod io;
pub mod questions;
pub mod record;
pub mod session;

pub use config::{Args, QuestionSet};
pub use session::{CommitError, Session, SessionError, SessionOptions};
