//! Build configuration for completion sessions.
//!
//! Compiler flags come from JSON compilation databases. A database is
//! detected once per build context and kept in a [`BuildConfigCache`] shared
//! by every session of that context.

mod cache;
mod database;
mod error;

pub use cache::{BuildConfigCache, ResolvedFlags};
pub use database::{CompilationDatabase, CompileCommand, DATABASE_FILE_NAME};
pub use error::{BuildConfigError, Result};
