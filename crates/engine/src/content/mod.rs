mod atomic_io;
mod compiler;
mod database;
mod discovery;
mod hashing;
mod manifest;
mod pipeline;
mod types;

pub use atomic_io::write_text_atomic;
pub use compiler::{compile_def_database, ContentCompileError, ContentErrorCode, SourceLocation};
pub use database::{DefDatabase, EntityArchetype, EntityDefId};
pub use pipeline::{
    build_or_load_def_database, load_or_compile_def_database, CacheDecision, ContentPipelineError,
    RebuildReason,
};
pub use types::{ContentPlanError, ContentPlanRequest};
