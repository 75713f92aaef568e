// Infrastructure: logging setup and on-disk diagnostics

pub mod diagnostics;
pub mod logging;

pub use diagnostics::DiagnosticSink;
