// Diagnostic artifacts for failed exact solves: the attempted model in LP
// text form plus a timestamped trace, one file per failure.

use crate::domain::OptimizationProblem;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const MAX_SUFFIX: u32 = 1000;

#[derive(Debug, Clone)]
pub struct DiagnosticSink {
    dir: PathBuf,
}

impl DiagnosticSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `solve_failure_<YYYYmmdd_HHMMSS_fff>.txt` and returns its path.
    /// An existing artifact is never replaced; a name taken within the same
    /// millisecond gets a `_1`, `_2`, ... suffix.
    pub fn record_solve_failure(
        &self,
        problem: &OptimizationProblem,
        trace: &[String],
    ) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let now = Local::now();
        let stem = format!("solve_failure_{}", now.format("%Y%m%d_%H%M%S_%3f"));

        let mut body = String::new();
        body.push_str(&format!("[ERROR] {}\n", now.format("%Y-%m-%d %H:%M:%S")));
        for line in trace {
            body.push_str(line);
            body.push('\n');
        }
        body.push_str("\n--- attempted model ---\n");
        body.push_str(&problem.to_string());

        let (path, mut file) = self.create_unique(&stem)?;
        file.write_all(body.as_bytes())?;
        Ok(path)
    }

    fn create_unique(&self, stem: &str) -> io::Result<(PathBuf, File)> {
        let mut suffix = 0u32;
        loop {
            let name = match suffix {
                0 => format!("{}.txt", stem),
                n => format!("{}_{}.txt", stem, n),
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && suffix < MAX_SUFFIX => {
                    suffix += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
