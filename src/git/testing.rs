use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use log::{Level, LevelFilter, Log, Metadata, Record};

use super::{GitError, GitExecutor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub dir: PathBuf,
    pub args: Vec<String>,
}

type Handler = Box<dyn Fn(&Path, &[&str]) -> Result<String, GitError> + Send + Sync>;

/// Records every invocation instead of spawning `git`.
pub struct FakeGit {
    calls: Mutex<Vec<Invocation>>,
    handler: Handler,
}

impl FakeGit {
    pub fn succeeding() -> FakeGit {
        Self::with_handler(|_, _| Ok(String::new()))
    }

    pub fn with_handler(
        handler: impl Fn(&Path, &[&str]) -> Result<String, GitError> + Send + Sync + 'static,
    ) -> FakeGit {
        FakeGit {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// The git subcommand of every invocation, in order.
    pub fn subcommands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| call.args.first().cloned())
            .collect()
    }
}

impl GitExecutor for FakeGit {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        self.calls.lock().unwrap().push(Invocation {
            dir: dir.to_path_buf(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        });
        (self.handler)(dir, args)
    }
}

pub fn failure(args: &[&str], output: &str) -> GitError {
    GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        status: "exit status: 1".to_string(),
        output: output.to_string(),
    }
}

static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

struct CapturingLogger;

impl Log for CapturingLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger;

/// Routes every log record of the test binary into memory.
pub fn capture_logs() {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Trace);
}

/// Levels of the captured records containing `needle`.
pub fn logged_levels(needle: &str) -> Vec<Level> {
    RECORDS
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, message)| message.contains(needle))
        .map(|(level, _)| *level)
        .collect()
}
