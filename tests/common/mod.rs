// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed test repository, home directory and
// lock file, plus a recording executor, so each integration test can run the
// engine in-process without touching the real system.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dotstate::config::Config;
use dotstate::config::profiles::{Resolution, resolve};
use dotstate::engine::{Context, Engine, RunOptions, RunReport};
use dotstate::exec::{ExecResult, Executor, never_interactive};
use dotstate::logging::{Log, MemoryLog};
use dotstate::platform::{Os, Platform};
use dotstate::state::{LOCK_FILE_NAME, StateStore};

/// Executor that records commands instead of running them.
///
/// Programs in `available` are reported as present on PATH; commands
/// containing any `failing` substring exit 1 with `stderr` set.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub available: BTreeSet<String>,
    pub failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    fn exec(&self, command: &str) -> ExecResult {
        self.calls
            .lock()
            .expect("calls lock")
            .push(command.to_string());
        let fail = self.failing.iter().any(|f| command.contains(f.as_str()));
        ExecResult {
            stdout: String::new(),
            stderr: if fail {
                format!("{command}: failed")
            } else {
                String::new()
            },
            success: !fail,
            code: Some(i32::from(fail)),
        }
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, command: &str) -> anyhow::Result<ExecResult> {
        Ok(self.exec(command))
    }

    fn run_interactive(&self, command: &str) -> anyhow::Result<ExecResult> {
        Ok(self.exec(command))
    }

    fn which(&self, program: &str) -> bool {
        self.available.contains(program)
    }
}

/// An isolated repository, home directory and lock file backed by a
/// [`tempfile::TempDir`].
pub struct TestRepo {
    dir: tempfile::TempDir,
    os: Os,
    pub executor: Arc<RecordingExecutor>,
    pub log: Arc<MemoryLog>,
}

impl TestRepo {
    /// Repository root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("repo")
    }

    /// Simulated home directory.
    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// Lock file path.
    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("state").join(LOCK_FILE_NAME)
    }

    /// Replace `dotstate.toml`.
    pub fn write_config(&self, toml: &str) {
        std::fs::write(self.root().join("dotstate.toml"), toml).expect("write config");
    }

    /// Write a file under the repository root.
    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
        std::fs::write(path, content).expect("write file");
    }

    pub fn config(&self) -> Config {
        let root = self.root();
        Config::load(&root, &root.join("dotstate.toml")).expect("load config")
    }

    pub fn resolve(&self, profiles: &[&str], terms: &[&str]) -> Resolution {
        let profiles: Vec<String> = profiles.iter().map(|p| (*p).to_string()).collect();
        let terms: Vec<String> = terms.iter().map(|t| (*t).to_string()).collect();
        resolve(&self.config(), &profiles, &terms, &self.os).expect("resolve")
    }

    pub fn state(&self) -> StateStore {
        StateStore::load(&self.state_path()).expect("load state")
    }

    pub fn engine(&self, options: RunOptions) -> Engine {
        let ctx = Context::with_home(
            Arc::new(self.config()),
            Platform::new(self.os.clone()),
            Arc::clone(&self.log) as Arc<dyn Log>,
            Arc::clone(&self.executor) as Arc<dyn Executor>,
            options,
            self.home(),
        )
        .with_interactive(never_interactive());
        Engine::new(ctx, self.state())
    }

    /// Converge `profiles` (narrowed by `terms`) and uninstall what is no
    /// longer configured, the way `dotstate install` does.
    pub fn install(&self, profiles: &[&str], terms: &[&str], options: RunOptions) -> RunReport {
        let selected = self.resolve(profiles, terms);
        let full = self.resolve(profiles, &[]);
        self.engine(options)
            .run(&selected.components, &full.identities())
            .expect("run")
    }

    /// Whether `relative` under the home directory is a symlink.
    pub fn is_link(&self, relative: &str) -> bool {
        self.home()
            .join(relative)
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
    }

    pub fn link_target(&self, relative: &str) -> PathBuf {
        std::fs::read_link(self.home().join(relative)).expect("read link")
    }

    pub fn exists_in_home(&self, relative: &str) -> bool {
        self.home().join(relative).symlink_metadata().is_ok()
    }

    pub fn path_in_home(&self, relative: &str) -> PathBuf {
        self.home().join(relative)
    }
}

/// Fluent builder for [`TestRepo`].
pub struct TestRepoBuilder {
    config: String,
    files: Vec<(String, String)>,
    programs: Vec<String>,
    failing: Vec<String>,
    os: Os,
}

impl TestRepoBuilder {
    pub fn new(config: &str) -> Self {
        Self {
            config: config.to_string(),
            files: Vec::new(),
            programs: Vec::new(),
            failing: Vec::new(),
            os: Os::Linux,
        }
    }

    /// Add a file under the repository root.
    #[must_use]
    pub fn file(mut self, relative: &str, content: &str) -> Self {
        self.files.push((relative.to_string(), content.to_string()));
        self
    }

    /// Report `program` as present on PATH.
    #[must_use]
    pub fn program(mut self, program: &str) -> Self {
        self.programs.push(program.to_string());
        self
    }

    /// Make commands containing `marker` fail.
    #[must_use]
    pub fn failing(mut self, marker: &str) -> Self {
        self.failing.push(marker.to_string());
        self
    }

    /// Simulate running on `os`.
    #[must_use]
    pub fn os(mut self, os: Os) -> Self {
        self.os = os;
        self
    }

    pub fn build(self) -> TestRepo {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("repo")).expect("create repo");
        std::fs::create_dir_all(dir.path().join("home")).expect("create home");
        let repo = TestRepo {
            dir,
            os: self.os,
            executor: Arc::new(RecordingExecutor {
                available: self.programs.into_iter().collect(),
                failing: self.failing,
                calls: Mutex::new(Vec::new()),
            }),
            log: Arc::new(MemoryLog::new()),
        };
        repo.write_config(&self.config);
        for (relative, content) in &self.files {
            repo.write_file(relative, content);
        }
        repo
    }
}

/// Read a whole file, for before/after comparisons.
pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read file")
}
