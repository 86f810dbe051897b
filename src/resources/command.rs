//! Shell-command resource: install, uninstall, and hook commands.
use anyhow::Result;

use super::{Applicable, ResourceChange};
use crate::error::ComponentError;
use crate::exec::Executor;
use crate::logging::Log;

/// A shell command run through the [`Executor`].
///
/// Commands have no queryable state, so this only implements [`Applicable`].
/// A non-zero exit surfaces as [`ComponentError::CommandFailed`] inside the
/// returned `anyhow::Error`.
#[derive(Debug)]
pub struct CommandResource<'a> {
    stage: &'a str,
    command: &'a str,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
    interactive: bool,
}

impl<'a> CommandResource<'a> {
    /// Create a command resource for `stage` (`install`, `postLink`, …).
    #[must_use]
    pub const fn new(
        stage: &'a str,
        command: &'a str,
        executor: &'a dyn Executor,
        log: &'a dyn Log,
    ) -> Self {
        Self {
            stage,
            command,
            executor,
            log,
            interactive: false,
        }
    }

    /// Attach the command to the terminal instead of capturing its output.
    #[must_use]
    pub const fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    fn failed(&self, code: i32, output: String) -> ComponentError {
        ComponentError::CommandFailed {
            stage: self.stage.to_string(),
            command: self.command.to_string(),
            code,
            output,
        }
    }
}

impl Applicable for CommandResource<'_> {
    fn description(&self) -> String {
        format!("{}: {}", self.stage, self.command)
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.log.debug(&format!("running {}", self.description()));
        let result = if self.interactive {
            self.log.before_interactive();
            let result = self.executor.run_interactive(self.command);
            self.log.after_interactive();
            result
        } else {
            self.executor.run(self.command)
        };

        let result = match result {
            Ok(result) => result,
            Err(e) => return Err(self.failed(-1, format!("{e:#}")).into()),
        };
        if result.success {
            Ok(ResourceChange::Applied)
        } else {
            Err(self
                .failed(result.code.unwrap_or(-1), result.combined_output())
                .into())
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::{ExecResult, MockExecutor};
    use crate::logging::{LogLine, MemoryLog};

    fn exit(code: i32, stderr: &str) -> ExecResult {
        ExecResult {
            stdout: String::new(),
            stderr: stderr.to_string(),
            success: code == 0,
            code: Some(code),
        }
    }

    #[test]
    fn success_is_applied() {
        let mut executor = MockExecutor::new();
        executor
            .expect_run()
            .withf(|cmd| cmd == "brew install ripgrep")
            .returning(|_| Ok(exit(0, "")));
        let log = MemoryLog::new();
        let res = CommandResource::new("install", "brew install ripgrep", &executor, &log);
        assert_eq!(res.apply().unwrap(), ResourceChange::Applied);
    }

    #[test]
    fn failure_carries_code_and_output() {
        let mut executor = MockExecutor::new();
        executor
            .expect_run()
            .returning(|_| Ok(exit(2, "no such formula")));
        let log = MemoryLog::new();
        let err = CommandResource::new("install", "brew install nope", &executor, &log)
            .apply()
            .unwrap_err();
        let component = err.downcast::<ComponentError>().unwrap();
        assert_eq!(
            component,
            ComponentError::CommandFailed {
                stage: "install".to_string(),
                command: "brew install nope".to_string(),
                code: 2,
                output: "no such formula".to_string(),
            }
        );
    }

    #[test]
    fn spawn_error_is_command_failed() {
        let mut executor = MockExecutor::new();
        executor
            .expect_run()
            .returning(|_| Err(anyhow::anyhow!("no shell")));
        let log = MemoryLog::new();
        let err = CommandResource::new("postLink", "x", &executor, &log)
            .apply()
            .unwrap_err();
        assert!(matches!(
            err.downcast::<ComponentError>().unwrap(),
            ComponentError::CommandFailed { code: -1, .. }
        ));
    }

    #[test]
    fn interactive_runs_between_callbacks() {
        let mut executor = MockExecutor::new();
        executor.expect_run().never();
        executor
            .expect_run_interactive()
            .times(1)
            .returning(|_| Ok(exit(0, "")));
        let log = MemoryLog::new();
        CommandResource::new("install", "sudo apt-get install -y zsh", &executor, &log)
            .interactive(true)
            .apply()
            .unwrap();
        let markers: Vec<LogLine> = log
            .lines()
            .into_iter()
            .filter(|l| matches!(l, LogLine::BeforeInteractive | LogLine::AfterInteractive))
            .collect();
        assert_eq!(markers, [LogLine::BeforeInteractive, LogLine::AfterInteractive]);
    }
}
