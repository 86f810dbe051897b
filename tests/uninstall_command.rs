#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `uninstall` flow.
//!
//! Components are installed first, then removed through
//! [`Engine::uninstall_tracked`](dotstate::engine::Engine::uninstall_tracked)
//! with the identities picked by [`targets`].

mod common;

use common::{TestRepo, TestRepoBuilder, read};
use dotstate::commands::uninstall::targets;
use dotstate::engine::{RunOptions, RunReport};
use dotstate::logging::ComponentStatus;

const CONFIG: &str = r#"
[profiles."*".zsh]
link = { "zsh/.zshrc" = "~/.zshrc", "zsh/.zshenv" = "~/.zshenv" }

[profiles.dev.ripgrep]
install = { apt = "sudo apt-get install -y ripgrep", pacman = "sudo pacman -S ripgrep" }
uninstall = { apt = "sudo apt-get remove -y ripgrep", pacman = "sudo pacman -R ripgrep" }

[profiles.dev.fzf]
install = { apt = "sudo apt-get install -y fzf" }
"#;

fn installed() -> TestRepo {
    let repo = TestRepoBuilder::new(CONFIG)
        .file("zsh/.zshrc", "autoload -Uz compinit\n")
        .file("zsh/.zshenv", "export PATH\n")
        .program("apt")
        .program("pacman")
        .build();
    let report = repo.install(&["dev"], &[], RunOptions::default());
    assert!(!report.has_failures());
    repo
}

fn uninstall(repo: &TestRepo, terms: &[&str], options: RunOptions) -> RunReport {
    let terms: Vec<String> = terms.iter().map(|t| (*t).to_string()).collect();
    let ids = targets(&repo.state(), &terms);
    repo.engine(options).uninstall_tracked(&ids).unwrap()
}

#[test]
fn uninstall_everything() {
    let repo = installed();

    let report = uninstall(&repo, &[], RunOptions::default());

    assert_eq!(report.count(ComponentStatus::Success), 3);
    assert!(!repo.exists_in_home(".zshrc"));
    assert!(!repo.exists_in_home(".zshenv"));
    assert_eq!(repo.state().entries().count(), 0);
    assert!(
        repo.executor
            .calls()
            .contains(&"sudo apt-get remove -y ripgrep".to_string())
    );
}

#[test]
fn terms_select_what_is_removed() {
    let repo = installed();

    let report = uninstall(&repo, &["zsh"], RunOptions::default());

    assert_eq!(report.results.len(), 1);
    assert_eq!(
        report.get("*.zsh").unwrap().message.as_deref(),
        Some("removed, 2 links removed")
    );
    assert!(repo.state().get("dev.ripgrep").is_some());
}

#[test]
fn recorded_manager_is_preferred() {
    let repo = installed();
    assert_eq!(
        repo.state().get("dev.ripgrep").unwrap().package_manager_used,
        "apt"
    );

    uninstall(&repo, &["ripgrep"], RunOptions::default());

    let calls = repo.executor.calls();
    assert!(calls.contains(&"sudo apt-get remove -y ripgrep".to_string()));
    assert!(!calls.contains(&"sudo pacman -R ripgrep".to_string()));
}

#[test]
fn missing_uninstall_table_warns_and_forgets() {
    let repo = installed();

    let report = uninstall(&repo, &["fzf"], RunOptions::default());

    assert_eq!(
        report.get("dev.fzf").map(|r| r.status),
        Some(ComponentStatus::Success)
    );
    assert!(repo.log.contains("no uninstall command"));
    assert!(repo.state().get("dev.fzf").is_none());
}

#[test]
fn foreign_file_at_link_destination_is_left_alone() {
    let repo = installed();
    std::fs::remove_file(repo.path_in_home(".zshrc")).unwrap();
    std::fs::write(repo.path_in_home(".zshrc"), "hand written\n").unwrap();

    let report = uninstall(&repo, &["zsh"], RunOptions::default());

    assert_eq!(
        report.get("*.zsh").map(|r| r.status),
        Some(ComponentStatus::Success)
    );
    assert_eq!(read(&repo.path_in_home(".zshrc")), "hand written\n");
    assert!(!repo.exists_in_home(".zshenv"));
}

#[test]
fn dry_run_keeps_everything() {
    let repo = installed();
    let lock_before = read(&repo.state_path());
    let calls_before = repo.executor.calls().len();

    let report = uninstall(
        &repo,
        &[],
        RunOptions {
            dry_run: true,
            ..RunOptions::default()
        },
    );

    assert_eq!(report.count(ComponentStatus::DryRun), 3);
    assert!(repo.is_link(".zshrc"));
    assert_eq!(repo.executor.calls().len(), calls_before);
    assert_eq!(read(&repo.state_path()), lock_before);
    assert!(repo.log.contains("would uninstall via apt"));
}

#[test]
fn nothing_tracked_means_nothing_to_do() {
    let repo = TestRepoBuilder::new(CONFIG).build();

    let report = uninstall(&repo, &[], RunOptions::default());

    assert!(report.results.is_empty());
    assert!(repo.executor.calls().is_empty());
}
