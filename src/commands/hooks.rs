//! # Setup-Hooks Command Implementation
//!
//! Installs a git `pre-commit` hook that runs `conventions format-check`
//! before each commit, so unformatted sources never reach the repository.
//!
//! The hook script carries a marker line. An existing hook with the marker is
//! ours and is only replaced with `--force`; a foreign hook is moved to
//! `pre-commit.backup` first, and only with `--force`.

use anyhow::Result;
use clap::Args;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Install the conventions pre-commit hook
#[derive(Args, Debug)]
pub struct SetupHooksArgs {
    /// Path to the Git repository (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Overwrite an existing hook (a foreign hook is backed up first)
    #[arg(long)]
    pub force: bool,
}

/// Hook marker comment to identify conventions hooks
const HOOK_MARKER: &str = "# conventions-hook";

fn generate_hook_script() -> String {
    format!(
        r#"#!/bin/sh
{HOOK_MARKER}
# Installed by 'conventions setup-hooks'. Checks formatting before each commit.
# Reinstall with: conventions setup-hooks --force

if ! command -v conventions >/dev/null 2>&1; then
    echo "Warning: conventions not found in PATH, skipping format check"
    exit 0
fi

if [ ! -f ".conventions.yaml" ]; then
    exit 0
fi

if ! conventions format-check; then
    echo ""
    echo "Formatting check failed. Run 'conventions format-apply' to fix it,"
    echo "or use 'git commit --no-verify' to skip this check."
    exit 1
fi
"#
    )
}

/// Find the .git directory for a repository
fn find_git_dir(repo_path: &Path) -> Result<PathBuf> {
    let git_dir = repo_path.join(".git");

    if git_dir.is_dir() {
        Ok(git_dir)
    } else if git_dir.is_file() {
        // Worktree or submodule: .git names the real git dir
        let content = fs::read_to_string(&git_dir)?;
        let gitdir = content
            .strip_prefix("gitdir: ")
            .ok_or_else(|| anyhow::anyhow!("Invalid .git file format"))?
            .trim();

        let path = if Path::new(gitdir).is_absolute() {
            PathBuf::from(gitdir)
        } else {
            repo_path.join(gitdir)
        };

        Ok(path)
    } else {
        Err(anyhow::anyhow!(
            "Not a Git repository: {}\n\nhint: Run 'git init' first, or pass --repo <DIR>",
            repo_path.display()
        ))
    }
}

/// Execute the `setup-hooks` command.
pub fn execute(args: SetupHooksArgs) -> Result<()> {
    let repo_path = match args.repo {
        Some(repo) => repo,
        None => std::env::current_dir()?,
    };

    let hooks_dir = find_git_dir(&repo_path)?.join("hooks");
    let hook_path = hooks_dir.join("pre-commit");
    fs::create_dir_all(&hooks_dir)?;

    if hook_path.exists() {
        let existing_content = fs::read_to_string(&hook_path)?;

        if existing_content.contains(HOOK_MARKER) {
            if !args.force {
                println!("conventions hook already installed. Use --force to overwrite.");
                return Ok(());
            }
            println!("Overwriting existing conventions hook...");
        } else if args.force {
            let backup_path = hooks_dir.join("pre-commit.backup");
            fs::rename(&hook_path, &backup_path)?;
            println!("Backed up existing hook to: {}", backup_path.display());
        } else {
            anyhow::bail!(
                "A pre-commit hook already exists (not from conventions). \
                 Use --force to overwrite (existing hook will be backed up)."
            );
        }
    }

    fs::write(&hook_path, generate_hook_script())?;

    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&hook_path, perms)?;
    }

    println!("Installed pre-commit hook: {}", hook_path.display());
    println!("The hook will run 'conventions format-check' before each commit.");
    Ok(())
}
