//! Opening a game in the platform's default handler.

use std::process::{Child, Command};

use anyhow::{Context, Result};
use launchpad_core::transport;
use launchpad_core::Url;
use tracing::{info, warn};

/// Resolve a card's play path against the site base. Absolute URLs are used
/// as they are.
pub fn resolve_target(base: &Url, path: &str) -> Result<Url> {
    let path = path.trim();
    if path.is_empty() {
        anyhow::bail!("This game has no launch path");
    }
    if let Ok(url) = Url::parse(path) {
        return Ok(url);
    }
    Ok(transport::resolve(base, path)?)
}

/// Launch `target` without waiting for the handler to exit.
pub fn open_target(target: &Url) -> Result<()> {
    let arg = if target.scheme() == "file" {
        target
            .to_file_path()
            .map_err(|_| anyhow::anyhow!("Not a local path: {}", target))?
            .display()
            .to_string()
    } else {
        target.to_string()
    };

    info!(target = %arg, "Opening game");
    let child = opener(&arg)
        .spawn()
        .with_context(|| format!("Failed opening {}", arg))?;
    reap(child);
    Ok(())
}

/// Wait for the opener on a detached thread so it does not linger as a
/// zombie until the launcher exits.
fn reap(mut child: Child) {
    std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => {
            warn!(pid = child.id(), %status, "Opener exited with an error");
        }
        Ok(_) => {}
        Err(e) => warn!(pid = child.id(), error = %e, "Could not wait for opener"),
    });
}

#[cfg(target_os = "windows")]
fn opener(arg: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", "", arg]);
    cmd
}

#[cfg(target_os = "macos")]
fn opener(arg: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(arg);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener(arg: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(arg);
    cmd
}
