use std::env;
use std::path::Path;
use std::process::Command;

use anyhow::{Result, bail};
use dialoguer::Confirm;
use nix::unistd::geteuid;

use crate::config::RunContext;

/// Check if the current process is running as root.
pub fn is_root() -> bool {
    geteuid().is_root()
}

/// If not root, prompt the user and re-exec via sudo.
/// This replaces the current process — it does not return on success.
///
/// The re-executed process gets the original arguments plus:
/// - `command` when it was picked from the menu,
/// - `answers`, the flags reproducing what was already prompted for,
/// - `--home`, so the content tree and renewal note land in the invoking
///   operator's home rather than root's.
pub fn escalate_if_needed(ctx: &RunContext, command: &str, answers: &[String]) -> Result<()> {
    if is_root() {
        return Ok(());
    }

    if ctx.non_interactive {
        bail!(
            "installing packages and writing /etc requires root privileges. \
             Re-run with sudo."
        );
    }

    let confirmed = Confirm::new()
        .with_prompt("This step requires root privileges. Re-run with sudo?")
        .default(true)
        .interact()?;

    if !confirmed {
        bail!("root privileges declined. Re-run manually with sudo.");
    }

    let exe = env::current_exe()?;
    let menu_command = ctx.command_from_menu.then_some(command);
    let args = sudo_args(
        env::args().skip(1).collect(),
        menu_command,
        answers,
        &ctx.paths.home,
    );

    tracing::info!("re-executing with sudo");
    tracing::debug!("exec: sudo {} {}", exe.display(), args.join(" "));

    let status = Command::new("sudo").arg(exe).args(&args).status()?;

    // sudo process completed — exit with its code
    std::process::exit(status.code().unwrap_or(1));
}

/// Arguments for the re-executed process.
fn sudo_args(
    mut args: Vec<String>,
    menu_command: Option<&str>,
    answers: &[String],
    home: &Path,
) -> Vec<String> {
    let pinned = args
        .iter()
        .any(|a| a == "--home" || a.starts_with("--home="));
    if let Some(command) = menu_command {
        args.push(command.to_string());
    }
    args.extend_from_slice(answers);
    if !pinned {
        args.push("--home".to_string());
        args.push(home.to_string_lossy().into_owned());
    }
    args
}
