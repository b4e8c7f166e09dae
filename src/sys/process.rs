use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use nix::unistd::{ForkResult, fork, setsid};
use tracing::{debug, trace, warn};

use crate::common::error::{Result, WmError};

/// Split a command line into words, honouring single and double quotes and
/// backslash escapes inside quotes.
pub fn parse_command(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current_part = String::new();
    let mut quote: Option<char> = None;
    let mut chars = command.chars();

    while let Some(ch) = chars.next() {
        match (ch, quote) {
            ('\'' | '"', None) => quote = Some(ch),
            (c, Some(q)) if c == q => quote = None,
            (' ' | '\t', None) => {
                if !current_part.is_empty() {
                    parts.push(std::mem::take(&mut current_part));
                }
            }
            ('\\', Some(_)) => match chars.next() {
                Some('n') => current_part.push('\n'),
                Some('t') => current_part.push('\t'),
                Some(other) => current_part.push(other),
                None => current_part.push('\\'),
            },
            (c, _) => current_part.push(c),
        }
    }

    if !current_part.is_empty() {
        parts.push(current_part);
    }
    parts
}

fn expand_home(word: &str) -> String {
    match (word.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().into_owned(),
        _ => word.to_string(),
    }
}

/// Start `command` in a session of its own and return once it has been
/// exec'd.
///
/// The program runs in a grandchild that init adopts. The intermediate child
/// exits right after forking and is reaped here, so nothing waits on
/// long-running programs and they outlive us without joining our process
/// group.
pub fn spawn(command: &str) -> Result<()> {
    let failure = |reason: String| WmError::ExternalActionFailure {
        action: format!("spawn `{command}`"),
        reason,
    };
    let parts = parse_command(command);
    let Some((cmd, args)) = parts.split_first() else {
        return Err(failure("empty command".to_string()));
    };
    trace!(cmd, ?args, "spawning");
    let mut process = Command::new(expand_home(cmd));
    process
        .args(args.iter().map(|a| expand_home(a)))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    // SAFETY: only fork, setsid and _exit run between fork and exec, and
    // all of them are async-signal-safe.
    unsafe {
        process.pre_exec(|| match fork() {
            Ok(ForkResult::Parent { .. }) => nix::libc::_exit(0),
            Ok(ForkResult::Child) => setsid().map(drop).map_err(io::Error::from),
            Err(e) => Err(e.into()),
        });
    }
    // Exec failures in the grandchild are reported through spawn.
    let mut intermediate = process.spawn().map_err(|e| failure(e.to_string()))?;
    match intermediate.wait() {
        Ok(status) if status.success() => debug!(command, "spawned"),
        Ok(status) => warn!(command, %status, "intermediate child failed"),
        Err(e) => return Err(failure(format!("wait failed: {e}"))),
    }
    Ok(())
}
