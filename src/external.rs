use crate::command::ExitCode;
use crate::env::Environment;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::debug;

/// Exit code used when a command name cannot be resolved, after the
/// convention shells use for "command not found".
pub const NOT_FOUND_CODE: ExitCode = 127;

/// Launch one external command.
///
/// In the foreground the call blocks until the child terminates and returns
/// its exit code; a child that did not exit normally (e.g. was killed by a
/// signal) counts as 0, matching the shell's last-status convention. In the
/// background the child's PID is reported and the call returns a success
/// sentinel immediately. The child is then never waited on explicitly; it
/// stays a zombie until the shell exits. An unresolvable command name is
/// reported on stderr and yields [`NOT_FOUND_CODE`] without spawning anything.
pub fn launch(argv: &[String], background: bool, env: &Environment) -> Result<ExitCode> {
    let Some(name) = argv.first() else {
        return Ok(0);
    };
    let Some(mut cmd) = command_for(argv, env) else {
        eprintln!("command not found: {name}");
        return Ok(NOT_FOUND_CODE);
    };

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to start {name}"))?;
    debug!(pid = child.id(), command = %name, background, "spawned");

    if background {
        println!("Background process with PID: {}", child.id());
        return Ok(0);
    }

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for {name}"))?;
    debug!(command = %name, ?status, "finished");
    Ok(status.code().unwrap_or(0))
}

/// Spawn `left | right`, wiring left's stdout into right's stdin through an
/// OS pipe.
///
/// `sink` becomes the right command's stdout, so the caller decides where
/// pipeline output lands (the interpreter inherits the shell's stdout; tests
/// capture it). Both children are returned unwaited; the parent keeps no pipe
/// ends once both are running. Resolution of both names happens before any
/// spawn, so a bad name or a failed pipe aborts the whole shape with no
/// process left behind; if the right command fails to start after the left
/// one is already running, the left child is reaped before the error returns.
pub fn spawn_pipeline(
    left: &[String],
    right: &[String],
    env: &Environment,
    sink: Stdio,
) -> Result<(Child, Child)> {
    let mut left_cmd = command_for(left, env)
        .with_context(|| format!("command not found: {}", command_name(left)))?;
    let mut right_cmd = command_for(right, env)
        .with_context(|| format!("command not found: {}", command_name(right)))?;

    let mut left_child = left_cmd
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start {}", command_name(left)))?;
    let left_out = left_child
        .stdout
        .take()
        .context("pipe between commands was not created")?;

    let right_spawn = right_cmd.stdin(Stdio::from(left_out)).stdout(sink).spawn();
    // Dropping the Command releases the pipe read end it still holds when the
    // spawn failed, so reaping the left child below cannot block on a full pipe.
    drop(right_cmd);

    match right_spawn {
        Ok(right_child) => {
            debug!(
                left_pid = left_child.id(),
                right_pid = right_child.id(),
                "pipeline spawned"
            );
            Ok((left_child, right_child))
        }
        Err(e) => {
            let _ = left_child.wait();
            Err(e).with_context(|| format!("failed to start {}", command_name(right)))
        }
    }
}

fn command_name(argv: &[String]) -> &str {
    argv.first().map(String::as_str).unwrap_or_default()
}

/// Build a ready-to-spawn `Command` for `argv`, or `None` when the name does
/// not resolve to an executable. Children see the session's variables and run
/// in its working directory.
fn command_for(argv: &[String], env: &Environment) -> Option<Command> {
    let name = argv.first()?;
    let search_paths = env.get_var("PATH").unwrap_or_default();
    let path = find_command_path(OsStr::new(&search_paths), Path::new(name))?;

    let mut cmd = Command::new(path.as_ref());
    cmd.args(&argv[1..])
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir);
    Some(cmd)
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => {
            // Empty path -> not found
            None
        }
        (Some(x), None) => {
            // Single component -> search in PATH
            find_in_path(search_paths, x.as_os_str()).map(Cow::Owned)
        }
        _ => {
            // Multiple components -> search in current dir
            find_by_path(path).map(Cow::Borrowed)
        }
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let path = dir.join(cmd);
        if let Some(path) = find_by_path(&path) {
            return Some(path.to_owned());
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
