//! Subprocess plumbing shared by every generator.
//!
//! Commands run to completion under a fixed timeout with a capped output
//! buffer. Failures surface as [`DocToolsError`] values and are never retried.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::config::{MAX_OUTPUT_BYTES, SUBPROCESS_TIMEOUT};
use crate::error::{DocToolsError, Result};

/// A command line to run
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
    pub max_output: usize,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            timeout: SUBPROCESS_TIMEOUT,
            max_output: MAX_OUTPUT_BYTES,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The command line as a single printable string
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Captured output of a successful run
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Look a program up on `PATH`
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}

/// Fail fast with install instructions when `tool` is not available
pub fn ensure_tool(tool: &str, install: &str) -> Result<PathBuf> {
    find_on_path(tool).ok_or_else(|| {
        tracing::error!("Required tool {} is not installed", tool);
        DocToolsError::MissingDependency {
            tool: tool.to_string(),
            install: install.to_string(),
        }
    })
}

async fn read_capped<R>(reader: Option<R>, limit: usize) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let Some(reader) = reader else {
        return Ok((buf, false));
    };
    let mut limited = reader.take(limit as u64 + 1);
    limited.read_to_end(&mut buf).await?;
    let overflow = buf.len() > limit;
    buf.truncate(limit);
    Ok((buf, overflow))
}

/// Run a command to completion
pub async fn run(spec: CommandSpec) -> Result<CommandOutput> {
    let command_line = spec.display();
    tracing::info!("Running {}", command_line);

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DocToolsError::MissingDependency {
                tool: spec.program.clone(),
                install: format!("Install `{}` and make sure it is on PATH", spec.program),
            }
        } else {
            DocToolsError::Io(e)
        }
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let limit = spec.max_output;

    let collect = async {
        let (out, err) = tokio::join!(read_capped(stdout, limit), read_capped(stderr, limit));
        let status = child.wait().await?;
        Ok::<_, std::io::Error>((status, out?, err?))
    };

    let (status, (stdout, out_overflow), (stderr, err_overflow)) =
        match tokio::time::timeout(spec.timeout, collect).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!("{} timed out after {:?}", command_line, spec.timeout);
                return Err(DocToolsError::Timeout {
                    command: command_line,
                    seconds: spec.timeout.as_secs(),
                });
            }
        };

    if out_overflow || err_overflow {
        return Err(DocToolsError::OutputTooLarge {
            command: command_line,
            limit,
        });
    }

    let stdout = String::from_utf8_lossy(&stdout).into_owned();
    let stderr = String::from_utf8_lossy(&stderr).into_owned();

    if !status.success() {
        tracing::error!("{} failed with {:?}", command_line, status.code());
        return Err(DocToolsError::Subprocess {
            command: command_line,
            code: status.code(),
            stdout,
            stderr,
        });
    }

    Ok(CommandOutput { stdout, stderr })
}

/// A temporary directory that logs instead of failing when cleanup fails
pub struct TempWorkspace {
    dir: Option<TempDir>,
}

impl TempWorkspace {
    pub fn new(prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        tracing::debug!("Created temporary directory {:?}", dir.path());
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!("Failed to remove temporary directory {:?}: {}", path, e);
            }
        }
    }
}

/// Shallow-clone `url` at `reference` (tag or branch) into `dest`
pub async fn git_clone(url: &str, reference: &str, dest: &Path) -> Result<()> {
    ensure_tool("git", "Install git: https://git-scm.com/downloads")?;
    run(CommandSpec::new("git")
        .args(["clone", "--depth", "1", "--branch", reference, url])
        .arg(dest.as_os_str()))
    .await?;
    Ok(())
}

/// Use `local` when given and present, otherwise clone `url` into `scratch`
pub async fn local_or_clone(
    local: Option<&Path>,
    url: &str,
    reference: &str,
    scratch: &TempWorkspace,
) -> Result<PathBuf> {
    if let Some(path) = local {
        if path.is_dir() {
            tracing::info!("Using local checkout at {:?}", path);
            return Ok(path.to_path_buf());
        }
        tracing::warn!("Local checkout {:?} does not exist, cloning instead", path);
    }
    let dest = scratch.path().join("repo");
    git_clone(url, reference, &dest).await?;
    Ok(dest)
}
