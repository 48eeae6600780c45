//! Copying passwords to the system clipboard.

use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};

pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError>;
}

impl<C: Clipboard + ?Sized> Clipboard for &mut C {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        (**self).copy(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("failed to start the clipboard command (`{program}`): {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to send data to the clipboard command (`{program}`): {source}")]
    Write {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("the clipboard command (`{program}`) exited with {status}")]
    Failed { program: String, status: ExitStatus },
    #[error("the clipboard command is empty")]
    NoCommand,
}

/// Pipes text into an external clipboard program.
pub struct SystemClipboard {
    argv: Vec<String>,
}

impl SystemClipboard {
    /// Use `pbcopy` on macOS and `xsel -b` elsewhere.
    pub fn platform_default() -> SystemClipboard {
        SystemClipboard {
            argv: default_clipboard_argv(),
        }
    }

    /// Use a specific program and arguments, which must read the text from stdin.
    pub fn with_command(argv: Vec<String>) -> SystemClipboard {
        SystemClipboard { argv }
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        let (program, args) = self.argv.split_first().ok_or(ClipboardError::NoCommand)?;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| ClipboardError::Spawn {
                program: program.clone(),
                source,
            })?;
        {
            // Dropped at the end of this block, so the child sees EOF.
            let mut stdin = child.stdin.take().ok_or_else(|| ClipboardError::Write {
                program: program.clone(),
                source: io::Error::new(io::ErrorKind::BrokenPipe, "stdin was not captured"),
            })?;
            stdin
                .write_all(text.as_bytes())
                .map_err(|source| ClipboardError::Write {
                    program: program.clone(),
                    source,
                })?;
        }
        let status = child.wait().map_err(|source| ClipboardError::Write {
            program: program.clone(),
            source,
        })?;
        if status.success() {
            log::debug!("copied {} characters with `{}`", text.chars().count(), program);
            Ok(())
        } else {
            Err(ClipboardError::Failed {
                program: program.clone(),
                status,
            })
        }
    }
}

#[cfg(target_os = "macos")]
fn default_clipboard_argv() -> Vec<String> {
    vec!["pbcopy".to_owned()]
}

#[cfg(not(target_os = "macos"))]
fn default_clipboard_argv() -> Vec<String> {
    vec!["xsel".to_owned(), "-b".to_owned()]
}
