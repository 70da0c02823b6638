//! What the shell loop needs from its host.
//!
//! [`ReplCore`](crate::ReplCore) only talks to a [`ShellHost`]: it hands over
//! a [`PromptStatus`] describing the instance, gets back one [`ShellInput`]
//! and shows [`Message`]s. The terminal host and the scripted test host run
//! the same loop.

use std::fmt;

use piral_core::{GlobalState, LayoutType};

#[cfg(test)]
mod scripted;

#[cfg(test)]
pub use scripted::ScriptedHost;

#[derive(Debug, thiserror::Error)]
#[error("shell host failed: {0}")]
pub struct HostError(pub String);

/// One thing the user did at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Line(String),
    /// Ctrl+C.
    Interrupt,
    /// Ctrl+D.
    Eof,
}

/// Instance summary shown in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptStatus {
    pub pilets: usize,
    pub layout: LayoutType,
    pub loading: bool,
    /// Portals with at least one rendered fragment.
    pub portals: usize,
}

impl PromptStatus {
    pub fn of(state: &GlobalState) -> Self {
        Self {
            pilets: state.modules.len(),
            layout: state.app.layout,
            loading: state.app.loading,
            portals: state.portals.values().filter(|p| !p.is_empty()).count(),
        }
    }
}

impl fmt::Display for PromptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pilets {
            0 => write!(f, "no pilets")?,
            1 => write!(f, "1 pilet")?,
            n => write!(f, "{} pilets", n)?,
        }
        write!(f, " | {}", self.layout)?;
        if self.portals > 0 {
            write!(f, " | {} portal(s)", self.portals)?;
        }
        if self.loading {
            write!(f, " | loading")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Command output, possibly already colored.
    Plain,
    Error,
    Notice,
    Banner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Plain, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Notice, text)
    }

    pub fn banner(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Banner, text)
    }

    fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

pub trait ShellHost {
    /// Show the prompt and wait for the user. `None` once input is exhausted.
    fn next_input(&mut self, status: &PromptStatus) -> Result<Option<ShellInput>, HostError>;

    fn show(&mut self, message: Message) -> Result<(), HostError>;
}
