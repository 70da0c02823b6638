//! Platform-independent shell core.
//!
//! The loop talks to the user only through a [`ShellHost`], which gets a
//! fresh [`PromptStatus`] before every line.

use piral_core::InstanceConfig;

use crate::commands::{self, CommandResult};
use crate::host::{KeyMap, TerminalHost};
use crate::io::{HostError, Message, PromptStatus, ShellHost, ShellInput};
use crate::session::DebugSession;
use crate::DebugError;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// `exit` or `quit`.
    Command,
    /// Ctrl+D, or the host has no more input.
    EndOfInput,
}

pub struct ReplCore {
    session: DebugSession,
}

impl ReplCore {
    pub fn new(session: DebugSession) -> Self {
        Self { session }
    }

    /// Run the loop until the user leaves.
    pub fn run(&mut self, host: &mut impl ShellHost) -> Result<Exit, HostError> {
        host.show(Message::banner(BANNER))?;

        loop {
            let status = PromptStatus::of(&self.session.instance().context().read_state());
            let line = match host.next_input(&status)? {
                Some(ShellInput::Line(line)) => line,
                Some(ShellInput::Interrupt) => {
                    host.show(Message::notice("^C (use 'exit' to quit)"))?;
                    continue;
                }
                Some(ShellInput::Eof) | None => {
                    host.show(Message::notice("Goodbye!"))?;
                    return Ok(Exit::EndOfInput);
                }
            };

            match commands::execute(&line, &self.session) {
                CommandResult::Ok { display: None } => {}
                CommandResult::Ok {
                    display: Some(output),
                } => host.show(Message::plain(output))?,
                CommandResult::Error(msg) => {
                    tracing::debug!(input = %line, error = %msg, "command failed");
                    host.show(Message::error(msg))?;
                }
                CommandResult::Help => host.show(Message::plain(commands::format_help()))?,
                CommandResult::Exit => {
                    host.show(Message::notice("Goodbye!"))?;
                    return Ok(Exit::Command);
                }
            }
        }
    }

    pub fn session(&self) -> &DebugSession {
        &self.session
    }
}

/// Run the interactive shell in the terminal.
pub fn run(config: InstanceConfig, keys: KeyMap) -> Result<(), DebugError> {
    let session = DebugSession::new(config)?;
    let mut host = TerminalHost::new(keys);
    ReplCore::new(session).run(&mut host)?;
    Ok(())
}

const BANNER: &str = r#"
 ____  _           _
|  _ \(_)_ __ __ _| |
| |_) | | '__/ _` | |
|  __/| | | | (_| | |
|_|   |_|_|  \__,_|_|  debug shell

Type 'help' for available commands, 'exit' to quit.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MessageKind, ScriptedHost};
    use piral_core::LayoutType;

    fn core() -> ReplCore {
        ReplCore::new(DebugSession::new(InstanceConfig::default()).unwrap())
    }

    #[test]
    fn test_exit_command() {
        let mut host = ScriptedHost::lines(["exit"]);
        assert_eq!(core().run(&mut host).unwrap(), Exit::Command);
        assert!(host.text().contains("Goodbye"));
        assert_eq!(host.of_kind(MessageKind::Banner).len(), 1);
    }

    #[test]
    fn test_eof_ends_the_loop() {
        let mut host = ScriptedHost::default()
            .then(ShellInput::Eof)
            .then(ShellInput::Line("help".to_string()));
        assert_eq!(core().run(&mut host).unwrap(), Exit::EndOfInput);
        assert!(!host.text().contains("release"));
    }

    #[test]
    fn test_interrupt_continues() {
        let mut host = ScriptedHost::lines(["exit"]).first(ShellInput::Interrupt);
        assert_eq!(core().run(&mut host).unwrap(), Exit::Command);
        assert!(host.text().contains("^C"));
    }

    #[test]
    fn test_exhausted_input_ends_the_loop() {
        let mut host = ScriptedHost::lines(["layout"]);
        assert_eq!(core().run(&mut host).unwrap(), Exit::EndOfInput);
        assert!(host.text().contains("desktop"));
    }

    #[test]
    fn test_errors_are_reported_and_loop_continues() {
        let mut host = ScriptedHost::lines(["bogus", "resize 700", "exit"]);
        core().run(&mut host).unwrap();

        assert_eq!(host.of_kind(MessageKind::Error).len(), 1);
        assert!(host.text().contains("tablet"));
    }

    #[test]
    fn test_prompt_tracks_instance_state() {
        let mut host = ScriptedHost::lines([
            r#"load {"name":"a","version":"1"}"#,
            "layout mobile",
            "exit",
        ]);
        let mut core = core();
        core.run(&mut host).unwrap();

        assert_eq!(host.prompts[0].pilets, 0);
        let last = host.prompts.last().unwrap();
        assert_eq!(last.pilets, 1);
        assert_eq!(last.layout, LayoutType::Mobile);
        assert!(!last.loading);
        assert_eq!(core.session().instance().loaded_pilets(), vec!["a".to_string()]);
    }

    #[test]
    fn test_help_output() {
        let mut host = ScriptedHost::lines(["help", "exit"]);
        core().run(&mut host).unwrap();
        assert!(host.text().contains("release"));
    }
}
