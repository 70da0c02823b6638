//! A host that replays queued input and records everything shown.

use std::collections::VecDeque;

use super::{HostError, Message, MessageKind, PromptStatus, ShellHost, ShellInput};

#[derive(Debug, Default)]
pub struct ScriptedHost {
    inputs: VecDeque<ShellInput>,
    pub messages: Vec<Message>,
    /// The status passed with every prompt, oldest first.
    pub prompts: Vec<PromptStatus>,
}

impl ScriptedHost {
    pub fn lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut host = Self::default();
        host.inputs
            .extend(lines.into_iter().map(|l| ShellInput::Line(l.to_string())));
        host
    }

    pub fn then(mut self, input: ShellInput) -> Self {
        self.inputs.push_back(input);
        self
    }

    /// Queue `input` ahead of everything else.
    pub fn first(mut self, input: ShellInput) -> Self {
        self.inputs.push_front(input);
        self
    }

    pub fn text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn of_kind(&self, kind: MessageKind) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.text.as_str())
            .collect()
    }
}

impl ShellHost for ScriptedHost {
    fn next_input(&mut self, status: &PromptStatus) -> Result<Option<ShellInput>, HostError> {
        self.prompts.push(*status);
        Ok(self.inputs.pop_front())
    }

    fn show(&mut self, message: Message) -> Result<(), HostError> {
        self.messages.push(message);
        Ok(())
    }
}
