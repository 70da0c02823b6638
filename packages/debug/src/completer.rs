use reedline::{Completer, Span, Suggestion};

/// Command completer for the shell
pub struct ReplCompleter {
    commands: Vec<&'static str>,
}

impl ReplCompleter {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|(cmd, _)| *cmd).collect(),
        }
    }
}

impl Default for ReplCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for ReplCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line_to_pos = &line[..pos];
        let words: Vec<&str> = line_to_pos.split_whitespace().collect();

        // Only the command itself is completed.
        if !(words.is_empty() || (words.len() == 1 && !line_to_pos.ends_with(' '))) {
            return Vec::new();
        }

        let prefix = words.first().copied().unwrap_or("");
        let start = line_to_pos.rfind(prefix).unwrap_or(0);
        self.commands
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Suggestion {
                value: cmd.to_string(),
                description: command_description(cmd).map(str::to_string),
                style: None,
                extra: None,
                span: Span::new(start, pos),
                append_whitespace: true,
                match_indices: None,
            })
            .collect()
    }
}

pub(crate) const COMMANDS: &[(&str, &str)] = &[
    ("state", "Summary of the global state"),
    ("pages", "Registered pages"),
    ("extensions", "Extension registrations"),
    ("modules", "Loaded pilets"),
    ("portals", "Shown portal entries"),
    ("data", "Shared data items"),
    ("write", "Try to write a data item"),
    ("release", "Release a data item"),
    ("layout", "Show or change the layout"),
    ("resize", "Pick the layout for a width"),
    ("loading", "Set the loading flag"),
    ("load", "Load a pilet from metadata"),
    ("unload", "Unload a pilet"),
    ("view", "Resolve a path"),
    ("render", "Render an extension slot"),
    ("actions", "Names in the action table"),
    ("advance", "Move the clock forward"),
    ("help", "Show help"),
    ("exit", "Exit the shell"),
    ("quit", "Exit the shell"),
];

fn command_description(cmd: &str) -> Option<&'static str> {
    COMMANDS
        .iter()
        .find(|(name, _)| *name == cmd)
        .map(|(_, desc)| *desc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(suggestions: Vec<Suggestion>) -> Vec<String> {
        suggestions.into_iter().map(|s| s.value).collect()
    }

    #[test]
    fn completes_command_prefix() {
        let mut completer = ReplCompleter::new();
        assert_eq!(values(completer.complete("lo", 2)), vec!["loading", "load"]);
        assert_eq!(values(completer.complete("unl", 3)), vec!["unload"]);
    }

    #[test]
    fn empty_line_offers_every_command() {
        let mut completer = ReplCompleter::new();
        assert_eq!(completer.complete("", 0).len(), COMMANDS.len());
    }

    #[test]
    fn arguments_are_not_completed() {
        let mut completer = ReplCompleter::new();
        assert!(completer.complete("write ", 6).is_empty());
        assert!(completer.complete("write th", 8).is_empty());
    }

    #[test]
    fn suggestions_carry_descriptions() {
        let mut completer = ReplCompleter::new();
        let suggestion = &completer.complete("adv", 3)[0];
        assert_eq!(suggestion.description.as_deref(), Some("Move the clock forward"));
        assert_eq!(suggestion.span.start, 0);
        assert_eq!(suggestion.span.end, 3);
    }
}
