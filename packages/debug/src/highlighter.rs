use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::completer::COMMANDS;

const ALIASES: &[&str] = &["q", "w", "ext", "pilets", "?"];

/// Syntax highlighter for the shell
pub struct ReplHighlighter {
    commands: Vec<&'static str>,
}

impl ReplHighlighter {
    pub fn new() -> Self {
        let mut commands: Vec<&'static str> = COMMANDS.iter().map(|(cmd, _)| *cmd).collect();
        commands.extend_from_slice(ALIASES);
        Self { commands }
    }
}

impl Default for ReplHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for ReplHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        if line.is_empty() {
            return styled;
        }

        let (command, rest) = match line.find(char::is_whitespace) {
            Some(pos) => (&line[..pos], &line[pos..]),
            None => (line, ""),
        };

        let cmd_lower = command.to_lowercase();
        let cmd_style = if self.commands.contains(&cmd_lower.as_str()) {
            Style::new().bold().fg(Color::Cyan)
        } else {
            Style::new().fg(Color::Red)
        };
        styled.push((cmd_style, command.to_string()));

        if rest.is_empty() {
            return styled;
        }

        match cmd_lower.as_str() {
            // name, then JSON, then flags
            "write" | "w" | "render" => {
                let trimmed = rest.trim_start();
                let lead = rest.len() - trimmed.len();
                let name_end = trimmed
                    .find(char::is_whitespace)
                    .map(|p| lead + p)
                    .unwrap_or(rest.len());
                styled.push((Style::new().fg(Color::Yellow), rest[..name_end].to_string()));

                let tail = &rest[name_end..];
                match tail.find(" --") {
                    Some(flags) => {
                        styled.push((Style::new().fg(Color::Green), tail[..flags].to_string()));
                        styled.push((Style::new().fg(Color::Magenta), tail[flags..].to_string()));
                    }
                    None => styled.push((Style::new().fg(Color::Green), tail.to_string())),
                }
            }
            "load" => styled.push((Style::new().fg(Color::Green), rest.to_string())),
            _ => styled.push((Style::new().fg(Color::Yellow), rest.to_string())),
        }

        styled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(line: &str) -> Vec<String> {
        ReplHighlighter::new()
            .highlight(line, 0)
            .buffer
            .into_iter()
            .map(|(_, text)| text)
            .collect()
    }

    #[test]
    fn highlight_empty_returns_empty() {
        assert!(segments("").is_empty());
    }

    #[test]
    fn known_and_unknown_commands_differ() {
        let highlighter = ReplHighlighter::new();
        let known = highlighter.highlight("state", 0);
        let unknown = highlighter.highlight("bogus", 0);
        assert_ne!(known.buffer[0].0, unknown.buffer[0].0);
    }

    #[test]
    fn write_splits_name_json_and_flags() {
        assert_eq!(
            segments(r#"write theme "dark" --owner shell"#),
            vec!["write", " theme", r#" "dark""#, " --owner shell"]
        );
    }

    #[test]
    fn segments_cover_the_whole_line() {
        for line in ["load {\"name\": \"a\"}", "write x", "data theme", "render menu {}"] {
            assert_eq!(segments(line).concat(), line);
        }
    }
}
