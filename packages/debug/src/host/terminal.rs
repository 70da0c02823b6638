//! Reedline host for the debug shell.
//!
//! The prompt shows the instance status, Tab opens the command completion
//! menu and history is kept under the user's data directory.

use std::borrow::Cow;
use std::path::PathBuf;

use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditMode, Emacs, FileBackedHistory, KeyCode, KeyModifiers,
    MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    PromptViMode, Reedline, ReedlineEvent, ReedlineMenu, Signal, Vi,
};

use crate::completer::ReplCompleter;
use crate::highlighter::ReplHighlighter;
use crate::io::{HostError, Message, MessageKind, PromptStatus, ShellHost, ShellInput};

const COMPLETION_MENU: &str = "completion_menu";
const HISTORY_SIZE: usize = 1000;

/// Line editing key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMap {
    Vi,
    Emacs,
}

impl KeyMap {
    /// `PIRAL_EDIT_MODE` when set, otherwise vi if `$VISUAL` or `$EDITOR`
    /// names a vi.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self::choose(
            var("PIRAL_EDIT_MODE").as_deref(),
            var("VISUAL").or_else(|| var("EDITOR")).as_deref(),
        )
    }

    fn choose(explicit: Option<&str>, editor: Option<&str>) -> Self {
        let vi = match explicit {
            Some(mode) => matches!(mode.to_lowercase().as_str(), "vi" | "vim"),
            None => editor.is_some_and(names_a_vi),
        };
        if vi {
            KeyMap::Vi
        } else {
            KeyMap::Emacs
        }
    }

    fn edit_mode(self) -> Box<dyn EditMode> {
        let complete = ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
            ReedlineEvent::MenuNext,
        ]);
        match self {
            KeyMap::Vi => {
                let mut insert = default_vi_insert_keybindings();
                insert.add_binding(KeyModifiers::NONE, KeyCode::Tab, complete);
                Box::new(Vi::new(insert, default_vi_normal_keybindings()))
            }
            KeyMap::Emacs => {
                let mut keys = default_emacs_keybindings();
                keys.add_binding(KeyModifiers::NONE, KeyCode::Tab, complete);
                Box::new(Emacs::new(keys))
            }
        }
    }
}

/// `/usr/bin/nvim -f` names a vi, `code --wait` does not.
fn names_a_vi(editor: &str) -> bool {
    let program = editor.split_whitespace().next().unwrap_or_default();
    let name = program.rsplit('/').next().unwrap_or(program).to_lowercase();
    name == "vi" || name.ends_with("vim")
}

pub struct TerminalHost {
    editor: Reedline,
}

impl TerminalHost {
    pub fn new(keys: KeyMap) -> Self {
        let menu = ColumnarMenu::default()
            .with_name(COMPLETION_MENU)
            .with_text_style(Style::new().fg(Color::Cyan))
            .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold());

        let mut editor = Reedline::create()
            .with_completer(Box::new(ReplCompleter::new()))
            .with_highlighter(Box::new(ReplHighlighter::new()))
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
            ))
            .with_menu(ReedlineMenu::EngineCompleter(Box::new(menu)))
            .with_edit_mode(keys.edit_mode());

        match history_path().map(|path| {
            if let Some(dir) = path.parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            FileBackedHistory::with_file(HISTORY_SIZE, path)
        }) {
            Some(Ok(history)) => editor = editor.with_history(Box::new(history)),
            Some(Err(e)) => tracing::debug!(error = %e, "history disabled"),
            None => {}
        }

        Self { editor }
    }
}

impl ShellHost for TerminalHost {
    fn next_input(&mut self, status: &PromptStatus) -> Result<Option<ShellInput>, HostError> {
        let input = match self.editor.read_line(&StatusPrompt(*status)) {
            Ok(Signal::Success(line)) => ShellInput::Line(line),
            Ok(Signal::CtrlC) => ShellInput::Interrupt,
            Ok(Signal::CtrlD) => ShellInput::Eof,
            Err(e) => return Err(HostError(e.to_string())),
        };
        Ok(Some(input))
    }

    fn show(&mut self, message: Message) -> Result<(), HostError> {
        println!("{}", styled(message));
        Ok(())
    }
}

fn styled(message: Message) -> String {
    match message.kind {
        MessageKind::Plain => message.text,
        MessageKind::Error => format!("{} {}", Color::Red.bold().paint("Error:"), message.text),
        MessageKind::Notice | MessageKind::Banner => Color::Cyan.paint(message.text).to_string(),
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("piral-debug").join("history.txt"))
}

struct StatusPrompt(PromptStatus);

impl Prompt for StatusPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        // Yellow while the host is still loading.
        let color = if self.0.loading { Color::Yellow } else { Color::Blue };
        Cow::Owned(color.bold().paint(self.0.to_string()).to_string())
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        let indicator = match edit_mode {
            PromptEditMode::Vi(PromptViMode::Normal) => Color::Blue.bold().paint(" [N]>"),
            PromptEditMode::Vi(PromptViMode::Insert) => Color::Green.bold().paint(" [I]>"),
            _ => Color::Green.bold().paint(" >"),
        };
        Cow::Owned(format!("{} ", indicator))
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(": ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let failing = match search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}history: {}) ", failing, search.term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_mode_wins_over_editor() {
        assert_eq!(KeyMap::choose(Some("emacs"), Some("vim")), KeyMap::Emacs);
        assert_eq!(KeyMap::choose(Some("VI"), None), KeyMap::Vi);
    }

    #[test]
    fn editor_decides_without_explicit_mode() {
        assert_eq!(KeyMap::choose(None, Some("/usr/bin/nvim -f")), KeyMap::Vi);
        assert_eq!(KeyMap::choose(None, Some("vi")), KeyMap::Vi);
        assert_eq!(KeyMap::choose(None, Some("code --wait")), KeyMap::Emacs);
        assert_eq!(KeyMap::choose(None, Some("vimdiff")), KeyMap::Emacs);
        assert_eq!(KeyMap::choose(None, None), KeyMap::Emacs);
    }

    #[test]
    fn errors_get_a_prefix() {
        let text = styled(Message::error("no such pilet"));
        assert!(text.contains("Error:"));
        assert!(text.ends_with("no such pilet"));
        assert_eq!(styled(Message::plain("ok")), "ok");
    }
}
