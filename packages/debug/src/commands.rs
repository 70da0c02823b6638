//! Shell command parsing and execution.
//!
//! Commands:
//! - `state` - Summary of the whole global state
//! - `pages`, `extensions [name]`, `modules`, `portals` - Registries
//! - `data [name]` - Shared data items
//! - `write <name> <json> [--owner o] [--target t] [--expires ms]` - tryWriteDataItem
//! - `release <name> [--owner o]` - Write `null`, releasing the item
//! - `layout <mobile|tablet|desktop>`, `resize <width>`, `loading <on|off>`
//! - `load <json-metadata>`, `unload <name>` - Pilet lifecycle
//! - `view <path>` - What the shell would show for a path
//! - `render <slot> [json]` - Render an extension slot once and print its markup
//! - `actions` - Names in the action table
//! - `advance <ms>` - Move the manual clock forward
//! - `help`, `exit`

use std::time::Duration;

use nu_ansi_term::{Color, Style};
use serde_json::{json, Value as JsonValue};

use piral_core::{
    resolve_view, DataStoreTarget, Element, ExtensionSlot, LayoutType, PiletMetadata,
    SharedDataItem, Value, View,
};

use crate::session::DebugSession;

/// Result of executing a command
pub enum CommandResult {
    /// Command succeeded, optionally with output to display
    Ok { display: Option<String> },
    /// Command failed with an error message
    Error(String),
    /// User requested to exit
    Exit,
    /// Show help
    Help,
}

impl CommandResult {
    fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok {
            display: Some(display.into()),
        }
    }

    fn ok_none() -> Self {
        CommandResult::Ok { display: None }
    }
}

/// Parse and execute a command
pub fn execute(input: &str, session: &DebugSession) -> CommandResult {
    let input = input.trim();
    if input.is_empty() {
        return CommandResult::ok_none();
    }

    let (command, rest) = match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], input[pos..].trim()),
        None => (input, ""),
    };

    match command.to_lowercase().as_str() {
        "state" => cmd_state(session),
        "pages" => cmd_pages(session),
        "extensions" | "ext" => cmd_extensions(session, rest),
        "modules" | "pilets" => cmd_modules(session),
        "portals" => cmd_portals(session),
        "data" => cmd_data(session, rest),
        "write" | "w" => cmd_write(session, rest),
        "release" => cmd_release(session, rest),
        "layout" => cmd_layout(session, rest),
        "resize" => cmd_resize(session, rest),
        "loading" => cmd_loading(session, rest),
        "load" => cmd_load(session, rest),
        "unload" => cmd_unload(session, rest),
        "view" => cmd_view(session, rest),
        "render" => cmd_render(session, rest),
        "actions" => cmd_actions(session),
        "advance" => cmd_advance(session, rest),
        "help" | "?" => CommandResult::Help,
        "exit" | "quit" | "q" => CommandResult::Exit,
        _ => CommandResult::Error(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            command
        )),
    }
}

fn cmd_state(session: &DebugSession) -> CommandResult {
    let state = session.instance().context().read_state();
    let extensions: serde_json::Map<String, JsonValue> = state
        .components
        .extensions
        .iter()
        .map(|(name, regs)| (name.clone(), json!(regs.len())))
        .collect();
    let portals: serde_json::Map<String, JsonValue> = state
        .portals
        .iter()
        .map(|(id, entries)| (id.clone(), json!(entries.len())))
        .collect();

    let summary = json!({
        "app": {
            "layout": state.app.layout.to_string(),
            "loading": state.app.loading,
            "routes": state.app.routes.keys().collect::<Vec<_>>(),
        },
        "pages": state.components.pages.keys().collect::<Vec<_>>(),
        "extensions": extensions,
        "modules": state.modules.iter().map(|m| &m.name).collect::<Vec<_>>(),
        "portals": portals,
        "data": state.data.keys().collect::<Vec<_>>(),
        "custom": state
            .custom
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>(),
    });
    pretty(&summary)
}

fn cmd_pages(session: &DebugSession) -> CommandResult {
    let state = session.instance().context().read_state();
    if state.components.pages.is_empty() {
        return CommandResult::ok_display(dim("No pages registered"));
    }
    let lines: Vec<String> = state
        .components
        .pages
        .iter()
        .map(|(route, page)| {
            format!(
                "  {:<24} {}",
                Color::Yellow.paint(route),
                page.component.name()
            )
        })
        .collect();
    CommandResult::ok_display(lines.join("\n"))
}

fn cmd_extensions(session: &DebugSession, name: &str) -> CommandResult {
    let state = session.instance().context().read_state();
    let extensions = &state.components.extensions;

    if name.is_empty() {
        if extensions.is_empty() {
            return CommandResult::ok_display(dim("No extensions registered"));
        }
        let lines: Vec<String> = extensions
            .iter()
            .map(|(slot, regs)| format!("  {:<24} {}", Color::Yellow.paint(slot), regs.len()))
            .collect();
        return CommandResult::ok_display(lines.join("\n"));
    }

    match extensions.get(name) {
        Some(regs) => {
            let lines: Vec<String> = regs
                .iter()
                .map(|reg| {
                    format!(
                        "  {} {} {}",
                        Color::DarkGray.paint(reg.reference.to_string()),
                        reg.component.name(),
                        reg.defaults
                    )
                })
                .collect();
            CommandResult::ok_display(lines.join("\n"))
        }
        None => CommandResult::ok_display(dim(&format!("No extensions for '{}'", name))),
    }
}

fn cmd_modules(session: &DebugSession) -> CommandResult {
    let state = session.instance().context().read_state();
    if state.modules.is_empty() {
        return CommandResult::ok_display(dim("No pilets loaded"));
    }
    let lines: Vec<String> = state
        .modules
        .iter()
        .map(|m| format!("  {}@{}", Color::Green.paint(&m.name), m.version))
        .collect();
    CommandResult::ok_display(lines.join("\n"))
}

fn cmd_portals(session: &DebugSession) -> CommandResult {
    let state = session.instance().context().read_state();
    if state.portals.is_empty() {
        return CommandResult::ok_display(dim("No portals shown"));
    }
    let lines: Vec<String> = state
        .portals
        .iter()
        .map(|(id, entries)| {
            let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
            format!("  {} [{}]", Color::Yellow.paint(id), keys.join(", "))
        })
        .collect();
    CommandResult::ok_display(lines.join("\n"))
}

fn cmd_data(session: &DebugSession, name: &str) -> CommandResult {
    let ctx = session.instance().context();
    let now = ctx.now();

    if !name.is_empty() {
        return match ctx.read_data_item(name) {
            Ok(Some(item)) => pretty(&item_json(&item, now)),
            Ok(None) => CommandResult::ok_display(dim("null")),
            Err(e) => CommandResult::Error(e.to_string()),
        };
    }

    let state = ctx.read_state();
    if state.data.is_empty() {
        return CommandResult::ok_display(dim("No shared data"));
    }
    let lines: Vec<String> = state
        .data
        .iter()
        .map(|(name, item)| {
            format!(
                "  {:<16} {}",
                Color::Yellow.paint(name),
                item_json(item, now)
            )
        })
        .collect();
    CommandResult::ok_display(lines.join("\n"))
}

fn item_json(item: &SharedDataItem, now: i64) -> JsonValue {
    json!({
        "value": item.value.to_json(),
        "owner": item.owner,
        "target": item.target,
        "expires": item.expires,
        "expired": item.is_expired(now),
    })
}

/// Options trailing `write` and `release`.
#[derive(Debug, Default, PartialEq)]
struct WriteOptions {
    owner: Option<String>,
    target: DataStoreTarget,
    expires: Option<Duration>,
}

fn parse_options(input: &str) -> Result<WriteOptions, String> {
    let mut options = WriteOptions::default();
    let mut words = input.split_whitespace();
    while let Some(flag) = words.next() {
        let value = words
            .next()
            .ok_or_else(|| format!("Missing value for {}", flag))?;
        match flag {
            "--owner" => options.owner = Some(value.to_string()),
            "--target" => options.target = value.parse()?,
            "--expires" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| format!("Invalid expiration: {}", value))?;
                options.expires = Some(Duration::from_millis(ms));
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
    }
    Ok(options)
}

/// Split a leading JSON value off `input`, returning it and the remainder.
fn split_json(input: &str) -> Result<(JsonValue, &str), String> {
    let mut stream = serde_json::Deserializer::from_str(input).into_iter::<JsonValue>();
    match stream.next() {
        Some(Ok(value)) => Ok((value, &input[stream.byte_offset()..])),
        Some(Err(e)) => Err(format!("Invalid JSON: {}", e)),
        None => Err("Missing JSON value".to_string()),
    }
}

fn split_name(input: &str) -> (&str, &str) {
    match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], input[pos..].trim_start()),
        None => (input, ""),
    }
}

fn cmd_write(session: &DebugSession, input: &str) -> CommandResult {
    let (name, rest) = split_name(input);
    if name.is_empty() || rest.is_empty() {
        return CommandResult::Error(
            "Usage: write <name> <json> [--owner o] [--target t] [--expires ms]".to_string(),
        );
    }
    let (value, rest) = match split_json(rest) {
        Ok(parsed) => parsed,
        Err(e) => return CommandResult::Error(e),
    };
    let options = match parse_options(rest) {
        Ok(options) => options,
        Err(e) => return CommandResult::Error(e),
    };
    try_write(session, name, Value::from(value), options)
}

fn cmd_release(session: &DebugSession, input: &str) -> CommandResult {
    let (name, rest) = split_name(input);
    if name.is_empty() {
        return CommandResult::Error("Usage: release <name> [--owner o]".to_string());
    }
    match parse_options(rest) {
        Ok(options) => try_write(session, name, Value::Null, options),
        Err(e) => CommandResult::Error(e),
    }
}

fn try_write(session: &DebugSession, name: &str, value: Value, options: WriteOptions) -> CommandResult {
    let result = session.instance().context().try_write_data_item(
        name,
        value,
        options.owner.as_deref(),
        options.target,
        options.expires,
    );
    match result {
        Ok(true) => CommandResult::ok_display(Color::Green.paint("ok").to_string()),
        Ok(false) => CommandResult::ok_display(
            Color::Red
                .paint(format!("rejected: '{}' is owned by someone else", name))
                .to_string(),
        ),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_layout(session: &DebugSession, input: &str) -> CommandResult {
    let ctx = session.instance().context();
    if input.is_empty() {
        return CommandResult::ok_display(ctx.read_state().app.layout.to_string());
    }
    let layout: LayoutType = match input.parse() {
        Ok(layout) => layout,
        Err(e) => return CommandResult::Error(e),
    };
    match ctx.change_layout(layout) {
        Ok(()) => CommandResult::ok_none(),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_resize(session: &DebugSession, input: &str) -> CommandResult {
    let width: u32 = match input.parse() {
        Ok(width) => width,
        Err(_) => return CommandResult::Error("Usage: resize <width>".to_string()),
    };
    let instance = session.instance();
    match instance.resize(width) {
        Ok(()) => CommandResult::ok_display(instance.context().read_state().app.layout.to_string()),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_loading(session: &DebugSession, input: &str) -> CommandResult {
    let loading = match input {
        "on" | "true" => true,
        "off" | "false" => false,
        _ => return CommandResult::Error("Usage: loading <on|off>".to_string()),
    };
    match session.instance().context().set_loading(loading) {
        Ok(()) => CommandResult::ok_none(),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_load(session: &DebugSession, input: &str) -> CommandResult {
    let meta: PiletMetadata = match serde_json::from_str(input) {
        Ok(meta) => meta,
        Err(e) => return CommandResult::Error(format!("Invalid pilet metadata: {}", e)),
    };
    if meta.name.is_empty() {
        return CommandResult::Error("Pilet metadata needs a name".to_string());
    }
    let label = format!("{}@{}", meta.name, meta.version);
    match session.load_scripted(meta) {
        Ok(()) => CommandResult::ok_display(format!("{} {}", Color::Green.paint("loaded"), label)),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_unload(session: &DebugSession, name: &str) -> CommandResult {
    if name.is_empty() {
        return CommandResult::Error("Usage: unload <name>".to_string());
    }
    match session.instance().unload_pilet(name) {
        Ok(()) => CommandResult::ok_display(format!("{} {}", Color::Green.paint("unloaded"), name)),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_view(session: &DebugSession, path: &str) -> CommandResult {
    let path = if path.is_empty() { "/" } else { path };
    let state = session.instance().context().read_state();
    let line = match resolve_view(&state, true, None, path) {
        View::Page { component, .. } => {
            format!("{} {}", Color::Green.paint("page"), component.name())
        }
        View::Error { kind, component, .. } => {
            format!("{} {} ({})", Color::Red.paint("error"), component.name(), kind)
        }
        View::Loader(component) => format!("{} {}", Color::Yellow.paint("loader"), component.name()),
    };
    CommandResult::ok_display(line)
}

fn cmd_render(session: &DebugSession, input: &str) -> CommandResult {
    let (name, rest) = split_name(input);
    if name.is_empty() {
        return CommandResult::Error("Usage: render <slot> [json-params]".to_string());
    }
    let params = if rest.is_empty() {
        Value::Null
    } else {
        match serde_json::from_str::<JsonValue>(rest) {
            Ok(json) => Value::from(json),
            Err(e) => return CommandResult::Error(format!("Invalid JSON: {}", e)),
        }
    };

    let ctx = session.instance().context().clone();
    let mut slot = ExtensionSlot::new(ctx, name, Element::new("div"));
    if let Err(e) = slot.render(&params) {
        let _ = slot.teardown();
        return CommandResult::Error(e.to_string());
    }
    let markup = slot.container().to_markup();
    match slot.teardown() {
        Ok(()) => CommandResult::ok_display(markup),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_actions(session: &DebugSession) -> CommandResult {
    let names = session.instance().context().action_names();
    CommandResult::ok_display(
        names
            .iter()
            .map(|n| format!("  {}", n))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn cmd_advance(session: &DebugSession, input: &str) -> CommandResult {
    let ms: u64 = match input.parse() {
        Ok(ms) => ms,
        Err(_) => return CommandResult::Error("Usage: advance <ms>".to_string()),
    };
    session.clock().advance(Duration::from_millis(ms));
    CommandResult::ok_display(dim(&format!("now {}", session.instance().context().now())))
}

fn pretty(value: &JsonValue) -> CommandResult {
    match serde_json::to_string_pretty(value) {
        Ok(s) => CommandResult::ok_display(s),
        Err(e) => CommandResult::Error(format!("Failed to format: {}", e)),
    }
}

fn dim(text: &str) -> String {
    Color::DarkGray.paint(text).to_string()
}

/// Format help text
pub fn format_help() -> String {
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);

    let mut help = String::new();
    help.push_str(&format!(
        "{}\n\n",
        Style::new().bold().paint("Piral Debug Shell Commands")
    ));

    let commands = [
        ("state", "", "Summary of the global state"),
        ("pages", "", "Registered pages"),
        ("extensions", "[name]", "Extension slots, or the registrations of one"),
        ("modules", "", "Loaded pilets"),
        ("portals", "", "Shown portal entries"),
        ("data", "[name]", "Shared data items"),
        ("", "", ""),
        ("write", "<name> <json> [opts]", "Try to write a data item (--owner, --target, --expires ms)"),
        ("release", "<name> [--owner o]", "Release a data item"),
        ("advance", "<ms>", "Move the clock forward"),
        ("", "", ""),
        ("layout", "[mobile|tablet|desktop]", "Show or change the layout"),
        ("resize", "<width>", "Pick the layout for a viewport width"),
        ("loading", "<on|off>", "Set the loading flag"),
        ("", "", ""),
        ("load", "<json-metadata>", "Load a pilet scripted by its metadata"),
        ("unload", "<name>", "Unload a pilet"),
        ("view", "[path]", "What the shell shows for a path"),
        ("render", "<slot> [json]", "Render an extension slot once"),
        ("actions", "", "Names in the action table"),
        ("", "", ""),
        ("help", "", "Show this help message"),
        ("exit", "", "Exit the shell (alias: quit, q)"),
    ];

    for (cmd, args, desc) in commands {
        if cmd.is_empty() {
            help.push('\n');
        } else {
            help.push_str(&format!(
                "  {:<12} {:<26} {}\n",
                cmd_style.paint(cmd),
                arg_style.paint(args),
                desc
            ));
        }
    }

    help.push_str(&format!("\n{}\n", Style::new().bold().paint("Loading pilets")));
    help.push_str(&format!(
        "  {}\n",
        arg_style.paint(
            r#"load {"name": "about", "version": "1.0.0", "custom": {"pages": {"/about": "About"}, "extensions": {"menu": "About"}}}"#
        )
    ));

    help
}

#[cfg(test)]
mod tests {
    use super::*;
    use piral_core::InstanceConfig;

    fn session() -> DebugSession {
        DebugSession::new(InstanceConfig::default()).unwrap()
    }

    fn display(result: CommandResult) -> String {
        match result {
            CommandResult::Ok { display } => display.unwrap_or_default(),
            CommandResult::Error(e) => panic!("unexpected error: {}", e),
            CommandResult::Exit => panic!("unexpected exit"),
            CommandResult::Help => panic!("unexpected help"),
        }
    }

    fn is_error(result: CommandResult) -> bool {
        matches!(result, CommandResult::Error(_))
    }

    #[test]
    fn empty_input_does_nothing() {
        assert!(matches!(
            execute("   ", &session()),
            CommandResult::Ok { display: None }
        ));
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(is_error(execute("frobnicate", &session())));
    }

    #[test]
    fn exit_and_help() {
        let s = session();
        assert!(matches!(execute("exit", &s), CommandResult::Exit));
        assert!(matches!(execute("q", &s), CommandResult::Exit));
        assert!(matches!(execute("help", &s), CommandResult::Help));
    }

    #[test]
    fn parse_options_reads_all_flags() {
        let options = parse_options("--owner shell --target local --expires 250").unwrap();
        assert_eq!(
            options,
            WriteOptions {
                owner: Some("shell".to_string()),
                target: DataStoreTarget::Local,
                expires: Some(Duration::from_millis(250)),
            }
        );
        assert_eq!(parse_options("").unwrap(), WriteOptions::default());
        assert!(parse_options("--owner").is_err());
        assert!(parse_options("--target attic").is_err());
        assert!(parse_options("--color red").is_err());
    }

    #[test]
    fn split_json_stops_after_first_value() {
        let (value, rest) = split_json(r#"{"a": "x --owner y"} --owner z"#).unwrap();
        assert_eq!(value, json!({"a": "x --owner y"}));
        assert_eq!(rest.trim(), "--owner z");
        assert!(split_json("{oops").is_err());
    }

    #[test]
    fn write_respects_ownership() {
        let s = session();
        assert!(display(execute(r#"write cart [1, 2] --owner shop"#, &s)).contains("ok"));
        assert!(display(execute("write cart 3 --owner other", &s)).contains("rejected"));

        let item = display(execute("data cart", &s));
        assert!(item.contains("\"shop\""));
        assert!(item.contains("\"value\": [\n"));
    }

    #[test]
    fn release_then_write_by_another_owner() {
        let s = session();
        execute("write token \"abc\" --owner auth", &s);
        assert!(display(execute("release token --owner auth", &s)).contains("ok"));
        assert!(display(execute("write token \"def\" --owner other", &s)).contains("ok"));
    }

    #[test]
    fn advance_lets_items_expire() {
        let s = session();
        execute("write lock true --owner a --expires 1000", &s);
        assert!(display(execute("write lock false --owner b", &s)).contains("rejected"));
        execute("advance 1000", &s);
        assert!(display(execute("write lock false --owner b", &s)).contains("ok"));
    }

    #[test]
    fn layout_resize_and_loading() {
        let s = session();
        execute("layout mobile", &s);
        assert_eq!(display(execute("layout", &s)), "mobile");
        assert!(is_error(execute("layout huge", &s)));

        assert_eq!(display(execute("resize 1920", &s)), "desktop");
        assert_eq!(display(execute("resize 320", &s)), "mobile");

        execute("loading on", &s);
        assert!(s.instance().context().read_state().app.loading);
        assert!(is_error(execute("loading maybe", &s)));
    }

    #[test]
    fn load_inspect_and_unload_pilet() {
        let s = session();
        let out = display(execute(
            r#"load {"name":"about","version":"1.0.0","custom":{"pages":{"/about":"About us"},"extensions":{"menu":"About"}}}"#,
            &s,
        ));
        assert!(out.contains("about@1.0.0"));

        assert!(display(execute("pages", &s)).contains("/about"));
        assert!(display(execute("extensions", &s)).contains("menu"));
        assert!(display(execute("extensions menu", &s)).contains("about:menu"));
        assert!(display(execute("modules", &s)).contains("about"));
        assert!(display(execute("view /about", &s)).contains("about/about"));
        assert!(display(execute("view /nope", &s)).contains("not_found"));

        let markup = display(execute(r#"render menu {"user": "ada"}"#, &s));
        assert!(markup.contains("About"));
        assert!(markup.contains("data-extension-ref"));
        assert!(display(execute("portals", &s)).contains("No portals"));

        assert!(is_error(execute(r#"load {"name":"about","version":"2"}"#, &s)));
        assert!(display(execute("unload about", &s)).contains("unloaded"));
        assert!(display(execute("pages", &s)).contains("No pages"));
        assert!(is_error(execute("unload about", &s)));
    }

    #[test]
    fn load_rejects_bad_metadata() {
        let s = session();
        assert!(is_error(execute("load not-json", &s)));
        assert!(is_error(execute(r#"load {"version":"1"}"#, &s)));
    }

    #[test]
    fn actions_lists_base_actions() {
        let out = display(execute("actions", &session()));
        assert!(out.contains("tryWriteDataItem"));
        assert!(out.contains("registerPage"));
    }

    #[test]
    fn state_summarizes_everything() {
        let s = session();
        execute("write theme \"dark\"", &s);
        let out = display(execute("state", &s));
        let parsed: JsonValue = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["app"]["layout"], "desktop");
        assert_eq!(parsed["data"], json!(["theme"]));
    }
}
