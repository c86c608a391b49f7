//! Terminal view adapter: command parsing and rendering

use shipform_common::UiPhase;
use shipform_session::form::FieldId;
use shipform_session::{SessionController, ShippingBackend};
use std::fmt::Write as _;
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  extract <file>        read markup from <file> and extract addresses
  show                  print the current form
  next | prev           page through addresses
  select <n>            jump to address <n> (1-based)
  set <field> <value>   edit a form field (e.g. set weight 2.5)
  merge on|off          merge all orders into one submission
  same-dims on|off      apply the shown dimensions to every merged order
  submit                validate and post the form, saving the CSV
  reset                 clear the session
  help                  show this text
  quit                  exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Extract(PathBuf),
    Show,
    Next,
    Prev,
    Select(usize),
    Set(FieldId, String),
    Merge(bool),
    SameDims(bool),
    Submit,
    Reset,
    Help,
    Quit,
}

/// Parse one input line; blank lines yield `Ok(None)`
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "extract" | "load" => {
            if rest.is_empty() {
                return Err("usage: extract <file>".to_string());
            }
            Command::Extract(PathBuf::from(rest))
        }
        "show" => Command::Show,
        "next" | "n" => Command::Next,
        "prev" | "p" => Command::Prev,
        "select" => {
            let n: usize = rest
                .parse()
                .map_err(|_| "usage: select <n> (1-based)".to_string())?;
            if n == 0 {
                return Err("address numbers start at 1".to_string());
            }
            Command::Select(n - 1)
        }
        "set" => {
            let (name, value) = match rest.split_once(char::is_whitespace) {
                Some((name, value)) => (name, value.trim()),
                None => (rest, ""),
            };
            if name.is_empty() {
                return Err("usage: set <field> <value>".to_string());
            }
            Command::Set(name.parse()?, value.to_string())
        }
        "merge" => Command::Merge(parse_toggle(rest)?),
        "same-dims" | "same_dimensions" => Command::SameDims(parse_toggle(rest)?),
        "submit" => Command::Submit,
        "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command: {} (try 'help')", other)),
    };
    Ok(Some(command))
}

fn parse_toggle(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" => Ok(true),
        "off" | "no" | "false" => Ok(false),
        _ => Err("expected on or off".to_string()),
    }
}

/// Render the sections visible in the current phase
pub fn render<B: ShippingBackend>(controller: &SessionController<B>) -> String {
    let view = controller.view();
    let mut out = String::new();

    if let Some(message) = &view.error_message {
        let _ = writeln!(out, "error: {}", message);
    }

    match controller.phase() {
        UiPhase::Input | UiPhase::Error => {
            let _ = writeln!(out, "Paste markup into a file and run: extract <file>");
        }
        UiPhase::Loading => {
            let _ = writeln!(out, "Extracting...");
        }
        UiPhase::Form => {
            if let Some(id) = controller.session_id() {
                let _ = writeln!(out, "session {}", id);
            }
            if let Some(count) = &view.order_count {
                let _ = writeln!(out, "{}", count);
            }
            if view.selector_visible {
                let cursor = controller.state().cursor();
                for (index, label) in view.selector_options.iter().enumerate() {
                    let marker = if index == cursor { '>' } else { ' ' };
                    let _ = writeln!(out, "{} [{}] {}", marker, index + 1, label);
                }
            }
            let form = controller.form();
            for field in FieldId::ALL {
                let flag = if view.invalid_fields.contains(&field) {
                    " (required)"
                } else {
                    ""
                };
                let _ = writeln!(out, "  {:<12} {}{}", field.name(), form.get(field), flag);
            }
            let options = controller.options();
            let _ = writeln!(
                out,
                "  merge orders: {}  same dimensions: {}",
                on_off(options.merge_orders),
                on_off(options.same_dimensions)
            );
        }
    }
    out
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
