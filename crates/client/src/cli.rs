//! Line-oriented commands for the `stocklog` terminal front end.

use std::fmt::Write as _;

use stocklog_core::{Direction, Preset, ProductReference};
use thiserror::Error;

use crate::listing::StockRow;
use crate::notice::TransientNotice;

pub const HELP: &str = "\
commands:
  login <username> <password>   sign in
  logout                        sign out and forget the saved token
  search <text>                 find a product (or offer to add it)
  select <n>                    pick result n from the last search
  qty <n>                       set the quantity
  + [n] / - [n]                 step the quantity (default 1)
  preset <5|10|20|50>           set a preset quantity
  in / out                      record the movement
  list [filter]                 show stock levels
  reload                        re-read the product catalog
  status                        show the form and any notices
  help                          this text
  quit                          exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    Search(String),
    Select(usize),
    Quantity(String),
    Adjust(i64),
    Preset(Preset),
    Submit(Direction),
    List(Option<String>),
    Reload,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'; type 'help'")]
    Unknown(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{command}': invalid value '{value}'")]
    InvalidArgument { command: &'static str, value: String },
}

pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),
        "login" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(username), Some(password)) => Ok(Command::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                }),
                _ => Err(ParseError::MissingArgument {
                    command: "login",
                    argument: "a username and a password",
                }),
            }
        }
        "logout" => Ok(Command::Logout),
        "search" | "s" => Ok(Command::Search(rest.to_string())),
        "select" => {
            let n = required(rest, "select", "a result number")?;
            match n.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Command::Select(n)),
                _ => Err(invalid("select", n)),
            }
        }
        "qty" | "quantity" => Ok(Command::Quantity(required(rest, "qty", "a quantity")?.to_string())),
        "preset" => {
            let raw = required(rest, "preset", "one of 5, 10, 20, 50")?;
            raw.parse::<u32>()
                .ok()
                .and_then(Preset::from_value)
                .map(Command::Preset)
                .ok_or_else(|| invalid("preset", raw))
        }
        "in" => Ok(Command::Submit(Direction::In)),
        "out" => Ok(Command::Submit(Direction::Out)),
        "list" | "ls" => Ok(Command::List((!rest.is_empty()).then(|| rest.to_string()))),
        "reload" => Ok(Command::Reload),
        "status" => Ok(Command::Status),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        step if step.starts_with('+') || step.starts_with('-') => parse_step(step, rest),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

/// `+`, `+ 5`, `+5`, `-`, `- 2`, `-2`
fn parse_step(head: &str, rest: &str) -> Result<Command, ParseError> {
    let (sign, attached) = head.split_at(1);
    let amount = match (attached, rest) {
        ("", "") => 1,
        ("", n) | (n, "") => n
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| invalid("step", n))?,
        _ => return Err(invalid("step", rest)),
    };
    Ok(Command::Adjust(if sign == "-" { -amount } else { amount }))
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument { command, argument })
    } else {
        Ok(rest)
    }
}

fn invalid(command: &'static str, value: &str) -> ParseError {
    ParseError::InvalidArgument {
        command,
        value: value.to_string(),
    }
}

/// Numbered search results, as offered to `select`.
pub fn render_choices(choices: &[ProductReference]) -> String {
    let mut out = String::new();
    for (i, choice) in choices.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {}", i + 1, choice.label());
    }
    if out.is_empty() {
        out.push_str("  (no products)\n");
    }
    out
}

pub fn render_rows(rows: &[StockRow]) -> String {
    if rows.is_empty() {
        return "  (no matching products)\n".to_string();
    }
    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(4);
    let mut out = format!("  {:<width$}  {:>7}  STATUS\n", "NAME", "STOCK");
    for row in rows {
        let _ = writeln!(
            out,
            "  {:<width$}  {:>7}  {} ({})",
            row.name,
            row.stock,
            row.level.label(),
            row.category,
        );
    }
    out
}

pub fn render_notice(notice: &TransientNotice) -> String {
    format!("[{}] {}", notice.kind.as_str(), notice.message)
}
