use thiserror::Error;

/// The two search boxes: `type` searches exclude watched names, `find`
/// searches everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBox {
    Watchlist,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Remove(String),
    Toggle(String),
    Clear,
    List,
    /// Replaces the watchlist search box contents. Empty text clears it.
    Type(String),
    /// Replaces the global search box contents.
    Find(String),
    /// 1-based index into the suggestions last shown for that box.
    Pick(SearchBox, usize),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`; try `help`")]
    Unknown(String),
    #[error("`{0}` needs a name")]
    MissingArgument(&'static str),
    #[error("`{0}` needs a suggestion number, got `{1}`")]
    BadIndex(&'static str, String),
}

pub const HELP: &str = "\
commands:
  add <name>      watch a name
  remove <name>   stop watching a name
  toggle <name>   add or remove a name
  clear           empty the watchlist
  list            show the watchlist
  type <text>     search suggestions, skipping watched names
  find <text>     search all categories
  pick <n>        watch the n-th suggestion of the last `type`
  fpick <n>       watch the n-th result of the last `find`
  help            show this text
  quit            exit";

/// Parses one input line. A blank line is `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.trim().is_empty() {
        return Ok(None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (trimmed, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "add" => Command::Add(required(rest, "add")?),
        "remove" | "rm" => Command::Remove(required(rest, "remove")?),
        "toggle" => Command::Toggle(required(rest, "toggle")?),
        "clear" => Command::Clear,
        "list" | "ls" => Command::List,
        // Search text is passed through untrimmed; the debouncer decides what blank means.
        "type" => Command::Type(rest.to_string()),
        "find" => Command::Find(rest.to_string()),
        "pick" => Command::Pick(SearchBox::Watchlist, index(rest, "pick")?),
        "fpick" => Command::Pick(SearchBox::Global, index(rest, "fpick")?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required(rest: &str, command: &'static str) -> Result<String, CommandError> {
    let name = rest.trim();
    if name.is_empty() {
        return Err(CommandError::MissingArgument(command));
    }
    Ok(name.to_string())
}

fn index(rest: &str, command: &'static str) -> Result<usize, CommandError> {
    let arg = rest.trim();
    match arg.parse::<usize>() {
        Ok(index) if index > 0 => Ok(index),
        _ => Err(CommandError::BadIndex(command, arg.to_string())),
    }
}
