//! Line commands typed into the terminal, mapped onto page intents.

use queue_core::UserIntent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Intent(UserIntent),
    Refresh,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  submit <location> | <description>   ask for help
  update <location> | <description>   edit your request
  cancel                              withdraw your request
  pop                                 take the next request (instructors)
  toggle                              go online/offline (instructors)
  refresh | show | help | quit";

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((line, ""));

    match word.to_ascii_lowercase().as_str() {
        "submit" => {
            let (location, description) = split_request_fields(rest)?;
            Ok(Command::Intent(UserIntent::SubmitRequest {
                location,
                description,
            }))
        }
        "update" => {
            let (location, description) = split_request_fields(rest)?;
            Ok(Command::Intent(UserIntent::UpdateMyRequest {
                location,
                description,
            }))
        }
        "cancel" => Ok(Command::Intent(UserIntent::CancelMyRequest)),
        "pop" => Ok(Command::Intent(UserIntent::PopQueue)),
        "toggle" => Ok(Command::Intent(UserIntent::ToggleStatus)),
        "refresh" => Ok(Command::Refresh),
        "show" | "" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command `{other}`; type `help`")),
    }
}

fn split_request_fields(rest: &str) -> Result<(String, String), String> {
    let (location, description) = rest
        .split_once('|')
        .ok_or_else(|| "expected `<location> | <description>`".to_string())?;
    let location = location.trim();
    let description = description.trim();
    if location.is_empty() || description.is_empty() {
        return Err("location and description must not be empty".to_string());
    }
    Ok((location.to_string(), description.to_string()))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
