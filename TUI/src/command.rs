use crate::action::Action;

pub struct CommandParser;

impl CommandParser {
    pub fn parse(input: &str) -> Result<Action, String> {
        let input = input.trim();
        if !input.starts_with('/') {
            return Err("Not a command".to_string());
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        let args = args.trim();

        match cmd {
            "/help" => Ok(Action::Help),
            "/new" => Ok(Action::NewChat),
            "/stop" => Ok(Action::Stop),
            "/upload" => {
                if args.is_empty() {
                    Err("Usage: /upload <path>\n  Example: /upload ./report.pdf".to_string())
                } else {
                    Ok(Action::Upload { path: args.to_string() })
                }
            }
            "/copy" => Ok(Action::CopyReply),
            "/like" => Ok(Action::Feedback { positive: true }),
            "/dislike" => Ok(Action::Feedback { positive: false }),
            "/sidebar" => Ok(Action::ToggleSidebar),
            "/quit" => Ok(Action::Quit),
            _ => Err(format!("Unknown command: {}. Type /help for available commands.", cmd)),
        }
    }
}
