//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to inspect and steer the soul without sending it a message.

/// A parsed chat command.
///
/// These commands are handled locally or through the backend's ancillary
/// endpoints; they never start a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Show the backend configuration.
    ShowConfig,

    /// Show the faculty weights.
    Weights,

    /// List habits, optionally restricted to one category.
    Habits(Option<String>),

    /// List learnings awaiting trainer guidance.
    Pending,

    /// List active learnings.
    Learnings,

    /// Strengthen a habit.
    Reinforce(i64),

    /// Answer a pending learning.
    Respond {
        /// The pending learning.
        learning_id: i64,
        /// What the soul should do.
        guidance: String,
        /// How to apply the guidance; may be empty.
        application_note: String,
    },

    /// Teach the soul something it has not asked about.
    Teach {
        /// The situation the learning applies to.
        trigger_summary: String,
        /// Comma-separated keywords that trigger the learning.
        keywords: String,
        /// What the soul should do.
        guidance: String,
        /// How to apply the guidance; may be empty.
        application_note: String,
    },

    /// Retire a learning.
    Forget(i64),

    /// Set the confidence below which the soul asks its trainer.
    Threshold(f64),

    /// Turn the backend's learning mode on or off.
    LearningMode(bool),

    /// Switch between streaming and one-shot turns.
    Stream(bool),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use soulai::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/habits emotional").is_some());
/// assert!(parse_command("Hello, soul!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "config" => ChatCommand::ShowConfig,
        "weights" => ChatCommand::Weights,
        "habits" => ChatCommand::Habits(argument.map(|s| s.to_string())),
        "pending" => ChatCommand::Pending,
        "learnings" => ChatCommand::Learnings,
        "reinforce" => parse_id_command("/reinforce", argument, ChatCommand::Reinforce),
        "respond" => parse_respond_command(argument),
        "teach" => parse_teach_command(argument),
        "forget" => parse_id_command("/forget", argument, ChatCommand::Forget),
        "threshold" => match argument.and_then(|v| v.parse::<f64>().ok()) {
            Some(value) if (0.0..=1.0).contains(&value) => ChatCommand::Threshold(value),
            _ => ChatCommand::Invalid("/threshold expects a number from 0.0 to 1.0".to_string()),
        },
        "learning" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::LearningMode(value),
            None => ChatCommand::Invalid("/learning expects 'on' or 'off'".to_string()),
        },
        "stream" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Stream(value),
            None => ChatCommand::Invalid("/stream expects 'on' or 'off'".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn parse_id(value: &str) -> Option<i64> {
    value.trim_start_matches('#').parse::<i64>().ok()
}

fn parse_id_command(
    name: &str,
    argument: Option<&str>,
    make: fn(i64) -> ChatCommand,
) -> ChatCommand {
    match argument.and_then(parse_id) {
        Some(id) => make(id),
        None => ChatCommand::Invalid(format!("{name} expects a numeric id")),
    }
}

fn parse_teach_command(argument: Option<&str>) -> ChatCommand {
    const USAGE: &str =
        "/teach requires '<situation> | <keywords> | <guidance> [| <application note>]'";
    let Some(arg) = argument else {
        return ChatCommand::Invalid(USAGE.to_string());
    };
    let mut fields = arg.splitn(4, '|').map(str::trim);
    let (Some(trigger_summary), Some(keywords), Some(guidance)) =
        (fields.next(), fields.next(), fields.next())
    else {
        return ChatCommand::Invalid(USAGE.to_string());
    };
    if trigger_summary.is_empty() || guidance.is_empty() {
        return ChatCommand::Invalid(USAGE.to_string());
    }
    ChatCommand::Teach {
        trigger_summary: trigger_summary.to_string(),
        keywords: keywords.to_string(),
        guidance: guidance.to_string(),
        application_note: fields.next().unwrap_or_default().to_string(),
    }
}

fn parse_respond_command(argument: Option<&str>) -> ChatCommand {
    const USAGE: &str = "/respond requires '<id> <guidance> [| <application note>]'";
    let Some(arg) = argument else {
        return ChatCommand::Invalid(USAGE.to_string());
    };

    let mut parts = arg.splitn(2, ' ');
    let Some(learning_id) = parts.next().and_then(parse_id) else {
        return ChatCommand::Invalid("/respond expects a numeric learning id".to_string());
    };
    let Some(text) = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty()) else {
        return ChatCommand::Invalid(USAGE.to_string());
    };

    let (guidance, application_note) = match text.split_once('|') {
        Some((guidance, note)) => (guidance.trim(), note.trim()),
        None => (text, ""),
    };
    if guidance.is_empty() {
        return ChatCommand::Invalid(USAGE.to_string());
    }
    ChatCommand::Respond {
        learning_id,
        guidance: guidance.to_string(),
        application_note: application_note.to_string(),
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /config                Show the soul's configuration
  /weights               Show the faculty weights
  /habits [category]     List habits (optionally one category)
  /reinforce <id>        Strengthen a habit
  /pending               List questions awaiting your guidance
  /learnings             List active learnings
  /respond <id> <guidance> [| <note>]
                         Answer a pending question
  /teach <situation> | <keywords> | <guidance> [| <note>]
                         Teach the soul without being asked
  /forget <id>           Retire a learning
  /learning on|off       Enable or disable learning mode
  /threshold <0.0-1.0>   Set the confidence below which the soul asks you
  /stream on|off         Stream answers as they form, or wait for them
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_inspection_commands() {
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
        assert_eq!(parse_command("/WEIGHTS"), Some(ChatCommand::Weights));
        assert_eq!(parse_command("/pending"), Some(ChatCommand::Pending));
        assert_eq!(parse_command("/learnings"), Some(ChatCommand::Learnings));
    }

    #[test]
    fn parse_habits() {
        assert_eq!(parse_command("/habits"), Some(ChatCommand::Habits(None)));
        assert_eq!(
            parse_command("/habits  emotional "),
            Some(ChatCommand::Habits(Some("emotional".to_string())))
        );
    }

    #[test]
    fn parse_respond() {
        assert_eq!(
            parse_command("/respond 42 Be gentle | Acknowledge the loss first"),
            Some(ChatCommand::Respond {
                learning_id: 42,
                guidance: "Be gentle".to_string(),
                application_note: "Acknowledge the loss first".to_string(),
            })
        );
        assert_eq!(
            parse_command("/respond #7 Say namaste"),
            Some(ChatCommand::Respond {
                learning_id: 7,
                guidance: "Say namaste".to_string(),
                application_note: String::new(),
            })
        );
        assert!(matches!(
            parse_command("/respond"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
        assert!(matches!(
            parse_command("/respond abc guidance"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("numeric")
        ));
        assert!(matches!(
            parse_command("/respond 3 | only a note"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_teach() {
        assert_eq!(
            parse_command("/teach greetings | hello,hi | Be warm | Greet back by name"),
            Some(ChatCommand::Teach {
                trigger_summary: "greetings".to_string(),
                keywords: "hello,hi".to_string(),
                guidance: "Be warm".to_string(),
                application_note: "Greet back by name".to_string(),
            })
        );
        assert_eq!(
            parse_command("/teach farewells |  | Say namaste"),
            Some(ChatCommand::Teach {
                trigger_summary: "farewells".to_string(),
                keywords: String::new(),
                guidance: "Say namaste".to_string(),
                application_note: String::new(),
            })
        );
        assert!(matches!(
            parse_command("/teach greetings | hello"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
        assert!(matches!(
            parse_command("/teach"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/teach | hello | Be warm"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_id_commands() {
        assert_eq!(parse_command("/reinforce 3"), Some(ChatCommand::Reinforce(3)));
        assert_eq!(parse_command("/forget #12"), Some(ChatCommand::Forget(12)));
        assert!(matches!(
            parse_command("/forget"),
            Some(ChatCommand::Invalid(msg)) if msg == "/forget expects a numeric id"
        ));
        assert!(matches!(
            parse_command("/reinforce warmth"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("/reinforce")
        ));
    }

    #[test]
    fn parse_threshold() {
        assert_eq!(
            parse_command("/threshold 0.65"),
            Some(ChatCommand::Threshold(0.65))
        );
        assert_eq!(parse_command("/threshold 1"), Some(ChatCommand::Threshold(1.0)));
        for bad in ["/threshold", "/threshold 1.5", "/threshold -0.1", "/threshold high"] {
            assert!(
                matches!(parse_command(bad), Some(ChatCommand::Invalid(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn parse_toggles() {
        assert_eq!(
            parse_command("/learning on"),
            Some(ChatCommand::LearningMode(true))
        );
        assert_eq!(parse_command("/stream off"), Some(ChatCommand::Stream(false)));
        assert!(matches!(
            parse_command("/stream maybe"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/model opus"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello, soul!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/teach"));
        assert!(help.contains("/respond"));
        assert!(help.contains("/threshold"));
        assert!(help.contains("/weights"));
    }
}
