use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Launch,
    Lookup,
    List,
    Refresh,
    Done,
    Auth,
    TestUpgrade,
    Test,
    Build,
    WorkflowLaunch,
    Version,
    Help,
}

pub struct CommandSpec {
    pub command: Command,
    pub usage: &'static str,
}

/// Tried top to bottom, so `test upgrade` must stay ahead of `test <name>`.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: Command::Launch,
        usage: "launch <image_or_version_or_pr> <options>",
    },
    CommandSpec {
        command: Command::Lookup,
        usage: "lookup <image_or_version_or_pr>",
    },
    CommandSpec {
        command: Command::List,
        usage: "list",
    },
    CommandSpec {
        command: Command::Refresh,
        usage: "refresh",
    },
    CommandSpec {
        command: Command::Done,
        usage: "done",
    },
    CommandSpec {
        command: Command::Auth,
        usage: "auth",
    },
    CommandSpec {
        command: Command::TestUpgrade,
        usage: "test upgrade <from> <to> <options>",
    },
    CommandSpec {
        command: Command::Test,
        usage: "test <name> <image_or_version_or_pr> <options>",
    },
    CommandSpec {
        command: Command::Build,
        usage: "build <pullrequest> <options>",
    },
    CommandSpec {
        command: Command::WorkflowLaunch,
        usage: "workflow-launch <name> <image_or_version_or_pr> <parameters>",
    },
    CommandSpec {
        command: Command::Version,
        usage: "version",
    },
    CommandSpec {
        command: Command::Help,
        usage: "help",
    },
];

/// Named arguments captured from a command line. Missing slots read as "".
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Slots(HashMap<&'static str, String>);

impl Slots {
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Match `text` against a usage pattern.
///
/// Literal words must match exactly. Each `<slot>` takes one
/// whitespace-separated word, except the last which takes the rest of the line.
pub fn match_usage(usage: &'static str, text: &str) -> Option<Slots> {
    let pattern: Vec<&'static str> = usage.split_whitespace().collect();
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut slots = HashMap::new();

    for (i, token) in pattern.iter().copied().enumerate() {
        match token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            Some(name) => {
                let value = if i + 1 == pattern.len() {
                    words.get(i..).map(|rest| rest.join(" ")).unwrap_or_default()
                } else {
                    words.get(i).map(|w| w.to_string()).unwrap_or_default()
                };
                slots.insert(name, value);
            }
            None => {
                if words.get(i) != Some(&token) {
                    return None;
                }
            }
        }
    }

    let has_trailing_slot = pattern.last().is_some_and(|t| t.starts_with('<'));
    if !has_trailing_slot && words.len() > pattern.len() {
        return None;
    }
    Some(Slots(slots))
}

pub fn find_command(text: &str) -> Option<(Command, Slots)> {
    COMMANDS
        .iter()
        .find_map(|spec| match_usage(spec.usage, text).map(|slots| (spec.command, slots)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_fill_in_order_and_default_empty() {
        let slots = match_usage("launch <image_or_version_or_pr> <options>", "launch 4.15").unwrap();
        assert_eq!(slots.get("image_or_version_or_pr"), "4.15");
        assert_eq!(slots.get("options"), "");
        assert_eq!(slots.get("nope"), "");
    }

    #[test]
    fn last_slot_takes_the_rest() {
        let slots = match_usage("launch <image_or_version_or_pr> <options>", "launch  4.15   gcp, ovn").unwrap();
        assert_eq!(slots.get("options"), "gcp, ovn");
    }

    #[test]
    fn literals_must_match() {
        assert!(match_usage("list", "lists").is_none());
        assert!(match_usage("list", "list everything").is_none());
        assert!(match_usage("list", "list").is_some());
    }

    #[test]
    fn upgrade_wins_over_plain_test() {
        let (command, slots) = find_command("test upgrade 4.14 4.15 aws").unwrap();
        assert_eq!(command, Command::TestUpgrade);
        assert_eq!(slots.get("from"), "4.14");
        assert_eq!(slots.get("to"), "4.15");
        assert_eq!(slots.get("options"), "aws");

        let (command, slots) = find_command("test e2e 4.15").unwrap();
        assert_eq!(command, Command::Test);
        assert_eq!(slots.get("name"), "e2e");
    }

    #[test]
    fn unknown_commands_do_not_match() {
        assert!(find_command("deploy everything").is_none());
        assert!(find_command("").is_none());
    }
}
