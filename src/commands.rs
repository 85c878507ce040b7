//! Available commands and autocomplete logic

use crate::catalog::SortKey;

/// What a command does once executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Sort(SortKey),
  Refresh,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub action: Action,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "name",
    aliases: &["n", "title"],
    description: "Sort by name",
    action: Action::Sort(SortKey::Name),
  },
  Command {
    name: "price",
    aliases: &["p", "cost"],
    description: "Sort by price",
    action: Action::Sort(SortKey::Price),
  },
  Command {
    name: "publisher",
    aliases: &["pub"],
    description: "Sort by publisher",
    action: Action::Sort(SortKey::Publisher),
  },
  Command {
    name: "genre",
    aliases: &["g"],
    description: "Sort by genre",
    action: Action::Sort(SortKey::Genre),
  },
  Command {
    name: "unsorted",
    aliases: &["none", "clear"],
    description: "Keep catalog order",
    action: Action::Sort(SortKey::None),
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Fetch the catalog again",
    action: Action::Refresh,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit bookstall",
    action: Action::Quit,
  },
];

/// Lower is a better match; None means no match at all.
fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();

  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&'static Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_rank(cmd, &input).map(|rank| (cmd, rank)))
    .collect();

  // Stable, so ties keep declaration order
  matches.sort_by_key(|(_, rank)| *rank);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Resolve the input to a single command: the selected suggestion if any.
pub fn resolve(input: &str, selected: usize) -> Option<&'static Command> {
  get_suggestions(input).get(selected).copied()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("price");
    assert_eq!(suggestions[0].name, "price");
  }

  #[test]
  fn test_alias_beats_prefix() {
    // "p" is an alias of price and a prefix of publisher
    let suggestions = get_suggestions("p");
    assert_eq!(suggestions[0].name, "price");
    assert_eq!(suggestions[1].name, "publisher");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("gen");
    assert_eq!(suggestions[0].action, Action::Sort(SortKey::Genre));
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("fres");
    assert_eq!(suggestions[0].name, "refresh");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("zzz").is_empty());
    assert!(resolve("zzz", 0).is_none());
  }

  #[test]
  fn test_resolve_uses_selection() {
    assert_eq!(resolve("p", 1).map(|c| c.action), Some(Action::Sort(SortKey::Publisher)));
    assert_eq!(resolve(" QUIT ", 0).map(|c| c.action), Some(Action::Quit));
  }
}
