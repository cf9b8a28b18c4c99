// ABOUTME: Turns directory participants into MarkdownV2 user mentions
// ABOUTME: Drops do-not-disturb users and escapes display names for Telegram

use crate::traits::{Participants, UserId};
use std::collections::HashSet;

/// Characters that must be backslash-escaped in MarkdownV2 text
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// A formatted string that mentions exactly one participant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MentionToken(String);

impl MentionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<MentionToken> for String {
    fn from(token: MentionToken) -> Self {
        token.0
    }
}

impl std::fmt::Display for MentionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escape text for use outside of entities in a MarkdownV2 message
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Build an inline mention of `user_id` labelled with `name`
pub fn mention_markdown(user_id: UserId, name: &str) -> MentionToken {
    // An empty label renders as nothing, which would silently drop the mention
    let label = if name.trim().is_empty() {
        user_id.to_string()
    } else {
        name.to_string()
    };
    MentionToken(format!(
        "[{}](tg://user?id={})",
        escape_markdown(&label),
        user_id
    ))
}

/// Format every participant not in `dnd` as a mention, preserving order
pub fn mention_tokens(participants: &Participants, dnd: &HashSet<UserId>) -> Vec<MentionToken> {
    participants
        .iter()
        .filter(|(id, _)| !dnd.contains(id))
        .map(|(id, name)| mention_markdown(*id, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participants(n: i64) -> Participants {
        (1..=n).map(|i| (UserId(i), format!("user{}", i))).collect()
    }

    #[test]
    fn test_mention_markdown_format() {
        let token = mention_markdown(UserId(123), "Alice");
        assert_eq!(token.as_str(), "[Alice](tg://user?id=123)");
    }

    #[test]
    fn test_mention_markdown_escapes_name() {
        let token = mention_markdown(UserId(1), "a_b [x] v1.0!");
        assert_eq!(token.as_str(), r"[a\_b \[x\] v1\.0\!](tg://user?id=1)");
    }

    #[test]
    fn test_mention_markdown_empty_name_uses_id() {
        let token = mention_markdown(UserId(99), "  ");
        assert_eq!(token.as_str(), "[99](tg://user?id=99)");
    }

    #[test]
    fn test_escape_markdown_backslash() {
        assert_eq!(escape_markdown(r"a\b"), r"a\\b");
        assert_eq!(escape_markdown("plain text"), "plain text");
    }

    #[test]
    fn test_mention_tokens_drops_dnd() {
        let dnd: HashSet<UserId> = [UserId(3), UserId(7)].into_iter().collect();
        let tokens = mention_tokens(&participants(12), &dnd);
        assert_eq!(tokens.len(), 10);
        assert!(tokens.iter().all(|t| !t.as_str().contains("id=3)")));
        assert!(tokens.iter().all(|t| !t.as_str().contains("id=7)")));
    }

    #[test]
    fn test_mention_tokens_dnd_not_in_chat() {
        let dnd: HashSet<UserId> = [UserId(500)].into_iter().collect();
        assert_eq!(mention_tokens(&participants(4), &dnd).len(), 4);
    }

    #[test]
    fn test_mention_tokens_ordered_by_id() {
        let mut map = Participants::new();
        map.insert(UserId(30), "c".to_string());
        map.insert(UserId(10), "a".to_string());
        map.insert(UserId(20), "b".to_string());
        let tokens = mention_tokens(&map, &HashSet::new());
        let labels: Vec<&str> = tokens.iter().map(|t| &t.as_str()[1..2]).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_mention_tokens_empty() {
        assert!(mention_tokens(&Participants::new(), &HashSet::new()).is_empty());
    }
}
