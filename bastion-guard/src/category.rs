use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A protected class of action with its own enable flag and threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GuildSettings,
    Role,
    Channel,
    Emoji,
    Sticker,
    AddedBot,
    Ban,
    Kick,
    Spam,
    ShoutRatio,
    Profanity,
    Advertising,
    Link,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown protection category `{0}`")]
pub struct CategoryParseError(pub String);

impl Category {
    pub const ALL: [Category; 13] = [
        Category::GuildSettings,
        Category::Role,
        Category::Channel,
        Category::Emoji,
        Category::Sticker,
        Category::AddedBot,
        Category::Ban,
        Category::Kick,
        Category::Spam,
        Category::ShoutRatio,
        Category::Profanity,
        Category::Advertising,
        Category::Link,
    ];

    /// Stable name used in storage and administrative commands.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::GuildSettings => "guild_settings",
            Category::Role => "role",
            Category::Channel => "channel",
            Category::Emoji => "emoji",
            Category::Sticker => "sticker",
            Category::AddedBot => "added_bot",
            Category::Ban => "ban",
            Category::Kick => "kick",
            Category::Spam => "spam",
            Category::ShoutRatio => "shout_ratio",
            Category::Profanity => "profanity",
            Category::Advertising => "advertising",
            Category::Link => "link",
        }
    }

    /// Human-facing label used in sanction reasons and command output.
    pub fn label(self) -> &'static str {
        match self {
            Category::GuildSettings => "Server settings",
            Category::Role => "Role",
            Category::Channel => "Channel",
            Category::Emoji => "Emoji",
            Category::Sticker => "Sticker",
            Category::AddedBot => "Bot addition",
            Category::Ban => "Ban",
            Category::Kick => "Kick",
            Category::Spam => "Spam",
            Category::ShoutRatio => "Caps",
            Category::Profanity => "Profanity",
            Category::Advertising => "Advertising",
            Category::Link => "Link",
        }
    }

    /// Categories driven by message content rather than structural changes.
    pub fn is_content(self) -> bool {
        matches!(
            self,
            Category::Spam
                | Category::ShoutRatio
                | Category::Profanity
                | Category::Advertising
                | Category::Link
        )
    }

    /// Whether the numeric threshold means anything for this category.
    ///
    /// `AddedBot` reacts on the first occurrence and the pattern checks react
    /// on any match, so their stored threshold is ignored.
    pub fn uses_threshold(self) -> bool {
        !matches!(
            self,
            Category::AddedBot | Category::Profanity | Category::Advertising | Category::Link
        )
    }

    /// Threshold stored when a category is enabled before a limit was set.
    pub fn default_threshold(self) -> u32 {
        match self {
            Category::Spam => 5,
            Category::ShoutRatio => 70,
            Category::AddedBot
            | Category::Profanity
            | Category::Advertising
            | Category::Link => 0,
            _ => 3,
        }
    }

    /// Upper bound accepted for a threshold: shout ratio is a percentage.
    pub fn max_threshold(self) -> u32 {
        match self {
            Category::ShoutRatio => 100,
            _ => 1_000,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        let category = match normalized.as_str() {
            "guild_settings" | "guild" | "settings" | "server" => Category::GuildSettings,
            "role" | "roles" => Category::Role,
            "channel" | "channels" => Category::Channel,
            "emoji" | "emojis" => Category::Emoji,
            "sticker" | "stickers" => Category::Sticker,
            "added_bot" | "bot" | "bots" => Category::AddedBot,
            "ban" | "bans" => Category::Ban,
            "kick" | "kicks" => Category::Kick,
            "spam" => Category::Spam,
            "shout_ratio" | "caps" | "shout" => Category::ShoutRatio,
            "profanity" | "swear" => Category::Profanity,
            "advertising" | "ads" | "ad" => Category::Advertising,
            "link" | "links" | "url" => Category::Link,
            _ => return Err(CategoryParseError(raw.trim().to_owned())),
        };

        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_names_parse_back() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn aliases_and_case_are_accepted() {
        assert_eq!("CAPS".parse::<Category>(), Ok(Category::ShoutRatio));
        assert_eq!(" bot ".parse::<Category>(), Ok(Category::AddedBot));
        assert_eq!("guild-settings".parse::<Category>(), Ok(Category::GuildSettings));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "webhooks".parse::<Category>().unwrap_err();
        assert_eq!(err.to_string(), "unknown protection category `webhooks`");
    }

    #[test]
    fn content_split() {
        let content: Vec<_> = Category::ALL.iter().filter(|c| c.is_content()).collect();
        assert_eq!(content.len(), 5);
        assert!(!Category::AddedBot.is_content());
    }
}
