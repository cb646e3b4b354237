//! Message content checks: spam rate, shouting, profanity, advertising and
//! raw links. Checks run in that order and stop at the first one that fires.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, warn};

use crate::category::Category;
use crate::counter::{ActionKey, WindowCounter};
use crate::policy::{GuildPolicy, PolicySource};
use crate::remediation::{RemediationOutcome, Remediator, Sanction, log_failure};
use crate::verdict::{Skip, Verdict};

static ADVERTISING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(discord\.gg/\w+|discord(?:app)?\.com/invite/\w+|\.(?:tk|ml|ga|cf|gq)\b)",
    )
    .expect("advertising pattern is valid")
});

static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://\S+").expect("link pattern is valid"));

/// Static substring list; matching is case-insensitive.
pub const PROFANITY: &[&str] = &[
    "fuck",
    "shit",
    "bitch",
    "cunt",
    "asshole",
    "bastard",
    "dickhead",
    "wanker",
];

/// Percentage of uppercase letters among all characters of `body`.
///
/// Non-letters count toward the denominator, so a message without letters
/// scores zero.
pub fn shout_percentage(body: &str) -> f64 {
    let total = body.chars().count();
    if total == 0 {
        return 0.0;
    }

    let upper = body.chars().filter(|ch| ch.is_uppercase()).count();
    upper as f64 / total as f64 * 100.0
}

pub fn contains_advertising(body: &str) -> bool {
    ADVERTISING.is_match(body)
}

pub fn contains_link(body: &str) -> bool {
    LINK.is_match(body)
}

pub fn contains_profanity(body: &str) -> bool {
    let lower = body.to_lowercase();
    PROFANITY.iter().any(|word| lower.contains(word))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub author_id: u64,
    pub body: String,
    pub author_is_bot: bool,
}

pub struct ContentGuard {
    policies: Arc<dyn PolicySource>,
    remediator: Arc<dyn Remediator>,
    counter: Arc<WindowCounter<ActionKey>>,
    spam_timeout: Duration,
}

impl ContentGuard {
    pub fn new(
        policies: Arc<dyn PolicySource>,
        remediator: Arc<dyn Remediator>,
        spam_window: Duration,
        spam_timeout: Duration,
    ) -> Self {
        Self {
            policies,
            remediator,
            counter: Arc::new(WindowCounter::new(spam_window)),
            spam_timeout,
        }
    }

    pub fn counter(&self) -> &Arc<WindowCounter<ActionKey>> {
        &self.counter
    }

    pub async fn handle(&self, message: &MessageEvent) -> Verdict {
        if message.author_is_bot {
            return Verdict::Skipped(Skip::AutomatedAuthor);
        }

        let guild_id = message.guild_id;
        let policy = match self.policies.guild_policy(guild_id).await {
            Ok(Some(policy)) if policy.any_content_enabled() => policy,
            Ok(_) => return Verdict::Skipped(Skip::Disabled),
            Err(source) => {
                error!(?source, guild_id, "failed to read guild policy");
                return Verdict::Skipped(Skip::StoreUnavailable);
            }
        };

        match self.policies.is_exempt(guild_id, message.author_id).await {
            Ok(false) => {}
            Ok(true) => return Verdict::Skipped(Skip::Exempt),
            Err(source) => {
                error!(?source, guild_id, "failed to read exemption list");
                return Verdict::Skipped(Skip::StoreUnavailable);
            }
        }

        match self.first_violation(&policy, message) {
            Some(category) => self.remediate(message, category).await,
            None => Verdict::Clean,
        }
    }

    fn first_violation(&self, policy: &GuildPolicy, message: &MessageEvent) -> Option<Category> {
        if let Some(limit) = policy.threshold(Category::Spam) {
            let key = ActionKey::new(message.guild_id, message.author_id, Category::Spam);
            let breach = self.counter.increment_past(key, limit);
            debug!(
                guild_id = message.guild_id,
                author_id = message.author_id,
                count = breach.count(),
                limit,
                "message counted"
            );
            if breach.is_exceeded() {
                return Some(Category::Spam);
            }
        }

        if let Some(percentage) = policy.threshold(Category::ShoutRatio) {
            if shout_percentage(&message.body) > f64::from(percentage) {
                return Some(Category::ShoutRatio);
            }
        }

        let pattern_checks: [(Category, fn(&str) -> bool); 3] = [
            (Category::Profanity, contains_profanity),
            (Category::Advertising, contains_advertising),
            (Category::Link, contains_link),
        ];

        pattern_checks
            .into_iter()
            .find(|(category, check)| policy.is_enabled(*category) && check(&message.body))
            .map(|(category, _)| category)
    }

    async fn remediate(&self, message: &MessageEvent, category: Category) -> Verdict {
        let guild_id = message.guild_id;
        warn!(guild_id, author_id = message.author_id, %category, "message violates content policy");

        log_failure(
            "delete_message",
            guild_id,
            self.remediator
                .delete_message(message.channel_id, message.message_id)
                .await,
        );

        let sanction = if category == Category::Spam {
            log_failure(
                "suspend_actor",
                guild_id,
                self.remediator
                    .suspend_actor(guild_id, message.author_id, self.spam_timeout, "Spam protection")
                    .await,
            );
            Sanction::Suspend(self.spam_timeout)
        } else {
            let notice = notice_text(category, message.author_id);
            log_failure(
                "send_channel_notice",
                guild_id,
                self.remediator
                    .send_channel_notice(message.channel_id, &notice)
                    .await,
            );
            Sanction::None
        };

        Verdict::Remediated {
            category,
            outcome: RemediationOutcome {
                revert: true,
                sanction,
            },
        }
    }
}

fn notice_text(category: Category, author_id: u64) -> String {
    let rule = match category {
        Category::ShoutRatio => "please don't use so many capital letters",
        Category::Profanity => "profanity is not allowed here",
        Category::Advertising => "advertising is not allowed here",
        Category::Link => "posting links is not allowed here",
        _ => "that message broke the server rules",
    };

    format!("<@{}>, {}!", author_id, rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_and_letterless_messages_score_zero() {
        assert_eq!(shout_percentage("aaaa"), 0.0);
        assert_eq!(shout_percentage("1234 !!"), 0.0);
        assert_eq!(shout_percentage(""), 0.0);
    }

    #[test]
    fn punctuation_dilutes_the_ratio() {
        assert_eq!(shout_percentage("HELLO"), 100.0);
        assert_eq!(shout_percentage("HI!!"), 50.0);
    }

    #[test]
    fn links_require_a_scheme() {
        assert!(contains_link("visit http://x.io"));
        assert!(contains_link("HTTPS://example.com/path"));
        assert!(!contains_link("visit x.io"));
    }

    #[test]
    fn advertising_patterns() {
        assert!(contains_advertising("join discord.gg/abc123"));
        assert!(contains_advertising("discordapp.com/invite/xyz"));
        assert!(contains_advertising("free nitro at claim.tk"));
        assert!(!contains_advertising("I use tkinter and python"));
        assert!(!contains_advertising("see you on discord later"));
    }

    #[test]
    fn profanity_is_case_insensitive_substring() {
        assert!(contains_profanity("what the SHIT"));
        assert!(!contains_profanity("have a nice day"));
    }

    #[test]
    fn notice_mentions_author() {
        assert_eq!(
            notice_text(Category::Link, 7),
            "<@7>, posting links is not allowed here!"
        );
    }
}
