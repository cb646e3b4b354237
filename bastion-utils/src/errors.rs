use poise::serenity_prelude as serenity;

const MISSING_ACCESS: isize = 50_001;
const MISSING_PERMISSIONS: isize = 50_013;

/// JSON error codes Discord returns when the addressed object no longer
/// exists (channel, guild, member, message, role, user, emoji, ban, sticker).
const UNKNOWN_RESOURCE_CODES: [isize; 9] = [
    10_003, 10_004, 10_007, 10_008, 10_011, 10_013, 10_014, 10_026, 10_060,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscordFailure {
    /// The bot lacks a permission or sits too low in the role hierarchy.
    MissingPermissions,
    /// The target was already gone.
    UnknownResource,
    Other,
}

/// Classify a failed request from its HTTP status and Discord JSON code.
pub fn classify_response(status: u16, code: isize) -> DiscordFailure {
    if code == MISSING_PERMISSIONS || code == MISSING_ACCESS || status == 403 {
        DiscordFailure::MissingPermissions
    } else if UNKNOWN_RESOURCE_CODES.contains(&code) || status == 404 {
        DiscordFailure::UnknownResource
    } else {
        DiscordFailure::Other
    }
}

pub fn classify(source: &serenity::Error) -> DiscordFailure {
    match source {
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response)) => {
            classify_response(response.status_code.as_u16(), response.error.code)
        }
        _ => DiscordFailure::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_failures() {
        assert_eq!(
            classify_response(403, MISSING_PERMISSIONS),
            DiscordFailure::MissingPermissions
        );
        assert_eq!(classify_response(403, 0), DiscordFailure::MissingPermissions);
        assert_eq!(
            classify_response(400, MISSING_ACCESS),
            DiscordFailure::MissingPermissions
        );
    }

    #[test]
    fn vanished_targets() {
        assert_eq!(classify_response(404, 10_011), DiscordFailure::UnknownResource);
        assert_eq!(classify_response(404, 10_026), DiscordFailure::UnknownResource);
        assert_eq!(classify_response(404, 0), DiscordFailure::UnknownResource);
    }

    #[test]
    fn everything_else() {
        assert_eq!(classify_response(500, 0), DiscordFailure::Other);
        assert_eq!(classify_response(429, 0), DiscordFailure::Other);
    }
}
