/// Embed styling shared by command replies.
pub mod embed;
/// Classification of failed Discord requests.
pub mod errors;
/// Human-readable durations.
pub mod formatting;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Guild permission checks for administrative commands.
pub mod permissions;
