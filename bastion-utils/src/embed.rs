use poise::serenity_prelude as serenity;

/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0xB2_3A_48;

/// Embed with one line per entry, or `empty_note` when there are none.
pub fn build_list_embed(
    title: &str,
    lines: &[String],
    empty_note: &str,
    footer: Option<&str>,
) -> serenity::CreateEmbed {
    let description = if lines.is_empty() {
        empty_note.to_owned()
    } else {
        lines.join("\n")
    };

    let builder = serenity::CreateEmbed::new()
        .title(title.to_owned())
        .color(DEFAULT_EMBED_COLOR)
        .description(description);

    match footer {
        Some(note) if !note.is_empty() => {
            builder.footer(serenity::CreateEmbedFooter::new(note.to_owned()))
        }
        _ => builder,
    }
}
