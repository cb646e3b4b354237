use poise::serenity_prelude as serenity;

/// Union of the `@everyone` role and every role the member holds.
pub fn fold_role_permissions<'a>(
    guild_id: serenity::GuildId,
    member_roles: &[serenity::RoleId],
    roles: impl IntoIterator<Item = (&'a serenity::RoleId, serenity::Permissions)>,
) -> serenity::Permissions {
    let everyone_role_id = serenity::RoleId::new(guild_id.get());

    roles
        .into_iter()
        .filter(|(role_id, _)| **role_id == everyone_role_id || member_roles.contains(role_id))
        .fold(serenity::Permissions::empty(), |resolved, (_, perms)| {
            resolved | perms
        })
}

/// Effective guild-level permissions of a member. The owner holds all of them.
pub async fn resolve_user_permissions(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> anyhow::Result<serenity::Permissions> {
    let guild = guild_id.to_partial_guild(http).await?;
    if guild.owner_id == user_id {
        return Ok(serenity::Permissions::all());
    }

    let member = guild_id.member(http, user_id).await?;

    Ok(fold_role_permissions(
        guild_id,
        &member.roles,
        guild.roles.iter().map(|(id, role)| (id, role.permissions)),
    ))
}

/// Only administrators may change protections or exemptions.
pub async fn is_guild_administrator(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> anyhow::Result<bool> {
    let perms = resolve_user_permissions(http, guild_id, user_id).await?;

    Ok(perms.contains(serenity::Permissions::ADMINISTRATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everyone_role_applies_to_all_members() {
        let guild_id = serenity::GuildId::new(10);
        let everyone = serenity::RoleId::new(10);
        let admin = serenity::RoleId::new(11);
        let roles = [
            (everyone, serenity::Permissions::SEND_MESSAGES),
            (admin, serenity::Permissions::ADMINISTRATOR),
        ];

        let plain = fold_role_permissions(guild_id, &[], roles.iter().map(|(id, p)| (id, *p)));
        assert_eq!(plain, serenity::Permissions::SEND_MESSAGES);

        let elevated =
            fold_role_permissions(guild_id, &[admin], roles.iter().map(|(id, p)| (id, *p)));
        assert!(elevated.contains(serenity::Permissions::ADMINISTRATOR));
        assert!(elevated.contains(serenity::Permissions::SEND_MESSAGES));
    }
}
