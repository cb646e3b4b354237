use std::sync::Arc;

use bastion_database::Database;
use bastion_guard::{AssetInventory, Guard};

pub type Error = anyhow::Error;

/// State shared by every command and event handler.
#[derive(Clone, Debug)]
pub struct Data {
    pub db: Database,
    pub guard: Arc<Guard>,
    /// Last known emoji and sticker ids per guild, for diffing inventory
    /// updates into individual creations and deletions.
    pub inventory: Arc<AssetInventory>,
}

pub type Context<'a> = poise::Context<'a, Data, Error>;
