pub mod guard;

use bastion_core::{Data, Error};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[guard::protection::META, guard::exempt::META];

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![guard::protection::protection(), guard::exempt::exempt()]
}
