pub mod admin;
pub mod browse;
pub mod checklist;
pub mod config;
pub mod convert;

use std::fmt::Display;

use serde::Serialize;

use crate::cli::{Cli, Command, ConfigCommand};
use crate::error::Result;
use crate::storage::FileStore;
use config::{Overrides, Settings};

/// What every command needs besides its own arguments.
pub struct Context {
    pub settings: Settings,
    pub json: bool,
}

impl Context {
    pub fn open_store(&self) -> FileStore {
        FileStore::open(self.settings.storage_path.clone())
    }
}

/// Prints `value` as pretty JSON or as its text rendering.
pub fn emit<T: Serialize + Display>(json: bool, value: &T) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{value}");
    }
    Ok(())
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let json = cli.global.json;
    let overrides = Overrides {
        config_path: cli.global.config,
        data_source: cli.global.data_source,
        api_base: cli.global.api_base,
        storage_path: cli.global.storage,
    };

    match cli.command {
        Command::Config(ConfigCommand::Show) => emit(json, &config::show(&overrides)?),
        Command::Config(ConfigCommand::Set { key, value }) => {
            let updated = config::set_value(&overrides, &key, &value)?;
            emit(json, &updated)
        }
        Command::Convert(cmd) => convert::run(cmd, json),
        command => {
            let ctx = Context {
                settings: config::resolve(&overrides)?,
                json,
            };
            tracing::debug!("settings: {:?}", ctx.settings);
            match command {
                Command::Browse(args) => browse::run(&ctx, args).await,
                Command::Check { name, tier } => checklist::toggle(&ctx, &name, tier).await,
                Command::Checklist => checklist::show(&ctx),
                Command::Admin(cmd) => admin::run(&ctx, cmd).await,
                Command::Config(_) | Command::Convert(_) => Ok(()),
            }
        }
    }
}
