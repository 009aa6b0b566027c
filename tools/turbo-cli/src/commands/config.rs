//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;

    ctx.output.info("[api]");
    ctx.output.kv("base_url", &config.api.base_url);
    if let Some(secs) = config.api.timeout_secs {
        ctx.output.kv("timeout_secs", &secs.to_string());
    }

    ctx.output.info("[currency]");
    ctx.output.kv("rates_url", &config.currency.rates_url);
    ctx.output
        .kv("fallback_rate", &config.currency.fallback_rate.to_string());

    ctx.output.info("[sync]");
    ctx.output.kv("policy", &format!("{:?}", config.sync_policy()));

    ctx.output.info("[storage]");
    ctx.output.kv("dir", &config.storage.dir.display().to_string());
    ctx.output
        .kv("remember_me", &config.storage.remember_me.to_string());

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("turbo.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output
        .success(&format!("Created {}", config_path.display()));

    Ok(())
}
