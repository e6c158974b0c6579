use crate::commands::{print_json, Context};
use crate::error::not_configured;
use anyhow::{anyhow, Context as _, Result};
use clap::Args;
use crmsync_config::AppConfig;
use crmsync_core::{Normalizer, Platform, SyncReceipt};
use crmsync_sync::{
    AdapterRegistry, DestinationSettings, HttpSettings, HttpSourceFactory, SimplyCastClient,
    SyncEngine,
};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Args)]
#[command(group(
    clap::ArgGroup::new("target")
        .required(true)
        .args(["platform", "all"])
))]
pub struct SyncArgs {
    /// Platform id to sync
    pub platform: Option<String>,
    /// Sync every configured platform
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct SyncDto {
    platform: &'static str,
    ok: bool,
    receipt: Option<Value>,
    error: Option<String>,
}

impl SyncDto {
    fn new(platform: Platform, result: crmsync_sync::Result<SyncReceipt>) -> Self {
        match result {
            Ok(receipt) => Self {
                platform: platform.as_str(),
                ok: true,
                receipt: Some(receipt.into_inner()),
                error: None,
            },
            Err(err) => Self {
                platform: platform.as_str(),
                ok: false,
                receipt: None,
                error: Some(err.to_string()),
            },
        }
    }
}

pub fn sync(ctx: &Context<'_>, args: SyncArgs) -> Result<()> {
    match args.platform {
        Some(raw) if !args.all => sync_one(ctx, &raw),
        _ => sync_all(ctx),
    }
}

fn sync_one(ctx: &Context<'_>, raw: &str) -> Result<()> {
    let platform = Platform::parse(raw)?;
    let engine = build_engine(ctx.config, Some(platform))?;
    let receipt = engine
        .sync_from(platform.as_str())
        .with_context(|| format!("sync {platform}"))?;
    print_results(ctx, vec![SyncDto::new(platform, Ok(receipt))])
}

fn sync_all(ctx: &Context<'_>) -> Result<()> {
    if ctx.config.platforms.is_empty() {
        return Err(not_configured("no platforms configured"));
    }
    let engine = build_engine(ctx.config, None)?;
    let items: Vec<SyncDto> = engine
        .sync_all()
        .into_iter()
        .map(|(platform, result)| SyncDto::new(platform, result))
        .collect();
    let failed = items.iter().filter(|item| !item.ok).count();
    let total = items.len();
    print_results(ctx, items)?;
    if failed > 0 {
        return Err(anyhow!("{failed} of {total} platforms failed to sync"));
    }
    Ok(())
}

fn print_results(ctx: &Context<'_>, items: Vec<SyncDto>) -> Result<()> {
    if ctx.json {
        return print_json(&items);
    }
    for item in items {
        match (item.receipt, item.error) {
            (Some(receipt), _) => println!("{}: submitted ({})", item.platform, receipt),
            (None, Some(error)) => println!("{}: failed: {}", item.platform, error),
            (None, None) => println!("{}: failed", item.platform),
        }
    }
    Ok(())
}

/// Wires the SimplyCast destination and the configured platforms into an
/// engine. With `only` set, other platform tables are left unvalidated.
fn build_engine(config: &AppConfig, only: Option<Platform>) -> Result<SyncEngine> {
    let Some(destination) = &config.destination else {
        return Err(not_configured(
            "destination: add a [destination] table with public_key and secret_key",
        ));
    };
    let http = HttpSettings {
        timeout: Duration::from_secs(config.timeout_secs),
        ..HttpSettings::default()
    };
    let mut settings =
        DestinationSettings::new(destination.public_key.as_str(), destination.secret_key.as_str());
    if let Some(endpoint) = &destination.endpoint {
        settings.endpoint = endpoint.trim_end_matches('/').to_string();
    }
    let client = SimplyCastClient::new(settings, &http)?;
    let engine = SyncEngine::new(
        AdapterRegistry::new(HttpSourceFactory::new(http)),
        Normalizer::new(config.rules.clone()),
        client,
    );

    for (platform, params) in &config.platforms {
        if only.is_some_and(|wanted| wanted != *platform) {
            continue;
        }
        engine
            .configure_platform(platform.as_str(), params)
            .with_context(|| format!("configure {platform}"))?;
        debug!(platform = %platform, "platform ready");
    }
    Ok(engine)
}
