use crate::commands::{print_json, Context};
use anyhow::Result;
use crmsync_core::SUPPORTED_PLATFORMS;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PlatformDto {
    platform: &'static str,
    configured: bool,
}

pub fn list_platforms(ctx: &Context<'_>) -> Result<()> {
    let items: Vec<PlatformDto> = SUPPORTED_PLATFORMS
        .iter()
        .map(|platform| PlatformDto {
            platform: platform.as_str(),
            configured: ctx.config.platforms.contains_key(platform),
        })
        .collect();

    if ctx.json {
        return print_json(&items);
    }

    for item in items {
        let state = if item.configured {
            "configured"
        } else {
            "not configured"
        };
        println!("{} ({})", item.platform, state);
    }
    Ok(())
}
