use crate::commands::{print_json, Context};
use crate::error::{invalid_input, not_configured};
use anyhow::Result;
use clap::Args;
use crmsync_core::Platform;
use crmsync_sync::credentials;
use serde::Serialize;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Only check this platform
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
struct ValidationDto {
    platform: &'static str,
    valid: bool,
    endpoint: Option<String>,
    error: Option<String>,
}

/// Checks configured credentials offline; no request leaves the machine.
pub fn validate(ctx: &Context<'_>, args: ValidateArgs) -> Result<()> {
    let targets: Vec<Platform> = match args.platform {
        Some(raw) => {
            let platform = Platform::parse(&raw)?;
            if !ctx.config.platforms.contains_key(&platform) {
                return Err(not_configured(format!("no [platforms.{platform}] table")));
            }
            vec![platform]
        }
        None => ctx.config.platforms.keys().copied().collect(),
    };
    if targets.is_empty() {
        return Err(not_configured("no platforms configured"));
    }

    let items: Vec<ValidationDto> = targets
        .into_iter()
        .map(|platform| {
            let params = &ctx.config.platforms[&platform];
            match credentials::validate(platform, params) {
                Ok(config) => ValidationDto {
                    platform: platform.as_str(),
                    valid: true,
                    endpoint: Some(config.endpoint),
                    error: None,
                },
                Err(err) => ValidationDto {
                    platform: platform.as_str(),
                    valid: false,
                    endpoint: None,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect();
    let failed = items.iter().filter(|item| !item.valid).count();

    if ctx.json {
        print_json(&items)?;
    } else {
        for item in &items {
            match (&item.endpoint, &item.error) {
                (Some(endpoint), _) => println!("{}: ok ({})", item.platform, endpoint),
                (None, Some(error)) => println!("{}: {}", item.platform, error),
                (None, None) => println!("{}: invalid", item.platform),
            }
        }
    }

    if failed > 0 {
        return Err(invalid_input(format!(
            "{failed} of {} platform configurations are invalid",
            items.len()
        )));
    }
    Ok(())
}
