use crate::commands::{print_json, Context};
use crate::error::{invalid_input, not_configured};
use anyhow::Result;
use crmsync_core::Platform;
use crmsync_sync::{authorization_url, credentials, PlatformCredentials};

/// Prints the Salesforce consent URL. The `code` it yields goes back into the
/// `[platforms.salesforcecrm]` table.
pub fn print_auth_url(ctx: &Context<'_>) -> Result<()> {
    let platform = Platform::SalesforceCrm;
    let Some(params) = ctx.config.platforms.get(&platform) else {
        return Err(not_configured(format!("no [platforms.{platform}] table")));
    };
    let config = credentials::validate(platform, params)?;
    let PlatformCredentials::OAuthCode(creds) = &config.credentials else {
        return Err(invalid_input(
            "salesforcecrm uses the password flow; set redirect_uri for the authorization-code flow",
        ));
    };
    let url = authorization_url(&config.endpoint, &creds.client_id, &creds.redirect_uri)?;

    if ctx.json {
        print_json(&serde_json::json!({ "platform": platform.as_str(), "url": url }))?;
    } else {
        println!("{url}");
    }
    Ok(())
}
