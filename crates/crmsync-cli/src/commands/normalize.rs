use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use anyhow::{Context as _, Result};
use clap::Args;
use crmsync_core::{Normalizer, RawContact};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// JSON file holding an array of contact records
    pub file: PathBuf,
}

/// Runs the configured rules over a local file without contacting any service.
pub fn normalize(ctx: &Context<'_>, args: NormalizeArgs) -> Result<()> {
    let data = fs::read_to_string(&args.file)
        .with_context(|| format!("read contacts file {}", args.file.display()))?;
    let parsed: Value = serde_json::from_str(&data)
        .with_context(|| format!("parse contacts file {}", args.file.display()))?;
    let Some(records) = parsed.as_array() else {
        return Err(invalid_input("contacts file must hold a JSON array"));
    };
    let contacts: Vec<RawContact> = records.iter().map(RawContact::from_json).collect();

    let normalized = Normalizer::new(ctx.config.rules.clone()).normalize(&contacts)?;

    if ctx.json {
        return print_json(&normalized);
    }
    if normalized.is_empty() {
        println!("no contacts");
        return Ok(());
    }
    for (index, contact) in normalized.iter().enumerate() {
        println!("contact {}", index + 1);
        for field in contact.fields() {
            println!("  {}: {}", field.id, field.value);
        }
    }
    Ok(())
}
