//! Secret lifecycle commands.
//!
//! Provides `ksm create|update|get|list|delete`. Each command builds a
//! [`SecretRecord`] from its flags and hands it to the [`SecretManager`].

use std::collections::BTreeMap;

use clap::Args;
use ksm_secrets::{SecretManager, SecretRecord};

/// Arguments shared by `create` and `update`.
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Secret name
    #[arg(long)]
    pub name: String,

    /// Comma-separated key=value pairs, e.g. user=admin,password=s3cr3t
    #[arg(long)]
    pub data: String,

    /// Secret type
    #[arg(long = "type")]
    pub kind: Option<String>,
}

/// Parse `k=v,k2=v2` into entries.
///
/// Pairs are split on the first `=` and trimmed; pairs without `=` are
/// skipped. Keys are not checked here.
pub fn parse_data(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn record_from(namespace: &str, args: WriteArgs) -> SecretRecord {
    SecretRecord::new(namespace, args.name)
        .with_kind(args.kind.unwrap_or_default())
        .with_entries(parse_data(&args.data))
}

/// Run `ksm create`.
pub async fn create(
    manager: &SecretManager,
    namespace: &str,
    args: WriteArgs,
) -> anyhow::Result<()> {
    let created = manager.create(record_from(namespace, args)).await?;
    println!(
        "Secret '{}' created in namespace '{}'.",
        created.name, created.namespace
    );
    Ok(())
}

/// Run `ksm update`.
pub async fn update(
    manager: &SecretManager,
    namespace: &str,
    args: WriteArgs,
) -> anyhow::Result<()> {
    let updated = manager.update(record_from(namespace, args)).await?;
    println!(
        "Secret '{}' updated in namespace '{}'.",
        updated.name, updated.namespace
    );
    Ok(())
}

/// Run `ksm get`.
pub async fn get(
    manager: &SecretManager,
    namespace: &str,
    name: &str,
    key: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(key) = key {
        println!("{}", manager.get_value(namespace, name, key).await?);
        return Ok(());
    }

    let record = manager.get(namespace, name).await?;
    println!("Name:      {}", record.name);
    println!("Namespace: {}", record.namespace);
    println!("Type:      {}", record.kind);
    if let Some(version) = &record.resource_version {
        println!("Version:   {}", version);
    }
    if let Some(created) = record.created_at {
        println!("Created:   {}", created.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("Data:");
    for (key, value) in &record.entries {
        println!("  {} = {}", key, value);
    }
    Ok(())
}

/// Run `ksm list`.
pub async fn list(manager: &SecretManager, namespace: &str) -> anyhow::Result<()> {
    let records = manager.list(namespace).await?;

    if records.is_empty() {
        println!("No secrets in namespace '{}'.", namespace);
        return Ok(());
    }

    println!("{:<32} {:<24} {:<6} {}", "NAME", "TYPE", "KEYS", "CREATED");
    println!("{}", "-".repeat(84));
    for r in &records {
        let created = r
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<32} {:<24} {:<6} {}", r.name, r.kind, r.entries.len(), created);
    }
    println!("\n{} secret(s) total.", records.len());
    Ok(())
}

/// Run `ksm delete`.
pub async fn delete(manager: &SecretManager, namespace: &str, name: &str) -> anyhow::Result<()> {
    manager.delete(namespace, name).await?;
    println!("Secret '{}' deleted from namespace '{}'.", name, namespace);
    Ok(())
}
