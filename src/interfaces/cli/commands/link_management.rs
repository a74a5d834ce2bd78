//! Link commands: create, resolve, list

use colored::Colorize;

use crate::analytics::ClientMetadata;
use crate::interfaces::cli::CliError;
use crate::runtime::AppContext;
use crate::storage::ShortLink;
use crate::utils::time_parser::parse_expiry;

fn format_expiry(link: &ShortLink) -> String {
    link.expires_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

pub async fn create_link(
    ctx: &AppContext,
    url: &str,
    owner: Option<i64>,
    expires_in: Option<&str>,
) -> Result<(), CliError> {
    let expires_at = expires_in
        .map(|s| parse_expiry(s, ctx.clock.now()))
        .transpose()
        .map_err(|e| CliError::ParseError(e.format_simple()))?;

    let link = ctx.link_service.create(url, owner, expires_at).await?;
    println!(
        "{} {} -> {} (expires: {})",
        "✓".bold().green(),
        link.code.cyan(),
        link.target.blue().underline(),
        format_expiry(&link).yellow()
    );
    Ok(())
}

pub async fn resolve_link(
    ctx: &AppContext,
    code: &str,
    ip: &str,
    user_agent: Option<String>,
    referrer: Option<String>,
) -> Result<(), CliError> {
    let mut metadata = ClientMetadata::new(ip);
    metadata.user_agent = user_agent;
    metadata.referrer = referrer;

    let target = ctx.resolve_and_record(code, metadata).await?;
    println!("{}", target);
    Ok(())
}

pub async fn list_links(
    ctx: &AppContext,
    owner: i64,
    active_only: bool,
    page: u64,
    page_size: u64,
) -> Result<(), CliError> {
    let (links, total) = if active_only {
        ctx.link_service
            .list_active_for_owner(owner, page, page_size)
            .await?
    } else {
        ctx.link_service.list_for_owner(owner, page, page_size).await?
    };

    if links.is_empty() {
        println!("{}", "No links found".dimmed());
        return Ok(());
    }

    for link in &links {
        let status = if link.is_accessible_at(ctx.clock.now()) {
            "active".green()
        } else {
            "expired".red()
        };
        println!(
            "  {} -> {} [{}] clicks: {} expires: {}",
            link.code.cyan(),
            link.target.blue(),
            status,
            link.click_count.to_string().magenta(),
            format_expiry(link)
        );
    }
    println!(
        "{} page {} ({} of {} total)",
        "ℹ".bold().blue(),
        page.max(1),
        links.len(),
        total
    );
    Ok(())
}
