//! Stats command

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::runtime::AppContext;
use crate::services::CategoryStats;

fn print_breakdown(title: &str, entries: &[CategoryStats]) {
    println!("{}", title.bold());
    if entries.is_empty() {
        println!("  {}", "-".dimmed());
    }
    for entry in entries {
        println!(
            "  {:<20} {:>8} {:>6.1}%",
            entry.name, entry.count, entry.percentage
        );
    }
}

pub async fn show_stats(ctx: &AppContext, code: &str, refresh: bool) -> Result<(), CliError> {
    let stats = if refresh {
        ctx.analytics_service.refresh(code).await?
    } else {
        ctx.analytics_service.get_stats(code).await?
    };

    println!(
        "{} {} -> {}",
        "Stats for".bold(),
        stats.code.cyan(),
        stats.target.blue()
    );
    println!(
        "Total clicks: {}",
        stats.total_clicks.to_string().magenta().bold()
    );

    println!("{} ({} .. {})", "Daily".bold(), stats.from, stats.to);
    for day in &stats.daily {
        println!("  {} {:>8}", day.date, day.count);
    }

    print_breakdown("Devices", &stats.devices);
    print_breakdown("Browsers", &stats.browsers);
    print_breakdown("Countries", &stats.countries);
    print_breakdown("Referrers", &stats.referrers);
    Ok(())
}
