//! Configuration check command.

use std::path::Path;

use console::style;

use crate::config::Settings;

/// Print the validated configuration.
///
/// Capture agents are listed in precedence order: a URL is handled by the
/// first agent whose pattern matches.
pub fn cmd_check(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    println!(
        "{} Configuration {} is valid",
        style("✓").green(),
        style(config_path.display()).bold()
    );
    println!("  Listen:   {}", settings.bind);
    println!("  Database: {}", settings.database_url);
    match settings.capture_timeout {
        Some(timeout) => println!("  Capture timeout: {}s", timeout.as_secs()),
        None => println!("  Capture timeout: none"),
    }
    match settings.max_concurrent_captures {
        0 => println!("  Concurrent captures: unbounded"),
        n => println!("  Concurrent captures: {}", n),
    }

    println!();
    println!("{}", style("Archives").bold());
    let mut archives: Vec<_> = settings.archives.iter().collect();
    archives.sort_by(|a, b| a.name.cmp(&b.name));
    if archives.is_empty() {
        println!("  {}", style("(none)").dim());
    }
    for archive in archives {
        println!(
            "  {:<16} {} ({} user{})",
            archive.name,
            archive.storage.display(),
            archive.users.len(),
            if archive.users.len() == 1 { "" } else { "s" }
        );
    }

    println!();
    println!("{}", style("Capture agents (first match wins)").bold());
    if settings.agents.is_empty() {
        println!("  {}", style("(none)").dim());
    }
    for (i, binding) in settings.agents.iter().enumerate() {
        let target = binding.agent().target();
        let marker = match target {
            Some(program) if which::which(program).is_err() => style("✗").red(),
            _ => style("✓").green(),
        };
        println!(
            "  {}. {} {:<16} /{}/ -> {}",
            i + 1,
            marker,
            binding.name(),
            binding.pattern().as_str(),
            target.map(|p| p.display().to_string()).unwrap_or_default()
        );
    }

    Ok(())
}
