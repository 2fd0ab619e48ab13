//! Database migration command.

use console::style;

use crate::config::Settings;
use crate::repository::DbContext;

/// Apply pending schema migrations and report what ran.
pub async fn cmd_migrate(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    println!(
        "{} Migrating {}",
        style("→").cyan(),
        style(&settings.database_url).bold()
    );

    let ctx = DbContext::from_url(&settings.database_url);
    let applied = ctx
        .init_schema()
        .await
        .map_err(|e| anyhow::anyhow!("Database migration failed: {}", e))?;

    if applied.is_empty() {
        println!("  {} Already up to date", style("✓").green());
    } else {
        for name in &applied {
            println!("  {} Applied {}", style("✓").green(), name);
        }
    }

    Ok(())
}
