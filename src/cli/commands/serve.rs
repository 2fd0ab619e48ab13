//! Web server command.

use std::net::SocketAddr;

use console::style;

use crate::config::{parse_bind, Settings};
use crate::repository::DbContext;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let addr = match bind {
        Some(bind) => parse_bind_address(bind, settings.bind)?,
        None => settings.bind,
    };

    // Run database migrations first
    println!("{} Running database migrations...", style("→").cyan());
    let ctx = DbContext::from_url(&settings.database_url);
    match ctx.init_schema().await {
        Ok(applied) => {
            for name in &applied {
                println!("  {} Applied {}", style("✓").green(), name);
            }
            println!("  {} Database ready", style("✓").green());
        }
        Err(e) => {
            eprintln!("  {} Migration failed: {}", style("✗").red(), e);
            return Err(anyhow::anyhow!("Database migration failed: {}", e));
        }
    }

    settings.ensure_directories()?;

    println!(
        "{} Starting march server at http://{}",
        style("→").cyan(),
        addr
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &ctx, addr).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> configured host, port 3030
/// - Just a host: "127.0.0.1" -> that host, configured port
/// - Host and port: "127.0.0.1:3030"
fn parse_bind_address(bind: &str, default: SocketAddr) -> anyhow::Result<SocketAddr> {
    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(SocketAddr::new(default.ip(), port));
    }

    if let Ok(addr) = bind.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Try parsing as host:port
    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok(parse_bind(host, port)?);
        }
    }

    // Must be just a host, use configured port
    Ok(parse_bind(bind, default.port())?)
}
