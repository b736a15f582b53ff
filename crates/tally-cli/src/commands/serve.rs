//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::BackendKind;

use super::{load_ai_config, open_db};

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    static_dir: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let ai = load_ai_config(config_path)?;

    println!("🚀 Starting Tally web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    println!("   Insights: {} ({})", ai.backend, ai.model);
    if ai.backend == BackendKind::Gemini && !ai.has_api_key() {
        println!("   💡 Tip: Set GEMINI_API_KEY for AI insights (fallback text is used until then)");
    }

    // Comma-separated API keys for service access
    let api_keys =
        tally_server::parse_api_keys(&std::env::var("TALLY_API_KEYS").unwrap_or_default());

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!("   🔒 Authentication: Cloudflare Access (header only)");
        if !api_keys.is_empty() {
            println!(
                "   🔑 API keys: {} configured (TALLY_API_KEYS)",
                api_keys.len()
            );
        }
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;

    let config = tally_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins: vec![],
        api_keys,
    };

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("Static directory path must be valid UTF-8"))
        .transpose()?;
    tally_server::serve_with_config(db, host, port, static_dir_str, config, ai).await?;

    Ok(())
}
