//! Client config commands.

use anyhow::Result;

use crate::config::ClientConfig;

/// Set properties in the config file.
pub fn set(
    server: Option<&str>,
    session_path: Option<&str>,
    client_config_path: &std::path::Path,
) -> Result<()> {
    if server.is_none() && session_path.is_none() {
        anyhow::bail!("Nothing to set. Use --server <url> or --session-path <file>.");
    }
    let mut config = ClientConfig::load(client_config_path)?;

    if let Some(s) = server {
        config.server = s.to_string();
    }
    if let Some(p) = session_path {
        config.session_path = p.to_string();
    }

    config.save(client_config_path)?;
    println!("Config {} updated.", client_config_path.display());
    Ok(())
}

/// Print the effective settings.
pub fn show(server_flag: Option<&str>, client_config_path: &std::path::Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;

    println!("Config:    {}", client_config_path.display());
    println!("Server:    {}", config.server_url(server_flag));
    println!("Session:   {}", config.session_file().display());
    Ok(())
}
