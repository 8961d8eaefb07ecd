//! Login / logout / whoami commands.

use anyhow::Result;
use joyeria_auth::View;
use serde_json::json;

use super::App;

/// Log in and report where the account lands.
pub async fn login(app: &App, email: &str, password: &str) -> Result<()> {
    let session = joyeria_auth::login(&app.api, &app.store, email, password).await?;
    let landing = app.guard.landing();

    if app.json {
        return app.print_json(&json!({
            "userId": session.user_id,
            "rol": session.profile.rol,
            "nombre": session.profile.nombre,
            "landing": landing.path(),
        }));
    }
    println!("Logged in as {}.", session.profile.nombre);
    println!("Server:  {}", app.api.base_url());
    println!("Landing: {}", landing);
    Ok(())
}

/// Forget the stored session.
pub fn logout(app: &App) -> Result<()> {
    joyeria_auth::logout(&app.store)?;
    println!("Logged out.");
    Ok(())
}

/// Print the cached profile.
pub fn whoami(app: &App) -> Result<()> {
    let session = app.enter(View::Profile)?;
    if app.json {
        return app.print_json(&json!({
            "userId": session.user_id,
            "profile": session.profile,
        }));
    }
    println!("Name:    {}", session.profile.nombre);
    println!("Role:    {}", session.profile.rol);
    println!("User ID: {}", session.user_id);
    if let Some(url) = &session.profile.imagen_url {
        println!("Image:   {}", url);
    }
    println!("Home:    {}", View::default_for(session.role));
    Ok(())
}
