use anyhow::{bail, Result};
use obra_auth::LoginRequest;
use tracing::info;

use super::report_field_errors;
use crate::output::{print_json, Summary};
use crate::App;

pub async fn login(app: &App, email: String, password: String) -> Result<()> {
    match app.api.auth().login(LoginRequest::new(email, password)).await {
        Ok(user) => {
            info!(user_id = user.id, "logged in");
            println!("Sesión iniciada: {}", user.summary());
            Ok(())
        }
        Err(err) => {
            report_field_errors(&err);
            Err(err)
        }
    }
}

pub fn logout(app: &App) -> Result<()> {
    app.api.auth().logout()?;
    println!("Sesión cerrada");
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    if !app.api.session().is_authenticated() {
        bail!("no hay sesión; usa `obra login`");
    }
    let user = app.api.auth().me().await?;
    if app.json {
        return print_json(&user);
    }
    println!("{}", user.summary());
    if let Some(expires) = app.api.session().access_expires_at() {
        println!("token válido hasta {}", expires.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}
