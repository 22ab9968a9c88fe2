//! Subcommand handlers. Each prints its result to stdout.

use chrono::{DateTime, Utc};
use serde_json::json;
use tcw_core::auth::capabilities::{menu_route, visible_menu_items};
use tcw_core::auth::jwt;
use tcw_core::models::auth::{Credentials, User};
use tcw_core::session::{AuthState, SessionController};
use tracing::info;

use crate::{Error, Result};

pub async fn login(
    controller: &SessionController,
    username: String,
    password: String,
    as_json: bool,
) -> Result<()> {
    let user = controller
        .login(Credentials::new(username, password))
        .await?;
    info!(user_id = %user.id, "signed in");

    if as_json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("Signed in as {} ({})", user.display_name, user.username);
    }
    Ok(())
}

pub fn status(controller: &SessionController, as_json: bool) -> Result<()> {
    let state = controller.state();
    let expires_at = state.token.as_deref().and_then(jwt::expires_at);

    if as_json {
        let out = json!({
            "authenticated": state.is_authenticated(),
            "phase": state.phase.as_str(),
            "user": state.user.as_ref().map(|u| &u.username),
            "expires_at": expires_at.map(|t| t.to_rfc3339()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match (&state.user, expires_at) {
        (Some(user), expiry) => {
            println!("Signed in as {} ({})", user.display_name, user.username);
            if let Some(expiry) = expiry {
                println!("Token expires {}", describe_expiry(expiry, Utc::now()));
            }
        }
        (None, _) => println!("Not signed in"),
    }
    Ok(())
}

pub fn whoami(controller: &SessionController, as_json: bool) -> Result<()> {
    let user = signed_in_user(&controller.state())?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!("{} ({})", user.display_name, user.initials);
    println!("  id:          {}", user.id);
    println!("  username:    {}", user.username);
    println!("  email:       {}", user.email);
    if let Some(company) = user.company_name.as_ref().or(user.company_id.as_ref()) {
        println!("  company:     {company}");
    }
    println!("  roles:       {}", join(user.roles.iter()));
    println!("  permissions: {}", join(user.permissions.iter()));
    if !user.is_active {
        println!("  (inactive)");
    }
    Ok(())
}

pub fn menu(controller: &SessionController, as_json: bool) -> Result<()> {
    let user = signed_in_user(&controller.state())?;
    let items = visible_menu_items(&user);

    if as_json {
        let out: Vec<_> = items
            .iter()
            .map(|item| {
                json!({
                    "key": item.key,
                    "name": item.name,
                    "type": item.menu_type.label(),
                    "route": menu_route(item),
                    "available": item.is_available,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No menu items");
        return Ok(());
    }
    for item in items {
        let flag = if item.is_available { "" } else { "  (unavailable)" };
        println!(
            "{:>4}  {:<24} {:<24} {}{flag}",
            item.order,
            item.name,
            menu_route(item),
            item.menu_type.label(),
        );
    }
    Ok(())
}

pub async fn refresh(controller: &SessionController, as_json: bool) -> Result<()> {
    let user = controller.refresh_profile().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("Profile refreshed for {}", user.display_name);
    }
    Ok(())
}

pub fn logout(controller: &SessionController) -> Result<()> {
    controller.logout();
    println!("Signed out");
    Ok(())
}

fn signed_in_user(state: &AuthState) -> Result<User> {
    state
        .user
        .clone()
        .filter(|_| state.is_authenticated())
        .ok_or_else(|| Error::Custom("Not signed in. Run `tcw login` first.".into()))
}

fn join<'a>(values: impl Iterator<Item = &'a String>) -> String {
    let joined = values.map(String::as_str).collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}

fn describe_expiry(expiry: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let left = expiry - now;
    if left.num_seconds() <= 0 {
        return format!("at {} (expired)", expiry.to_rfc3339());
    }
    let (h, m) = (left.num_hours(), left.num_minutes() % 60);
    format!("at {} (in {h}h {m:02}m)", expiry.to_rfc3339())
}
