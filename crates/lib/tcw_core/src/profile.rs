//! Profile transformer: raw profile payload to normalized [`User`].
//!
//! Two backend shapes are accepted:
//!
//! - flat: string id, optional name fields, string roles and a permission list
//! - rich: numeric id, integer roles and menu-item descriptors from which
//!   permissions are derived
//!
//! Either may arrive wrapped in a `{success, data, message}` envelope.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::auth::AuthError;
use crate::models::auth::{RawProfile, User};

/// Fallback display name when the profile carries nothing usable.
const DEFAULT_DISPLAY_NAME: &str = "User";

/// Parse a profile response body, unwrapping the `{success, data, message}`
/// envelope when present.
pub fn parse_profile(body: Value) -> Result<RawProfile, AuthError> {
    let payload = match body {
        Value::Object(mut map) if map.contains_key("success") => {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            match map.get("success") {
                Some(Value::Bool(true)) => {}
                _ => {
                    return Err(AuthError::InvalidResponse(
                        message.unwrap_or_else(|| "profile request was not successful".into()),
                    ));
                }
            }
            match map.remove("data") {
                Some(Value::Null) | None => {
                    return Err(AuthError::InvalidResponse(
                        "profile envelope has no data".into(),
                    ));
                }
                Some(data) => data,
            }
        }
        other => other,
    };

    if !payload.is_object() {
        return Err(AuthError::InvalidResponse(
            "profile payload is not an object".into(),
        ));
    }

    serde_json::from_value(payload)
        .map_err(|e| AuthError::InvalidResponse(format!("profile payload: {e}")))
}

/// Normalize a raw profile into a [`User`].
pub fn transform(raw: RawProfile) -> User {
    let display_name = display_name(&raw);
    let initials = initials(&display_name);
    let menu_items = raw.menu_items.unwrap_or_default();

    let roles: BTreeSet<String> = raw
        .roles
        .unwrap_or_default()
        .iter()
        .map(ToString::to_string)
        .collect();

    let mut permissions: BTreeSet<String> = raw.permissions.unwrap_or_default().into_iter().collect();
    for item in menu_items.iter().filter(|i| i.is_usable()) {
        permissions.insert(item.key.clone());
        permissions.insert(format!("{}.{}", item.menu_type.label(), item.key));
    }

    User {
        id: raw.id.map(|id| id.to_string()).unwrap_or_default(),
        username: raw.username.unwrap_or_default(),
        email: raw.email.unwrap_or_default(),
        display_name,
        initials,
        roles,
        permissions,
        is_active: raw.is_active.unwrap_or(true),
        first_name: non_blank(raw.first_name),
        last_name: non_blank(raw.last_name),
        full_name: non_blank(raw.full_name),
        platform: non_blank(raw.platform),
        locale: non_blank(raw.locale),
        company_id: raw.company_id.map(|id| id.to_string()),
        company_name: non_blank(raw.company_name),
        last_login_at: non_blank(raw.last_login_at),
        profile_picture: raw.profile_picture.filter(|v| !v.is_null()),
        menu_items,
    }
}

/// Full name → first + last → first → email local part → username → "User".
fn display_name(raw: &RawProfile) -> String {
    let trimmed = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(full) = trimmed(&raw.full_name) {
        return full;
    }
    let first = trimmed(&raw.first_name);
    let last = trimmed(&raw.last_name);
    match (first, last) {
        (Some(f), Some(l)) => return format!("{f} {l}"),
        (Some(f), None) => return f,
        _ => {}
    }
    if let Some(local) = raw
        .email
        .as_deref()
        .and_then(|e| e.split('@').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return local.to_string();
    }
    if let Some(username) = trimmed(&raw.username) {
        return username;
    }
    DEFAULT_DISPLAY_NAME.to_string()
}

/// First letter of each of the first two whitespace-separated tokens, uppercased.
fn initials(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .take(2)
        .filter_map(|token| token.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::capabilities::{has_menu_access, has_permission, has_role};
    use serde_json::json;

    fn raw(value: Value) -> RawProfile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn first_and_last_name() {
        let user = transform(raw(json!({
            "id": "u1", "email": "jane@x.com", "firstName": "Jane", "lastName": "Doe"
        })));
        assert_eq!(user.display_name, "Jane Doe");
        assert_eq!(user.initials, "JD");
    }

    #[test]
    fn email_local_part_only() {
        let user = transform(raw(json!({"email": "bob@example.com"})));
        assert_eq!(user.display_name, "bob");
        assert_eq!(user.initials, "B");
        assert!(user.is_active);
    }

    #[test]
    fn display_name_resolution_order() {
        let user = transform(raw(json!({
            "fullName": "  Alice Smith ", "firstName": "A", "lastName": "S", "email": "a@x.com"
        })));
        assert_eq!(user.display_name, "Alice Smith");

        let user = transform(raw(json!({"firstName": "Cher", "email": "c@x.com"})));
        assert_eq!(user.display_name, "Cher");

        let user = transform(raw(json!({"fullName": "   ", "username": "dave"})));
        assert_eq!(user.display_name, "dave");

        let user = transform(raw(json!({})));
        assert_eq!(user.display_name, "User");
        assert_eq!(user.initials, "U");
    }

    #[test]
    fn initials_use_first_two_tokens() {
        assert_eq!(initials("mary ann evans"), "MA");
        assert_eq!(initials("plato"), "P");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn flat_shape_roles_and_permissions() {
        let user = transform(raw(json!({
            "id": "u1",
            "username": "jane",
            "email": "jane@x.com",
            "roles": ["admin", "editor"],
            "permissions": ["orders.read", "orders.read"],
            "isActive": false,
            "locale": "nl"
        })));
        assert!(has_role(&user, "admin"));
        assert!(has_permission(&user, "orders.read"));
        assert_eq!(user.permissions.len(), 1);
        assert!(!user.is_active);
        assert_eq!(user.locale.as_deref(), Some("nl"));
    }

    #[test]
    fn rich_shape_derives_menu_permissions() {
        let user = transform(raw(json!({
            "id": 1,
            "fullName": "Alice Smith",
            "email": "alice@x.com",
            "roles": [1],
            "companyId": 42,
            "menuItems": [
                {"id": 1, "key": "home", "name": "Home", "menuType": 1,
                 "isActive": true, "isAvailable": true, "order": 0},
                {"id": 2, "key": "approve", "name": "Approve", "menuType": 3,
                 "isActive": true, "isAvailable": true, "order": 1},
                {"id": 3, "key": "popupOnly", "name": "Popup", "menuType": 2,
                 "isActive": true, "isAvailable": false, "order": 2}
            ]
        })));
        assert_eq!(user.id, "1");
        assert_eq!(user.initials, "AS");
        assert_eq!(user.company_id.as_deref(), Some("42"));
        assert!(has_role(&user, 1));
        assert!(has_menu_access(&user, "home"));
        assert!(has_permission(&user, "main.home"));
        assert!(has_permission(&user, "home"));
        assert!(has_permission(&user, "workflow.approve"));
        assert!(!has_permission(&user, "popup.popupOnly"));
        assert!(!has_menu_access(&user, "popupOnly"));
        assert_eq!(user.menu_items.len(), 3);
    }

    #[test]
    fn parse_profile_unwraps_envelope() {
        let parsed = parse_profile(json!({
            "success": true,
            "data": {"id": 5, "email": "e@x.com"},
            "message": null
        }))
        .unwrap();
        assert_eq!(parsed.email.as_deref(), Some("e@x.com"));
    }

    #[test]
    fn parse_profile_accepts_bare_payload() {
        let parsed = parse_profile(json!({"id": "u1", "email": "e@x.com"})).unwrap();
        assert_eq!(parsed.id.unwrap().to_string(), "u1");
    }

    #[test]
    fn parse_profile_rejects_failed_envelope() {
        let err = parse_profile(json!({"success": false, "data": null, "message": "nope"}))
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(ref m) if m == "nope"));

        let err = parse_profile(json!({"success": true, "data": null})).unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[test]
    fn parse_profile_rejects_non_objects() {
        assert!(matches!(
            parse_profile(json!([1, 2, 3])),
            Err(AuthError::InvalidResponse(_))
        ));
    }
}
