//! Capability checks over a normalized [`User`].
//!
//! Stateless lookups: the same answers come back for a `User` built by the
//! profile transformer and for one read back from storage.

use std::fmt::Display;

use crate::models::auth::{MenuItem, User};

/// Whether the user holds `role`. Integer and string role ids compare by
/// their string form.
pub fn has_role(user: &User, role: impl Display) -> bool {
    user.roles.contains(&role.to_string())
}

/// Whether `permission` is in the user's derived permission set.
pub fn has_permission(user: &User, permission: &str) -> bool {
    user.permissions.contains(permission)
}

/// Whether some menu item with `key` is both active and available.
pub fn has_menu_access(user: &User, key: &str) -> bool {
    user.menu_items
        .iter()
        .any(|item| item.key == key && item.is_usable())
}

/// Active menu items sorted by `order`, then by name.
pub fn visible_menu_items(user: &User) -> Vec<&MenuItem> {
    let mut items: Vec<&MenuItem> = user.menu_items.iter().filter(|i| i.is_active).collect();
    items.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
    items
}

/// Client-side route for a menu item.
///
/// An explicit `path` wins; `home`/`main` map to `/`; otherwise the key is
/// lowercased with camel-case humps turned into dashes (`userSettings` →
/// `/user-settings`).
pub fn menu_route(item: &MenuItem) -> String {
    if let Some(path) = item.path.as_deref().filter(|p| !p.is_empty()) {
        return format!("/{}", path.trim_start_matches('/'));
    }

    let lowered = item.key.to_lowercase();
    if lowered == "home" || lowered == "main" {
        return "/".to_string();
    }

    let mut route = String::with_capacity(item.key.len() + 4);
    route.push('/');
    for (i, ch) in item.key.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                route.push('-');
            }
            route.extend(ch.to_lowercase());
        } else {
            route.push(ch);
        }
    }
    route
}
