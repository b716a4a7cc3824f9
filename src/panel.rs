//! The admin panel itself: path, theme, navigation, user menu, pages and
//! widgets, plus the resources it serves.

use serde::Serialize;

use crate::resources::{self, Resource};

pub const PANEL_PATH: &str = "admin";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NavigationItem {
    pub label: &'static str,
    pub url: String,
    pub icon: &'static str,
    pub group: Option<&'static str>,
    pub sort: u8,
    pub open_in_new_tab: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuItem {
    pub key: &'static str,
    pub label: &'static str,
    pub url: Option<&'static str>,
    pub icon: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PanelConfig {
    pub id: &'static str,
    pub path: &'static str,
    pub default: bool,
    pub login: bool,
    pub primary_color: &'static str,
    pub font: &'static str,
    pub favicon: &'static str,
    pub global_search_key_bindings: Vec<&'static str>,
    pub sidebar_collapsible_on_desktop: bool,
    pub navigation: Vec<NavigationItem>,
    pub user_menu: Vec<MenuItem>,
    pub pages: Vec<&'static str>,
    pub widgets: Vec<&'static str>,
    pub middleware: Vec<&'static str>,
    pub auth_middleware: Vec<&'static str>,
}

fn resource_navigation(resource: &Resource) -> NavigationItem {
    NavigationItem {
        label: resource.plural_label,
        url: format!("/{}/{}", PANEL_PATH, resource.slug),
        icon: resource.navigation_icon,
        group: None,
        sort: resource.navigation_sort,
        open_in_new_tab: false,
    }
}

pub fn config() -> PanelConfig {
    let mut navigation: Vec<NavigationItem> = resources::registry().iter().map(resource_navigation).collect();
    navigation.push(NavigationItem {
        label: "Blog",
        url: "https://devdiagui.ml".to_string(),
        icon: "heroicon-o-document-text",
        group: Some("Lien Externe"),
        sort: 2,
        open_in_new_tab: true,
    });

    PanelConfig {
        id: "admin",
        path: PANEL_PATH,
        default: true,
        login: true,
        primary_color: "blue",
        font: "Outfit",
        favicon: "images/logoWg.png",
        global_search_key_bindings: vec!["command+k", "ctrl+k"],
        sidebar_collapsible_on_desktop: true,
        navigation,
        user_menu: vec![
            MenuItem {
                key: "settings",
                label: "Paramètre",
                url: Some("/settings"),
                icon: Some("heroicon-o-cog-6-tooth"),
            },
            MenuItem {
                key: "logout",
                label: "Déconnexion",
                url: None,
                icon: None,
            },
            MenuItem {
                key: "profile",
                label: "Edit profile",
                url: None,
                icon: None,
            },
        ],
        pages: vec!["dashboard"],
        widgets: vec!["account", "info"],
        middleware: vec![
            "encrypt_cookies",
            "add_queued_cookies",
            "start_session",
            "authenticate_session",
            "share_errors",
            "verify_csrf_token",
            "substitute_bindings",
        ],
        auth_middleware: vec!["authenticate"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_is_served_at_admin() {
        let panel = config();
        assert_eq!(panel.path, "admin");
        assert_eq!(panel.global_search_key_bindings, vec!["command+k", "ctrl+k"]);
        assert_eq!(panel.primary_color, "blue");
    }

    #[test]
    fn external_blog_link_opens_in_new_tab() {
        let panel = config();
        let blog = panel.navigation.iter().find(|item| item.label == "Blog").unwrap();
        assert_eq!(blog.group, Some("Lien Externe"));
        assert_eq!(blog.sort, 2);
        assert!(blog.open_in_new_tab);
    }

    #[test]
    fn resources_are_in_navigation() {
        let panel = config();
        let urls: Vec<&str> = panel.navigation.iter().map(|item| item.url.as_str()).collect();
        assert!(urls.contains(&"/admin/products"));
        assert!(urls.contains(&"/admin/categories"));
        assert!(urls.contains(&"/admin/brands"));
    }

    #[test]
    fn user_menu_keeps_declared_order() {
        let keys: Vec<&str> = config().user_menu.iter().map(|item| item.key).collect();
        assert_eq!(keys, vec!["settings", "logout", "profile"]);
    }
}
