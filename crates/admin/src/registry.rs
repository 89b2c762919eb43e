//! Admin sections registered at startup.
//!
//! The registry is built once in `main` and carried in [`AppState`]; the
//! navigation bar and dashboard render from it.
//!
//! [`AppState`]: crate::state::AppState

use serde::Serialize;

/// One admin page group, e.g. "Refund requests".
#[derive(Debug, Clone, Serialize)]
pub struct AdminSection {
    /// Stable key, used to highlight the active nav entry.
    pub key: &'static str,
    pub label: &'static str,
    /// List page path.
    pub path: &'static str,
    /// Group heading on the dashboard.
    pub group: &'static str,
    /// Whether the list page offers bulk actions.
    pub has_actions: bool,
}

impl AdminSection {
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str, path: &'static str) -> Self {
        Self {
            key,
            label,
            path,
            group: "Store",
            has_actions: false,
        }
    }

    #[must_use]
    pub const fn group(mut self, group: &'static str) -> Self {
        self.group = group;
        self
    }

    #[must_use]
    pub const fn with_actions(mut self) -> Self {
        self.has_actions = true;
        self
    }
}

/// Ordered set of admin sections.
#[derive(Debug, Clone, Default)]
pub struct AdminRegistry {
    sections: Vec<AdminSection>,
}

impl AdminRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// Add a section. A section with an existing key replaces it in place.
    #[must_use]
    pub fn register(mut self, section: AdminSection) -> Self {
        if let Some(existing) = self.sections.iter_mut().find(|s| s.key == section.key) {
            *existing = section;
        } else {
            self.sections.push(section);
        }
        self
    }

    #[must_use]
    pub fn sections(&self) -> &[AdminSection] {
        &self.sections
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AdminSection> {
        self.sections.iter().find(|s| s.key == key)
    }

    /// Distinct group headings in registration order.
    #[must_use]
    pub fn groups(&self) -> Vec<&'static str> {
        let mut groups: Vec<&'static str> = Vec::new();
        for section in &self.sections {
            if !groups.contains(&section.group) {
                groups.push(section.group);
            }
        }
        groups
    }

    /// Sections belonging to `group`.
    pub fn in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a AdminSection> {
        self.sections.iter().filter(move |s| s.group == group)
    }

    /// The sections this panel ships with.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .register(
                AdminSection::new("refunds", "Refund requests", "/refunds")
                    .group("Refunds")
                    .with_actions(),
            )
            .register(AdminSection::new("refund_items", "Refund items", "/refund-items").group("Refunds"))
            .register(AdminSection::new("orders", "Orders", "/orders").group("Orders"))
            .register(AdminSection::new("order_items", "Order items", "/order-items").group("Orders"))
            .register(
                AdminSection::new("shipping_addresses", "Shipping addresses", "/shipping-addresses")
                    .group("Orders"),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sections() {
        let registry = AdminRegistry::standard();
        let keys: Vec<_> = registry.sections().iter().map(|s| s.key).collect();
        assert_eq!(
            keys,
            ["refunds", "refund_items", "orders", "order_items", "shipping_addresses"]
        );
        assert_eq!(registry.groups(), ["Refunds", "Orders"]);
        assert!(registry.get("refunds").is_some_and(|s| s.has_actions));
        assert!(registry.get("orders").is_some_and(|s| !s.has_actions));
    }

    #[test]
    fn test_register_replaces_same_key() {
        let registry = AdminRegistry::new()
            .register(AdminSection::new("orders", "Orders", "/orders"))
            .register(AdminSection::new("orders", "All orders", "/orders"));
        assert_eq!(registry.sections().len(), 1);
        assert_eq!(registry.sections()[0].label, "All orders");
    }
}
