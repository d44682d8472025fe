use std::collections::HashMap;

use crate::config::RouteFamily;

/// Lookup from route id to the family label it is displayed under.
#[derive(Debug, Clone, Default)]
pub struct RouteFamilies {
    by_route: HashMap<String, String>,
}

impl RouteFamilies {
    pub fn new(families: &[RouteFamily]) -> Self {
        let by_route = families
            .iter()
            .flat_map(|family| {
                family
                    .routes
                    .iter()
                    .map(move |route| (route.clone(), family.label.clone()))
            })
            .collect();
        Self { by_route }
    }

    pub fn family_of(&self, route: &str) -> Option<&str> {
        self.by_route.get(route).map(String::as_str)
    }

    /// The family label for family members, the route id otherwise.
    pub fn display_group<'a>(&'a self, route: &'a str) -> &'a str {
        self.family_of(route).unwrap_or(route)
    }

    /// Headsign shown for `route`; family members get a branch tag so
    /// branches stay distinguishable inside the shared group.
    pub fn headsign(&self, route: &str, headsign: &str) -> String {
        if self.family_of(route).is_none() {
            return headsign.to_string();
        }

        let tag = format!("({})", branch_tag(route));
        if headsign.contains(&tag) {
            headsign.to_string()
        } else if headsign.is_empty() {
            tag
        } else {
            format!("{headsign} {tag}")
        }
    }
}

/// Short branch name: the part after the last `-` (`Green-B` → `B`).
pub fn branch_tag(route: &str) -> &str {
    match route.rsplit_once('-') {
        Some((_, tag)) if !tag.is_empty() => tag,
        _ => route,
    }
}
