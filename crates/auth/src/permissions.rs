//! Static role-permission mapping
//!
//! Read-only, process-wide table from role to accessible resource tags.
//! Never mutated at runtime.

use unilearn_common::Role;

/// Resource tags a role may access. The admin wildcard grants all;
/// an unknown role grants none.
pub fn role_resources(role: Role) -> &'static [&'static str] {
    match role {
        Role::Teacher => &["dashboard", "lessons", "students", "materials", "analytics"],
        Role::Student => &["lessons", "enrollments", "materials", "progress"],
        Role::Admin => &["*"],
        Role::Unknown => &[],
    }
}

/// Whether `role` may access `resource`.
pub fn role_can_access(role: Role, resource: &str) -> bool {
    let resources = role_resources(role);
    resources.contains(&"*") || resources.contains(&resource)
}
