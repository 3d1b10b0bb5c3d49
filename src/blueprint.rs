//! The compiled-in Ansible LAMP project.
//!
//! File contents live under `src/blueprint/` and are embedded at build time, so the table
//! below is the only thing that decides what gets written and where.

use crate::manifest::{FileSpec, Manifest};

/// Directory used when neither the command line nor a config file names one.
pub const DEFAULT_BASE_DIR: &str = "lamp-ansible";

static LAMP_FILES: [(&str, &str); 12] = [
    ("ansible.cfg", include_str!("blueprint/ansible.cfg")),
    ("inventory/dev.ini", include_str!("blueprint/inventory/dev.ini")),
    (
        "inventory/staging.ini",
        include_str!("blueprint/inventory/staging.ini"),
    ),
    ("inventory/prod.ini", include_str!("blueprint/inventory/prod.ini")),
    ("playbook.yml", include_str!("blueprint/playbook.yml")),
    (
        "roles/apache/tasks/main.yml",
        include_str!("blueprint/roles/apache/tasks/main.yml"),
    ),
    (
        "roles/apache/handlers/main.yml",
        include_str!("blueprint/roles/apache/handlers/main.yml"),
    ),
    (
        "roles/apache/templates/index.html.j2",
        include_str!("blueprint/roles/apache/templates/index.html.j2"),
    ),
    (
        "roles/mysql/tasks/main.yml",
        include_str!("blueprint/roles/mysql/tasks/main.yml"),
    ),
    (
        "roles/mysql/handlers/main.yml",
        include_str!("blueprint/roles/mysql/handlers/main.yml"),
    ),
    (
        "roles/php/tasks/main.yml",
        include_str!("blueprint/roles/php/tasks/main.yml"),
    ),
    (
        "roles/php/handlers/main.yml",
        include_str!("blueprint/roles/php/handlers/main.yml"),
    ),
];

/// Returns the LAMP scaffold: inventories for three environments, a playbook and the apache,
/// mysql and php roles.
pub fn lamp_stack() -> Manifest {
    LAMP_FILES
        .iter()
        .map(|(path, content)| FileSpec::new(*path, *content))
        .collect()
}
