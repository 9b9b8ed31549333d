//! `decker models`: print the supported model table.

use crate::core::models::load_builtin_models;

pub fn list_models() {
    println!("Supported models:");
    for spec in load_builtin_models() {
        println!(
            "  • {:<26} {:<18} requires {}",
            spec.id, spec.display_name, spec.env_key
        );
    }
}
