//! YAML parser for schema profiles
//!
//! Parses and validates profile YAML files.
//! Supports both built-in profiles (by name) and custom YAML files (by path).

use super::builtin;
use super::types::{normalize_header, SchemaProfile};
use crate::error::{Error, Result};
use crate::types::SemanticType;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load a profile from a name or file path
///
/// Built-in names (`daily`, `master`, `backfill`) are checked first, then the
/// input is treated as a path to a YAML file.
pub fn load_profile(path: impl AsRef<Path>) -> Result<SchemaProfile> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = builtin::get_builtin(&path_str) {
            return load_profile_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            let builtin_list = builtin::list_builtin().join(", ");
            Error::config(format!(
                "Profile '{}' not found. Built-in profiles: {}. Or provide a path to a YAML file.",
                path.display(),
                builtin_list
            ))
        } else {
            Error::config(format!(
                "Failed to read profile file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_profile_from_str(&content)
}

/// Load a profile from a YAML string
pub fn load_profile_from_str(yaml: &str) -> Result<SchemaProfile> {
    let mut profile: SchemaProfile = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse profile YAML: {e}")))?;

    for mapping in &mut profile.header_map {
        mapping.header = normalize_header(&mapping.header);
    }

    validate_profile(&profile)?;
    Ok(profile)
}

/// Validate a profile definition
pub fn validate_profile(profile: &SchemaProfile) -> Result<()> {
    if profile.name.is_empty() {
        return Err(Error::config("Profile name cannot be empty"));
    }

    if profile.target_table.trim().is_empty() {
        return Err(Error::config(format!(
            "Profile '{}' target_table cannot be empty",
            profile.name
        )));
    }

    if profile.fields.is_empty() {
        return Err(Error::config(format!(
            "Profile '{}' must declare at least one field",
            profile.name
        )));
    }

    let field_names: HashSet<_> = profile.fields.iter().map(|f| f.name.as_str()).collect();
    if field_names.len() != profile.fields.len() {
        return Err(Error::config(format!(
            "Profile '{}' has duplicate field names",
            profile.name
        )));
    }

    if profile.fields.iter().any(|f| f.name.trim().is_empty()) {
        return Err(Error::config(format!(
            "Profile '{}' has a field with an empty name",
            profile.name
        )));
    }

    let mut headers = HashSet::new();
    for mapping in &profile.header_map {
        if !headers.insert(mapping.header.as_str()) {
            return Err(Error::config(format!(
                "Profile '{}' maps header '{}' more than once",
                profile.name, mapping.header
            )));
        }
        if !field_names.contains(mapping.field.as_str()) {
            return Err(Error::config(format!(
                "Profile '{}' maps header '{}' to undeclared field '{}'",
                profile.name, mapping.header, mapping.field
            )));
        }
    }

    match &profile.date_field {
        Some(name) => {
            let field = profile.field(name).ok_or_else(|| {
                Error::config(format!(
                    "Profile '{}' date_field '{name}' is not a declared field",
                    profile.name
                ))
            })?;
            if field.semantic_type != SemanticType::Date {
                return Err(Error::config(format!(
                    "Profile '{}' date_field '{name}' must have type date",
                    profile.name
                )));
            }
        }
        None => {
            if profile.date_filter_enabled || profile.collision_check_enabled {
                return Err(Error::config(format!(
                    "Profile '{}' enables a date policy but declares no date_field",
                    profile.name
                )));
            }
        }
    }

    Ok(())
}
