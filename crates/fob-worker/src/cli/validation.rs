use crate::stats::SortKey;
use regex::Regex;

const SORT_FIELDS: &[&str] = &["name", "size", "id"];

/// Parse a configuration count. A coordinator always expects at least one.
pub fn parse_count(s: &str) -> Result<usize, String> {
    let count: usize = s
        .parse()
        .map_err(|_| format!("Count must be a positive integer: '{}'", s))?;
    if count == 0 {
        return Err("Count must be at least 1".to_string());
    }
    Ok(count)
}

/// Validate a statistics sort key such as `size` or `!name`.
pub fn parse_sort_key(s: &str) -> Result<String, String> {
    let key = SortKey::parse(s).ok_or_else(|| "Sort key cannot be empty".to_string())?;
    if !SORT_FIELDS.contains(&key.field.as_str()) {
        return Err(format!(
            "Unknown sort field '{}' (expected one of: {})",
            key.field,
            SORT_FIELDS.join(", ")
        ));
    }
    Ok(s.trim().to_string())
}

/// Validate a module exclusion pattern.
pub fn parse_exclude(s: &str) -> Result<String, String> {
    Regex::new(s).map_err(|e| format!("Invalid exclude pattern: {}", e))?;
    Ok(s.to_string())
}
