//! Category ordering, selection and key validation.
//!
//! The functions here operate on anything implementing [`CategoryEntry`] so
//! that the row model in `folio-db` and test fixtures can share them.

use crate::error::CoreError;

/// Maximum length of a category key.
pub const MAX_KEY_LENGTH: usize = 64;

/// Fields of a category the ordering rules depend on.
pub trait CategoryEntry {
    fn key(&self) -> &str;
    fn display_name(&self) -> &str;
    fn is_hidden(&self) -> bool;
}

/// Sort categories with all visible entries first, then hidden entries.
///
/// Each group is ordered alphabetically by display name, ignoring case. Ties
/// fall back to the key so the order is total.
pub fn sort_visible_first<T: CategoryEntry>(categories: &mut [T]) {
    categories.sort_by(|a, b| {
        a.is_hidden()
            .cmp(&b.is_hidden())
            .then_with(|| {
                a.display_name()
                    .to_lowercase()
                    .cmp(&b.display_name().to_lowercase())
            })
            .then_with(|| a.key().cmp(b.key()))
    });
}

/// The category selected when the portfolio first loads: the first visible
/// entry in the given order.
pub fn default_category<T: CategoryEntry>(categories: &[T]) -> Option<&T> {
    categories.iter().find(|c| !c.is_hidden())
}

/// Validate a category key: 1-64 chars of lowercase ASCII letters, digits
/// or `-`, not starting or ending with `-`.
pub fn validate_category_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Category key must be between 1 and {MAX_KEY_LENGTH} characters"
        )));
    }
    let valid_chars = key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_chars || key.starts_with('-') || key.ends_with('-') {
        return Err(CoreError::Validation(format!(
            "Invalid category key '{key}'. Use lowercase letters, digits and '-'"
        )));
    }
    Ok(())
}

/// Validate a category display name (non-blank).
pub fn validate_category_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Category name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Derive a key suggestion from a display name.
///
/// Runs of non-alphanumeric characters collapse into a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.truncate(MAX_KEY_LENGTH);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
