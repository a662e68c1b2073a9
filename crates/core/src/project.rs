//! Project field helpers and validation.
//!
//! Projects store their skills as one comma-joined string; these helpers
//! convert between that form and a list, and group projects by category for
//! the all-projects browser.

use serde::Serialize;

use crate::error::CoreError;

/// Maximum length for a project title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Split the stored comma-joined skills string into trimmed, non-empty
/// entries, preserving order.
pub fn split_skills(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join a list of skills into the stored comma-joined form.
pub fn join_skills<S: AsRef<str>>(skills: &[S]) -> String {
    skills
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Project title must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Project title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// External links must be absolute http(s) URLs.
pub fn validate_link(link: &str) -> Result<(), CoreError> {
    if link.starts_with("https://") || link.starts_with("http://") {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid link '{link}'. Must start with http:// or https://"
        )))
    }
}

/// Projects sharing a category key. `category` is `None` for the bucket of
/// projects whose key matches no known category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup<T> {
    pub category: Option<String>,
    pub items: Vec<T>,
}

/// Group items by category key in the given category order.
///
/// Categories with no items are omitted. Items with an unknown key are
/// collected into a trailing ungrouped bucket. Item order within a group is
/// preserved.
pub fn group_by_category<T, F>(
    category_order: &[String],
    items: Vec<T>,
    key_of: F,
) -> Vec<CategoryGroup<T>>
where
    F: Fn(&T) -> &str,
{
    let mut groups: Vec<CategoryGroup<T>> = category_order
        .iter()
        .map(|key| CategoryGroup {
            category: Some(key.clone()),
            items: Vec::new(),
        })
        .collect();
    let mut ungrouped = Vec::new();

    for item in items {
        match category_order.iter().position(|k| k == key_of(&item)) {
            Some(idx) => groups[idx].items.push(item),
            None => ungrouped.push(item),
        }
    }

    groups.retain(|g| !g.items.is_empty());
    if !ungrouped.is_empty() {
        groups.push(CategoryGroup {
            category: None,
            items: ungrouped,
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_trims_and_drops_empty() {
        assert_eq!(
            split_skills(" Figma, Canva ,, Notion ,"),
            vec!["Figma", "Canva", "Notion"]
        );
        assert!(split_skills("").is_empty());
        assert!(split_skills(" , ").is_empty());
    }

    #[test]
    fn join_normalises_spacing() {
        assert_eq!(join_skills(&["Excel", " Sheets ", ""]), "Excel, Sheets");
        assert_eq!(join_skills::<&str>(&[]), "");
    }

    #[test]
    fn title_validation() {
        assert!(validate_title("Inbox cleanup").is_ok());
        assert!(validate_title("  ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }

    #[test]
    fn link_validation() {
        assert!(validate_link("https://example.com").is_ok());
        assert!(validate_link("http://example.com").is_ok());
        assert!(validate_link("example.com").is_err());
        assert!(validate_link("javascript:alert(1)").is_err());
    }

    #[test]
    fn grouping_follows_category_order() {
        let order = vec!["admin".to_string(), "design".to_string()];
        let items = vec![("p1", "design"), ("p2", "admin"), ("p3", "design")];
        let groups = group_by_category(&order, items, |i| i.1);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category.as_deref(), Some("admin"));
        assert_eq!(groups[0].items, vec![("p2", "admin")]);
        assert_eq!(groups[1].items, vec![("p1", "design"), ("p3", "design")]);
    }

    #[test]
    fn orphans_land_in_ungrouped_bucket() {
        let order = vec!["admin".to_string()];
        let items = vec![("p1", "retired"), ("p2", "admin")];
        let groups = group_by_category(&order, items, |i| i.1);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].category, None);
        assert_eq!(groups[1].items, vec![("p1", "retired")]);
    }

    #[test]
    fn grouping_empty_input() {
        let groups = group_by_category::<(&str, &str), _>(&[], Vec::new(), |i| i.1);
        assert!(groups.is_empty());
    }
}
