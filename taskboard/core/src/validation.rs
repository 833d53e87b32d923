//! Field rules shared by the server (authoritative) and the client (early feedback).

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// A task field that does not satisfy the store's constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Task title is required")]
    EmptyTitle,
    #[error("Task title must be at most {} characters", MAX_TITLE_LEN)]
    TitleTooLong,
    #[error("Task description must be at most {} characters", MAX_DESCRIPTION_LEN)]
    DescriptionTooLong,
}

/// Trims the title and checks it is present and short enough.
pub fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(title.to_string())
}

/// Trims the description. A blank description is stored as absent.
pub fn normalize_description(description: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(description) = description.map(str::trim) else {
        return Ok(None);
    };
    if description.is_empty() {
        return Ok(None);
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(Some(description.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_title() {
        assert_eq!(normalize_title("  Ship it  "), Ok("Ship it".to_string()));
    }

    #[test]
    fn rejects_blank_title() {
        assert_eq!(normalize_title(""), Err(ValidationError::EmptyTitle));
        assert_eq!(normalize_title("   \t"), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn title_limit_counts_characters_not_bytes() {
        let at_limit = "é".repeat(MAX_TITLE_LEN);
        assert!(normalize_title(&at_limit).is_ok());
        let over = "x".repeat(MAX_TITLE_LEN + 1);
        assert_eq!(normalize_title(&over), Err(ValidationError::TitleTooLong));
    }

    #[test]
    fn blank_description_becomes_none() {
        assert_eq!(normalize_description(None), Ok(None));
        assert_eq!(normalize_description(Some("  ")), Ok(None));
        assert_eq!(
            normalize_description(Some(" notes ")),
            Ok(Some("notes".to_string()))
        );
    }

    #[test]
    fn rejects_long_description() {
        let long = "d".repeat(MAX_DESCRIPTION_LEN + 1);
        assert_eq!(
            normalize_description(Some(&long)),
            Err(ValidationError::DescriptionTooLong)
        );
    }
}
