use super::ApiError;

pub const MAX_PAGE_LIMIT: u64 = 100;
/// Keeps `(page - 1) * limit` well inside an SQLite `OFFSET`.
pub const MAX_PAGE: u64 = 1_000_000;

pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MIN_LIMIT: u64 = 1;

    if !(MIN_LIMIT..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between {} and {}",
            limit, MIN_LIMIT, MAX_PAGE_LIMIT
        )));
    }
    Ok(limit)
}

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page == 0 {
        return Err(ApiError::validation(
            "Invalid page: 0. Pages start at 1",
        ));
    }
    if page > MAX_PAGE {
        return Err(ApiError::validation(format!(
            "Invalid page: {page}. Page must be at most {MAX_PAGE}"
        )));
    }
    Ok(page)
}

/// Trims the search term; blank input means no search.
#[must_use]
pub fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub fn validate_bonus(field: &str, value: Option<&serde_json::Value>) -> Result<i32, ApiError> {
    value
        .and_then(serde_json::Value::as_i64)
        .filter(|v| *v >= 0)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| {
            ApiError::validation(format!("{field} must be a non-negative integer"))
        })
}

pub fn require_field<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(20).is_ok());
        assert!(validate_limit(100).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(101).is_err());
    }

    #[test]
    fn test_validate_page() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(MAX_PAGE).is_ok());
        assert!(validate_page(0).is_err());
        assert!(validate_page(MAX_PAGE + 1).is_err());
        assert!(validate_page(u64::MAX).is_err());
    }

    #[test]
    fn test_normalize_search() {
        assert_eq!(normalize_search(Some("  frog ")), Some("frog".to_string()));
        assert_eq!(normalize_search(Some("   ")), None);
        assert_eq!(normalize_search(None), None);
    }

    #[test]
    fn test_validate_bonus() {
        assert_eq!(validate_bonus("referralBonus", Some(&json!(7))).unwrap(), 7);
        assert_eq!(validate_bonus("referralBonus", Some(&json!(0))).unwrap(), 0);
        assert!(validate_bonus("referralBonus", Some(&json!(-1))).is_err());
        assert!(validate_bonus("referralBonus", Some(&json!(1.5))).is_err());
        assert!(validate_bonus("referralBonus", Some(&json!("5"))).is_err());
        assert!(validate_bonus("referralBonus", None).is_err());
    }

    #[test]
    fn test_require_field() {
        assert_eq!(require_field(Some(" block "), "x").unwrap(), "block");
        assert!(require_field(Some(""), "x").is_err());
        assert!(require_field(None, "x").is_err());
    }
}
