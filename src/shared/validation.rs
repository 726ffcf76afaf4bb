use rust_decimal::Decimal;
use validator::ValidationError;

/// Prices must never be negative
pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Catalogue prices fit a `NUMERIC(12, 2)` column: at most 10 integer digits, 2 decimals
pub fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(value)?;

    if value.normalize().scale() > 2 {
        let mut err = ValidationError::new("price_scale");
        err.message = Some("must have at most 2 decimal places".into());
        return Err(err);
    }

    if *value >= Decimal::from(10_000_000_000i64) {
        let mut err = ValidationError::new("price_range");
        err.message = Some("must be less than 10000000000".into());
        return Err(err);
    }

    Ok(())
}

/// Names must yield a usable slug
pub fn validate_sluggable(name: &str) -> Result<(), ValidationError> {
    if crate::shared::slug::derive_slug(name).is_empty() {
        let mut err = ValidationError::new("sluggable");
        err.message = Some("must contain at least one letter, digit or underscore".into());
        return Err(err);
    }
    Ok(())
}

/// Trim a free-text field, mapping blank input to `None`
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse a boolean form value, accepting checkbox-style `on`/`off` and `1`/`0`
pub fn parse_bool(field: &str, raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        other => Err(format!("{}: '{}' is not a boolean", field, other)),
    }
}
