use crate::utils::error::{BotError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(BotError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BotError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // NaN 不會通過任何比較
    if !(value >= min && value <= max) {
        return Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_log_level(field_name: &str, level: &str) -> Result<()> {
    const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];
    if !LEVELS.contains(&level.to_lowercase().as_str()) {
        return Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: level.to_string(),
            reason: format!("Must be one of {}", LEVELS.join(", ")),
        });
    }
    Ok(())
}

/// Shared checks for every [`ConfigProvider`](crate::domain::ports::ConfigProvider).
pub fn validate_provider<C: crate::domain::ports::ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_url("base_url", config.base_url())?;
    validate_non_empty_string("user_agent", config.user_agent())?;
    validate_non_empty_string("command_prefix", config.command_prefix())?;
    validate_range("min_request_interval_secs", config.min_request_interval_secs(), 0.0, 60.0)?;
    validate_range("request_timeout_secs", config.request_timeout_secs(), 0.1, 300.0)?;
    validate_range("cooldown_secs", config.cooldown_secs(), 0.0, 3600.0)?;
    validate_range("dedup_window_secs", config.dedup_window_secs(), 0.0, 3600.0)?;
    validate_positive_number("max_batch_requests", config.max_batch_requests(), 1)?;
    validate_positive_number("max_concurrent_resolvers", config.max_concurrent_resolvers(), 1)?;
    validate_log_level("log_level", config.log_level())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("base_url", "https://api.scryfall.com").is_ok());
        assert!(validate_url("base_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("base_url", "").is_err());
        assert!(validate_url("base_url", "invalid-url").is_err());
        assert!(validate_url("base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("max_batch_requests", 5, 1).is_ok());
        assert!(validate_positive_number("max_batch_requests", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range_rejects_nan() {
        assert!(validate_range("cooldown_secs", 2.0, 0.0, 10.0).is_ok());
        assert!(validate_range("cooldown_secs", -1.0, 0.0, 10.0).is_err());
        assert!(validate_range("cooldown_secs", f64::NAN, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_validate_log_level() {
        assert!(validate_log_level("log_level", "DEBUG").is_ok());
        assert!(validate_log_level("log_level", "loud").is_err());
    }

    #[test]
    fn test_empty_string_is_missing() {
        assert!(validate_non_empty_string("command_prefix", "!").is_ok());
        let err = validate_non_empty_string("command_prefix", "   ").unwrap_err();
        assert!(matches!(err, BotError::MissingConfigError { .. }));
    }
}
