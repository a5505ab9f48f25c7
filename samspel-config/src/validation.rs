//! Custom validation functions for configuration.

use validator::ValidationError;

/// Validate the run-loop strategy name.
pub fn validate_strategy(strategy: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^(sequential|parallel)$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(strategy) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_strategy"))
    }
}
