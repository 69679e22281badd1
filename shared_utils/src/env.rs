use thiserror::Error;

/// An environment variable required by the application is not set (or is blank).
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// A variable that is set but contains only whitespace counts as missing, so an
/// empty `LOTTERY_API_KEY=` line in a `.env` file does not produce an empty header.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    get_optional_env_var(name).ok_or_else(|| MissingEnvVarError(name.to_string()))
}

/// Reads an environment variable that the caller can live without.
pub fn get_optional_env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    // SAFETY (all tests): env mutation is serialized through `#[serial]`.

    #[test]
    #[serial]
    fn present_variable_is_trimmed() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_VAR", "  abc  ") };
        assert_eq!(get_env_var("SHARED_UTILS_TEST_VAR").unwrap(), "abc");
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_VAR") };
    }

    #[test]
    #[serial]
    fn missing_variable_names_itself() {
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_VAR") };
        let err = get_env_var("SHARED_UTILS_TEST_VAR").unwrap_err();
        assert_eq!(err.to_string(), "Missing environment variable: SHARED_UTILS_TEST_VAR");
    }

    #[test]
    #[serial]
    fn blank_variable_counts_as_missing() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_VAR", "   ") };
        assert!(get_optional_env_var("SHARED_UTILS_TEST_VAR").is_none());
        assert!(get_env_var("SHARED_UTILS_TEST_VAR").is_err());
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_VAR") };
    }
}
