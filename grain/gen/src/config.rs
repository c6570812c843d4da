//! Generator configuration parsed from the plugin parameter string.
//!
//! protoc forwards everything after `--grain_opt=` (or the part before `:` in
//! `--grain_out=`) as one string of comma-separated `key=value` pairs:
//!
//! ```text
//! bridge=v1,default_timeout=30s,runtime=crate::grain
//! ```

use std::str::FromStr;
use std::time::Duration;

use grain_define::BridgeVersion;
use proc_macro2::TokenStream;
use quote::ToTokens;

use crate::errors::GeneratorError;

/// Idle period after which generated actors deactivate unless configured.
pub const DEFAULT_DEACTIVATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Path of the runtime crate as seen from generated code.
pub const DEFAULT_RUNTIME_PATH: &str = "::grain";

/// Settings that shape every generated unit of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Wire error shape the generated dispatcher and client agree on.
    pub bridge: BridgeVersion,
    /// Idle timeout baked into `<svc>_kind`. Zero disables deactivation.
    pub default_timeout: Duration,
    /// Runtime crate path, e.g. `::grain` or `crate::runtime`.
    pub runtime: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeVersion::default(),
            default_timeout: DEFAULT_DEACTIVATION_TIMEOUT,
            runtime: DEFAULT_RUNTIME_PATH.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Parses a plugin parameter string. An empty string yields the defaults.
    ///
    /// ## Errors
    ///
    /// Returns [`GeneratorError::ConfigError`] for unknown keys, pairs without
    /// `=`, or values that do not parse.
    ///
    /// ## Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use grain_define::BridgeVersion;
    /// use grain_gen::config::GeneratorConfig;
    ///
    /// let config = GeneratorConfig::parse("bridge=v1, default_timeout=90s").unwrap();
    /// assert_eq!(config.bridge, BridgeVersion::V1);
    /// assert_eq!(config.default_timeout, Duration::from_secs(90));
    /// assert_eq!(config.runtime, "::grain");
    /// ```
    pub fn parse(parameter: &str) -> Result<Self, GeneratorError> {
        let mut config = Self::default();

        for pair in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                GeneratorError::ConfigError(format!("expected key=value, got '{pair}'"))
            })?;
            let value = value.trim();

            match key.trim() {
                "bridge" => {
                    config.bridge = BridgeVersion::from_str(value).map_err(|_| {
                        GeneratorError::ConfigError(format!(
                            "unknown bridge version '{value}' (expected v1 or v2)"
                        ))
                    })?;
                }
                "default_timeout" => {
                    config.default_timeout = parse_timeout(value).map_err(|reason| {
                        GeneratorError::ConfigError(format!("default_timeout: {reason}"))
                    })?;
                }
                "runtime" => {
                    syn::parse_str::<syn::Path>(value).map_err(|e| {
                        GeneratorError::ConfigError(format!("runtime '{value}' is not a path: {e}"))
                    })?;
                    config.runtime = value.to_string();
                }
                other => {
                    return Err(GeneratorError::ConfigError(format!(
                        "unknown parameter '{other}' (known: bridge, default_timeout, runtime)"
                    )));
                }
            }
        }

        Ok(config)
    }

    /// The runtime path as tokens for `quote!` interpolation.
    pub fn runtime_tokens(&self) -> Result<TokenStream, GeneratorError> {
        syn::parse_str::<syn::Path>(&self.runtime)
            .map(|path| path.to_token_stream())
            .map_err(|e| GeneratorError::ConfigError(format!("runtime '{}': {e}", self.runtime)))
    }
}

/// Parses `<n>[ms|s|m|h]`. A bare number is seconds and `0` disables the timeout.
///
/// ## Examples
///
/// ```
/// use std::time::Duration;
/// use grain_gen::config::parse_timeout;
///
/// assert_eq!(parse_timeout("250ms").unwrap(), Duration::from_millis(250));
/// assert_eq!(parse_timeout("2m").unwrap(), Duration::from_secs(120));
/// assert_eq!(parse_timeout("0").unwrap(), Duration::ZERO);
/// ```
pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    let normalized = value.trim().to_lowercase().replace(' ', "");

    if normalized.is_empty() {
        return Err("timeout cannot be empty".to_string());
    }

    let split_index = normalized
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(normalized.len());
    let (amount, unit) = normalized.split_at(split_index);

    if amount.is_empty() {
        return Err("timeout must start with a number".to_string());
    }

    let amount: u64 = amount
        .parse()
        .map_err(|_| "timeout must be a number".to_string())?;

    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "" | "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        "h" => Duration::from_secs(amount.saturating_mul(3600)),
        _ => return Err("timeout units must be ms, s, m, or h".to_string()),
    };

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parameter_gives_defaults() {
        assert_eq!(GeneratorConfig::parse("").unwrap(), GeneratorConfig::default());
        assert_eq!(GeneratorConfig::parse(" , ").unwrap(), GeneratorConfig::default());
    }

    #[test]
    fn default_bridge_is_v2() {
        assert_eq!(GeneratorConfig::default().bridge, BridgeVersion::V2);
    }

    #[test]
    fn runtime_path_is_accepted_and_tokenized() {
        let config = GeneratorConfig::parse("runtime=crate::rt").unwrap();
        assert_eq!(config.runtime, "crate::rt");
        assert_eq!(config.runtime_tokens().unwrap().to_string(), "crate :: rt");
    }

    #[test]
    fn zero_timeout_disables_deactivation() {
        let config = GeneratorConfig::parse("default_timeout=0").unwrap();
        assert!(config.default_timeout.is_zero());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = GeneratorConfig::parse("paths=source_relative").unwrap_err().to_string();
        assert!(err.contains("unknown parameter 'paths'"), "got: {err}");
    }

    #[test]
    fn pair_without_value_is_rejected() {
        assert!(matches!(
            GeneratorConfig::parse("bridge"),
            Err(GeneratorError::ConfigError(_))
        ));
    }

    #[test]
    fn bad_bridge_version_is_rejected() {
        let err = GeneratorConfig::parse("bridge=v3").unwrap_err().to_string();
        assert!(err.contains("v3"), "got: {err}");
    }

    #[test]
    fn invalid_runtime_path_is_rejected() {
        assert!(GeneratorConfig::parse("runtime=not a path").is_err());
    }

    #[test]
    fn parse_timeout_defaults_to_seconds() {
        assert_eq!(parse_timeout("15").unwrap(), Duration::from_secs(15));
    }

    #[test]
    fn parse_timeout_supports_hours() {
        assert_eq!(parse_timeout("2h").unwrap(), Duration::from_secs(7200));
    }

    #[test]
    fn parse_timeout_rejects_unknown_units() {
        assert!(parse_timeout("5d").is_err());
        assert!(parse_timeout("ms").is_err());
        assert!(parse_timeout("").is_err());
    }
}
