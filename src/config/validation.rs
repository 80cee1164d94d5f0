//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeout > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SupervisorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SupervisorConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("lifecycle.shutdown_timeout_secs must be greater than zero")]
    ZeroShutdownTimeout,

    #[error("{0} must not be empty")]
    EmptyPath(&'static str),

    #[error("{field} is not a valid socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("child.command must not be empty")]
    EmptyChildCommand,
}

/// Check a parsed configuration.
pub fn validate_config(config: &SupervisorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.lifecycle.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }

    if config.tls.cert_path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyPath("tls.cert_path"));
    }
    if config.tls.key_path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyPath("tls.key_path"));
    }

    if config.status.enabled {
        check_address(&mut errors, "status.bind_address", &config.status.bind_address);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if let Some(child) = &config.child {
        if child.command.trim().is_empty() {
            errors.push(ValidationError::EmptyChildCommand);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ChildConfig;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&SupervisorConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = SupervisorConfig::default();
        config.lifecycle.shutdown_timeout_secs = 0;
        config.tls.key_path = Default::default();
        config.status.bind_address = "localhost".to_string();
        config.child = Some(ChildConfig {
            command: "  ".to_string(),
            args: vec![],
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroShutdownTimeout,
                ValidationError::EmptyPath("tls.key_path"),
                ValidationError::InvalidAddress {
                    field: "status.bind_address",
                    value: "localhost".to_string(),
                },
                ValidationError::EmptyChildCommand,
            ]
        );
    }

    #[test]
    fn disabled_endpoints_skip_address_checks() {
        let mut config = SupervisorConfig::default();
        config.status.enabled = false;
        config.status.bind_address = "nonsense".to_string();
        config.observability.metrics_address = "nonsense".to_string();

        assert!(validate_config(&config).is_ok());
    }
}
