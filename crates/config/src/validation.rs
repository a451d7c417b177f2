//! Configuration validation
//!
//! Fails fast on anything a sink could not be constructed from:
//! - Required fields are present for enabled sinks
//! - Sizes are non-zero and windows are within bounds
//! - Recipients look like addresses
//! - At least one sink is enabled when any are declared

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::sinks::{BatchingMailSinkConfig, RotatingFileSinkConfig, SinkConfig};

/// Longest accepted batching window
pub const MAX_WINDOW_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_sinks(config)?;
    Ok(())
}

/// Validate sink configurations
fn validate_sinks(config: &Config) -> Result<()> {
    if !config.sinks.is_empty() && config.enabled_sinks().is_empty() {
        return Err(ConfigError::NoSinksEnabled);
    }

    for (name, sink) in config.sinks.iter() {
        if !sink.is_enabled() {
            continue;
        }

        match sink {
            SinkConfig::RotatingFile(file) => validate_rotating_file(name, file)?,
            SinkConfig::Mail(mail) => validate_recipients(name, &mail.recipients)?,
            SinkConfig::BatchingMail(mail) => validate_batching_mail(name, mail)?,
            // Stream sinks don't have required fields
            SinkConfig::Stream(_) => {}
        }
    }

    Ok(())
}

fn validate_rotating_file(name: &str, file: &RotatingFileSinkConfig) -> Result<()> {
    if file.base_file_name.trim().is_empty() {
        return Err(ConfigError::missing_field("sink", name, "base_file_name"));
    }
    if file.base_file_name.ends_with('/') || file.base_file_name.ends_with('\\') {
        return Err(ConfigError::invalid_value(
            "sink",
            name,
            "base_file_name",
            "must name a file, not a directory",
        ));
    }
    if file.max_trace_file_size == 0 {
        return Err(ConfigError::invalid_value(
            "sink",
            name,
            "max_trace_file_size",
            "must be greater than zero",
        ));
    }
    if file.retention_period_in_days == Some(0) {
        return Err(ConfigError::invalid_value(
            "sink",
            name,
            "retention_period_in_days",
            "must be at least one day (omit it to keep files forever)",
        ));
    }
    Ok(())
}

fn validate_recipients(name: &str, recipients: &[String]) -> Result<()> {
    if recipients.is_empty() {
        return Err(ConfigError::missing_field("sink", name, "recipients"));
    }
    if let Some(bad) = recipients
        .iter()
        .find(|r| r.trim().is_empty() || !r.contains('@'))
    {
        return Err(ConfigError::invalid_value(
            "sink",
            name,
            "recipients",
            format!("'{}' is not an email address", bad),
        ));
    }
    Ok(())
}

fn validate_batching_mail(name: &str, mail: &BatchingMailSinkConfig) -> Result<()> {
    validate_recipients(name, &mail.recipients)?;
    for (field, seconds) in [
        ("initial_window_seconds", mail.initial_window_seconds),
        ("increment_window_seconds", mail.increment_window_seconds),
    ] {
        if seconds == 0 {
            return Err(ConfigError::invalid_value("sink", name, field, "must be greater than zero"));
        }
        if seconds > MAX_WINDOW_SECONDS {
            return Err(ConfigError::invalid_value(
                "sink",
                name,
                field,
                format!("must be at most {} (one week)", MAX_WINDOW_SECONDS),
            ));
        }
    }
    if mail.max_listed_messages == 0 {
        return Err(ConfigError::invalid_value(
            "sink",
            name,
            "max_listed_messages",
            "must be greater than zero",
        ));
    }
    Ok(())
}
