use std::ops::RangeInclusive;

use crate::error::ConfigError;

pub const DEFAULT_SERVER_NAME: &str = "server";
pub const DEFAULT_PORT: u16 = 5000;

/// Registered ports: above the well-known range, below the dynamic one.
pub const PORT_RANGE: RangeInclusive<u32> = 1024..=49151;

pub fn validate_port(port: u32) -> Result<u16, ConfigError> {
    if !PORT_RANGE.contains(&port) {
        return Err(ConfigError::PortOutOfRange { port });
    }
    u16::try_from(port).map_err(|_| ConfigError::PortOutOfRange { port })
}

/// `clap` value parser for `--port`.
pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let port: u32 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort(raw.to_string()))?;
    validate_port(port)
}
