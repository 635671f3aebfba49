use celloapi::ChassisFiles;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error(
        "Invalid chassis name '{0}'. Expected letters and digits only (e.g., 'Eco1C1G1T1')."
    )]
    InvalidChassisName(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Component '{component}' cannot be empty in '{input}'.")]
    EmptyComponent {
        component: &'static str,
        input: String,
    },
}

/// Resolves a chassis name to its UCF, input and output file names.
///
/// Names outside the known table are accepted with a warning, since users may
/// supply their own constraint files.
pub fn parse_chassis(name: &str) -> Result<ChassisFiles, ParseError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "chassis",
            input: name.to_string(),
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ParseError::InvalidChassisName(name.to_string()));
    }

    let chassis = ChassisFiles::new(name);
    if !chassis.is_known() {
        warn!(
            "Chassis '{}' is not one of the chassis shipped with Cello v2.",
            name
        );
    }
    Ok(chassis)
}

pub fn parse_key_value(input: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidKeyValue(input.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "key",
            input: input.to_string(),
        });
    }
    Ok((key, value.trim()))
}
