//! Command line parsing.

use thiserror::Error;

pub const USAGE: &str = "\
Usage: rovcontrol <mode> [depth_setpoint]

Modes:
  joystick            map gamepad input to thruster and light commands
  depth <setpoint>    hold the given depth in meters
  all <setpoint>      run both loops";

/// What the process was asked to run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Joystick,
    Depth { setpoint: f64 },
    All { setpoint: f64 },
}

impl Command {
    pub fn runs_joystick(&self) -> bool {
        matches!(self, Command::Joystick | Command::All { .. })
    }

    pub fn depth_setpoint(&self) -> Option<f64> {
        match self {
            Command::Joystick => None,
            Command::Depth { setpoint } | Command::All { setpoint } => Some(*setpoint),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    #[error("No mode given")]
    MissingMode,

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("Mode {0} needs a depth setpoint")]
    MissingSetpoint(&'static str),

    #[error("Invalid depth setpoint: {0}")]
    InvalidSetpoint(String),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),
}

/// Parses the arguments following the program name
pub fn parse_args<I, S>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let mode = args.next().ok_or(CliError::MissingMode)?;

    let command = match mode.as_str() {
        "joystick" => Command::Joystick,
        "depth" => Command::Depth {
            setpoint: parse_setpoint(args.next(), "depth")?,
        },
        "all" => Command::All {
            setpoint: parse_setpoint(args.next(), "all")?,
        },
        _ => return Err(CliError::UnknownMode(mode)),
    };

    match args.next() {
        Some(extra) => Err(CliError::UnexpectedArgument(extra)),
        None => Ok(command),
    }
}

fn parse_setpoint(arg: Option<String>, mode: &'static str) -> Result<f64, CliError> {
    let raw = arg.ok_or(CliError::MissingSetpoint(mode))?;
    match raw.trim().parse::<f64>() {
        Ok(setpoint) if setpoint.is_finite() => Ok(setpoint),
        _ => Err(CliError::InvalidSetpoint(raw)),
    }
}
