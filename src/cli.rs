//! Line commands accepted by `busylight run`

use crate::light::LightColor;
use std::str::FromStr;

/// Interactive driver commands
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Show a color (`available`, `busy`, `locked`, `color RRGGBB`)
    Color(LightColor),
    /// Set brightness in [0, 1]
    Brightness(f32),
    /// Dim or restore brightness
    Dim(bool),
    /// Set fade speed on the connected light
    Speed(i8),
    /// Snooze Slack notifications on or off
    Snooze(bool),
    /// Start Slack authorization in the browser
    Login,
    /// Deliver an activation callback URL
    Activate(String),
    /// Remove the Slack integration
    Logout,
    /// Print current state
    Status,
    /// Exit
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("{0}: missing argument")]
    MissingArgument(&'static str),
    #[error("{0}: invalid argument {1:?}")]
    InvalidArgument(&'static str, String),
}

fn parse_switch(name: &'static str, arg: Option<&str>) -> Result<bool, ParseCommandError> {
    match arg {
        Some("on") | Some("true") | Some("1") => Ok(true),
        Some("off") | Some("false") | Some("0") => Ok(false),
        Some(other) => Err(ParseCommandError::InvalidArgument(name, other.to_string())),
        None => Err(ParseCommandError::MissingArgument(name)),
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ParseCommandError::Empty)?;
        let arg = words.next();

        let command = match name.to_ascii_lowercase().as_str() {
            "available" => Command::Color(LightColor::AVAILABLE),
            "busy" => Command::Color(LightColor::BUSY),
            "locked" => Command::Color(LightColor::LOCKED),
            "color" => {
                let value = arg.ok_or(ParseCommandError::MissingArgument("color"))?;
                Command::Color(
                    value
                        .parse()
                        .map_err(|_| ParseCommandError::InvalidArgument("color", value.to_string()))?,
                )
            }
            "brightness" => {
                let value = arg.ok_or(ParseCommandError::MissingArgument("brightness"))?;
                let brightness: f32 = value
                    .parse()
                    .map_err(|_| ParseCommandError::InvalidArgument("brightness", value.to_string()))?;
                if !(0.0..=1.0).contains(&brightness) {
                    return Err(ParseCommandError::InvalidArgument("brightness", value.to_string()));
                }
                Command::Brightness(brightness)
            }
            "dim" => Command::Dim(parse_switch("dim", arg)?),
            "speed" => {
                let value = arg.ok_or(ParseCommandError::MissingArgument("speed"))?;
                Command::Speed(
                    value
                        .parse()
                        .map_err(|_| ParseCommandError::InvalidArgument("speed", value.to_string()))?,
                )
            }
            "snooze" => Command::Snooze(parse_switch("snooze", arg)?),
            "login" => Command::Login,
            "activate" => Command::Activate(
                arg.ok_or(ParseCommandError::MissingArgument("activate"))?
                    .to_string(),
            ),
            "logout" => Command::Logout,
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}
