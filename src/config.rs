//! Command line and environment configuration.
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it. `IMAGE_PATH` and `IMAGE_PROCESSING_ENDPOINT` are
//! required; an empty value counts as missing.

use crate::capture::CommandCapture;
use crate::client::DEFAULT_REQUEST_TIMEOUT;
use crate::cycle::DEFAULT_CYCLE_DELAY;
use crate::error::ConfigError;
use crate::telemetry::{DEFAULT_MESSAGE_TIMEOUT, DEFAULT_OUTPUT};
use clap::{Parser, ValueEnum};
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

/// BCM lines of the reference wiring, in yellow, green, blue, red, white order.
pub const DEFAULT_GPIO_PINS: [u32; 5] = [6, 19, 13, 26, 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndicatorBackend {
    /// Drive GPIO lines through sysfs
    Gpio,
    /// Keep line levels in memory and log state changes
    Log,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path of the most recently captured frame
    #[arg(long, env = "IMAGE_PATH", default_value = "")]
    pub image_path: String,

    /// URL of the image classification service
    #[arg(long, env = "IMAGE_PROCESSING_ENDPOINT", default_value = "")]
    pub endpoint: String,

    /// Frame-grab command; the image path is appended as its last argument.
    /// Split on whitespace only: quotes are not interpreted
    #[arg(long, env = "CAPTURE_COMMAND")]
    pub capture_command: Option<String>,

    /// Telemetry message timeout in milliseconds
    #[arg(long, env = "MESSAGE_TIMEOUT_MS", default_value_t = DEFAULT_MESSAGE_TIMEOUT.as_millis() as u64)]
    pub message_timeout_ms: u64,

    /// Classification request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_millis() as u64)]
    pub request_timeout_ms: u64,

    /// Delay between cycles in milliseconds
    #[arg(long, env = "CYCLE_DELAY_MS", default_value_t = DEFAULT_CYCLE_DELAY.as_millis() as u64)]
    pub cycle_delay_ms: u64,

    /// URL receiving telemetry messages; logged locally when absent
    #[arg(long, env = "TELEMETRY_ENDPOINT")]
    pub telemetry_endpoint: Option<String>,

    /// Output channel telemetry is routed to
    #[arg(long, env = "TELEMETRY_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub telemetry_output: String,

    /// Optional HMAC key for signing telemetry messages
    #[arg(long, env = "TELEMETRY_HMAC_KEY")]
    pub telemetry_hmac_key: Option<String>,

    /// Indicator line driver
    #[arg(long, env = "INDICATOR", value_enum, default_value_t = IndicatorBackend::Log)]
    pub indicator: IndicatorBackend,

    /// GPIO lines as yellow,green,blue,red,white
    #[arg(long, env = "GPIO_PINS", default_value = "6,19,13,26,5")]
    pub gpio_pins: String,

    /// sysfs GPIO directory
    #[arg(long, env = "GPIO_ROOT", default_value = crate::indicator::DEFAULT_GPIO_ROOT)]
    pub gpio_root: PathBuf,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub image_path: PathBuf,
    pub endpoint: Url,
    pub capture: Option<CommandCapture>,
    pub message_timeout: Duration,
    pub request_timeout: Duration,
    pub cycle_delay: Duration,
    pub telemetry_endpoint: Option<Url>,
    pub telemetry_output: String,
    pub telemetry_hmac_key: Option<String>,
    pub indicator: IndicatorBackend,
    pub gpio_pins: [u32; 5],
    pub gpio_root: PathBuf,
    pub debug: bool,
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let image_path = args.image_path.trim();
        if image_path.is_empty() {
            return Err(ConfigError::MissingValue("IMAGE_PATH"));
        }
        let endpoint = args.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::MissingValue("IMAGE_PROCESSING_ENDPOINT"));
        }

        let capture = match args.capture_command.as_deref().map(str::trim) {
            Some(command) if !command.is_empty() => Some(CommandCapture::parse(command)?),
            _ => None,
        };

        let telemetry_endpoint = match args.telemetry_endpoint.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Some(parse_endpoint(url)?),
            _ => None,
        };

        Ok(Self {
            image_path: PathBuf::from(image_path),
            endpoint: parse_endpoint(endpoint)?,
            capture,
            message_timeout: Duration::from_millis(args.message_timeout_ms),
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            cycle_delay: Duration::from_millis(args.cycle_delay_ms),
            telemetry_endpoint,
            telemetry_output: args.telemetry_output,
            telemetry_hmac_key: args.telemetry_hmac_key.filter(|key| !key.is_empty()),
            indicator: args.indicator,
            gpio_pins: parse_pins(&args.gpio_pins)?,
            gpio_root: args.gpio_root,
            debug: args.debug,
        })
    }
}

impl Config {
    /// Default `RUST_LOG` filter.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

fn parse_endpoint(url: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidEndpoint {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ConfigError::InvalidEndpoint {
            url: url.to_string(),
            reason: format!("unsupported scheme {scheme}"),
        }),
    }
}

/// Parse five comma separated line numbers.
pub fn parse_pins(list: &str) -> Result<[u32; 5], ConfigError> {
    let pins = list
        .split(',')
        .map(|pin| pin.trim().parse::<u32>())
        .collect::<Result<Vec<u32>, _>>()
        .map_err(|e| ConfigError::InvalidPins(format!("{list}: {e}")))?;

    <[u32; 5]>::try_from(pins).map_err(|pins| {
        ConfigError::InvalidPins(format!("expected 5 lines, got {}", pins.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, ConfigError> {
        let mut argv = vec!["waste-sorter-agent"];
        argv.extend_from_slice(args);
        Config::try_from(Args::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[
            "--image-path",
            "/tmp/image.jpg",
            "--endpoint",
            "http://classifier/image",
        ])
        .unwrap();
        assert_eq!(config.image_path, PathBuf::from("/tmp/image.jpg"));
        assert_eq!(config.endpoint.as_str(), "http://classifier/image");
        assert_eq!(config.message_timeout, Duration::from_millis(10000));
        assert_eq!(config.cycle_delay, Duration::from_secs(1));
        assert_eq!(config.telemetry_output, "output1");
        assert_eq!(config.gpio_pins, DEFAULT_GPIO_PINS);
        assert_eq!(config.indicator, IndicatorBackend::Log);
        assert!(config.capture.is_none());
        assert!(config.telemetry_endpoint.is_none());
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_debug_raises_log_filter() {
        let config = parse(&[
            "--image-path",
            "/tmp/image.jpg",
            "--endpoint",
            "http://classifier/image",
            "--debug",
        ])
        .unwrap();
        assert!(config.debug);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_empty_required_values() {
        assert!(matches!(
            parse(&["--image-path", "", "--endpoint", "http://classifier/image"]),
            Err(ConfigError::MissingValue("IMAGE_PATH"))
        ));
        assert!(matches!(
            parse(&["--image-path", "/tmp/image.jpg", "--endpoint", "  "]),
            Err(ConfigError::MissingValue("IMAGE_PROCESSING_ENDPOINT"))
        ));
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            parse(&["--image-path", "/tmp/i.jpg", "--endpoint", "classifier"]),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            parse(&["--image-path", "/tmp/i.jpg", "--endpoint", "ftp://classifier/"]),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_optional_values() {
        let config = parse(&[
            "--image-path",
            "/tmp/image.jpg",
            "--endpoint",
            "https://classifier/image",
            "--capture-command",
            "fswebcam -r 1280x720 --no-banner",
            "--telemetry-endpoint",
            "http://hub/telemetry",
            "--indicator",
            "gpio",
            "--gpio-pins",
            "1, 2, 3, 4, 5",
        ])
        .unwrap();
        assert_eq!(config.capture.unwrap().program(), "fswebcam");
        assert_eq!(
            config.telemetry_endpoint.unwrap().as_str(),
            "http://hub/telemetry"
        );
        assert_eq!(config.indicator, IndicatorBackend::Gpio);
        assert_eq!(config.gpio_pins, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_parse_pins() {
        assert!(matches!(parse_pins("1,2,3"), Err(ConfigError::InvalidPins(_))));
        assert!(matches!(parse_pins("1,2,3,4,x"), Err(ConfigError::InvalidPins(_))));
        assert_eq!(parse_pins("6,19,13,26,5").unwrap(), DEFAULT_GPIO_PINS);
    }
}
