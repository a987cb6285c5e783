//! Host configuration.
//!
//! `HostConfig` controls how the [`HostContext`](crate::host::HostContext) creates surfaces and
//! starts the engine. It provides defaults via [`Default`], a fluent [`HostConfig::builder()`]
//! with validation, and [`HostConfig::from_json`] for hosts that ship their settings as JSON.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use surface_host::config::HostConfig;
//! let cfg = HostConfig::default();
//! assert!(cfg.validate_attachments);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use surface_host::config::{HostConfig, LogLevel};
//! use surface_host::surface::PixelFormat;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = HostConfig::builder()
//!     .pixel_format(PixelFormat::Rgbx8888)
//!     .engine_arg("--rendering-driver")
//!     .engine_arg("vulkan")
//!     .log_level(LogLevel::Debug)
//!     .build()?;
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `pixel_format`: Buffer format of compositor controls created by the host (default: RGBA 8888).
//! - `engine_args`: Command line handed to the engine on initialization.
//! - `log_level`: If set, the maximum level installed into the `log` facade when the host
//!   initializes. Unset by default, leaving the application's logger alone.
//! - `validate_attachments`: Ask the compositor whether a previously attached parent control is
//!   still alive before trusting its identity (default: `true`).
//!
//! # Errors
//!
//! Validation returns [`HostConfigError`] when the pixel format is only a hint to the system
//! (`Opaque`, `Translucent`, ...) or when an engine argument is empty.

use crate::surface::PixelFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Log level the host installs into the `log` facade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub pixel_format: PixelFormat,
    pub engine_args: Vec<String>,
    pub log_level: Option<LogLevel>,
    pub validate_attachments: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Rgba8888,
            engine_args: Vec::new(),
            log_level: None,
            validate_attachments: true,
        }
    }
}

impl HostConfig {
    pub fn builder() -> HostConfigBuilder {
        HostConfigBuilder::default()
    }

    /// Parses and validates a JSON document. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<HostConfig, HostConfigError> {
        let cfg: HostConfig = serde_json::from_str(json).map_err(|e| HostConfigError::Parse(e.to_string()))?;
        validate(&cfg)?;
        Ok(cfg)
    }

    /// The filter to install into the `log` facade, if the application asked for one.
    pub fn log_filter(&self) -> Option<log::LevelFilter> {
        self.log_level.map(Into::into)
    }

    /// Checks a config that was assembled by hand instead of through the builder.
    pub fn validate(&self) -> Result<(), HostConfigError> {
        validate(self)
    }
}

/// Builder for [`HostConfig`].
#[derive(Debug, Clone, Default)]
pub struct HostConfigBuilder {
    inner: HostConfig,
}

impl HostConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut HostConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn pixel_format(self, format: PixelFormat) -> Self { self.map(|c| c.pixel_format = format) }
    pub fn engine_arg<S: Into<String>>(self, arg: S) -> Self { self.map(|c| c.engine_args.push(arg.into())) }
    pub fn engine_args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map(|c| c.engine_args = args.into_iter().map(Into::into).collect())
    }
    pub fn log_level(self, level: LogLevel) -> Self { self.map(|c| c.log_level = Some(level)) }
    pub fn validate_attachments(self, on: bool) -> Self { self.map(|c| c.validate_attachments = on) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<HostConfig, HostConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum HostConfigError {
    UnsupportedPixelFormat(PixelFormat),
    EmptyEngineArg(usize),
    Parse(String),
}

impl fmt::Display for HostConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostConfigError::UnsupportedPixelFormat(p) =>
                write!(f, "pixel_format {p:?} is not a buffer format"),
            HostConfigError::EmptyEngineArg(idx) =>
                write!(f, "engine_args[{idx}] is empty"),
            HostConfigError::Parse(msg) =>
                write!(f, "cannot parse host config: {msg}"),
        }
    }
}
impl std::error::Error for HostConfigError {}

fn validate(c: &HostConfig) -> Result<(), HostConfigError> {
    if !c.pixel_format.is_buffer_format() {
        return Err(HostConfigError::UnsupportedPixelFormat(c.pixel_format));
    }
    if let Some(idx) = c.engine_args.iter().position(|a| a.trim().is_empty()) {
        return Err(HostConfigError::EmptyEngineArg(idx));
    }
    Ok(())
}
