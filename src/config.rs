// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! YAML configuration.
//!
//! Keys are kebab-case on the wire. A port of 0 disables the corresponding
//! listener; `restart-interval: -1` disables child restarts;
//! `minimum-fps: 0` removes the render deadline (frame requests then wait
//! for an actual change). Unknown keys are rejected so a typo cannot
//! silently disable a feature.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("config: {0}")]
    #[diagnostic(help("check width/height, compression-level (0..=100) and the log levels"))]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Ordered font list; face 0 must cover ASCII, the rest are fallbacks.
    pub font_files: Vec<PathBuf>,
    #[serde(default = "defaults::font_height")]
    pub font_height: usize,

    #[serde(default = "defaults::width")]
    pub width: usize,
    #[serde(default = "defaults::height")]
    pub height: usize,

    /// 0..=100; PNG zlib level and (inverted) JPEG quality derive from it.
    #[serde(default = "defaults::compression_level")]
    pub compression_level: u8,
    /// Cadence floor for HTTP streams; 0 = render only on change.
    #[serde(default = "defaults::minimum_fps")]
    pub minimum_fps: u32,

    #[serde(default = "defaults::any_addr")]
    pub telnet_addr: String,
    #[serde(default)]
    pub telnet_port: u16,

    #[serde(default = "defaults::any_addr")]
    pub http_addr: String,
    #[serde(default)]
    pub http_port: u16,

    #[serde(default)]
    pub https_port: u16,
    #[serde(default)]
    pub https_key: Option<PathBuf>,
    #[serde(default)]
    pub https_certificate: Option<PathBuf>,

    #[serde(default = "defaults::any_addr")]
    pub ssh_addr: String,
    #[serde(default)]
    pub ssh_port: u16,
    /// Directory containing `ssh_host_rsa_key`.
    #[serde(default)]
    pub ssh_keys: Option<PathBuf>,

    pub exec_command: String,
    #[serde(default)]
    pub directory: Option<String>,
    /// Seconds between child restarts; negative disables restarting.
    #[serde(default = "defaults::restart_interval")]
    pub restart_interval: i64,
    #[serde(default = "defaults::yes")]
    pub stderr_to_stdout: bool,

    #[serde(default)]
    pub local_output: bool,
    #[serde(default)]
    pub fork: bool,

    #[serde(default)]
    pub dumb_telnet: bool,
    #[serde(default)]
    pub telnet_workarounds: bool,
    #[serde(default)]
    pub ignore_keypresses: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_file")]
    pub file: PathBuf,
    #[serde(default = "defaults::log_level")]
    pub loglevel_files: String,
    #[serde(default = "defaults::log_level")]
    pub loglevel_screen: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: defaults::log_file(),
            loglevel_files: defaults::log_level(),
            loglevel_screen: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn font_height() -> usize { 16 }
    pub fn width() -> usize { 80 }
    pub fn height() -> usize { 25 }
    pub fn compression_level() -> u8 { 75 }
    pub fn minimum_fps() -> u32 { 2 }
    pub fn any_addr() -> String { "0.0.0.0".to_string() }
    pub fn restart_interval() -> i64 { -1 }
    pub fn yes() -> bool { true }
    pub fn log_file() -> PathBuf { PathBuf::from("termcam.log") }
    pub fn log_level() -> String { "warning".to_string() }
}

impl Config {
    pub fn load(path: &std::path::Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(
                "width and height must be at least 1".to_string(),
            ));
        }
        if self.width > u16::MAX as usize || self.height > u16::MAX as usize {
            return Err(ConfigError::Invalid(
                "width and height must fit a pty (u16)".to_string(),
            ));
        }
        if self.compression_level > 100 {
            return Err(ConfigError::Invalid(
                "compression-level is a percentage (0..=100)".to_string(),
            ));
        }
        if self.font_height == 0 {
            return Err(ConfigError::Invalid(
                "font-height must be at least 1".to_string(),
            ));
        }
        if self.font_files.is_empty() {
            return Err(ConfigError::Invalid(
                "font-files must list at least one font".to_string(),
            ));
        }
        if self.exec_command.split_whitespace().next().is_none() {
            return Err(ConfigError::Invalid(
                "exec-command must name a program".to_string(),
            ));
        }
        if self.https_port != 0
            && (self.https_key.is_none() || self.https_certificate.is_none())
        {
            return Err(ConfigError::Invalid(
                "https-port requires https-key and https-certificate".to_string(),
            ));
        }
        if self.ssh_port != 0 && self.ssh_keys.is_none() {
            return Err(ConfigError::Invalid(
                "ssh-port requires ssh-keys".to_string(),
            ));
        }
        for level in [&self.logging.loglevel_files, &self.logging.loglevel_screen] {
            if parse_log_level(level).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "\"{level}\" is not a log level (debug|info|warning|error)"
                )));
            }
        }
        Ok(())
    }

    /// The render deadline derived from `minimum-fps`; `None` when 0.
    #[must_use]
    pub fn max_wait(&self) -> Option<Duration> {
        (self.minimum_fps > 0)
            .then(|| Duration::from_millis(u64::from(1000 / self.minimum_fps.max(1))))
    }
}

/// `debug|info|warning|error` to a tracing level filter.
#[must_use]
pub fn parse_log_level(name: &str) -> Option<tracing::level_filters::LevelFilter> {
    use tracing::level_filters::LevelFilter;
    match name {
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warning" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_str(yaml: &str) -> Result<Config, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        Config::load(file.path())
    }

    const FULL: &str = r#"
font-files:
  - /usr/share/fonts/truetype/unifont/unifont.ttf
font-height: 14
width: 132
height: 43
compression-level: 40
minimum-fps: 5
telnet-addr: 127.0.0.1
telnet-port: 2300
http-addr: 0.0.0.0
http-port: 8080
https-port: 0
ssh-addr: 0.0.0.0
ssh-port: 0
exec-command: /usr/bin/irssi -c irc.example.net
directory: /tmp
restart-interval: 5
stderr-to-stdout: true
local-output: false
fork: false
dumb-telnet: false
telnet-workarounds: true
ignore-keypresses: false
logging:
  file: /var/log/termcam.log
  loglevel-files: info
  loglevel-screen: error
"#;

    #[test]
    fn full_document_parses() {
        let config = load_str(FULL).unwrap();
        assert_eq!(config.width, 132);
        assert_eq!(config.height, 43);
        assert_eq!(config.compression_level, 40);
        assert_eq!(config.telnet_port, 2300);
        assert_eq!(config.exec_command, "/usr/bin/irssi -c irc.example.net");
        assert_eq!(config.restart_interval, 5);
        assert!(config.telnet_workarounds);
        assert_eq!(config.logging.loglevel_files, "info");
        assert_eq!(config.max_wait(), Some(Duration::from_millis(200)));
    }

    #[test]
    fn minimal_document_gets_defaults() {
        let config = load_str(
            "font-files: [a.ttf]\nexec-command: /bin/cat\n",
        )
        .unwrap();
        assert_eq!(config.width, 80);
        assert_eq!(config.height, 25);
        assert_eq!(config.font_height, 16);
        assert_eq!(config.telnet_port, 0);
        assert_eq!(config.restart_interval, -1);
        assert!(config.stderr_to_stdout);
        assert_eq!(config.logging.loglevel_screen, "warning");
    }

    #[test]
    fn zero_fps_disables_max_wait() {
        let config =
            load_str("font-files: [a.ttf]\nexec-command: /bin/cat\nminimum-fps: 0\n")
                .unwrap();
        assert_eq!(config.max_wait(), None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_str(
            "font-files: [a.ttf]\nexec-command: /bin/cat\nfrobnicate: yes\n",
        );
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn https_needs_key_and_certificate() {
        let result = load_str(
            "font-files: [a.ttf]\nexec-command: /bin/cat\nhttps-port: 8443\n",
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn ssh_needs_key_directory() {
        let result = load_str(
            "font-files: [a.ttf]\nexec-command: /bin/cat\nssh-port: 2222\n",
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let result = load_str(
            "font-files: [a.ttf]\nexec-command: /bin/cat\nlogging: {loglevel-screen: loud}\n",
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn bad_compression_is_rejected() {
        let result = load_str(
            "font-files: [a.ttf]\nexec-command: /bin/cat\ncompression-level: 150\n",
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = Config::load(std::path::Path::new("/no/such/config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn log_level_names() {
        assert!(parse_log_level("debug").is_some());
        assert!(parse_log_level("warning").is_some());
        assert!(parse_log_level("verbose").is_none());
    }
}
