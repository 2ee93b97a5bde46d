//! Configuration for the key capture loop
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (~/.config/keypress/config.toml, or --config PATH)
//! 3. Environment variables (KEYPRESS_* prefix)
//! 4. CLI flags (highest priority)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{KeypressError, Result};
use crate::logging::*;

pub const ENV_EXIT_KEY: &str = "KEYPRESS_EXIT_KEY";
pub const ENV_POLL_TIMEOUT_MS: &str = "KEYPRESS_POLL_TIMEOUT_MS";

/// Upper bound for the per-poll wait; interrupts are only noticed between polls
pub const MAX_POLL_TIMEOUT_MS: u64 = 5_000;

/// A single non-printable control byte that ends the key loop.
///
/// Written as `esc`, `del`, caret notation (`^D`) or hex (`0x04`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExitKey(u8);

impl ExitKey {
	pub const ESCAPE: ExitKey = ExitKey(0x1b);

	pub fn new(byte: u8) -> Result<Self> {
		if byte < 0x20 || byte == 0x7f {
			Ok(ExitKey(byte))
		} else {
			Err(KeypressError::InvalidConfig {
				message: format!("exit key 0x{:02x} is not a control character", byte),
			})
		}
	}

	pub fn byte(self) -> u8 {
		self.0
	}

	/// True for keys the terminal turns into signals by default in cbreak mode
	pub fn is_signal_key(self) -> bool {
		// ^C, ^\ and ^Z
		matches!(self.0, 0x03 | 0x1c | 0x1a)
	}
}

impl Default for ExitKey {
	fn default() -> Self {
		ExitKey::ESCAPE
	}
}

impl fmt::Display for ExitKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0 {
			0x1b => write!(f, "esc"),
			0x7f => write!(f, "del"),
			b => write!(f, "^{}", (b | 0x40) as char),
		}
	}
}

impl FromStr for ExitKey {
	type Err = KeypressError;

	fn from_str(s: &str) -> Result<Self> {
		let invalid = || KeypressError::InvalidConfig { message: format!("unrecognized exit key {:?}", s) };
		let s = s.trim();
		let lower = s.to_ascii_lowercase();

		let byte = match lower.as_str() {
			"esc" | "escape" => 0x1b,
			"del" | "delete" | "^?" => 0x7f,
			_ if lower.starts_with("0x") => u8::from_str_radix(&lower[2..], 16).map_err(|_| invalid())?,
			_ => {
				let bytes = s.as_bytes();
				if bytes.len() != 2 || bytes[0] != b'^' {
					return Err(invalid());
				}
				match bytes[1].to_ascii_uppercase() {
					c @ b'@'..=b'_' => c ^ 0x40,
					_ => return Err(invalid()),
				}
			}
		};
		ExitKey::new(byte)
	}
}

impl TryFrom<String> for ExitKey {
	type Error = KeypressError;

	fn try_from(s: String) -> Result<Self> {
		s.parse()
	}
}

impl From<ExitKey> for String {
	fn from(key: ExitKey) -> String {
		key.to_string()
	}
}

/// Settings for [`crate::event_loop::KeyEventLoop`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Key that terminates the loop
	pub exit_key: ExitKey,

	/// Readiness wait per poll; 0 polls without waiting
	pub poll_timeout_ms: u64,
}

impl Default for Config {
	fn default() -> Self {
		Config { exit_key: ExitKey::ESCAPE, poll_timeout_ms: 0 }
	}
}

impl Config {
	/// `$XDG_CONFIG_HOME/keypress/config.toml`, falling back to `~/.config`
	pub fn default_path() -> Option<PathBuf> {
		let base = match std::env::var_os("XDG_CONFIG_HOME") {
			Some(dir) if !dir.is_empty() => PathBuf::from(dir),
			_ => PathBuf::from(std::env::var_os("HOME")?).join(".config"),
		};
		Some(base.join("keypress").join("config.toml"))
	}

	pub fn from_toml_str(content: &str) -> Result<Self> {
		toml::from_str(content).map_err(|e| KeypressError::InvalidConfig { message: e.to_string() })
	}

	pub fn load_file(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)?;
		let config = Config::from_toml_str(&content).map_err(|e| match e {
			KeypressError::InvalidConfig { message } => {
				KeypressError::InvalidConfig { message: format!("{}: {}", path.display(), message) }
			}
			other => other,
		})?;
		debug!("Loaded config from {}", path.display());
		Ok(config)
	}

	/// Defaults overlaid with the config file.
	///
	/// An explicit path must exist; the default path is optional.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		match explicit {
			Some(path) => Config::load_file(path),
			None => match Config::default_path() {
				Some(path) if path.is_file() => Config::load_file(&path),
				_ => Ok(Config::default()),
			},
		}
	}

	/// Apply `KEYPRESS_*` overrides from the process environment.
	pub fn apply_env(&mut self) -> Result<()> {
		self.apply_env_from(|name| std::env::var(name).ok())
	}

	pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(value) = lookup(ENV_EXIT_KEY) {
			self.exit_key = value.parse()?;
		}
		if let Some(value) = lookup(ENV_POLL_TIMEOUT_MS) {
			self.poll_timeout_ms = parse_timeout_ms(&value)?;
		}
		Ok(())
	}

	pub fn poll_timeout(&self) -> Duration {
		Duration::from_millis(self.poll_timeout_ms)
	}

	pub fn validate(&self) -> Result<()> {
		if self.poll_timeout_ms > MAX_POLL_TIMEOUT_MS {
			return Err(KeypressError::InvalidConfig {
				message: format!(
					"poll timeout {}ms exceeds the maximum of {}ms",
					self.poll_timeout_ms, MAX_POLL_TIMEOUT_MS
				),
			});
		}
		if self.exit_key.is_signal_key() {
			warn!("Exit key {} is normally turned into a signal by the terminal", self.exit_key);
		}
		Ok(())
	}
}

pub fn parse_timeout_ms(value: &str) -> Result<u64> {
	value
		.trim()
		.parse()
		.map_err(|_| KeypressError::InvalidConfig { message: format!("invalid poll timeout {:?}", value) })
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn test_config_default() {
		let config = Config::default();
		assert_eq!(config.exit_key.byte(), 0x1b);
		assert_eq!(config.poll_timeout(), Duration::ZERO);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_exit_key_notations() {
		assert_eq!("esc".parse::<ExitKey>().unwrap().byte(), 0x1b);
		assert_eq!("Escape".parse::<ExitKey>().unwrap().byte(), 0x1b);
		assert_eq!("^D".parse::<ExitKey>().unwrap().byte(), 0x04);
		assert_eq!("^d".parse::<ExitKey>().unwrap().byte(), 0x04);
		assert_eq!("^[".parse::<ExitKey>().unwrap().byte(), 0x1b);
		assert_eq!("^?".parse::<ExitKey>().unwrap().byte(), 0x7f);
		assert_eq!("0x07".parse::<ExitKey>().unwrap().byte(), 0x07);
	}

	#[test]
	fn test_exit_key_rejects_printable() {
		assert!("q".parse::<ExitKey>().is_err());
		assert!("0x41".parse::<ExitKey>().is_err());
		assert!("0xe9".parse::<ExitKey>().is_err());
		assert!("^1".parse::<ExitKey>().is_err());
		assert!(ExitKey::new(b' ').is_err());
	}

	#[test]
	fn test_exit_key_display_parses_back() {
		for key in [ExitKey::ESCAPE, ExitKey::new(0x04).unwrap(), ExitKey::new(0x7f).unwrap()] {
			assert_eq!(key.to_string().parse::<ExitKey>().unwrap(), key);
		}
		assert_eq!(ExitKey::new(0x04).unwrap().to_string(), "^D");
	}

	#[test]
	fn test_config_toml() {
		let config = Config::from_toml_str("exitKey = \"^D\"\npollTimeoutMs = 20\n").unwrap();
		assert_eq!(config.exit_key.byte(), 0x04);
		assert_eq!(config.poll_timeout_ms, 20);

		// Missing fields fall back to defaults
		let config = Config::from_toml_str("pollTimeoutMs = 5").unwrap();
		assert_eq!(config.exit_key, ExitKey::ESCAPE);

		assert!(Config::from_toml_str("exitKey = \"x\"").is_err());
	}

	#[test]
	fn test_env_overrides() {
		let env: HashMap<&str, &str> = [(ENV_EXIT_KEY, "0x04"), (ENV_POLL_TIMEOUT_MS, "15")].into_iter().collect();
		let mut config = Config::default();
		config.apply_env_from(|name| env.get(name).map(|v| v.to_string())).unwrap();
		assert_eq!(config.exit_key.byte(), 0x04);
		assert_eq!(config.poll_timeout_ms, 15);

		let mut config = Config::default();
		let result = config.apply_env_from(|name| (name == ENV_POLL_TIMEOUT_MS).then(|| "soon".to_string()));
		assert!(matches!(result, Err(KeypressError::InvalidConfig { .. })));
	}

	#[test]
	fn test_validate_timeout_bound() {
		let config = Config { poll_timeout_ms: MAX_POLL_TIMEOUT_MS + 1, ..Config::default() };
		assert!(config.validate().is_err());
	}
}

// vim: ts=4
