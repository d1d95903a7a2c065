//! Layered configuration loading.
//!
//! A config type only needs `Default + Serialize + Deserialize`. Its default
//! value is serialized into a tree which then decides which environment
//! variables and command line flags exist, and how their text is typed.
//! Sources are merged in this order, later ones winning:
//!
//! 1. `C::default()`
//! 2. the config file (`.toml`, `.yaml`/`.yml` or `.json`)
//! 3. environment variables, `CHAT_API_BIND_ADDRESS` for `api.bind_address`
//! 4. command line flags, `--api.bind-address` for `api.bind_address`

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;

use clap::{Arg, ArgAction, Command};
use convert_case::{Case, Casing};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::logging;

pub const ENV_PREFIX: &str = "CHAT";

const CONFIG_FILE_KEY: &str = "config_file";
const FILE_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// The log level to use, this is a tracing env filter
	pub level: String,

	/// What logging mode we should use
	pub mode: logging::Mode,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			mode: logging::Mode::Default,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config file: {0}")]
	Io(#[from] std::io::Error),
	#[error("failed to parse toml: {0}")]
	Toml(#[from] toml::de::Error),
	#[error("failed to parse yaml: {0}")]
	Yaml(#[from] serde_yaml::Error),
	#[error("failed to parse json: {0}")]
	Json(#[from] serde_json::Error),
	#[error("unsupported config file format: {0}")]
	UnsupportedFormat(String),
	#[error("config file not found: {0}")]
	NotFound(String),
	#[error("{0}")]
	Cli(#[from] clap::Error),
	#[error("invalid value for {key}: {reason}")]
	InvalidValue { key: String, reason: String },
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Loads `C` from the process environment, and from the process arguments
/// when `enable_cli` is set. `config_file` is the file to try when neither the
/// environment nor the command line name one; unlike a named file it may be
/// missing. Returns the config together with the canonical path of the file
/// that was loaded, if any.
pub fn parse<C>(enable_cli: bool, config_file: Option<String>) -> Result<(C, Option<String>)>
where
	C: Serialize + DeserializeOwned + Default,
{
	let args = enable_cli.then(|| std::env::args_os().collect());

	match parse_from(args, std::env::vars().collect(), config_file) {
		Err(ConfigError::Cli(err))
			if matches!(
				err.kind(),
				clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
			) =>
		{
			err.exit()
		}
		result => result,
	}
}

/// [`parse`] with explicit arguments and environment.
pub fn parse_from<C>(
	args: Option<Vec<OsString>>,
	env: HashMap<String, String>,
	config_file: Option<String>,
) -> Result<(C, Option<String>)>
where
	C: Serialize + DeserializeOwned + Default,
{
	let mut value = serde_json::to_value(C::default())?;

	let mut leaves = Vec::new();
	collect_leaves(&value, &mut Vec::new(), &mut leaves);

	let cli = args.map(|args| cli_overrides(&leaves, args)).transpose()?;
	let env = env_overrides(&leaves, &env)?;

	let named_file = cli
		.iter()
		.chain(std::iter::once(&env))
		.find_map(|overrides| overrides.get(CONFIG_FILE_KEY).and_then(Value::as_str))
		.map(str::to_owned);

	let mut loaded_from = None;
	if let Some(path) = named_file.clone().or(config_file) {
		match resolve_file(&path) {
			Some(file) => {
				merge(&mut value, load_file(&file)?);
				loaded_from = Some(std::fs::canonicalize(&file)?.display().to_string());
			}
			None if named_file.is_some() => return Err(ConfigError::NotFound(path)),
			None => tracing::debug!(path, "no config file found, skipping"),
		}
	}

	merge(&mut value, env);
	if let Some(cli) = cli {
		merge(&mut value, cli);
	}

	Ok((serde_json::from_value(value)?, loaded_from))
}

/// A settable key: its path in the tree and its default value.
type Leaf = (Vec<String>, Value);

fn collect_leaves(value: &Value, path: &mut Vec<String>, out: &mut Vec<Leaf>) {
	match value {
		Value::Object(map) if !map.is_empty() => {
			for (key, value) in map {
				path.push(key.clone());
				collect_leaves(value, path, out);
				path.pop();
			}
		}
		_ => out.push((path.clone(), value.clone())),
	}
}

fn env_key(path: &[String]) -> String {
	std::iter::once(ENV_PREFIX.to_owned())
		.chain(path.iter().map(|segment| segment.to_uppercase()))
		.collect::<Vec<_>>()
		.join("_")
}

fn cli_flag(path: &[String]) -> String {
	path.iter()
		.map(|segment| segment.to_case(Case::Kebab))
		.collect::<Vec<_>>()
		.join(".")
}

fn env_overrides(leaves: &[Leaf], env: &HashMap<String, String>) -> Result<Value> {
	let mut overrides = Value::Object(Map::new());

	for (path, default) in leaves {
		let key = env_key(path);
		if let Some(raw) = env.get(&key) {
			set_path(&mut overrides, path, coerce(&key, raw, default)?);
		}
	}

	Ok(overrides)
}

fn cli_overrides(leaves: &[Leaf], args: Vec<OsString>) -> Result<Value> {
	let name = args
		.first()
		.and_then(|arg| Path::new(arg).file_name())
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_else(|| "app".to_owned());

	let command = leaves.iter().fold(Command::new(name), |command, (path, default)| {
		let flag = cli_flag(path);
		let arg = Arg::new(flag.clone())
			.long(flag)
			.action(ArgAction::Set)
			.help(format!("default: {default}"));

		command.arg(match default {
			Value::Bool(_) => arg.num_args(0..=1).default_missing_value("true"),
			_ => arg,
		})
	});

	let matches = command.try_get_matches_from(args)?;

	let mut overrides = Value::Object(Map::new());
	for (path, default) in leaves {
		let flag = cli_flag(path);
		if let Some(raw) = matches.get_one::<String>(&flag) {
			set_path(&mut overrides, path, coerce(&flag, raw, default)?);
		}
	}

	Ok(overrides)
}

/// Types raw text using the default value of the key as a template.
fn coerce(key: &str, raw: &str, template: &Value) -> Result<Value> {
	let invalid = |reason: String| ConfigError::InvalidValue {
		key: key.to_owned(),
		reason,
	};

	let raw = raw.trim();
	let looks_like_json = raw.starts_with('{') || raw.starts_with('[');

	match template {
		Value::Bool(_) => raw.parse::<bool>().map(Value::Bool).map_err(|e| invalid(e.to_string())),
		Value::Number(_) => raw
			.parse::<serde_json::Number>()
			.map(Value::Number)
			.map_err(|e| invalid(e.to_string())),
		Value::Array(_) if !looks_like_json => Ok(Value::Array(
			raw.split(',')
				.map(str::trim)
				.filter(|item| !item.is_empty())
				.map(|item| Value::String(item.to_owned()))
				.collect(),
		)),
		Value::Array(_) | Value::Object(_) => serde_json::from_str(raw).map_err(|e| invalid(e.to_string())),
		Value::Null if looks_like_json => serde_json::from_str(raw).map_err(|e| invalid(e.to_string())),
		Value::String(_) | Value::Null => Ok(Value::String(raw.to_owned())),
	}
}

fn set_path(root: &mut Value, path: &[String], value: Value) {
	let Some((last, parents)) = path.split_last() else {
		*root = value;
		return;
	};

	let mut current = root;
	for segment in parents {
		if !current.is_object() {
			*current = Value::Object(Map::new());
		}

		let Value::Object(map) = current else {
			return;
		};
		current = map.entry(segment.clone()).or_insert_with(|| Value::Object(Map::new()));
	}

	if !current.is_object() {
		*current = Value::Object(Map::new());
	}

	if let Value::Object(map) = current {
		map.insert(last.clone(), value);
	}
}

/// Deep merges `overlay` into `base`. Objects merge key by key, anything else
/// replaces the base value.
fn merge(base: &mut Value, overlay: Value) {
	match (base, overlay) {
		(_, Value::Null) => {}
		(Value::Object(base), Value::Object(overlay)) => {
			for (key, value) in overlay {
				match base.get_mut(&key) {
					Some(existing) if existing.is_object() && value.is_object() => merge(existing, value),
					_ => {
						base.insert(key, value);
					}
				}
			}
		}
		(base, overlay) => *base = overlay,
	}
}

fn resolve_file(path: &str) -> Option<String> {
	if Path::new(path).is_file() {
		return Some(path.to_owned());
	}

	FILE_EXTENSIONS
		.iter()
		.map(|ext| format!("{path}.{ext}"))
		.find(|candidate| Path::new(candidate).is_file())
}

fn load_file(path: &str) -> Result<Value> {
	let content = std::fs::read_to_string(path)?;

	let extension = Path::new(path)
		.extension()
		.and_then(|ext| ext.to_str())
		.unwrap_or_default()
		.to_lowercase();

	Ok(match extension.as_str() {
		"toml" => toml::from_str(&content)?,
		"yaml" | "yml" => serde_yaml::from_str(&content)?,
		"json" => serde_json::from_str(&content)?,
		_ => return Err(ConfigError::UnsupportedFormat(path.to_owned())),
	})
}
