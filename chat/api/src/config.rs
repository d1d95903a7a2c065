use std::net::SocketAddr;

use anyhow::Result;
use common::config::LoggingConfig;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// The API is the backend for the chat service
pub struct AppConfig {
	/// The path to the config file
	pub config_file: Option<String>,

	/// Name of this instance
	pub name: String,

	/// If we should export the GraphQL schema, if set to true, the schema will
	/// be exported to the stdout, and the program will exit.
	pub export_gql: bool,

	/// The logging config
	pub logging: LoggingConfig,

	/// API Config
	pub api: ApiConfig,

	/// Database Config
	pub database: DatabaseConfig,

	/// JWT Config
	pub jwt: JwtConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ApiConfig {
	/// Bind address for the API
	pub bind_address: SocketAddr,

	/// Origins allowed to make credentialed cross origin requests
	pub cors_origins: Vec<String>,

	/// Mark the session cookie as `Secure`
	pub secure_cookies: bool,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			bind_address: SocketAddr::from(([0u16; 8], 4000)),
			cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
			secure_cookies: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
	/// The database URL to use
	pub uri: String,

	/// The maximum number of pooled connections
	pub max_connections: u32,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			uri: "sqlite://chat.db?mode=rwc".to_string(),
			max_connections: 10,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct JwtConfig {
	/// JWT secret
	pub secret: String,

	/// JWT issuer
	pub issuer: String,

	/// How long a session stays valid, in seconds
	pub session_duration: u64,
}

impl Default for JwtConfig {
	fn default() -> Self {
		Self {
			issuer: "chat".to_string(),
			secret: "chat".to_string(),
			session_duration: 60 * 60 * 24 * 7,
		}
	}
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			config_file: Some("config".to_string()),
			name: "chat-api".to_string(),
			export_gql: false,
			logging: LoggingConfig::default(),
			api: ApiConfig::default(),
			database: DatabaseConfig::default(),
			jwt: JwtConfig::default(),
		}
	}
}

impl AppConfig {
	pub fn parse() -> Result<Self> {
		let (mut config, config_file) = common::config::parse::<Self>(!cfg!(test), Self::default().config_file)?;

		config.config_file = config_file;

		Ok(config)
	}
}
