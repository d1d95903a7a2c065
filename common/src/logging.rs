use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

type ReloadHandle = Box<dyn Fn(&str) -> Result<(), LoggingError> + Sync + Send>;

static RELOAD_HANDLE: OnceCell<ReloadHandle> = OnceCell::new();

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
	#[default]
	Default,
	Json,
	Pretty,
	Compact,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
	#[error("invalid logging level: {0}")]
	InvalidLevel(#[from] tracing_subscriber::filter::ParseError),
	#[error("failed to init logger: {0}")]
	Init(#[from] tracing_subscriber::util::TryInitError),
	#[error("failed to reload logger: {0}")]
	Reload(#[from] tracing_subscriber::reload::Error),
}

macro_rules! install {
	($builder:expr) => {{
		let builder = $builder;
		let handle = builder.reload_handle();

		builder.finish().try_init()?;

		Box::new(move |level: &str| {
			handle.reload(EnvFilter::from_str(level)?)?;
			Ok(())
		}) as ReloadHandle
	}};
}

/// Installs the global subscriber on first use. Later calls only swap the
/// level filter, the output mode is fixed by the first call.
pub fn init(level: &str, mode: Mode) -> Result<(), LoggingError> {
	let reload = RELOAD_HANDLE.get_or_try_init(|| {
		let env_filter = EnvFilter::from_str(level)?;
		let fmt = tracing_subscriber::fmt().with_line_number(true).with_file(true);

		Ok::<_, LoggingError>(match mode {
			Mode::Default => install!(fmt.with_env_filter(env_filter).with_filter_reloading()),
			Mode::Json => install!(fmt.json().with_env_filter(env_filter).with_filter_reloading()),
			Mode::Pretty => install!(fmt.pretty().with_env_filter(env_filter).with_filter_reloading()),
			Mode::Compact => install!(fmt.compact().with_env_filter(env_filter).with_filter_reloading()),
		})
	})?;

	reload(level)
}
