use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_graphql::SDLExportOptions;
use common::context::Context;
use common::dataloader::DataLoader;
use common::{logging, signal};
use tokio::signal::unix::SignalKind;
use tokio::{select, time};

use crate::config::{ApiConfig, AppConfig, DatabaseConfig, JwtConfig};
use crate::dataloader::message::{MessageCountByRoomLoader, MessagesByRoomLoader};
use crate::dataloader::room::{RoomByIdLoader, RoomsByUserLoader};
use crate::dataloader::room_member::RoomMembersByRoomLoader;
use crate::dataloader::session::SessionByIdLoader;
use crate::dataloader::user::UserByIdLoader;
use crate::subscription::SubscriptionManager;

mod api;
mod config;
mod database;
mod dataloader;
mod global;
mod subscription;


pub struct GlobalState {
	config: AppConfig,
	db: sqlx::SqlitePool,
	ctx: Context,

	user_by_id_loader: DataLoader<UserByIdLoader>,
	session_by_id_loader: DataLoader<SessionByIdLoader>,
	room_by_id_loader: DataLoader<RoomByIdLoader>,
	rooms_by_user_loader: DataLoader<RoomsByUserLoader>,
	room_members_by_room_loader: DataLoader<RoomMembersByRoomLoader>,
	messages_by_room_loader: DataLoader<MessagesByRoomLoader>,
	message_count_by_room_loader: DataLoader<MessageCountByRoomLoader>,

	subscription_manager: SubscriptionManager,
}

impl GlobalState {
	pub fn new(config: AppConfig, db: sqlx::SqlitePool, ctx: Context) -> Self {
		Self {
			user_by_id_loader: UserByIdLoader::new(db.clone()),
			session_by_id_loader: SessionByIdLoader::new(db.clone()),
			room_by_id_loader: RoomByIdLoader::new(db.clone()),
			rooms_by_user_loader: RoomsByUserLoader::new(db.clone()),
			room_members_by_room_loader: RoomMembersByRoomLoader::new(db.clone()),
			messages_by_room_loader: MessagesByRoomLoader::new(db.clone()),
			message_count_by_room_loader: MessageCountByRoomLoader::new(db.clone()),
			subscription_manager: SubscriptionManager::default(),
			config,
			db,
			ctx,
		}
	}
}

impl common::global::GlobalCtx for GlobalState {
	fn ctx(&self) -> &Context {
		&self.ctx
	}
}

impl common::global::GlobalConfigProvider<AppConfig> for GlobalState {
	fn provide_config(&self) -> &AppConfig {
		&self.config
	}
}

impl common::global::GlobalConfigProvider<ApiConfig> for GlobalState {
	fn provide_config(&self) -> &ApiConfig {
		&self.config.api
	}
}

impl common::global::GlobalConfigProvider<JwtConfig> for GlobalState {
	fn provide_config(&self) -> &JwtConfig {
		&self.config.jwt
	}
}

impl common::global::GlobalConfigProvider<DatabaseConfig> for GlobalState {
	fn provide_config(&self) -> &DatabaseConfig {
		&self.config.database
	}
}

impl common::global::GlobalDb for GlobalState {
	fn db(&self) -> &sqlx::SqlitePool {
		&self.db
	}
}

impl common::global::GlobalConfig for GlobalState {}

impl global::ApiState for GlobalState {
	fn user_by_id_loader(&self) -> &DataLoader<UserByIdLoader> {
		&self.user_by_id_loader
	}

	fn session_by_id_loader(&self) -> &DataLoader<SessionByIdLoader> {
		&self.session_by_id_loader
	}

	fn room_by_id_loader(&self) -> &DataLoader<RoomByIdLoader> {
		&self.room_by_id_loader
	}

	fn rooms_by_user_loader(&self) -> &DataLoader<RoomsByUserLoader> {
		&self.rooms_by_user_loader
	}

	fn room_members_by_room_loader(&self) -> &DataLoader<RoomMembersByRoomLoader> {
		&self.room_members_by_room_loader
	}

	fn messages_by_room_loader(&self) -> &DataLoader<MessagesByRoomLoader> {
		&self.messages_by_room_loader
	}

	fn message_count_by_room_loader(&self) -> &DataLoader<MessageCountByRoomLoader> {
		&self.message_count_by_room_loader
	}

	fn subscription_manager(&self) -> &SubscriptionManager {
		&self.subscription_manager
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let config = AppConfig::parse()?;

	if config.export_gql {
		let schema = api::gql::schema::<GlobalState>();

		println!(
			"{}",
			schema.sdl_with_options(
				SDLExportOptions::default()
					.include_specified_by()
					.sorted_arguments()
					.sorted_enum_items()
					.sorted_fields()
			)
		);

		return Ok(());
	}

	logging::init(&config.logging.level, config.logging.mode)?;

	if let Some(file) = &config.config_file {
		tracing::info!(file = %file, "loaded config from file");
	}

	tracing::debug!("config: {:#?}", config);

	let db = database::connect(&config.database).await?;

	let (ctx, handler) = Context::new();

	let global = Arc::new(GlobalState::new(config, db, ctx));

	let api_future = tokio::spawn(api::run(global.clone()));

	// Listen on both sigint and sigterm and cancel the context when either is received
	let mut signal_handler = signal::SignalHandler::new()
		.with_signal(SignalKind::interrupt())?
		.with_signal(SignalKind::terminate())?;

	select! {
		r = api_future => tracing::error!("api stopped unexpectedly: {:?}", r),
		r = global.subscription_manager.run(global.ctx.clone()) => tracing::error!("subscription manager stopped unexpectedly: {:?}", r),
		_ = signal_handler.recv() => tracing::info!("shutting down"),
	}

	// We cannot have a context in scope when we cancel the handler, otherwise it will deadlock.
	drop(global);

	tracing::info!("waiting for tasks to finish");

	select! {
		_ = time::sleep(Duration::from_secs(60)) => tracing::warn!("force shutting down"),
		_ = signal_handler.recv() => tracing::warn!("force shutting down"),
		_ = handler.cancel() => tracing::info!("shutting down"),
	}

	Ok(())
}
