use common::dataloader::DataLoader;

use crate::config::{ApiConfig, JwtConfig};
use crate::dataloader::message::{MessageCountByRoomLoader, MessagesByRoomLoader};
use crate::dataloader::room::{RoomByIdLoader, RoomsByUserLoader};
use crate::dataloader::room_member::RoomMembersByRoomLoader;
use crate::dataloader::session::SessionByIdLoader;
use crate::dataloader::user::UserByIdLoader;
use crate::subscription::SubscriptionManager;

pub trait ApiState {
	fn user_by_id_loader(&self) -> &DataLoader<UserByIdLoader>;
	fn session_by_id_loader(&self) -> &DataLoader<SessionByIdLoader>;
	fn room_by_id_loader(&self) -> &DataLoader<RoomByIdLoader>;
	fn rooms_by_user_loader(&self) -> &DataLoader<RoomsByUserLoader>;
	fn room_members_by_room_loader(&self) -> &DataLoader<RoomMembersByRoomLoader>;
	fn messages_by_room_loader(&self) -> &DataLoader<MessagesByRoomLoader>;
	fn message_count_by_room_loader(&self) -> &DataLoader<MessageCountByRoomLoader>;

	fn subscription_manager(&self) -> &SubscriptionManager;
}

pub trait ApiGlobal:
	common::global::GlobalCtx
	+ common::global::GlobalConfigProvider<ApiConfig>
	+ common::global::GlobalConfigProvider<JwtConfig>
	+ common::global::GlobalDb
	+ common::global::GlobalConfig
	+ ApiState
	+ Send
	+ Sync
	+ 'static
{
}

impl<T> ApiGlobal for T where
	T: common::global::GlobalCtx
		+ common::global::GlobalConfigProvider<ApiConfig>
		+ common::global::GlobalConfigProvider<JwtConfig>
		+ common::global::GlobalDb
		+ common::global::GlobalConfig
		+ ApiState
		+ Send
		+ Sync
		+ 'static
{
}
