use common::database::Ulid;
use common::dataloader::{Cache, HashMapCache, Loader, SharedCache};

pub mod message;
pub mod room;
pub mod room_member;
pub mod session;
pub mod user;

use self::message::{MessageCountByRoomLoader, MessagesByRoomLoader};
use self::room::{RoomByIdLoader, RoomsByUserLoader};
use self::room_member::RoomMembersByRoomLoader;
use self::session::SessionByIdLoader;
use self::user::UserByIdLoader;

pub type RequestCache<L> = SharedCache<HashMapCache<L>>;

/// Loader results remembered for the lifetime of a single request.
#[derive(Default, Clone)]
pub struct LoaderCaches {
	pub user_by_id: RequestCache<UserByIdLoader>,
	pub session_by_id: RequestCache<SessionByIdLoader>,
	pub room_by_id: RequestCache<RoomByIdLoader>,
	pub rooms_by_user: RequestCache<RoomsByUserLoader>,
	pub room_members_by_room: RequestCache<RoomMembersByRoomLoader>,
	pub messages_by_room: RequestCache<MessagesByRoomLoader>,
	pub message_count_by_room: RequestCache<MessageCountByRoomLoader>,
}

fn evict<L: Loader>(cache: &RequestCache<L>, key: &L::Key) {
	let mut cache = cache;
	Cache::<L>::delete(&mut cache, key);
}

impl LoaderCaches {
	/// Forgets everything derived from the membership of `user_id` in `room_id`.
	pub fn membership_changed(&self, room_id: Ulid, user_id: Ulid) {
		evict(&self.room_members_by_room, &room_id);
		evict(&self.rooms_by_user, &user_id);
	}

	/// Forgets everything derived from the messages of `room_id`.
	pub fn message_added(&self, room_id: Ulid) {
		evict(&self.messages_by_room, &room_id);
		evict(&self.message_count_by_room, &room_id);
		evict(&self.room_by_id, &room_id);
	}

	pub fn session_removed(&self, session_id: Ulid) {
		evict(&self.session_by_id, &session_id);
	}
}
