pub mod date;
pub mod id;
pub mod inputs;
pub mod message;
pub mod responses;
pub mod room;
pub mod room_member;
pub mod user;
