mod futures;

pub use futures::{FutureContext, FutureTimeout};
