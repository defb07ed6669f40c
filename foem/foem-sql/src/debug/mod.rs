mod log;
mod messages;

pub use self::log::*;
pub use messages::MessageLogger;
