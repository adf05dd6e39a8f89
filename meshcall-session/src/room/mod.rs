mod command;
mod roster;
mod session;
mod view;

pub use command::SessionCommand;
pub use roster::Roster;
pub use session::RoomSession;
pub use view::RoomView;
