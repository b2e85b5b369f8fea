pub mod assist;
pub mod autoname;
pub mod change;
pub mod config;
pub mod debounce;
pub mod driver;
pub mod effect;
pub mod http;
pub mod merge;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod status;
pub mod store;
pub mod token;

pub use config::{ClientConfig, SessionConfig};
pub use driver::SessionDriver;
pub use effect::{Notice, SaveTrigger};
pub use session::NoteSession;
pub use status::SessionStatus;
pub use token::AuthToken;
