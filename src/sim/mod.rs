pub mod animation;
pub mod save;
pub mod session;
pub mod state;
