pub mod command;
pub mod drag;
pub mod system;
pub mod window;
