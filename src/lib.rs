pub mod actor;
pub mod common;
pub mod layout_engine;
pub mod model;
pub mod server;
pub mod sys;
