pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod invitation;
pub mod io;
pub mod note;
pub mod report;
pub mod session;
pub mod survey;
pub mod team;
pub mod token;

pub use error::{Result, RetroError};
