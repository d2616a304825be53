#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]

pub mod config;
pub mod dev;
pub mod error;
pub mod js;
pub mod sfc;
pub mod version;

pub use config::DevConfig;
pub use dev::{DevServer, ModuleResponse, Request, Route};
pub use error::Error;
pub use version::VERSION;
