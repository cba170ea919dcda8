//! Data transfer objects shared by the service, store, engine and HTTP API.

mod market;
mod order;
mod portfolio;
mod response;
mod settings;
mod strategy;

pub use market::*;
pub use order::*;
pub use portfolio::*;
pub use response::*;
pub use settings::*;
pub use strategy::*;
