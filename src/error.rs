use crate::{clients, config};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("vendor client error: {0}")]
    Client(#[from] clients::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
