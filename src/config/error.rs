use std::path::PathBuf;

pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to build the 'Enviroment' from the provided string.")]
    StringToEnvironmentFail,
    #[error("config file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("Missing {service} env vars ({missing})")]
    MissingSettings {
        service: &'static str,
        missing: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("figment extraction error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(Box::new(value))
    }
}
