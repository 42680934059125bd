use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Required setting missing: {name} not set")]
    MissingSetting { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;
