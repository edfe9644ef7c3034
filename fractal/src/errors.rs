use crate::config::ConfigError;
use crate::dao::DaoError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("json error")]
    Json(#[from] serde_json::Error),

    #[error("failed to set up the dao")]
    Dao(#[from] DaoError),

    #[error("step {index} failed")]
    Step {
        index: usize,
        #[source]
        source: DaoError,
    },

    #[error("no command given, see `fractal --help`")]
    MissingCommand,

    #[error("tracing parse error")]
    TracingParse(#[from] tracing_subscriber::filter::ParseError),

    #[error("error setting tracing global subscriber")]
    TracingSetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}
