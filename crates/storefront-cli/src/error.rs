use std::path::PathBuf;

use storefront_workflows::WorkflowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read fixture '{path}'")]
    FixtureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture '{path}'")]
    FixtureParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load configuration")]
    Config(#[source] WorkflowError),

    #[error("failed to read store state")]
    Store(#[from] WorkflowError),

    #[error("failed to start async runtime")]
    Runtime(#[source] std::io::Error),

    #[error("failed to render output")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use storefront_workflows::WorkflowError;

    use super::CliError;

    #[test]
    fn fixture_read_error_includes_path() {
        let err = CliError::FixtureRead {
            path: PathBuf::from("/fixtures/seed.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };

        assert!(err.to_string().contains("/fixtures/seed.json"));
    }

    #[test]
    fn fixture_read_error_exposes_io_source() {
        let err = CliError::FixtureRead {
            path: PathBuf::from("seed.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };

        let source = std::error::Error::source(&err).map(ToString::to_string);

        assert_eq!(source.as_deref(), Some("missing"));
    }

    #[test]
    fn workflow_error_converts_to_store_error() {
        let err: CliError = WorkflowError::Storage("lock poisoned".to_string()).into();

        assert!(matches!(err, CliError::Store(_)));
    }

    #[test]
    fn serde_error_converts_to_output_error() {
        let json_err = serde_json::from_str::<u32>("nope").expect_err("invalid json");

        let err: CliError = json_err.into();

        assert!(matches!(err, CliError::Output(_)));
    }
}
