use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A record is missing a required field or carries an invalid value.
    #[error("schema error{}: {message}", fmt_index(.index))]
    Schema {
        index: Option<usize>,
        message: String,
    },

    /// A series name encodes a batch-size suffix that cannot be parsed.
    #[error("cannot parse series name `{name}` (record {index}): {message}")]
    Parse {
        index: usize,
        name: String,
        message: String,
    },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn schema(index: Option<usize>, message: impl Into<String>) -> Self {
        Self::Schema {
            index,
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn fmt_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" (record {i})"),
        None => String::new(),
    }
}
