#[derive(thiserror::Error)]
pub enum Error {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("reply is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("de/serialize error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("yaml serialize error")]
    Yaml(#[from] serde_yaml::Error),
    #[error("environment variable {0} is not usable: {1}")]
    EnvVar(String, #[source] std::env::VarError),
    #[error("config file error")]
    ConfigFile(#[from] config_file::ConfigFileError),
    #[error("preset not found: {0}")]
    PresetNotFound(String),
    #[error("endpoint url not specified")]
    UrlNotSpecified,
    #[error("unable to render markdown: {0}")]
    Bat(#[from] bat::error::Error),
}

/// Writes `e` followed by its numbered chain of causes, one per line.
pub(crate) fn format_error(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter,
) -> std::fmt::Result {
    write!(f, "{e}")?;

    let causes = std::iter::successors(e.source(), |cause| cause.source());
    for (depth, cause) in causes.enumerate() {
        if depth == 0 {
            writeln!(f, "\ncaused by:")?;
        }
        writeln!(f, "{depth: >5}: {cause}")?;
    }

    Ok(())
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        format_error(self, f)
    }
}
