pub type CubeMovieResult<T> = Result<T, CubeMovieError>;

#[derive(thiserror::Error, Debug)]
pub enum CubeMovieError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("input error: {0}")]
    Input(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CubeMovieError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CubeMovieError::config("x")
                .to_string()
                .contains("configuration error:")
        );
        assert!(
            CubeMovieError::input("x")
                .to_string()
                .contains("input error:")
        );
        assert!(
            CubeMovieError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            CubeMovieError::encode("x")
                .to_string()
                .contains("encode error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = CubeMovieError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
