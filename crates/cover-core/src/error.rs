use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(String),

    #[error("Empty frame: {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },

    #[error("Invalid color '{0}': expected #rrggbb")]
    InvalidColor(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl From<image::ImageError> for CoverError {
    fn from(e: image::ImageError) -> Self {
        CoverError::Image(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoverError>;
