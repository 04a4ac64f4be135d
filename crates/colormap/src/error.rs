use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("RGBA buffer holds {actual} bytes, expected {expected} for {cols}x{rows}")]
    BufferSize {
        expected: usize,
        actual: usize,
        cols: usize,
        rows: usize,
    },

    #[error("Image of {cols}x{rows} exceeds the encoder's size limit")]
    TooLarge { cols: usize, rows: usize },

    #[error(transparent)]
    Core(#[from] rubblescan_core::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
