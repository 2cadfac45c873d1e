/// Result alias that carries the custom [`PortfolioError`] type.
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A caller supplied a value outside the accepted domain.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A carousel needs at least one item to rotate through.
    #[error("carousel requires at least one item")]
    EmptyCarousel,
    /// TOML content or configuration could not be parsed.
    #[error("failed to parse TOML: {0}")]
    Config(#[from] toml::de::Error),
    /// JSON output could not be produced.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// A link target is neither an absolute URI nor an in-page anchor.
    #[error("invalid link `{href}`: {reason}")]
    InvalidLink { href: String, reason: String },
    /// Content references an asset that is not present in the store.
    #[error("unknown asset `{0}` referenced by content")]
    UnknownAsset(String),
    /// An index addressed past the end of a fixed collection.
    #[error("index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

impl PortfolioError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for PortfolioError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for PortfolioError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
