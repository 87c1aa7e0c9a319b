/// Data handed to the presentation layer together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub data: T,
    /// True when the remote could not be reached and `data` is the last
    /// cached state.
    pub offline: bool,
    /// Why the remote could not be used, when `offline` is set.
    pub message: Option<String>,
}

impl<T> Loaded<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            offline: false,
            message: None,
        }
    }

    pub fn cached(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            offline: true,
            message: Some(message.into()),
        }
    }
}
