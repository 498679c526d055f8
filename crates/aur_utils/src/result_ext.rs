use crate::AnyResult;
use anyhow::anyhow;
use std::{error::Error, fmt::Display};

/// Attaches a human readable context message to a failure, turning it into an [`anyhow::Error`].
pub trait AnyhowResultExt<T> {
    fn otherwise(self, s: impl Display) -> AnyResult<T>;
}

impl<T, E: Error + Send + Sync + 'static> AnyhowResultExt<T> for Result<T, E> {
    fn otherwise(self, s: impl Display) -> AnyResult<T> {
        self.map_err(|e| anyhow::Error::from(e).context(s.to_string()))
    }
}

impl<T> AnyhowResultExt<T> for Option<T> {
    fn otherwise(self, s: impl Display) -> AnyResult<T> {
        self.ok_or_else(|| anyhow!("{s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::AnyhowResultExt;
    use std::io;

    #[test]
    fn context_is_prepended() {
        let result: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::NotFound, "nope"));
        let err = result.otherwise("reading aur.toml").unwrap_err();

        assert_eq!(err.to_string(), "reading aur.toml");
        assert_eq!(err.root_cause().to_string(), "nope");
    }

    #[test]
    fn missing_option_becomes_error() {
        let value: Option<u32> = None;
        let err = value.otherwise("no adapter").unwrap_err();
        assert_eq!(err.to_string(), "no adapter");

        assert_eq!(Some(5).otherwise("unused").unwrap(), 5);
    }
}
