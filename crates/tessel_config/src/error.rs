//! Configuration errors.

use std::path::PathBuf;

/// Why a `tessel.toml` could not be turned into a [`TesselConfig`](crate::TesselConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read `{}`: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The TOML is malformed or names an unknown key or variant.
    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but lies outside its legal range.
    #[error("`{key}` must be {expected}, got {value}")]
    OutOfRange {
        /// Dotted key, e.g. `place.cool.alpha`.
        key: &'static str,
        /// Human-readable constraint.
        expected: &'static str,
        /// The offending value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_names_the_key() {
        let err = ConfigError::OutOfRange {
            key: "place.cool.alpha",
            expected: "in (0, 1)",
            value: "1.5".to_string(),
        };
        assert_eq!(err.to_string(), "`place.cool.alpha` must be in (0, 1), got 1.5");
    }

    #[test]
    fn read_error_names_the_file() {
        let err = ConfigError::Read {
            path: PathBuf::from("cfg/tessel.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "cannot read `cfg/tessel.toml`: missing");
    }
}
