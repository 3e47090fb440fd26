use std::fmt;

/// An error that can occur when decoding a format string
#[derive(Debug, Clone, PartialEq)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    #[cold]
    pub(crate) fn illegal_specifier(specifier: String, offset: usize) -> Error {
        Error::new(ErrorKind::IllegalSpecifier { specifier, offset })
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Returns the offset (in format units) where the offending directive starts
    pub fn offset(&self) -> Option<usize> {
        self.0.offset()
    }
}

/// Specific type of error
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// A conversion directive could not be resolved to any known length
    /// modifier and conversion combination
    IllegalSpecifier { specifier: String, offset: usize },
}

impl ErrorKind {
    pub fn offset(&self) -> Option<usize> {
        match *self {
            ErrorKind::IllegalSpecifier { offset, .. } => Some(offset),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::IllegalSpecifier {
                ref specifier,
                offset,
            } => write!(
                f,
                "cannot handle specifier \"%{}\" (offset: {})",
                specifier, offset
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_specifier_display() {
        let err = Error::illegal_specifier(String::from("hhhi"), 3);
        assert_eq!(err.offset(), Some(3));
        assert_eq!(
            err.to_string(),
            "cannot handle specifier \"%hhhi\" (offset: 3)"
        );
    }
}
