pub(crate) type DynError = Box<dyn std::error::Error + Send + Sync>;

/// The Errors that may occur when calling the bookscan functions.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<DynError>,
}

/// Types of errors that make up an [`Error`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The image path does not exist.
    ImageNotFound,
    /// The image exists but could not be read or decoded.
    ImageDecode,
    /// The request to the bibliographic service failed.
    Network,
    /// The bibliographic record is not well formed XML.
    XmlParse,
    /// Writing the raw record to disk failed.
    Io,
    /// A value does not satisfy the ISBN invariant.
    InvalidIsbn,
}

impl Error {
    /// Creates a new [`Error`] based on the [`ErrorKind`] and message to describe the error.
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            source: None,
        }
    }

    /// Wraps an existing error as the source of [`Error`].
    pub fn wrap<E>(kind: ErrorKind, source: E) -> Self
    where
        E: Into<DynError>,
    {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
        }
    }

    /// Adds a message describing what was being done when the error occurred.
    #[must_use]
    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the kind of error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ErrorKind::ImageNotFound => f.write_str("Image not found")?,
            ErrorKind::ImageDecode => f.write_str("Image decode error")?,
            ErrorKind::Network => f.write_str("Network error")?,
            ErrorKind::XmlParse => f.write_str("XML parse error")?,
            ErrorKind::Io => f.write_str("IO error")?,
            ErrorKind::InvalidIsbn => f.write_str("Invalid ISBN")?,
        };

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        if let Some(cause) = &self.source {
            write!(f, ": caused by {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| &**e as _)
    }
}

#[test]
fn display_includes_kind_message_and_cause() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = Error::wrap(ErrorKind::Io, io).with_message("Cannot write 'out.xml'");

    assert_eq!(ErrorKind::Io, err.kind());
    assert_eq!(
        "IO error: Cannot write 'out.xml': caused by denied",
        err.to_string()
    );
}
