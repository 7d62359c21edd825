use std::time::Duration;

use log::{trace, warn};

pub(crate) mod ndl;

use crate::{Error, ErrorKind};

/// Default time allowed for a whole request before it is abandoned.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues blocking GET requests and returns the response body.
pub trait Client {
    /// Returns the body of `url` as text.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::Network`] is returned when the request cannot be completed or
    /// the body cannot be read.
    fn get_text(&self, url: &str) -> Result<String, Error>;
}

impl<C: Client + ?Sized> Client for &C {
    fn get_text(&self, url: &str) -> Result<String, Error> {
        (**self).get_text(url)
    }
}

/// Builds the blocking HTTP client used for lookups.
///
/// # Errors
///
/// An [`Err`] is returned when the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client, Error> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("bookscan/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::wrap(ErrorKind::Network, e))
}

impl Client for reqwest::blocking::Client {
    fn get_text(&self, url: &str) -> Result<String, Error> {
        let resp = self
            .get(url)
            .send()
            .map_err(|e| Error::wrap(ErrorKind::Network, e))?;

        // The service reports "no results" inside a 200 response, so any other status is only
        // worth a warning and the body is still handed back.
        let status = resp.status();
        if status.is_success() {
            trace!("Request was successful");
        } else {
            warn!("Request to '{url}' returned status {status}");
        }

        resp.text().map_err(|e| Error::wrap(ErrorKind::Network, e))
    }
}

#[cfg(test)]
pub(crate) use test::{impl_text_producer, MockTextClient, NetworkErrorProducer, Producer};
