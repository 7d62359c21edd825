#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![warn(missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

//! # bookscan
//!
//! bookscan reads the ISBN barcode printed on a book cover and looks the book up in the
//! National Diet Library (NDL) Search API, returning its title and author.
//!
//! The work is a straight pipeline: [`scan`] finds EAN-13 symbols in an image, [`isbn`] keeps
//! the ones carrying an ISBN, [`fetch`] retrieves the dcndl record for each ISBN and
//! [`record::parse`] extracts a [`BookInfo`] from it. [`process_image`] runs all of it.

mod api;
mod error;
pub mod isbn;
pub mod record;
pub mod scan;
pub mod throttle;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub use api::{http_client, ndl::BibliographicQuery, Client, DEFAULT_TIMEOUT};
pub use error::{Error, ErrorKind};
pub use isbn::{extract_isbns, Isbn};
pub use record::BookInfo;
pub use scan::{DecodedSymbol, SymbolDecoder, Symbology, ZedbarDecoder};
use throttle::{FixedDelay, Throttle};

use log::{error, trace, warn};

/// What to do when looking up one ISBN fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and carry on with the next ISBN.
    #[default]
    SkipAndContinue,
    /// Stop at the first failure and return it.
    FailFast,
}

/// Run-time configuration of [`process_image`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Time allowed for each request.
    pub timeout: Duration,
    /// Pause after each request.
    pub delay: Duration,
    /// Directory where every raw record is saved as `<isbn>.xml`.
    pub persist_dir: Option<PathBuf>,
    /// How lookup failures are handled.
    pub failure_policy: FailurePolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            delay: throttle::DEFAULT_DELAY,
            persist_dir: None,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Decodes the barcode symbols in the image at `path`.
///
/// # Errors
///
/// An [`Err`] with [`ErrorKind::ImageNotFound`] is returned when `path` does not exist.
/// An [`Err`] with [`ErrorKind::ImageDecode`] is returned when the image cannot be read.
#[inline]
pub fn scan(path: &Path) -> Result<Vec<DecodedSymbol>, Error> {
    scan::scan_with(&ZedbarDecoder, path)
}

/// Fetches the raw NDL record for `isbn`, optionally saving it to `<persist_to>.xml`.
///
/// Every call makes exactly one request and then pauses for the default delay.
///
/// # Errors
///
/// An [`Err`] with [`ErrorKind::Network`] is returned when the request fails.
/// An [`Err`] with [`ErrorKind::Io`] is returned when the record cannot be saved.
#[inline]
pub fn fetch(isbn: &Isbn, persist_to: Option<&Path>) -> Result<String, Error> {
    let client = http_client(DEFAULT_TIMEOUT)?;
    api::ndl::fetch(&client, &FixedDelay::default(), isbn, persist_to)
}

/// Looks up every ISBN barcode in the image at `path`.
///
/// Returns `Ok(None)` when the image cannot be loaded, after logging why. Otherwise returns the
/// records found, in barcode order, possibly none.
///
/// # Errors
///
/// An [`Err`] is only returned with [`FailurePolicy::FailFast`], for the first lookup that
/// failed, or when the HTTP client cannot be built.
pub fn process_image(path: &Path, options: &Options) -> Result<Option<Vec<BookInfo>>, Error> {
    let client = http_client(options.timeout)?;
    Pipeline {
        decoder: ZedbarDecoder,
        client,
        throttle: FixedDelay(options.delay),
        persist_dir: options.persist_dir.clone(),
        failure_policy: options.failure_policy,
    }
    .process_image(path)
}

/// The scan, extract, fetch and parse steps wired together.
#[derive(Debug)]
pub struct Pipeline<D, C, T> {
    /// Finds symbols in the image.
    pub decoder: D,
    /// Performs the lookups.
    pub client: C,
    /// Paces the lookups.
    pub throttle: T,
    /// See [`Options::persist_dir`].
    pub persist_dir: Option<PathBuf>,
    /// See [`Options::failure_policy`].
    pub failure_policy: FailurePolicy,
}

impl<D, C, T> Pipeline<D, C, T>
where
    D: SymbolDecoder,
    C: Client,
    T: Throttle,
{
    /// See [`process_image`].
    ///
    /// # Errors
    ///
    /// See [`process_image`].
    pub fn process_image(&self, path: &Path) -> Result<Option<Vec<BookInfo>>, Error> {
        let symbols = match scan::scan_with(&self.decoder, path) {
            Ok(symbols) => symbols,
            Err(err) => {
                error!("{err}");
                return Ok(None);
            }
        };

        let isbns = extract_isbns(&symbols);
        trace!(
            "{} symbol(s) decoded, {} carry an ISBN",
            symbols.len(),
            isbns.len()
        );

        let mut books = Vec::with_capacity(isbns.len());
        for isbn in &isbns {
            match self.lookup(isbn) {
                Ok(Some(book)) => books.push(book),
                Ok(None) => trace!("Empty record for ISBN '{isbn}'"),
                Err(err) => match self.failure_policy {
                    FailurePolicy::FailFast => return Err(err),
                    FailurePolicy::SkipAndContinue => {
                        warn!("Skipping ISBN '{isbn}': {err}");
                    }
                },
            }
        }

        Ok(Some(books))
    }

    /// Fetches and parses the record of a single `isbn`.
    ///
    /// # Errors
    ///
    /// An [`Err`] is returned when the record cannot be fetched, saved or parsed.
    pub fn lookup(&self, isbn: &Isbn) -> Result<Option<BookInfo>, Error> {
        let persist_to = self.persist_dir.as_ref().map(|dir| dir.join(isbn.as_str()));
        let doc = api::ndl::fetch(&self.client, &self.throttle, isbn, persist_to.as_deref())?;
        record::parse(Some(&doc))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use assert_fs::{fixture::PathChild, TempDir};
    use image::GrayImage;

    use super::*;
    use crate::{
        api::{impl_text_producer, MockTextClient, NetworkErrorProducer},
        throttle::NoDelay,
    };

    impl_text_producer! {
        RecordProducer => Ok(include_str!("../../../tests/data/readable_code.xml").to_owned()),
        EmptyProducer => Ok(String::new()),
        MalformedProducer => Ok("<searchRetrieveResponse>".to_owned()),
    }

    /// Pretends every image contains the given payloads as EAN-13 symbols.
    struct FakeDecoder(Vec<&'static str>);

    impl SymbolDecoder for FakeDecoder {
        fn decode(&self, _: &GrayImage) -> Result<Vec<DecodedSymbol>, Error> {
            Ok(self
                .0
                .iter()
                .map(|payload| DecodedSymbol {
                    symbology: Symbology::Ean13,
                    payload: payload.as_bytes().to_vec(),
                })
                .collect())
        }
    }

    /// Fails for urls containing any of the listed ISBNs.
    #[derive(Default)]
    struct FlakyClient {
        failing: Vec<&'static str>,
        requests: RefCell<Vec<String>>,
    }

    impl Client for FlakyClient {
        fn get_text(&self, url: &str) -> Result<String, Error> {
            self.requests.borrow_mut().push(url.to_owned());
            if self.failing.iter().any(|isbn| url.contains(isbn)) {
                Err(Error::new(ErrorKind::Network, "connection reset"))
            } else {
                Ok(include_str!("../../../tests/data/readable_code.xml").to_owned())
            }
        }
    }

    fn blank_image(dir: &TempDir) -> PathBuf {
        let path = dir.child("cover.png").path().to_owned();
        GrayImage::from_pixel(120, 80, image::Luma([255]))
            .save(&path)
            .unwrap();
        path
    }

    fn pipeline<D, C>(decoder: D, client: C) -> Pipeline<D, C, NoDelay> {
        Pipeline {
            decoder,
            client,
            throttle: NoDelay,
            persist_dir: None,
            failure_policy: FailurePolicy::SkipAndContinue,
        }
    }

    fn readable_code() -> BookInfo {
        BookInfo {
            title: Some("リーダブルコード".to_owned()),
            author: Some("Dustin Boswell".to_owned()),
        }
    }

    #[test]
    fn missing_image_is_none_not_an_error() {
        let dir = TempDir::new().unwrap();
        let client = MockTextClient::<RecordProducer>::default();
        let pipeline = pipeline(ZedbarDecoder, &client);

        let res = pipeline.process_image(dir.child("nope.jpg").path()).unwrap();

        assert_eq!(None, res);
        assert!(client.requests().is_empty());
    }

    #[test]
    fn image_without_barcode_is_empty() {
        let dir = TempDir::new().unwrap();
        let client = MockTextClient::<RecordProducer>::default();
        let pipeline = pipeline(ZedbarDecoder, &client);

        let res = pipeline.process_image(&blank_image(&dir)).unwrap();

        assert_eq!(Some(vec![]), res);
        assert!(client.requests().is_empty());
    }

    #[test]
    fn barcode_in_image_is_looked_up() {
        let path = Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../tests/data/ean13_9784873115658.png"
        ));
        let client = MockTextClient::<RecordProducer>::default();
        let pipeline = pipeline(ZedbarDecoder, &client);

        let res = pipeline.process_image(path).unwrap();

        assert_eq!(Some(vec![readable_code()]), res);
        let requests = client.requests();
        assert_eq!(1, requests.len());
        assert!(requests[0].contains("9784873115658"));
    }

    #[test]
    fn each_isbn_is_looked_up_in_order() {
        let dir = TempDir::new().unwrap();
        let client = MockTextClient::<RecordProducer>::default();
        let decoder = FakeDecoder(vec!["9784798157632", "4901234567894", "9784873115658"]);
        let pipeline = pipeline(decoder, &client);

        let res = pipeline.process_image(&blank_image(&dir)).unwrap();

        assert_eq!(Some(vec![readable_code(), readable_code()]), res);
        let requests = client.requests();
        assert_eq!(2, requests.len());
        assert!(requests[0].contains("9784798157632"));
        assert!(requests[1].contains("9784873115658"));
    }

    #[test]
    fn empty_records_are_left_out() {
        let dir = TempDir::new().unwrap();
        let client = MockTextClient::<EmptyProducer>::default();
        let pipeline = pipeline(FakeDecoder(vec!["9784798157632"]), &client);

        let res = pipeline.process_image(&blank_image(&dir)).unwrap();

        assert_eq!(Some(vec![]), res);
    }

    #[test]
    fn failed_lookup_is_skipped_by_default() {
        let dir = TempDir::new().unwrap();
        let client = FlakyClient {
            failing: vec!["9784798157632"],
            ..FlakyClient::default()
        };
        let decoder = FakeDecoder(vec!["9784798157632", "9784873115658"]);
        let pipeline = pipeline(decoder, &client);

        let res = pipeline.process_image(&blank_image(&dir)).unwrap();

        assert_eq!(Some(vec![readable_code()]), res);
        assert_eq!(2, client.requests.borrow().len());
    }

    #[test]
    fn fail_fast_returns_the_first_error() {
        let dir = TempDir::new().unwrap();
        let client = MockTextClient::<NetworkErrorProducer>::default();
        let decoder = FakeDecoder(vec!["9784798157632", "9784873115658"]);
        let pipeline = Pipeline {
            failure_policy: FailurePolicy::FailFast,
            ..pipeline(decoder, &client)
        };

        let err = pipeline.process_image(&blank_image(&dir)).unwrap_err();

        assert_eq!(ErrorKind::Network, err.kind());
        assert_eq!(1, client.requests().len());
    }

    #[test]
    fn malformed_record_follows_the_failure_policy() {
        let dir = TempDir::new().unwrap();
        let image = blank_image(&dir);
        let client = MockTextClient::<MalformedProducer>::default();

        let skipping = pipeline(FakeDecoder(vec!["9784798157632"]), &client);
        assert_eq!(Some(vec![]), skipping.process_image(&image).unwrap());

        let failing = Pipeline {
            failure_policy: FailurePolicy::FailFast,
            ..pipeline(FakeDecoder(vec!["9784798157632"]), &client)
        };
        let err = failing.process_image(&image).unwrap_err();
        assert_eq!(ErrorKind::XmlParse, err.kind());
    }

    #[test]
    fn records_are_saved_under_the_isbn() {
        let dir = TempDir::new().unwrap();
        let client = MockTextClient::<RecordProducer>::default();
        let pipeline = Pipeline {
            persist_dir: Some(dir.path().to_owned()),
            ..pipeline(FakeDecoder(vec!["9784798157632"]), &client)
        };

        pipeline.process_image(&blank_image(&dir)).unwrap();

        assert!(dir.child("9784798157632.xml").path().is_file());
    }

    #[test]
    fn default_options() {
        let options = Options::default();

        assert_eq!(Duration::from_secs(30), options.timeout);
        assert_eq!(Duration::from_millis(100), options.delay);
        assert_eq!(FailurePolicy::SkipAndContinue, options.failure_policy);
        assert_eq!(None, options.persist_dir);
    }
}
