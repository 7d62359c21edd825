//! Turning decoded barcode symbols into ISBN values.

use std::{fmt, ops::Deref};

use log::{trace, warn};

use crate::{
    scan::{DecodedSymbol, Symbology},
    Error, ErrorKind,
};

/// Bookland country code shared by every ISBN derived EAN.
const BOOKLAND_PREFIX: &str = "97";

/// An ISBN of 10 or 13 ASCII digits starting with the Bookland prefix.
///
/// The only way to obtain an [`Isbn`] is through [`Isbn::parse`] so a value that breaks the
/// invariant can never be handed to the fetcher.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Isbn(String);

impl Isbn {
    /// Validates `value` as an [`Isbn`].
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::InvalidIsbn`] is returned when `value` is not 10 or 13 ASCII
    /// digits or does not start with "97".
    pub fn parse<S: Into<String>>(value: S) -> Result<Self, Error> {
        let value = value.into();

        if value.len() != 10 && value.len() != 13 {
            return Err(Error::new(
                ErrorKind::InvalidIsbn,
                format!("'{value}' must be 10 or 13 digits long"),
            ));
        }

        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::new(
                ErrorKind::InvalidIsbn,
                format!("'{value}' must only contain digits"),
            ));
        }

        if !value.starts_with(BOOKLAND_PREFIX) {
            return Err(Error::new(
                ErrorKind::InvalidIsbn,
                format!("'{value}' does not start with the Bookland prefix {BOOKLAND_PREFIX}"),
            ));
        }

        Ok(Self(value))
    }

    /// The digits of the ISBN.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Isbn {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keeps the symbols that carry an ISBN, in the order they were decoded.
///
/// Duplicates are kept as is: a barcode decoded twice is looked up twice.
#[must_use]
pub fn extract_isbns(symbols: &[DecodedSymbol]) -> Vec<Isbn> {
    symbols.iter().filter_map(isbn_from_symbol).collect()
}

fn isbn_from_symbol(symbol: &DecodedSymbol) -> Option<Isbn> {
    if !matches!(symbol.symbology, Symbology::Ean13 | Symbology::Ean10) {
        trace!("Ignoring {:?} symbol", symbol.symbology);
        return None;
    }

    let Ok(text) = std::str::from_utf8(&symbol.payload) else {
        trace!("Ignoring symbol with a non UTF-8 payload");
        return None;
    };

    if !text.starts_with(BOOKLAND_PREFIX) {
        trace!("Ignoring '{text}' as it is not a Bookland EAN");
        return None;
    }

    match Isbn::parse(text) {
        Ok(isbn) => Some(isbn),
        Err(err) => {
            warn!("Skipping barcode: {err}");
            None
        }
    }
}
