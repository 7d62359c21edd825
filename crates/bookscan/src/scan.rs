//! Loading a raster image and detecting the barcode symbols in it.

use std::{io, path::Path};

use image::{GrayImage, ImageReader};
use log::trace;
use zedbar::{config::Ean13, DecoderConfig, Image, Scanner, SymbolType};

use crate::{Error, ErrorKind};

/// The symbologies the ISBN extractor cares about.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Symbology {
    /// EAN-13, which covers every ISBN-13.
    Ean13,
    /// ISBN-10 presented by the decoder as its own symbology.
    Ean10,
    /// Anything else.
    Other,
}

/// A barcode symbol found in an image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedSymbol {
    /// What kind of barcode was decoded.
    pub symbology: Symbology,
    /// The raw payload of the barcode.
    pub payload: Vec<u8>,
}

/// Finds barcode symbols in a grayscale image.
pub trait SymbolDecoder {
    /// Returns every symbol found in `image`, possibly none.
    ///
    /// # Errors
    ///
    /// An [`Err`] is returned when the image cannot be handed to the decoder.
    fn decode(&self, image: &GrayImage) -> Result<Vec<DecodedSymbol>, Error>;
}

/// [`SymbolDecoder`] backed by zedbar with only EAN-13 enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZedbarDecoder;

impl SymbolDecoder for ZedbarDecoder {
    fn decode(&self, image: &GrayImage) -> Result<Vec<DecodedSymbol>, Error> {
        let (width, height) = image.dimensions();
        let mut image = Image::from_gray(image.as_raw(), width, height)
            .map_err(|e| Error::new(ErrorKind::ImageDecode, e.to_string()))?;

        let mut scanner = Scanner::with_config(DecoderConfig::new().disable_all().enable(Ean13));

        let mut symbols = Vec::new();
        for symbol in scanner.scan(&mut image) {
            let symbology = match symbol.symbol_type() {
                SymbolType::Ean13 | SymbolType::Isbn13 => Symbology::Ean13,
                SymbolType::Isbn10 => Symbology::Ean10,
                _ => Symbology::Other,
            };
            symbols.push(DecodedSymbol {
                symbology,
                payload: symbol.data().to_vec(),
            });
        }

        trace!("Decoder found {} symbol(s)", symbols.len());
        Ok(symbols)
    }
}

/// Opens the image at `path` and converts it to grayscale.
///
/// # Errors
///
/// An [`Err`] with [`ErrorKind::ImageNotFound`] is returned when nothing exists at `path`.
/// An [`Err`] with [`ErrorKind::ImageDecode`] is returned when the file cannot be read or is not
/// a supported image.
pub fn load_image(path: &Path) -> Result<GrayImage, Error> {
    trace!("Opening image '{}'", path.display());
    let reader = ImageReader::open(path).map_err(|e| {
        let kind = if e.kind() == io::ErrorKind::NotFound {
            ErrorKind::ImageNotFound
        } else {
            ErrorKind::ImageDecode
        };
        Error::wrap(kind, e).with_message(format!("'{}'", path.display()))
    })?;

    reader
        .with_guessed_format()
        .map_err(|e| Error::wrap(ErrorKind::ImageDecode, e))?
        .decode()
        .map(|image| image.to_luma8())
        .map_err(|e| {
            Error::wrap(ErrorKind::ImageDecode, e)
                .with_message(format!("'{}' is not a readable image", path.display()))
        })
}

/// Loads the image at `path` and decodes its barcode symbols with `decoder`.
///
/// # Errors
///
/// See [`load_image`] and [`SymbolDecoder::decode`].
pub fn scan_with<D: SymbolDecoder>(decoder: &D, path: &Path) -> Result<Vec<DecodedSymbol>, Error> {
    let image = load_image(path)?;
    decoder.decode(&image)
}
