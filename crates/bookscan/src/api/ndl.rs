use std::{ffi::OsString, fs, path::Path};

use log::{info, trace};

use crate::{isbn::Isbn, throttle::Throttle, Error, ErrorKind};

use super::Client;

const NDL_SRU_URL: &str = "https://iss.ndl.go.jp/api/sru";

const SRU_PARAMS: [(&str, &str); 5] = [
    ("operation", "searchRetrieve"),
    ("version", "1.2"),
    ("recordSchema", "dcndl"),
    ("onlyBib", "true"),
    ("recordPacking", "xml"),
];

/// An SRU search for a single ISBN in the NDL OPAC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BibliographicQuery {
    cql: String,
}

impl BibliographicQuery {
    /// Builds the query for `isbn`.
    #[must_use]
    pub fn new(isbn: &Isbn) -> Self {
        Self {
            cql: format!("isbn=\"{isbn}\" AND dpid=iss-ndl-opac"),
        }
    }

    /// The unescaped CQL sent as the `query` parameter.
    #[must_use]
    pub fn cql(&self) -> &str {
        &self.cql
    }

    /// The full request url with the query percent encoded.
    #[must_use]
    pub fn url(&self) -> String {
        let mut url = NDL_SRU_URL.to_owned();
        let mut sep = '?';
        for (key, value) in SRU_PARAMS {
            url.push(sep);
            url.push_str(key);
            url.push('=');
            url.push_str(value);
            sep = '&';
        }
        url.push_str("&query=");
        url.push_str(&urlencoding::encode(&self.cql));
        url
    }
}

/// Fetches the raw dcndl record for `isbn`.
///
/// Exactly one request is made per call, results are never cached. When `persist_to` is given the
/// body is written verbatim to `<persist_to>.xml`. The `throttle` is paused after the request
/// whatever its outcome.
pub(crate) fn fetch<C, T>(
    client: &C,
    throttle: &T,
    isbn: &Isbn,
    persist_to: Option<&Path>,
) -> Result<String, Error>
where
    C: Client,
    T: Throttle,
{
    info!("Searching for ISBN '{isbn}' using the NDL Search API");
    let url = BibliographicQuery::new(isbn).url();
    trace!("GET {url}");

    let res = client.get_text(&url).and_then(|body| {
        if let Some(path) = persist_to {
            persist(path, &body)?;
        }
        Ok(body)
    });

    throttle.pause();
    res
}

fn persist(path: &Path, body: &str) -> Result<(), Error> {
    let mut file_name = OsString::from(path.as_os_str());
    file_name.push(".xml");
    let path = Path::new(&file_name);

    fs::write(path, body).map_err(|e| {
        Error::wrap(ErrorKind::Io, e)
            .with_message(format!("Cannot write record to '{}'", path.display()))
    })?;
    trace!("Wrote {} bytes to '{}'", body.len(), path.display());
    Ok(())
}
