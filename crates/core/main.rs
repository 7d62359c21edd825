#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![allow(clippy::as_conversions, clippy::mod_module_files)]

use std::{path::PathBuf, process, time::Duration};

use bookscan::{BookInfo, FailurePolicy, Options};

use clap::Parser;
use eyre::{Result, WrapErr};
use log::{error, trace};

const USAGE: &str = "Usage: bookscan <image_path>";

fn main() {
    if let Err(err) = try_main() {
        error!("{:#}", err);
        process::exit(2);
    }
}

fn try_main() -> Result<()> {
    let Cli {
        images,
        verbosity,
        quiet,
        save_xml,
        fail_fast,
        timeout,
        json,
    } = Cli::parse();

    setup_errlog(verbosity as usize, quiet)?;

    let image = match images.as_slice() {
        [image] => image,
        _ => {
            trace!("Expected exactly one image but got {}", images.len());
            println!("{USAGE}");
            return Ok(());
        }
    };

    let options = Options {
        timeout: Duration::from_secs(timeout),
        persist_dir: save_xml,
        failure_policy: if fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::SkipAndContinue
        },
        ..Options::default()
    };
    trace!("Running with {:?}", options);

    let books = bookscan::process_image(image, &options)
        .wrap_err_with(|| format!("Failed to look up the books in '{}'", image.display()))?;

    // `None` means the image could not be loaded, which has already been reported.
    let Some(books) = books else {
        return Ok(());
    };

    if json {
        let out = serde_json::to_string_pretty(&books).wrap_err("Cannot serialize the results")?;
        println!("{out}");
    } else if !quiet {
        books.iter().for_each(print_book);
    }

    Ok(())
}

fn print_book(book: &BookInfo) {
    println!(
        "{}\t{}",
        book.title.as_deref().unwrap_or("-"),
        book.author.as_deref().unwrap_or("-")
    );
}

fn setup_errlog(verbosity: usize, quiet: bool) -> Result<()> {
    // quiet only lets errors through
    let verbosity = if quiet { 0 } else { verbosity + 2 };

    stderrlog::new()
        .verbosity(verbosity)
        .init()
        .wrap_err("Cannot set up logging")
}

#[derive(Parser)]
#[clap(name = "bookscan")]
#[clap(about = "Read the ISBN barcode of a book cover and look the book up in NDL Search")]
#[clap(version, author)]
struct Cli {
    /// The image of the book cover or barcode
    #[clap(parse(from_os_str), value_name = "IMAGE")]
    images: Vec<PathBuf>,

    /// How chatty the program is when performing commands
    ///
    /// The number of times this flag is used will increase how chatty
    /// the program is.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,

    /// Only errors are printed to stderr and results are not written to stdout, unless --json is
    /// used.
    #[clap(short, long)]
    quiet: bool,

    /// Directory where each raw NDL record is saved as <isbn>.xml
    #[clap(long, parse(from_os_str), value_name = "DIR")]
    save_xml: Option<PathBuf>,

    /// Stop at the first ISBN that cannot be looked up instead of skipping it
    #[clap(long)]
    fail_fast: bool,

    /// Seconds allowed for each request to NDL Search
    #[clap(long, value_name = "SECONDS", default_value_t = 30)]
    timeout: u64,

    /// Print the results as JSON
    #[clap(long)]
    json: bool,
}
