//! Types module for the main runtime, exposing error and result types.
//!
//! Most code in this module is based around coercion of error types into
//! a common error type, to be used as the general "Error" of this crate.
use logger::SetLoggerError;
use quick_xml::events::Event;
use quick_xml::Reader;
use rusoto_core::region::ParseRegionError;
use rusoto_core::request;
use thiserror::Error;

use std::fmt::{self, Debug, Display, Formatter};
use std::io;

/// Public type alias for a result with a `UtilError` error type.
pub type UtilResult<T> = Result<T, UtilError>;

/// Delegating error wrapper for errors raised by the main archive.
///
/// The internal `String` representation enables cheap coercion from
/// other error types by binding their error messages through. This
/// is somewhat similar to the `failure` crate, but minimal.
pub struct UtilError(String);

/// Debug implementation for `UtilError`.
impl Debug for UtilError {
    /// Formats an `UtilError` by delegating to `Display`.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// Display implementation for `UtilError`.
impl Display for UtilError {
    /// Formats an `UtilError` by writing out the inner representation.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error raised when a report table cannot be written out.
///
/// Rendering stops at the first failure; the title of the table being
/// written is kept to point at how far the report got.
#[derive(Debug, Error)]
#[error("Unable to write \"{table}\": {source}")]
pub struct RenderError {
    table: String,
    source: io::Error,
}

impl RenderError {
    /// Constructs a new `RenderError` for a table title.
    pub fn new(table: &str, source: io::Error) -> RenderError {
        RenderError {
            table: table.to_string(),
            source,
        }
    }

    /// Retrieves the title of the table which failed to write.
    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Macro to implement `From` for provided types.
macro_rules! derive_from {
    ($type:ty) => {
        impl<'a> From<$type> for UtilError {
            fn from(t: $type) -> UtilError {
                UtilError(t.to_string())
            }
        }
    };
}

// Easy derivations of derive_from.
derive_from!(&'a str);
derive_from!(io::Error);
derive_from!(clap::Error);
derive_from!(SetLoggerError);
derive_from!(ParseRegionError);
derive_from!(RenderError);
derive_from!(request::TlsError);
derive_from!(tokio::task::JoinError);
derive_from!(String);

/// Macro to implement `From` for Rusoto types.
macro_rules! derive_from_rusoto {
    ($type:ty) => {
        impl From<rusoto_core::RusotoError<$type>> for UtilError {
            /// Converts a Rusoto error to a `UtilError`.
            fn from(err: rusoto_core::RusotoError<$type>) -> UtilError {
                UtilError(rusoto_message(err.to_string()))
            }
        }
    };
}

// derive error display for all used rusoto_s3 types
derive_from_rusoto!(rusoto_s3::GetBucketLocationError);
derive_from_rusoto!(rusoto_s3::ListBucketsError);
derive_from_rusoto!(rusoto_s3::ListObjectsV2Error);

/// Extracts the `Message` of an XML error body, if there is one.
fn rusoto_message(msg: String) -> String {
    // not XML, nothing to find
    if !msg.starts_with("<?xml") {
        return msg;
    }

    // create an XML reader and buffer
    let mut reader = Reader::from_str(&msg);
    let mut buffer = Vec::new();

    loop {
        // parse through each XML node event
        match reader.read_event(&mut buffer) {
            // end, or error, just give up
            Ok(Event::Eof) | Err(_) => break,

            // if we find a message tag, we'll use that as the error
            Ok(Event::Start(ref e)) if e.name() == b"Message" => {
                if let Ok(text) = reader.read_text(b"Message", &mut Vec::new()) {
                    return text;
                }
                break;
            }

            // skip
            _ => (),
        }
        // empty buffers
        buffer.clear();
    }

    // default msg
    msg
}
