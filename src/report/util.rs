//! General utility module housing formatting functions.
use pretty_bytes::converter::convert;

use std::io::{self, Write};

/// Number of bytes in a gigabyte, as reported in size tables.
const GIGABYTE: f64 = 1024.0 * 1024.0 * 1024.0;

/// Converts a byte count to a `String` representation.
pub fn convert_bytes(bytes: u64) -> String {
    convert(bytes as f64).replacen(' ', "", 1)
}

/// Converts a byte count to gigabytes with four decimals.
pub fn convert_gigabytes(bytes: u64) -> String {
    format!("{:.4}", bytes as f64 / GIGABYTE)
}

/// Writes a comma separated row of fields, terminated by a line feed.
///
/// An empty slice of fields writes an empty line.
pub fn write_row<W, S>(writer: &mut W, fields: &[S]) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            writer.write_all(b",")?;
        }
        write_field(writer, field.as_ref())?;
    }
    writer.write_all(b"\n")
}

/// Writes a single field, quoting it when required.
fn write_field<W: Write>(writer: &mut W, field: &str) -> io::Result<()> {
    if !needs_quotes(field) {
        return writer.write_all(field.as_bytes());
    }
    writer.write_all(b"\"")?;
    writer.write_all(field.replace('"', "\"\"").as_bytes())?;
    writer.write_all(b"\"")
}

/// Determines whether a field has to be quoted to be read back as-is.
fn needs_quotes(field: &str) -> bool {
    if field.is_empty() {
        return false;
    }
    if field == r"\." {
        return true;
    }
    if field.contains(|c: char| c == ',' || c == '"' || c == '\r' || c == '\n') {
        return true;
    }
    field.starts_with(char::is_whitespace)
}
