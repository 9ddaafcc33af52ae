//! Observations recorded by the aggregator, and their extraction from S3.
use chrono::{DateTime, Utc};
use rusoto_s3::Object;

use std::convert::TryFrom;

use crate::types::{UtilError, UtilResult};

/// Label used for any classification field which is missing or empty.
pub const UNKNOWN: &str = "unknown";

/// A single observed object, with all of its classifiable attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    size: u64,
    timestamp: DateTime<Utc>,
    storage_class: String,
    extension: String,
    group: Option<String>,
}

impl Observation {
    /// Constructs a new `Observation` with unknown classifications.
    pub fn new(size: u64, timestamp: DateTime<Utc>) -> Observation {
        Observation {
            size,
            timestamp,
            storage_class: UNKNOWN.into(),
            extension: UNKNOWN.into(),
            group: None,
        }
    }

    /// Sets the storage class of this observation.
    pub fn with_storage_class(mut self, storage_class: Option<&str>) -> Observation {
        self.storage_class = or_unknown(storage_class);
        self
    }

    /// Sets the file extension of this observation.
    pub fn with_extension(mut self, extension: Option<&str>) -> Observation {
        self.extension = or_unknown(extension);
        self
    }

    /// Sets the group (root folder) this observation is rolled up into.
    pub fn with_group(mut self, group: Option<&str>) -> Observation {
        self.group = group.map(|group| or_unknown(Some(group)));
        self
    }

    /// Retrieves the size of the observed object, in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Retrieves the modification time of the observed object.
    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    /// Retrieves the storage class, or `unknown`.
    pub fn storage_class(&self) -> &str {
        &self.storage_class
    }

    /// Retrieves the file extension (including the dot), or `unknown`.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Retrieves the group key, if any.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Retrieves the calendar month label (`YYYY-MM`) of the timestamp.
    pub fn month(&self) -> String {
        self.timestamp.format("%Y-%m").to_string()
    }

    /// Builds an `Observation` from an S3 `Object`.
    ///
    /// Folder markers (keys ending with `/`) are not objects of their own and
    /// result in `None`. Objects missing a key, a size, or a valid timestamp
    /// cannot be classified and result in an error for the caller to log.
    pub fn from_object(object: &Object) -> UtilResult<Option<Observation>> {
        let key = object
            .key
            .as_deref()
            .ok_or_else(|| UtilError::from("object listed without a key"))?;

        // skip folders
        if key.ends_with('/') {
            return Ok(None);
        }

        let size = object
            .size
            .and_then(|size| u64::try_from(size).ok())
            .ok_or_else(|| UtilError::from(format!("object {} has no valid size", key)))?;

        let modified = object
            .last_modified
            .as_deref()
            .ok_or_else(|| UtilError::from(format!("object {} has no modified date", key)))?;

        let timestamp = DateTime::parse_from_rfc3339(modified)
            .map_err(|err| format!("object {} has invalid date {}: {}", key, modified, err))?
            .with_timezone(&Utc);

        let observation = Observation::new(size, timestamp)
            .with_storage_class(object.storage_class.as_deref())
            .with_extension(extension(key))
            .with_group(key.split('/').next());

        Ok(Some(observation))
    }
}

/// Returns the extension of the last path segment, including the dot.
fn extension(key: &str) -> Option<&str> {
    let name = key.rsplit('/').next().unwrap_or(key);
    name.rfind('.').map(|idx| &name[idx..])
}

/// Converts an optional label to an owned label, defaulting to `unknown`.
fn or_unknown(label: Option<&str>) -> String {
    match label {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => UNKNOWN.to_string(),
    }
}
