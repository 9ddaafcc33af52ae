//! Common object traversal structures for AWS S3.
//!
//! This module doesn't contain anything special beyond a pseudo-iterator
//! to walk over pages of objects in S3 in a more idiomatic manner. Pages
//! are handed out whole, so they can be passed on to other workers.
use rusoto_s3::*;

use crate::types::UtilResult;

/// Pseudo `Iterator` structure to walk over pages of `Object` types in S3.
///
/// As this is a fallible iteration, a `for` style loop cannot be used
/// easily. Instead, this pattern must be used:
///
/// ```rust,ignore
/// let mut walker = PageWalker::new(s3, bucket, prefix);
///
/// while let Some(page) = walker.next().await? {
///     // do something...
/// }
/// ```
///
/// The walker owns its client, so it can be moved into a spawned task.
pub struct PageWalker {
    s3: S3Client,
    bucket: String,
    prefix: Option<String>,
    token: Option<String>,
    finished: bool,
}

impl PageWalker {
    /// Construct a new `PageWalker` for a bucket/prefix pair.
    pub fn new(s3: S3Client, bucket: String, prefix: Option<String>) -> Self {
        Self {
            s3,
            bucket,
            prefix,
            token: None,
            finished: false,
        }
    }

    /// Attempts to fetch the next page of `Object` values in the bucket.
    ///
    /// Every call which returns a page makes a single call to AWS; `None`
    /// is returned once the final page has been handed out. Pages may be
    /// empty (for example, an empty bucket yields a single empty page).
    pub async fn next(&mut self) -> UtilResult<Option<Vec<Object>>> {
        // if done, no fetch
        if self.finished {
            return Ok(None);
        }

        // create a request to list objects
        let request = ListObjectsV2Request {
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            continuation_token: self.token.clone(),
            ..ListObjectsV2Request::default()
        };

        // execute the request and await the response
        let response = self.s3.list_objects_v2(request).await?;

        // store the next identifier, none means last page
        self.token = response.next_continuation_token;
        self.finished = self.token.is_none();

        // pass back
        Ok(Some(response.contents.unwrap_or_default()))
    }
}
