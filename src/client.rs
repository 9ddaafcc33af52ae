//! S3 client construction and bucket discovery.
//!
//! Buckets can live in any region, and requests sent to the wrong region
//! are rejected, so every bucket is located first and listed through a
//! client bound to its own region.
use rusoto_core::{credential::ChainProvider, region::Region, HttpClient};
use rusoto_s3::*;

use std::str::FromStr;
use std::time::Duration;

use crate::types::UtilResult;

/// Creates a new `S3Client` bound to the provided region.
pub fn connect(region: Region) -> UtilResult<S3Client> {
    // create client options
    let client = HttpClient::new()?;

    // create provided with timeout
    let mut chain = ChainProvider::new();
    chain.set_timeout(Duration::from_millis(500));

    // create the new S3 client
    Ok(S3Client::new_with(client, chain, region))
}

/// Retrieves the names of every bucket visible to the credentials.
pub async fn list_buckets(s3: &S3Client) -> UtilResult<Vec<String>> {
    let output = s3.list_buckets().await?;
    let buckets = output
        .buckets
        .unwrap_or_default()
        .into_iter()
        .filter_map(|bucket| bucket.name)
        .collect();
    Ok(buckets)
}

/// Retrieves the region a bucket is located in.
pub async fn locate(s3: &S3Client, bucket: &str) -> UtilResult<Region> {
    let request = GetBucketLocationRequest {
        bucket: bucket.to_string(),
        ..GetBucketLocationRequest::default()
    };
    let output = s3.get_bucket_location(request).await?;
    normalize_location(output.location_constraint.as_deref())
}

/// Converts a bucket location constraint into a `Region`.
///
/// Buckets in `us-east-1` report no constraint at all, and the oldest
/// European buckets report the legacy `EU` constraint.
pub fn normalize_location(constraint: Option<&str>) -> UtilResult<Region> {
    match constraint {
        None | Some("") => Ok(Region::UsEast1),
        Some("EU") => Ok(Region::EuWest1),
        Some(name) => Ok(Region::from_str(name)?),
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_location;
    use rusoto_core::region::Region;

    #[test]
    fn normalizing_bucket_locations() {
        assert_eq!(normalize_location(None).unwrap(), Region::UsEast1);
        assert_eq!(normalize_location(Some("")).unwrap(), Region::UsEast1);
        assert_eq!(normalize_location(Some("EU")).unwrap(), Region::EuWest1);
        assert_eq!(
            normalize_location(Some("ap-southeast-2")).unwrap(),
            Region::ApSoutheast2
        );
        assert!(normalize_location(Some("moon-base-1")).is_err());
    }
}
