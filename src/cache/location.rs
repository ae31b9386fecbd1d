//! Parsing of `s3://bucket/key` result locations.

use url::Url;

/// A result location split into bucket and key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

/// Parses `s3://bucket/key`. Returns `None` for any other scheme, a missing
/// bucket, or an empty key.
pub fn parse_s3_location(location: &str) -> Option<S3Location> {
    let url = Url::parse(location).ok()?;
    if url.scheme() != "s3" {
        return None;
    }

    let bucket = url.host_str().filter(|host| !host.is_empty())?;
    // Keys keep their original encoding; take them from the raw string, not the URL path.
    let key = location
        .strip_prefix("s3://")?
        .split_once('/')
        .map(|(_, key)| key)
        .filter(|key| !key.is_empty())?;

    Some(S3Location {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}
