//! Request parameter parsing.
//!
//! Parameters are carried in the URI query string:
//!
//! - `type=eq&body_part=<fragment>&count=<n>` selects [`Mode::Generate`]
//! - `type=ne` selects [`Mode::Echo`]
//!
//! Parsing only checks that the fields are present and well formed. Whether a
//! fragment and count describe a valid body is decided by
//! [`generate`](crate::protocol::body::generate).

use bytes::Bytes;
use http::Uri;
use serde::Deserialize;

use crate::ensure;
use crate::protocol::ParamError;

const GENERATE_TYPE: &str = "eq";
const ECHO_TYPE: &str = "ne";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Generate,
    Echo,
}

/// Parameters of one request, exactly one mode per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestParams {
    Generate { fragment: Bytes, count: u64 },
    Echo,
}

#[derive(Deserialize, Debug, Default)]
struct RawParams {
    #[serde(rename = "type")]
    kind: Option<String>,
    body_part: Option<String>,
    count: Option<String>,
}

impl RequestParams {
    pub fn mode(&self) -> Mode {
        match self {
            RequestParams::Generate { .. } => Mode::Generate,
            RequestParams::Echo => Mode::Echo,
        }
    }

    pub fn from_uri(uri: &Uri) -> Result<Self, ParamError> {
        Self::from_query(uri.query().unwrap_or_default())
    }

    pub fn from_query(query: &str) -> Result<Self, ParamError> {
        let raw = serde_urlencoded::from_str::<RawParams>(query).map_err(ParamError::malformed_query)?;

        match raw.kind.as_deref() {
            Some(GENERATE_TYPE) => {
                let fragment = raw.body_part.ok_or(ParamError::missing_field("body_part"))?;
                let count = raw.count.ok_or(ParamError::missing_field("count"))?;
                let count = parse_count(&count)?;
                Ok(RequestParams::Generate { fragment: Bytes::from(fragment), count })
            }
            Some(ECHO_TYPE) => Ok(RequestParams::Echo),
            Some(other) => Err(ParamError::unknown_type(other)),
            None => Err(ParamError::MissingType),
        }
    }
}

/// A count is a plain decimal number: ASCII digits only, no sign and no
/// surrounding whitespace.
fn parse_count(value: &str) -> Result<u64, ParamError> {
    ensure!(!value.starts_with('-'), ParamError::NegativeCount { value: value.to_string() });
    ensure!(
        !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
        ParamError::invalid_count(format!("{value:?}, expected ascii digits"))
    );
    value.parse::<u64>().map_err(|e| ParamError::invalid_count(format!("{value:?}, {e}")))
}
