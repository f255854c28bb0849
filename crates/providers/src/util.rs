use vl_domain::error::Error;

/// Map a transport-level reqwest error into the domain taxonomy.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else if e.is_connect() {
        Error::Unreachable(e.to_string())
    } else if e.is_decode() {
        Error::Protocol(e.to_string())
    } else {
        Error::Unreachable(e.to_string())
    }
}
