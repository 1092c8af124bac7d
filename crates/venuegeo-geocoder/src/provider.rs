use std::future::Future;

use crate::candidate::GeocodeCandidate;
use crate::error::GeocodeError;

/// Forward-geocoding capability.
///
/// Implementations issue exactly one outbound request per `geocode` call,
/// do not cache, and return candidates in the provider's own ranking order
/// (best first) without filtering them.
pub trait GeocodeProvider: Send + Sync {
    /// Human-inspectable rendering of the request `geocode` would issue for
    /// `address_text`, with credentials redacted.
    fn describe_request(&self, address_text: &str) -> String;

    /// Resolves `address_text` to ranked candidates.
    ///
    /// Blank input fails with [`GeocodeError::InvalidAddress`] before any
    /// network call.
    fn geocode(
        &self,
        address_text: &str,
    ) -> impl Future<Output = Result<Vec<GeocodeCandidate>, GeocodeError>> + Send;
}
