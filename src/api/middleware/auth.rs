//! Bearer credential extraction
//!
//! Reads `Authorization: Bearer <token>` and exposes the verified identity
//! stored in request extensions to downstream handlers.

use actix_web::{
    dev::Payload,
    http::header::Header,
    FromRequest, HttpMessage, HttpRequest,
};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures::future::{ready, Ready};

use crate::gate::{GateError, Identity};

/// Extract the bearer token, if the header is present and well formed
pub fn extract_bearer<M: HttpMessage>(req: &M) -> Option<String> {
    Authorization::<Bearer>::parse(req)
        .ok()
        .map(|auth| auth.into_scheme().token().to_string())
        .filter(|token| !token.trim().is_empty())
}

/// Access to the identity the gate stored on the request
pub trait IdentityExt {
    fn identity(&self) -> Option<Identity>;
}

impl<T: HttpMessage> IdentityExt for T {
    fn identity(&self) -> Option<Identity> {
        self.extensions().get::<Identity>().cloned()
    }
}

/// Handlers take `Identity` as an argument; a route that is not behind the
/// gate has none and is refused.
impl FromRequest for Identity {
    type Error = GateError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(req.identity().ok_or(GateError::UnauthenticatedQuotaCheck))
    }
}
