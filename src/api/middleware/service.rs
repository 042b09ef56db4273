//! Access gate middleware
//!
//! Actix-web middleware that runs the admission pipeline (credential
//! verification, then quota charge) before the wrapped service sees the
//! request. The gate work happens synchronously in `call`; only the
//! downstream service is awaited.

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, ResponseError,
};
use chrono::Utc;
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::warn;

use crate::gate::{AccessGate, GateError};
use super::auth::extract_bearer;
use super::quota::add_quota_headers;

/// Which stages the middleware runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Verify the credential only; nothing is charged
    AuthenticateOnly,
    /// Verify the credential and charge one request against the quota
    Charge,
}

/// Middleware factory for the access gate
pub struct AccessGateMiddleware {
    gate: Arc<AccessGate>,
    mode: GateMode,
}

impl AccessGateMiddleware {
    pub fn new(gate: Arc<AccessGate>, mode: GateMode) -> Self {
        Self { gate, mode }
    }

    pub fn charged(gate: Arc<AccessGate>) -> Self {
        Self::new(gate, GateMode::Charge)
    }

    pub fn authenticated(gate: Arc<AccessGate>) -> Self {
        Self::new(gate, GateMode::AuthenticateOnly)
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGateMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Transform = AccessGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AccessGateService {
            service: Rc::new(service),
            gate: self.gate.clone(),
            mode: self.mode,
        })
    }
}

/// The actual middleware service
pub struct AccessGateService<S> {
    service: Rc<S>,
    gate: Arc<AccessGate>,
    mode: GateMode,
}

impl<S> AccessGateService<S> {
    fn reject<B>(
        req: ServiceRequest,
        err: GateError,
    ) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B, BoxBody>>, Error>>
    where
        B: 'static,
    {
        warn!(
            path = %req.path(),
            code = err.code(),
            status = err.status_code().as_u16(),
            "Request rejected by access gate"
        );
        let response = req.error_response(err).map_into_right_body();
        Box::pin(async move { Ok(response) })
    }
}

impl<S, B> Service<ServiceRequest> for AccessGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut core::task::Context<'_>) -> core::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let now = Utc::now();
        let token = extract_bearer(&req);

        let outcome = match self.mode {
            GateMode::AuthenticateOnly => self
                .gate
                .authenticate(token.as_deref(), now)
                .map(|identity| (identity, None)),
            GateMode::Charge => self
                .gate
                .admit(token.as_deref(), now)
                .map(|admission| (admission.identity, Some(admission.quota))),
        };

        let (identity, quota) = match outcome {
            Ok(admitted) => admitted,
            Err(err) => return Self::reject(req, err),
        };

        req.extensions_mut().insert(identity);

        let service = self.service.clone();
        Box::pin(async move {
            // The charge stands even if the handler fails or the client goes away.
            let res = service.call(req).await?;

            let mut res = res.map_into_left_body();
            if let Some(status) = quota {
                add_quota_headers(res.headers_mut(), &status);
            }
            Ok(res)
        })
    }
}
