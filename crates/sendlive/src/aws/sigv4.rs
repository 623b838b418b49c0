//! AWS Signature Version 4 request signing.

use std::time::SystemTime;

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningParams, SigningSettings, sign};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;

use super::AwsCredentials;
use crate::error::{Error, Result};
use crate::http::HttpRequest;

const PROVIDER_NAME: &str = "sendlive";

/// Signs requests for one AWS service in one region.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: AwsCredentials,
    service: &'static str,
}

impl SigV4Signer {
    /// Creates a signer for the given service, e.g. `medialive`.
    pub fn new(credentials: AwsCredentials, service: &'static str) -> Self {
        Self {
            credentials,
            service,
        }
    }

    /// Signs the request with the current time.
    pub fn sign(&self, request: HttpRequest) -> Result<HttpRequest> {
        self.sign_at(request, SystemTime::now())
    }

    /// Signs the request as if sent at `time`.
    pub fn sign_at(&self, request: HttpRequest, time: SystemTime) -> Result<HttpRequest> {
        let identity: Identity = Credentials::new(
            self.credentials.access_key.as_str(),
            self.credentials.secret_key.expose(),
            None,
            None,
            PROVIDER_NAME,
        )
        .into();

        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.credentials.region)
            .name(self.service)
            .time(time)
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| Error::configuration("invalid SigV4 signing parameters").with_source(e))?
            .into();

        let signable = SignableRequest::new(
            request.method.as_str(),
            request.url.as_str(),
            request
                .headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
            SignableBody::Bytes(request.body_bytes()),
        )
        .map_err(|e| {
            Error::configuration(format!("{} request cannot be signed", self.service))
                .with_source(e)
        })?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| {
                Error::configuration(format!("failed to sign {} request", self.service))
                    .with_source(e)
            })?
            .into_parts();

        let headers: Vec<(String, String)> = instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        Ok(headers
            .into_iter()
            .fold(request, |request, (name, value)| request.with_header(name, value)))
    }
}
