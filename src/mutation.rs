use std::sync::Arc;

use kube::core::admission::AdmissionResponse;
use log::*;

use crate::config::InjectionSpec;
use crate::envelope::{self, ResponseReview, ReviewRequest};
use crate::error::WebhookError;
use crate::identity;
use crate::metadata;
use crate::patch::create_patch;

/// The only path that produces admission responses.
pub const MUTATE_PATH: &str = "/mutate";

/// Turns admission reviews into username-injecting patches.
#[derive(Clone)]
pub struct MutationServer {
    spec: Arc<InjectionSpec>,
}

impl MutationServer {
    pub fn new(spec: InjectionSpec) -> Self {
        Self {
            spec: Arc::new(spec),
        }
    }

    pub fn spec(&self) -> &InjectionSpec {
        &self.spec
    }

    /// Handle one raw review body received on `path`.
    ///
    /// Undecodable bodies produce a response carrying the decode error.
    /// Reviews from exempt users, or received outside [`MUTATE_PATH`], get an
    /// envelope without a response.
    pub fn review(&self, path: &str, body: &[u8]) -> ResponseReview {
        let review = match envelope::decode(body) {
            Ok(review) => review,
            Err(err) => {
                error!("Can't decode body: {}", err);
                return envelope::into_review(
                    AdmissionResponse::invalid(err.to_string()),
                    &envelope::default_types(),
                );
            }
        };

        let request = &review.request;
        if identity::is_exempt(request.username()) {
            debug!(
                "Skipping review {} from exempt user {}",
                request.uid,
                request.username()
            );
            return envelope::empty_review(&review.types);
        }
        if path != MUTATE_PATH {
            debug!("Not mutating review {} received on {}", request.uid, path);
            return envelope::empty_review(&review.types);
        }

        let mut response = match self.mutate(request) {
            Ok(response) => response,
            Err(err) => {
                error!("{}", err);
                AdmissionResponse::invalid(err.to_string())
            }
        };
        response.uid = request.uid.clone();
        envelope::into_review(response, &review.types)
    }

    fn mutate(&self, request: &ReviewRequest) -> Result<AdmissionResponse, WebhookError> {
        info!(
            "AdmissionReview for Kind={} Namespace={} Name={} UID={} Operation={:?} User={}",
            request.kind.as_ref().map(|k| k.kind.as_str()).unwrap_or_default(),
            request.namespace.as_deref().unwrap_or_default(),
            request.name.as_deref().unwrap_or_default(),
            request.uid,
            request.operation,
            request.username(),
        );

        let raw = match request.raw_object() {
            Some(raw) => raw,
            None => {
                debug!("Review {} carries no object, allowing unchanged", request.uid);
                return Ok(envelope::allow());
            }
        };

        let existing = metadata::extract(raw)?;
        let injections = self.spec.injections(request.username());
        let patch = create_patch(existing, &injections);
        let response = envelope::allow().with_patch(patch)?;

        info!(
            "AdmissionResponse: patch={}",
            String::from_utf8_lossy(response.patch.as_deref().unwrap_or_default())
        );
        Ok(response)
    }
}
