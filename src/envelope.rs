//! Admission review envelope as exchanged with the API server.
//!
//! Requests are decoded into a local type that keeps the embedded object as
//! raw JSON: nothing here looks inside it, the metadata extractor parses it
//! separately. Responses are kube's admission types.

use k8s_openapi::api::authentication::v1::UserInfo;
use kube::core::admission::{AdmissionResponse, AdmissionReview, Operation};
use kube::core::{DynamicObject, GroupVersionKind, TypeMeta};
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::WebhookError;

pub const DEFAULT_API_VERSION: &str = "admission.k8s.io/v1";
pub const REVIEW_KIND: &str = "AdmissionReview";

/// Outgoing admission review
pub type ResponseReview = AdmissionReview<DynamicObject>;

/// A decoded review: its type metadata and the request it carries.
#[derive(Debug)]
pub struct ReviewEnvelope {
    pub types: TypeMeta,
    pub request: ReviewRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReview {
    api_version: String,
    kind: String,
    #[serde(default)]
    request: Option<ReviewRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub kind: Option<GroupVersionKind>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub operation: Option<Operation>,
    #[serde(default)]
    pub user_info: UserInfo,
    /// Serialized target object, left untouched
    #[serde(default)]
    pub object: Option<Box<RawValue>>,
}

impl ReviewRequest {
    /// Username of the requesting principal, empty when the API server sent none.
    pub fn username(&self) -> &str {
        self.user_info.username.as_deref().unwrap_or_default()
    }

    /// Raw bytes of the embedded object, if the request carries one.
    pub fn raw_object(&self) -> Option<&[u8]> {
        self.object.as_ref().map(|raw| raw.get().as_bytes())
    }
}

/// Type metadata used when the incoming review could not be decoded.
pub fn default_types() -> TypeMeta {
    TypeMeta {
        api_version: DEFAULT_API_VERSION.to_string(),
        kind: REVIEW_KIND.to_string(),
    }
}

/// An allowed response without a patch.
pub fn allow() -> AdmissionResponse {
    let mut response = AdmissionResponse::invalid("");
    response.allowed = true;
    response.result = Default::default();
    response
}

/// Wrap `response` into an outgoing review of the given version.
pub fn into_review(mut response: AdmissionResponse, types: &TypeMeta) -> ResponseReview {
    response.types = types.clone();
    response.into_review()
}

/// A review with no response section at all
pub fn empty_review(types: &TypeMeta) -> ResponseReview {
    AdmissionReview {
        types: types.clone(),
        request: None,
        response: None,
    }
}

pub fn decode(body: &[u8]) -> Result<ReviewEnvelope, WebhookError> {
    let wire: WireReview = serde_json::from_slice(body).map_err(WebhookError::MalformedEnvelope)?;
    let request = wire.request.ok_or(WebhookError::MissingRequest)?;

    Ok(ReviewEnvelope {
        types: TypeMeta {
            api_version: wire.api_version,
            kind: wire.kind,
        },
        request,
    })
}

pub fn encode(review: &ResponseReview) -> Result<Vec<u8>, WebhookError> {
    serde_json::to_vec(review).map_err(WebhookError::Encode)
}
