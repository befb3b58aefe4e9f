//! Every message the background answers.

use serde::{Deserialize, Serialize};

use exnota_core::result::{
    ClientIdError, ConnectError, NotionError, RepositoryError, SetTokenError,
};
use exnota_core::usecase::ConnectResponse;

use crate::message::Message;

/// Input or output with no fields. Encodes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInput {
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationResult {
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPayload {
    pub result: ValidationResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdPayload {
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInput {
    pub code: String,
    pub redirect_url: String,
}

/// Read the stored Notion token.
pub struct GetToken;

impl Message for GetToken {
    const NAME: &'static str = "notion.getToken";
    type Input = Empty;
    type Output = TokenPayload;
    type Error = RepositoryError;
}

/// Store a pasted integration token.
pub struct SetToken;

impl Message for SetToken {
    const NAME: &'static str = "notion.setToken";
    type Input = TokenInput;
    type Output = Empty;
    type Error = SetTokenError;
}

/// Forget the stored token.
pub struct ClearToken;

impl Message for ClearToken {
    const NAME: &'static str = "notion.clearToken";
    type Input = Empty;
    type Output = Empty;
    type Error = RepositoryError;
}

/// Check a candidate integration token against Notion without storing it.
pub struct ValidateIntegrationToken;

impl Message for ValidateIntegrationToken {
    const NAME: &'static str = "setup.validate-notion-integration-token";
    type Input = TokenInput;
    type Output = ValidationPayload;
    type Error = NotionError;
}

/// The public OAuth client id used to build the authorize URL.
pub struct GetClientId;

impl Message for GetClientId {
    const NAME: &'static str = "auth.getClientId";
    type Input = Empty;
    type Output = ClientIdPayload;
    type Error = ClientIdError;
}

/// Exchange an authorization code and persist the resulting token.
pub struct Connect;

impl Message for Connect {
    const NAME: &'static str = "auth.connect";
    type Input = ConnectInput;
    type Output = ConnectResponse;
    type Error = ConnectError;
}

pub const MESSAGE_NAMES: &[&str] = &[
    GetToken::NAME,
    SetToken::NAME,
    ClearToken::NAME,
    ValidateIntegrationToken::NAME,
    GetClientId::NAME,
    Connect::NAME,
];
