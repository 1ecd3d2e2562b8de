//! Request/response types for the auth flow endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct FlowStartRequest {
    /// One of `login`, `signup`, `reset-password`.
    pub flow: String,
    pub email: String,
    pub password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct FlowOtpRequest {
    pub flow_id: String,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct FlowResendRequest {
    pub flow_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct FlowNewPasswordRequest {
    pub flow_id: String,
    pub password: String,
    pub confirm_password: String,
}

/// Snapshot of a flow the page renderer switches on.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct FlowResponse {
    pub flow: String,
    pub stage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn flow_start_request_round_trips() -> Result<()> {
        let request = FlowStartRequest {
            flow: "login".to_string(),
            email: "alice@example.com".to_string(),
            password: None,
        };
        let value = serde_json::to_value(&request)?;
        let decoded: FlowStartRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.flow, "login");
        assert_eq!(decoded.email, "alice@example.com");
        assert!(decoded.password.is_none());
        Ok(())
    }

    #[test]
    fn flow_response_omits_empty_fields() -> Result<()> {
        let response = FlowResponse {
            flow: "signup".to_string(),
            stage: 1,
            flow_id: None,
            masked_email: None,
            redirect_to: None,
        };
        let value = serde_json::to_value(&response)?;
        assert!(value.get("flow_id").is_none());
        assert!(value.get("masked_email").is_none());
        assert!(value.get("redirect_to").is_none());
        Ok(())
    }
}
