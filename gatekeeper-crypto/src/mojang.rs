//! Identity-server HTTPS calls.
//!
//! Three endpoints are used: `authenticate` (exchange account credentials
//! for a session token — this proxy holds its own game account and performs
//! this step once per session, on behalf of the connecting player),
//! `join` (tell the identity server this client is about to join a given
//! server hash), and `hasJoined` (verify that a client has performed `join`).
//!
//! `hasJoined` is not reached by the session script this crate implements
//! (see the design notes on intercept-only-upstream vs. full MITM) but is
//! kept as a public building block for a full-MITM extension.

use serde::{Deserialize, Serialize};

use crate::AuthError;

const AUTHENTICATE_URL: &str = "https://authserver.mojang.com/authenticate";
const JOIN_URL: &str = "https://sessionserver.mojang.com/session/minecraft/join";
const HAS_JOINED_URL: &str = "https://sessionserver.mojang.com/session/minecraft/hasJoined";

#[derive(Debug, Serialize)]
struct AuthenticateAgent {
    name: &'static str,
    version: u32,
}

#[derive(Debug, Serialize)]
struct AuthenticateRequest<'a> {
    agent: AuthenticateAgent,
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthenticateProfile {
    id: String,
    #[allow(dead_code, reason = "kept for API completeness, not read by the session script")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AuthenticateResponseWire {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "selectedProfile")]
    selected_profile: AuthenticateProfile,
}

/// The result of a successful `authenticate` call.
#[derive(Debug, Clone)]
pub struct AuthenticateResponse {
    /// Bearer token used by subsequent `join` calls.
    pub access_token: String,
    /// The account's selected game-profile UUID.
    pub selected_profile_id: String,
}

#[derive(Debug, Serialize)]
struct JoinRequest<'a> {
    #[serde(rename = "accessToken")]
    access_token: &'a str,
    #[serde(rename = "selectedProfile")]
    selected_profile: &'a str,
    #[serde(rename = "serverId")]
    server_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct HasJoinedResponseWire {
    id: String,
}

/// The result of a successful `hasJoined` call.
#[derive(Debug, Clone)]
pub struct HasJoinedResponse {
    /// The verified player's UUID (undashed, as returned by the identity server).
    pub uuid: String,
}

/// A thin HTTPS client over the three identity-server endpoints.
#[derive(Debug, Clone, Default)]
pub struct MojangClient {
    http: reqwest::Client,
}

impl MojangClient {
    /// Builds a client with a fresh connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }

    /// Exchanges account credentials for an access token and selected profile.
    ///
    /// # Errors
    /// Returns [`AuthError::Request`] on transport failure, [`AuthError::FailedResponse`]
    /// on a non-2xx status, or [`AuthError::FailedParse`] if the body is not the expected shape.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AuthenticateResponse, AuthError> {
        let request = AuthenticateRequest {
            agent: AuthenticateAgent { name: "Minecraft", version: 1 },
            username,
            password,
        };

        let response = self.http.post(AUTHENTICATE_URL).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::FailedResponse(status));
        }

        let body: AuthenticateResponseWire = response.json().await?;
        Ok(AuthenticateResponse {
            access_token: body.access_token,
            selected_profile_id: body.selected_profile.id,
        })
    }

    /// Tells the identity server this session is about to join `server_id_hash`.
    ///
    /// # Errors
    /// Returns [`AuthError::Request`] on transport failure or [`AuthError::FailedResponse`]
    /// on a non-2xx status.
    pub async fn join(&self, access_token: &str, selected_profile: &str, server_id_hash: &str) -> Result<(), AuthError> {
        let request = JoinRequest {
            access_token,
            selected_profile,
            server_id: server_id_hash,
        };

        let response = self.http.post(JOIN_URL).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::FailedResponse(status));
        }

        Ok(())
    }

    /// Verifies that `username` previously called `join` with `server_id_hash`.
    ///
    /// # Errors
    /// Returns [`AuthError::Request`] on transport failure, [`AuthError::UnverifiedSession`]
    /// if the identity server reports no session, or [`AuthError::FailedParse`] on a malformed body.
    pub async fn has_joined(&self, username: &str, server_id_hash: &str) -> Result<HasJoinedResponse, AuthError> {
        let response = self
            .http
            .get(HAS_JOINED_URL)
            .query(&[("username", username), ("serverId", server_id_hash)])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Err(AuthError::UnverifiedSession);
        }
        if !status.is_success() {
            return Err(AuthError::FailedResponse(status));
        }

        let body: HasJoinedResponseWire = response.json().await?;
        Ok(HasJoinedResponse { uuid: body.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticate_request_serializes_expected_shape() {
        let request = AuthenticateRequest {
            agent: AuthenticateAgent { name: "Minecraft", version: 1 },
            username: "user",
            password: "pass",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["agent"]["name"], "Minecraft");
        assert_eq!(json["username"], "user");
        assert_eq!(json["password"], "pass");
    }

    #[test]
    fn has_joined_response_parses_id_field() {
        let body = serde_json::json!({ "id": "abc123", "properties": [] });
        let parsed: HasJoinedResponseWire = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.id, "abc123");
    }
}
