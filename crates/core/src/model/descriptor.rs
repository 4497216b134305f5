use thiserror::Error;

use crate::model::ids::{GroupId, SessionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Fatal precondition failures raised before any session work begins.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LaunchParamError {
    #[error("missing required launch parameter: {0}")]
    Missing(&'static str),

    #[error("invalid launch parameter {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

//
// ─── SESSION DESCRIPTOR ────────────────────────────────────────────────────────
//

/// Identifies the remote session and word group a drill runs against.
///
/// Supplied by the host at launch and immutable for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDescriptor {
    session_id: SessionId,
    group_id: GroupId,
}

impl SessionDescriptor {
    #[must_use]
    pub fn new(session_id: SessionId, group_id: GroupId) -> Self {
        Self {
            session_id,
            group_id,
        }
    }

    /// Parse the raw launch parameters the host received.
    ///
    /// # Errors
    ///
    /// Returns `LaunchParamError` when either parameter is absent or not a
    /// valid numeric id. Nothing else may run before this check passes.
    pub fn from_params(
        session_id: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<Self, LaunchParamError> {
        let session_raw = session_id.ok_or(LaunchParamError::Missing("sessionId"))?;
        let group_raw = group_id.ok_or(LaunchParamError::Missing("groupId"))?;

        let session_id = session_raw
            .parse::<SessionId>()
            .map_err(|_| LaunchParamError::Invalid {
                name: "sessionId",
                value: session_raw.to_string(),
            })?;
        let group_id = group_raw
            .parse::<GroupId>()
            .map_err(|_| LaunchParamError::Invalid {
                name: "groupId",
                value: group_raw.to_string(),
            })?;

        Ok(Self::new(session_id, group_id))
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
