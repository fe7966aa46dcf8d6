use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Header identifying the acting user. Absent means an internal caller.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header toggling access checks. Defaults to enabled.
pub const CHECK_ACCESS_HEADER: &str = "x-check-access";

/// Caller context threaded through the service layer.
///
/// Field protection and access-dependent behavior key off `user_id` and
/// `check_access`: internal callers (no user) and callers that explicitly
/// disable checking bypass the modification guard. `locations` and `as_of`
/// scope stock quantity reads and are filled in by the handlers from query
/// parameters.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: Option<Uuid>,
    pub check_access: bool,
    pub locations: Vec<Uuid>,
    pub as_of: Option<NaiveDate>,
}

impl RequestContext {
    /// Context for internal work such as generated-product persistence.
    pub fn system() -> Self {
        Self {
            user_id: None,
            check_access: false,
            locations: Vec::new(),
            as_of: None,
        }
    }

    /// Context for a named user with access checking on.
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            check_access: true,
            locations: Vec::new(),
            as_of: None,
        }
    }

    pub fn with_locations(mut self, locations: Vec<Uuid>) -> Self {
        self.locations = locations;
        self
    }

    pub fn with_stock_date(mut self, as_of: Option<NaiveDate>) -> Self {
        self.as_of = as_of;
        self
    }

    /// Whether protected-field rules apply to this caller.
    pub fn enforces_access(&self) -> bool {
        self.check_access && self.user_id.is_some()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::system()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = match parts.headers.get(USER_ID_HEADER) {
            Some(value) => {
                let raw = value.to_str().map_err(|_| {
                    ServiceError::Unauthorized("Invalid x-user-id header".to_string())
                })?;
                let parsed = Uuid::parse_str(raw).map_err(|_| {
                    ServiceError::Unauthorized(format!("Invalid user id: {}", raw))
                })?;
                Some(parsed)
            }
            None => None,
        };

        let check_access = parts
            .headers
            .get(CHECK_ACCESS_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "off"))
            .unwrap_or(true);

        Ok(Self {
            user_id,
            check_access,
            locations: Vec::new(),
            as_of: None,
        })
    }
}
