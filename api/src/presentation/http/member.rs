use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

pub const MEMBER_HEADER: &str = "x-member-id";

/// Acting member, taken from the `x-member-id` header (0 when absent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Member
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(MEMBER_HEADER) {
            None => Ok(Member(0)),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|id| *id >= 0)
                .map(Member)
                .ok_or(StatusCode::BAD_REQUEST),
        }
    }
}
