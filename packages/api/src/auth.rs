// ABOUTME: Caller identity extraction from gateway-forwarded headers
// ABOUTME: The auth gateway authenticates; this layer only reads and trusts its headers

use axum::{extract::FromRequestParts, http::request::Parts};
use revv_core::{Actor, Role};

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-revv-user";
pub const SHOP_HEADER: &str = "x-revv-shop";
pub const ROLE_HEADER: &str = "x-revv-role";

/// The authenticated caller for a request
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_HEADER).ok_or(ApiError::Unauthorized)?;
        let shop_id = header(parts, SHOP_HEADER).ok_or(ApiError::Unauthorized)?;
        let role: Role = header(parts, ROLE_HEADER)
            .ok_or(ApiError::Unauthorized)?
            .parse()
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(Self(Actor::new(user_id, shop_id, role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CurrentActor, ApiError> {
        let (mut parts, _) = request.into_parts();
        CurrentActor::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_identity_headers() {
        let request = Request::builder()
            .header(USER_HEADER, "user-1")
            .header(SHOP_HEADER, "shop-1")
            .header(ROLE_HEADER, "Admin")
            .body(())
            .unwrap();

        let CurrentActor(actor) = extract(request).await.unwrap();
        assert_eq!(actor, Actor::new("user-1", "shop-1", Role::Admin));
    }

    #[tokio::test]
    async fn test_missing_or_unknown_role_is_unauthorized() {
        let missing = Request::builder()
            .header(USER_HEADER, "user-1")
            .header(SHOP_HEADER, "shop-1")
            .body(())
            .unwrap();
        assert!(matches!(extract(missing).await, Err(ApiError::Unauthorized)));

        let unknown = Request::builder()
            .header(USER_HEADER, "user-1")
            .header(SHOP_HEADER, "shop-1")
            .header(ROLE_HEADER, "superuser")
            .body(())
            .unwrap();
        assert!(matches!(extract(unknown).await, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_blank_shop_is_unauthorized() {
        let request = Request::builder()
            .header(USER_HEADER, "user-1")
            .header(SHOP_HEADER, "  ")
            .header(ROLE_HEADER, "staff")
            .body(())
            .unwrap();
        assert!(matches!(extract(request).await, Err(ApiError::Unauthorized)));
    }
}
