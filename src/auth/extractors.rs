use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::{bearer_token, Claims};
use crate::error::AppError;

/// The caller, as established by `AuthMiddleware`.
///
/// Only usable on routes wrapped by the middleware; anywhere else the claims
/// are absent and extraction fails with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub is_staff: bool,
}

impl From<&Claims> for AuthenticatedUser {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            is_staff: claims.staff,
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<Claims>().map(AuthenticatedUser::from);
        match user {
            Some(user) => ready(Ok(user)),
            None => ready(Err(AppError::Unauthorized(
                "Authentication credentials were not provided".to_string(),
            )
            .into())),
        }
    }
}

/// The raw bearer token of the request together with its claims. Used by logout.
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub token: String,
    pub claims: Claims,
}

impl FromRequest for BearerToken {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req.headers()).map(str::to_string);
        let claims = req.extensions().get::<Claims>().cloned();
        match (token, claims) {
            (Some(token), Some(claims)) => ready(Ok(BearerToken { token, claims })),
            _ => ready(Err(AppError::Unauthorized("Missing token".to_string()).into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{header, StatusCode};
    use actix_web::test;

    fn claims(sub: i32, staff: bool) -> Claims {
        Claims {
            sub,
            staff,
            exp: usize::MAX,
        }
    }

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(claims(123, true));

        let user = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(
            user,
            AuthenticatedUser {
                id: 123,
                is_staff: true
            }
        );
    }

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let err = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_bearer_token_extractor() {
        let req = test::TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        req.extensions_mut().insert(claims(5, false));

        let bearer = BearerToken::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(bearer.token, "abc.def.ghi");
        assert_eq!(bearer.claims.sub, 5);
    }
}
