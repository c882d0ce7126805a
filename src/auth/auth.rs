use crate::auth::jwt::ERROR_TOKEN_NOT_FOUND;
use crate::error::ApiError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// The authenticated caller. The route-guard middleware decodes the bearer
/// token once per request and stashes this in the request extensions; the
/// extractor only reads it back out.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub uid: u64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthUser>().cloned();

        ready(match user {
            Some(user) => Ok(user),
            // Reached only when a handler is mounted outside the guarded
            // scope, so the middleware never ran for this request.
            None => Err(ApiError::unauthorized(ERROR_TOKEN_NOT_FOUND).into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn extractor_reads_the_stashed_identity() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthUser {
            uid: 7,
            email: "grace@example.com".to_string(),
            role: Role::Staff,
        });

        let user = AuthUser::extract(&req).await.unwrap();

        assert_eq!(user.uid, 7);
        assert_eq!(user.email, "grace@example.com");
        assert_eq!(user.role, Role::Staff);
    }

    #[actix_web::test]
    async fn extractor_rejects_requests_the_guard_never_saw() {
        let req = TestRequest::default().to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());
    }
}
