#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;
#[cfg(test)]
use crate::features::auth::models::UserRole;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};
#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
#[allow(dead_code)]
pub fn create_admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: Uuid::new_v4(),
        name: "Test Admin".to_string(),
        email: "admin@test.local".to_string(),
        role: UserRole::Admin,
    }
}

#[cfg(test)]
#[allow(dead_code)]
pub fn create_photographer_user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: Uuid::new_v4(),
        name: "Test Photographer".to_string(),
        email: "photographer@test.local".to_string(),
        role: UserRole::Photographer,
    }
}

#[cfg(test)]
#[allow(dead_code)]
pub fn with_user_auth(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                let response: Response = next.run(request).await;
                response
            }
        },
    ))
}
