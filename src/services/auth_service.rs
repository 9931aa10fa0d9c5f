use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::accounts::AccountService;
use crate::models::User as UserModel;
use crate::proto::auth::auth_service_server::AuthService;
use crate::proto::auth::{AuthResponse, LoginRequest, RegisterRequest, User, UserResponse};
use crate::proto::common::Empty;
use crate::session::Session;

pub struct AuthServiceImpl {
    accounts: Arc<AccountService>,
}

impl AuthServiceImpl {
    pub fn new(accounts: Arc<AccountService>) -> Self {
        Self { accounts }
    }
}

/// Session placed in extensions by `AuthLayer`.
pub fn get_session<T>(request: &Request<T>) -> Result<Session, Status> {
    request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| Status::unauthenticated("Authentication required"))
}

pub fn user_to_proto(user: &UserModel) -> User {
    User {
        id: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role.to_string(),
        location: user.location.clone().unwrap_or_default(),
        created_at: user.created_at.to_rfc3339(),
    }
}

#[tonic::async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<UserResponse>, Status> {
        let req = request.into_inner();
        let user = self
            .accounts
            .register(&req.name, &req.email, &req.password)
            .await?;

        Ok(Response::new(UserResponse {
            user: Some(user_to_proto(&user)),
        }))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<AuthResponse>, Status> {
        let req = request.into_inner();
        let outcome = self.accounts.login(&req.email, &req.password).await?;

        Ok(Response::new(AuthResponse {
            token: outcome.token,
            expires_at: outcome.expires_at.to_rfc3339(),
            user: Some(user_to_proto(&outcome.session.user)),
        }))
    }

    async fn current_user(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<UserResponse>, Status> {
        let session = get_session(&request)?;
        Ok(Response::new(UserResponse {
            user: Some(user_to_proto(&session.user)),
        }))
    }

    async fn logout(&self, request: Request<Empty>) -> Result<Response<Empty>, Status> {
        let session = get_session(&request)?;
        self.accounts.logout(&session).await;
        Ok(Response::new(Empty {}))
    }
}
