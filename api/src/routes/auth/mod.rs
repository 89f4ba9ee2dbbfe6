//! Session routes: refresh-token rotation and logout

pub mod dev_login;
pub mod logout;
pub mod logout_all;
pub mod refresh;

use std::sync::Arc;

use rotor_core::repositories::{RefreshTokenStore, UserRepository};
use rotor_core::services::SessionService;

/// Application state shared across auth handlers
pub struct AppState<S, U>
where
    S: RefreshTokenStore,
    U: UserRepository,
{
    pub session_service: Arc<SessionService<S, U>>,
}

impl<S, U> AppState<S, U>
where
    S: RefreshTokenStore,
    U: UserRepository,
{
    pub fn new(session_service: Arc<SessionService<S, U>>) -> Self {
        Self { session_service }
    }
}

pub use dev_login::dev_login;
pub use logout::logout;
pub use logout_all::logout_all;
pub use refresh::refresh;
