//! Client side of the recipe catalog: typed HTTP access and the session.

mod api;
mod session;

pub use api::{ApiClient, ClientError, LoginResponse};
pub use session::{Session, TOKEN_KEY, USER_KEY};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::db::test_support::{setup_db, TestContext};
    use crate::server::{router, AppState, TokenStore};

    /// A real server on an ephemeral localhost port.
    pub struct TestServer {
        pub url: String,
        pub state: AppState,
        _ctx: TestContext,
    }

    pub async fn spawn_server() -> TestServer {
        let ctx = setup_db().await;
        let state = AppState::new(ctx.pool.clone(), Arc::new(TokenStore::new(60)));
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            url: format!("http://{}", addr),
            state,
            _ctx: ctx,
        }
    }
}
