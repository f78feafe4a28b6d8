#[tokio::main]
async fn main() {
    use herald_agent::{HttpAgentBackend, JobRunner};
    use herald_authz::{AccessToken, Capability, StaticTokenProvider};
    use herald_server::{
        bindings::binding_table,
        config::ServerConfig,
        reply::HttpReplyChannel,
        routes::{AppState, router},
        service::BotService,
    };
    use herald_state::MemoryStateStore;
    use std::sync::Arc;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    // Agent job runner, when the feature is on and fully configured
    let runner = if config.features.enable_agent {
        match config.agent_backend_config() {
            Some(backend_config) => {
                let backend =
                    HttpAgentBackend::new(backend_config).expect("failed to build agent backend");
                Some(Arc::new(JobRunner::new(
                    Arc::new(backend),
                    config.polling.policy(),
                )))
            }
            None => {
                tracing::warn!(
                    "agent feature enabled but AI_FOUNDRY_ENDPOINT, AI_FOUNDRY_AGENT_ID, or AI_FOUNDRY_API_KEY is missing"
                );
                None
            }
        }
    } else {
        None
    };

    // Capability tokens arrive through configuration
    let mut tokens = StaticTokenProvider::empty();
    if let Some(token) = &config.agent_session_token {
        tokens = tokens.with_token(Capability::agent_session(), AccessToken::new(token.clone()));
    }

    let binding_router = binding_table(
        &config.features,
        runner,
        config.ai_foundry_model_name.clone(),
    )
    .expect("failed to build binding table");
    tracing::info!(bindings = binding_router.len(), "Binding table built");

    let reply_routes = Arc::new(HttpReplyChannel::new(config.reply_base_url.clone()));
    let service = BotService::new(
        binding_router,
        Arc::new(MemoryStateStore::new()),
        Arc::new(tokens),
        reply_routes.clone(),
    );

    let app = router(AppState {
        service: Arc::new(service),
        reply_routes,
    });

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
