use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::{
    BadgeService, GroupService, GroupStore, InMemoryStore, LeaderboardService, MatchService,
    MatchStore, PredictionService, PredictionStore, ScoringEngine, UserStore,
};
use persistence::repositories::{
    GroupRepository, MatchRepository, PredictionRepository, UserRepository,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{groups, health, leaderboard, matches, predictions, users};
use crate::services::MatchFeedClient;

/// Storage backends behind the domain services.
#[derive(Clone)]
pub struct Stores {
    pub matches: Arc<dyn MatchStore>,
    pub groups: Arc<dyn GroupStore>,
    pub users: Arc<dyn UserStore>,
    pub predictions: Arc<dyn PredictionStore>,
}

impl Stores {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            matches: Arc::new(MatchRepository::new(pool.clone())),
            groups: Arc::new(GroupRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            predictions: Arc::new(PredictionRepository::new(pool.clone())),
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            matches: store.clone(),
            groups: store.clone(),
            users: store.clone(),
            predictions: store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Present when running against PostgreSQL; used by health checks.
    pub pool: Option<PgPool>,
    pub matches: Arc<MatchService>,
    pub groups: Arc<GroupService>,
    pub predictions: Arc<PredictionService>,
    pub leaderboard: Arc<LeaderboardService>,
    pub badges: Arc<BadgeService>,
    pub scoring: Arc<ScoringEngine>,
    pub match_feed: Option<Arc<MatchFeedClient>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        stores: Stores,
        pool: Option<PgPool>,
        match_feed: Option<Arc<MatchFeedClient>>,
    ) -> Self {
        let scoring = Arc::new(ScoringEngine::new(
            stores.matches.clone(),
            stores.predictions.clone(),
            config.scoring.rules(),
            config.scoring.lock_timeout(),
        ));

        Self {
            badges: Arc::new(BadgeService::new(
                stores.users.clone(),
                stores.groups.clone(),
                stores.matches.clone(),
                stores.predictions.clone(),
            )),
            matches: Arc::new(MatchService::new(stores.matches.clone())),
            groups: Arc::new(GroupService::new(
                stores.groups.clone(),
                stores.users.clone(),
            )),
            predictions: Arc::new(PredictionService::new(
                stores.matches,
                stores.groups.clone(),
                stores.predictions.clone(),
                config.predictions.policy(),
            )),
            leaderboard: Arc::new(LeaderboardService::new(
                stores.groups,
                stores.users,
                stores.predictions,
            )),
            scoring,
            config,
            pool,
            match_feed,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let match_routes = Router::new()
        .route(
            "/api/v1/matches",
            post(matches::create_match).get(matches::list_matches),
        )
        .route(
            "/api/v1/matches/:match_id",
            get(matches::get_match).patch(matches::update_match),
        )
        .route(
            "/api/v1/matches/:match_id/calculate-points",
            post(matches::calculate_points),
        );

    let group_routes = Router::new()
        .route(
            "/api/v1/groups",
            post(groups::create_group).get(groups::list_groups),
        )
        .route("/api/v1/groups/join", post(groups::join_group))
        .route("/api/v1/groups/:group_id", get(groups::get_group))
        .route("/api/v1/groups/:group_id/leave", post(groups::leave_group))
        .route(
            "/api/v1/groups/:group_id/leaderboard",
            get(groups::get_leaderboard),
        )
        .route(
            "/api/v1/groups/:group_id/predictions",
            get(predictions::list_group_predictions),
        )
        .route(
            "/api/v1/groups/:group_id/users/:user_id/stats",
            get(groups::get_user_group_stats),
        )
        .route(
            "/api/v1/groups/:group_id/matches/:match_id/prediction",
            put(predictions::submit_prediction),
        )
        .route(
            "/api/v1/groups/:group_id/matches/:match_id/predictions",
            get(predictions::list_predictions),
        );

    let stats_routes = Router::new()
        .route("/api/v1/users/:user_id/stats", get(users::get_user_stats))
        .route("/api/v1/users/:user_id/badges", get(users::get_user_badges))
        .route(
            "/api/v1/leaderboard",
            get(leaderboard::get_global_leaderboard),
        );

    Router::new()
        .merge(public_routes)
        .merge(match_routes)
        .merge(group_routes)
        .merge(stats_routes)
        // Bottom layers run first.
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}

/// Router backed by PostgreSQL.
pub fn create_app(
    config: Config,
    pool: PgPool,
    match_feed: Option<Arc<MatchFeedClient>>,
) -> (AppState, Router) {
    let stores = Stores::postgres(&pool);
    let state = AppState::new(Arc::new(config), stores, Some(pool), match_feed);
    (state.clone(), create_router(state))
}
