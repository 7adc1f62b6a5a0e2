//! Single binary host: tournaments in memory behind a JSON API, plus a spectator mirror.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Default tournament options can be given as JSON in TOURNAMENT_OPTIONS.
//!
//! Every accepted change is published into the mirror, so other devices can follow a
//! tournament through /api/spectate/{id} without touching the live engine.

use actix_web::{
    get, post, put,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use arena_tournament::{
    ErrorKind, FormatId, FormatInfo, GameMatch, GameState, Player, PlayerId, PolicyManager,
    ReplicatedResult, ResultMeta, SchedulingPolicy, Standing, TournamentError, TournamentId,
    TournamentOptions, TournamentSnapshot,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Per-tournament entry: the live policy + last activity time (for auto-cleanup).
struct TournamentEntry {
    policy: Box<dyn SchedulingPolicy>,
    last_activity: Instant,
}

/// Last published snapshot per tournament, as spectators see it.
type Mirror = Arc<RwLock<HashMap<TournamentId, TournamentSnapshot>>>;

struct Host {
    manager: PolicyManager,
    tournaments: Mutex<HashMap<TournamentId, TournamentEntry>>,
    mirror: Mirror,
}

type AppState = Data<Host>;

/// Inactivity threshold: tournaments not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    format: FormatId,
    players: Vec<String>,
    #[serde(default)]
    options: Option<TournamentOptions>,
}

#[derive(Deserialize)]
struct ResultBody {
    winner_id: PlayerId,
    #[serde(default)]
    meta: Option<ResultMeta>,
}

#[derive(Deserialize)]
struct FormatsQuery {
    players: Option<usize>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Serialize)]
struct FormatListing {
    #[serde(flatten)]
    info: FormatInfo,
    estimate: Option<arena_tournament::DurationEstimate>,
}

/// What the controlling device renders after each call.
#[derive(Serialize)]
struct TournamentView<'a> {
    format: FormatId,
    version: u64,
    state: &'a GameState,
    next_match: Option<GameMatch>,
    standings: Vec<Standing>,
    winner: Option<&'a Player>,
    can_undo: bool,
}

impl<'a> TournamentView<'a> {
    fn of(policy: &'a dyn SchedulingPolicy) -> Self {
        Self {
            format: policy.format(),
            version: policy.version(),
            state: policy.state(),
            next_match: policy.next_match(),
            standings: policy.standings(),
            winner: policy.winner(),
            can_undo: policy.can_undo(),
        }
    }
}

fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e.kind() {
        ErrorKind::NoHistory => HttpResponse::Conflict().json(body),
        ErrorKind::Internal => {
            log::error!("engine invariant broken: {e}");
            HttpResponse::InternalServerError().json(body)
        }
        ErrorKind::Validation | ErrorKind::InvalidResult | ErrorKind::IllegalAction => {
            HttpResponse::BadRequest().json(body)
        }
    }
}

/// Look up a tournament and refresh its last_activity, so any access keeps it alive.
fn touch(
    table: &mut HashMap<TournamentId, TournamentEntry>,
    id: TournamentId,
) -> Option<&mut TournamentEntry> {
    let entry = table.get_mut(&id)?;
    entry.last_activity = Instant::now();
    Some(entry)
}

/// Store the latest snapshot for spectators.
fn publish_to(mirror: &Mirror, id: TournamentId, snapshot: &TournamentSnapshot) {
    if let Ok(mut m) = mirror.write() {
        m.insert(id, snapshot.clone());
    }
}

/// Load a remote snapshot; when it is accepted, spectators get it too (under the local id).
fn load_remote(
    policy: &mut dyn SchedulingPolicy,
    mirror: &Mirror,
    snapshot: TournamentSnapshot,
) -> Result<bool, TournamentError> {
    let id = policy.state().id;
    let loaded = policy.load_snapshot(snapshot)?;
    if loaded {
        publish_to(mirror, id, &policy.snapshot());
    } else {
        log::debug!("tournament {id}: stale snapshot ignored");
    }
    Ok(loaded)
}

/// Lock the tournament table, touch the entry and run `action` on its policy.
fn with_tournament<F>(state: &AppState, id: TournamentId, action: F) -> HttpResponse
where
    F: FnOnce(&mut dyn SchedulingPolicy) -> Result<(), TournamentError>,
{
    let mut g = match state.tournaments.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match touch(&mut g, id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    let policy = entry.policy.as_mut();
    match action(&mut *policy) {
        Ok(()) => HttpResponse::Ok().json(TournamentView::of(policy)),
        Err(e) => error_response(&e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "arena-tournament",
    })
}

/// List formats; with ?players=N each carries a duration estimate (null if N is out of range).
#[get("/api/formats")]
async fn api_formats(state: AppState, query: Query<FormatsQuery>) -> HttpResponse {
    let listings: Vec<FormatListing> = state
        .manager
        .formats()
        .into_iter()
        .map(|info| {
            let estimate = query
                .players
                .and_then(|n| state.manager.estimate(info.id, n, None).ok());
            FormatListing { info, estimate }
        })
        .collect();
    HttpResponse::Ok().json(listings)
}

/// Create a tournament in Setup (returns it with id; client stores id for subsequent requests).
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    let mut policy = match state.manager.create(body.format, &body.players, body.options) {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };
    let id = policy.state().id;
    let mirror = Arc::clone(&state.mirror);
    policy.set_publisher(Box::new(move |snapshot: &TournamentSnapshot| {
        publish_to(&mirror, id, snapshot)
    }));
    log::info!("created {} tournament {id}", body.format);

    let mut g = match state.tournaments.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = g.entry(id).or_insert(TournamentEntry {
        policy,
        last_activity: Instant::now(),
    });
    HttpResponse::Ok().json(TournamentView::of(entry.policy.as_ref()))
}

/// Get a tournament by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |_| Ok(()))
}

#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.tournaments.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match touch(&mut g, path.id) {
        Some(entry) => HttpResponse::Ok().json(entry.policy.standings()),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    }
}

/// Start the tournament (Setup -> Playing).
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |p| p.start().map(|_| ()))
}

/// Report the winner of the current match.
#[post("/api/tournaments/{id}/result")]
async fn api_report_result(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<ResultBody>,
) -> HttpResponse {
    with_tournament(&state, path.id, |p| {
        p.apply_result(body.winner_id, body.meta).map(|_| ())
    })
}

/// Streak format: champion takes the rest.
#[post("/api/tournaments/{id}/rest")]
async fn api_take_rest(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |p| p.take_rest().map(|_| ()))
}

/// Streak format: champion plays on.
#[post("/api/tournaments/{id}/continue")]
async fn api_continue_play(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |p| p.continue_play().map(|_| ()))
}

#[post("/api/tournaments/{id}/undo")]
async fn api_undo(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |p| p.undo().map(|_| ()))
}

/// End now; current standings become final.
#[post("/api/tournaments/{id}/end")]
async fn api_end_early(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |p| p.end_early().map(|_| ()))
}

/// Replace local state with a newer snapshot from another device (stale ones are ignored).
#[put("/api/tournaments/{id}/snapshot")]
async fn api_load_snapshot(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<TournamentSnapshot>,
) -> HttpResponse {
    let snapshot = body.into_inner();
    with_tournament(&state, path.id, |p| {
        load_remote(p, &state.mirror, snapshot).map(|_| ())
    })
}

/// Apply a result relayed from another device; duplicates are no-ops.
#[post("/api/tournaments/{id}/replicated")]
async fn api_replicated_result(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<ReplicatedResult>,
) -> HttpResponse {
    with_tournament(&state, path.id, |p| p.apply_replicated(&body).map(|_| ()))
}

/// Spectator view: the last published snapshot.
#[get("/api/spectate/{id}")]
async fn api_spectate(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let m = match state.mirror.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match m.get(&path.id) {
        Some(snapshot) => HttpResponse::Ok().json(snapshot),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "Nothing published" })),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_options() -> TournamentOptions {
    let Ok(raw) = std::env::var("TOURNAMENT_OPTIONS") else {
        return TournamentOptions::default();
    };
    match serde_json::from_str::<TournamentOptions>(&raw) {
        Ok(opts) => match opts.validate() {
            Ok(()) => opts,
            Err(e) => {
                log::warn!("TOURNAMENT_OPTIONS rejected ({e}); using defaults");
                TournamentOptions::default()
            }
        },
        Err(e) => {
            log::warn!("TOURNAMENT_OPTIONS is not valid JSON ({e}); using defaults");
            TournamentOptions::default()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(Host {
        manager: PolicyManager::new(default_options()),
        tournaments: Mutex::new(HashMap::new()),
        mirror: Arc::new(RwLock::new(HashMap::new())),
    });

    // Background task: every 30 minutes, remove tournaments inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let removed: Vec<TournamentId> = match state_cleanup.tournaments.lock() {
                Ok(mut g) => {
                    let stale: Vec<TournamentId> = g
                        .iter()
                        .filter(|(_, entry)| entry.last_activity.elapsed() >= INACTIVITY_TIMEOUT)
                        .map(|(id, _)| *id)
                        .collect();
                    for id in &stale {
                        g.remove(id);
                    }
                    stale
                }
                Err(_) => continue,
            };
            if removed.is_empty() {
                continue;
            }
            if let Ok(mut m) = state_cleanup.mirror.write() {
                for id in &removed {
                    m.remove(id);
                }
            }
            log::info!(
                "Cleaned up {} inactive tournament(s) (no activity for 12h)",
                removed.len()
            );
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(1 << 20))
            .service(api_health)
            .service(api_formats)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_standings)
            .service(api_start_tournament)
            .service(api_report_result)
            .service(api_take_rest)
            .service(api_continue_play)
            .service(api_undo)
            .service(api_end_early)
            .service(api_load_snapshot)
            .service(api_replicated_result)
            .service(api_spectate)
    })
    .bind(bind)?
    .run()
    .await
}
