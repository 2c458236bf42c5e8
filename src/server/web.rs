use std::convert::Infallible;

use log::{debug, error};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};
use warp::{
    http::StatusCode,
    hyper::Uri,
    reply::{Reply, Response},
    Filter, Rejection,
};

use crate::controller::{
    status::{ServerStatus, StartOutcome, WorkloadSnapshot},
    ControllerError,
};
use crate::notify::board::BoardView;

use super::{config::WebConfig, shared::{AppState, Message}};

#[derive(Debug, Deserialize)]
struct StartQuery {
    requested_by: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusPage {
    status: ServerStatus,
    workload: Option<WorkloadSnapshot>,
    idle_timeout: u32,
    #[serde(flatten)]
    board: BoardView,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn server(config: &WebConfig, state: AppState, message_tx: &broadcast::Sender<Message>) {
    let route = routes(state).with(warp::log(module_path!()));

    let message_clone = message_tx.clone();
    let shutdown = async move {
        let mut message_rx = message_clone.subscribe();
        while let Ok(msg) = message_rx.recv().await {
            if msg == Message::Shutdown {
                break;
            }
        }
    };

    match &config.tls {
        Some(tls) => {
            let (addr, server) = warp::serve(route)
                .tls()
                .cert_path(&tls.cert)
                .key_path(&tls.key)
                .bind_with_graceful_shutdown(config.listen, shutdown);
            debug!("Listening on https://{}", addr);
            server.await
        }
        None => {
            let (addr, server) = warp::serve(route).bind_with_graceful_shutdown(config.listen, shutdown);
            debug!("Listening on http://{}", addr);
            server.await
        }
    }
}

pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let index_route = warp::get()
        .and(warp::path::end())
        .map(|| warp::redirect::found(Uri::from_static("/status")));

    let state_filter = warp::any().map(move || state.clone());

    let status_route = warp::get()
        .and(warp::path("status")).and(warp::path::end())
        .and(state_filter.clone())
        .and_then(status)
        .map(|reply| warp::reply::with_header(reply, warp::http::header::REFRESH, "30"));

    let start_route = warp::post()
        .and(warp::path("start")).and(warp::path::end())
        .and(warp::query::<StartQuery>())
        .and(state_filter.clone())
        .and_then(start);

    let stop_route = warp::post()
        .and(warp::path("stop")).and(warp::path::end())
        .and(state_filter)
        .and_then(stop);

    warp::any().and(
        index_route
        .or(status_route)
        .or(start_route)
        .or(stop_route)
    ).map(|reply| {
        warp::reply::with_header(reply, "server", format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
    })
}

async fn status(state: AppState) -> Result<Response, Infallible> {
    let page = StatusPage {
        status: state.controller.status().await,
        workload: state.controller.workload().await,
        idle_timeout: state.controller.idle_timeout(),
        board: state.board.view().await,
    };
    Ok(warp::reply::json(&page).into_response())
}

/// Replies once the start has been accepted, not when the workload is up.
async fn start(query: StartQuery, state: AppState) -> Result<Response, Infallible> {
    let (accepted_tx, accepted_rx) = oneshot::channel();
    let controller = state.controller.clone();

    let task = tokio::spawn(async move {
        let result = controller
            .request_start_acked(query.requested_by.as_deref(), accepted_tx)
            .await;
        if let Err(e) = &result {
            error!("Start request failed: {}", e);
        }
        result
    });

    let outcome = match accepted_rx.await {
        Ok(outcome) => outcome,
        Err(_) => match task.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => return Ok(error_reply(&e)),
            Err(e) => {
                error!("Start task failed: {}", e);
                return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        },
    };

    let code = match outcome {
        StartOutcome::Started => StatusCode::ACCEPTED,
        StartOutcome::AlreadyStarting | StartOutcome::AlreadyRunning => StatusCode::OK,
    };
    Ok(warp::reply::with_status(warp::reply::json(&serde_json::json!({ "outcome": outcome })), code).into_response())
}

async fn stop(state: AppState) -> Result<Response, Infallible> {
    match state.controller.request_stop().await {
        Ok(()) => Ok(warp::reply::json(&serde_json::json!({ "info": "Workload stopped" })).into_response()),
        Err(e) => {
            error!("Stop request failed: {}", e);
            Ok(error_reply(&e))
        }
    }
}

fn error_reply(e: &ControllerError) -> Response {
    let code = match e {
        ControllerError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        e if e.is_adapter_error() => StatusCode::BAD_GATEWAY,
        ControllerError::StartTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warp::reply::with_status(warp::reply::json(&ErrorBody { error: e.to_string() }), code).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::notify::StatusBoard;
    use crate::testing::{harness, Harness};

    fn app(h: &Harness) -> AppState {
        AppState { controller: h.controller.clone(), board: StatusBoard::new() }
    }

    #[tokio::test]
    async fn index_redirects_to_status() {
        let h = harness(3, true, &[]);
        let res = warp::test::request().path("/").reply(&routes(app(&h))).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()["location"], "/status");
    }

    #[tokio::test]
    async fn status_shows_the_controller_state() {
        let h = harness(3, true, &[0]);
        h.controller.refresh().await.unwrap();

        let res = warp::test::request().path("/status").reply(&routes(app(&h))).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("server"));

        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["status"]["state"], "waiting_to_stop");
        assert_eq!(body["status"]["remaining_ticks"], 2);
        assert_eq!(body["workload"]["name"], "minecraft-server");
        assert_eq!(body["idle_timeout"], 3);
    }

    #[tokio::test]
    async fn start_before_the_first_refresh_is_unavailable() {
        let h = harness(3, false, &[]);
        let res = warp::test::request().method("POST").path("/start").reply(&routes(app(&h))).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn start_is_accepted() {
        let h = harness(3, false, &[1]);
        h.controller.refresh().await.unwrap();

        let res = warp::test::request()
            .method("POST")
            .path("/start?requested_by=alice")
            .reply(&routes(app(&h)))
            .await;
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(h.deploy.starts.load(Ordering::SeqCst), 1);

        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["outcome"], "started");
    }

    #[tokio::test]
    async fn failed_start_is_a_bad_gateway() {
        let h = harness(3, false, &[]);
        h.controller.refresh().await.unwrap();
        h.deploy.fail_start.store(true, Ordering::SeqCst);

        let res = warp::test::request().method("POST").path("/start").reply(&routes(app(&h))).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn stop_stops_the_workload() {
        let h = harness(3, true, &[2]);
        h.controller.refresh().await.unwrap();

        let res = warp::test::request().method("POST").path("/stop").reply(&routes(app(&h))).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(h.deploy.stops.load(Ordering::SeqCst), 1);
    }
}
