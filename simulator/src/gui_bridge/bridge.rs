use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::runner::Runner;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};
use tokio::runtime::Builder;
use varcore::pipeline::ReviewCommand;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Filter;

type Reply = WithStatus<Json>;

#[derive(Debug, Deserialize)]
struct TranscriptRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ThemeRequest {
    dark_mode: bool,
}

fn with_runner(runner: Runner) -> impl Filter<Extract = (Runner,), Error = Infallible> + Clone {
    warp::any().map(move || runner.clone())
}

fn ok(body: serde_json::Value) -> Reply {
    warp::reply::with_status(warp::reply::json(&body), StatusCode::OK)
}

fn failure(status: StatusCode, err: &anyhow::Error) -> Reply {
    warp::reply::with_status(
        warp::reply::json(&json!({"status": "error", "message": format!("{:#}", err)})),
        status,
    )
}

async fn payload(runner: Runner) -> Result<Reply, Infallible> {
    Ok(match VisualizationModel::capture(&runner) {
        Ok(model) => warp::reply::with_status(warp::reply::json(&model), StatusCode::OK),
        Err(err) => {
            error!("payload capture failed: {:#}", err);
            failure(StatusCode::INTERNAL_SERVER_ERROR, &err)
        }
    })
}

async fn command(command: ReviewCommand, runner: Runner) -> Result<Reply, Infallible> {
    Ok(match runner.dispatch(command).await {
        Ok(effect) => ok(json!({"status": "ok", "forced_tick": effect.force_tick})),
        Err(err) => {
            warn!("command rejected: {:#}", err);
            failure(StatusCode::BAD_REQUEST, &err)
        }
    })
}

async fn transcript(request: TranscriptRequest, runner: Runner) -> Result<Reply, Infallible> {
    Ok(match runner.record_transcript(&request.text) {
        Ok(()) => ok(json!({"status": "ok"})),
        Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, &err),
    })
}

async fn clear_transcripts(runner: Runner) -> Result<Reply, Infallible> {
    Ok(match runner.clear_transcripts() {
        Ok(()) => ok(json!({"status": "ok"})),
        Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, &err),
    })
}

async fn theme(request: ThemeRequest, runner: Runner) -> Result<Reply, Infallible> {
    Ok(match runner.set_dark_mode(request.dark_mode) {
        Ok(()) => ok(json!({"status": "ok", "dark_mode": request.dark_mode})),
        Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, &err),
    })
}

async fn report(runner: Runner) -> Result<Reply, Infallible> {
    Ok(match runner.report() {
        Ok(report) => warp::reply::with_status(warp::reply::json(&report), StatusCode::OK),
        Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, &err),
    })
}

async fn export(runner: Runner) -> Result<Reply, Infallible> {
    Ok(match runner.export() {
        Ok(path) => ok(json!({"status": "ok", "path": path.display().to_string()})),
        Err(err) => {
            error!("export failed: {:#}", err);
            failure(StatusCode::INTERNAL_SERVER_ERROR, &err)
        }
    })
}

/// HTTP surface consumed by the visualizer.
pub fn routes(
    runner: Runner,
) -> impl Filter<Extract = (Reply,), Error = warp::Rejection> + Clone {
    let payload_route = warp::path("payload")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_runner(runner.clone()))
        .and_then(payload);

    let command_route = warp::path("command")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_runner(runner.clone()))
        .and_then(command);

    let transcript_route = warp::path("transcript")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_runner(runner.clone()))
        .and_then(transcript);

    let clear_route = warp::path!("transcripts" / "clear")
        .and(warp::post())
        .and(with_runner(runner.clone()))
        .and_then(clear_transcripts);

    let theme_route = warp::path("theme")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_runner(runner.clone()))
        .and_then(theme);

    let report_route = warp::path("export")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_runner(runner.clone()))
        .and_then(report);

    let export_route = warp::path("export")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_runner(runner))
        .and_then(export);

    payload_route
        .or(command_route)
        .unify()
        .or(transcript_route)
        .unify()
        .or(clear_route)
        .unify()
        .or(theme_route)
        .unify()
        .or(report_route)
        .unify()
        .or(export_route)
        .unify()
}

/// Hosts the bridge on its own thread and runtime.
pub struct GuiBridge;

impl GuiBridge {
    pub fn spawn(runner: Runner, address: SocketAddr) -> JoinHandle<()> {
        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            info!("HTTP bridge listening on {}", address);
            runtime.block_on(async move {
                warp::serve(routes(runner)).run(address).await;
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{GeneratorConfig, SyntheticEstimator};
    use crate::workflow::config::WorkflowConfig;
    use tempfile::tempdir;
    use varcore::annotation::SelectionRole;
    use varcore::history::LocalStore;
    use varcore::pipeline::SessionState;

    fn runner() -> Runner {
        Runner::with_store(
            WorkflowConfig::from_args(100, 3.0, 11),
            Box::new(SyntheticEstimator::new(GeneratorConfig::default())),
            LocalStore::in_memory(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn commands_drive_the_session() {
        let runner = runner();
        runner.load_clip("clip.mp4").unwrap();
        let api = routes(runner.clone());

        let response = warp::test::request()
            .method("POST")
            .path("/command")
            .json(&ReviewCommand::StepForward)
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = warp::test::request()
            .method("GET")
            .path("/payload")
            .reply(&api)
            .await;
        let model: VisualizationModel = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(model.state, SessionState::Stepping);
        assert!(!model.display.commands.is_empty());
    }

    #[tokio::test]
    async fn rejected_commands_are_bad_requests() {
        let api = routes(runner());
        let response = warp::test::request()
            .method("POST")
            .path("/command")
            .json(&ReviewCommand::BeginSelection {
                role: SelectionRole::Attacker,
            })
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transcripts_and_theme_round_trip() {
        let runner = runner();
        let api = routes(runner.clone());

        for path in ["/transcript", "/theme"] {
            let body = if path == "/theme" {
                json!({"dark_mode": true})
            } else {
                json!({"text": "looks offside"})
            };
            let response = warp::test::request()
                .method("POST")
                .path(path)
                .json(&body)
                .reply(&api)
                .await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(runner.transcripts().unwrap()[0].text, "looks offside");
        assert!(runner.dark_mode().unwrap());

        warp::test::request()
            .method("POST")
            .path("/transcripts/clear")
            .reply(&api)
            .await;
        assert!(runner.transcripts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn export_returns_and_writes_report() {
        let dir = tempdir().unwrap();
        let mut config = WorkflowConfig::from_args(100, 3.0, 11);
        config.export_dir = dir.path().to_path_buf();
        let runner = Runner::with_store(
            config,
            Box::new(SyntheticEstimator::new(GeneratorConfig::default())),
            LocalStore::in_memory(),
        )
        .unwrap();
        let api = routes(runner);

        let response = warp::test::request()
            .method("GET")
            .path("/export")
            .reply(&api)
            .await;
        let report: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(report["offsideMode"], false);

        let response = warp::test::request()
            .method("POST")
            .path("/export")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(dir.path().join("var_decision_report.json").exists());
    }
}
