use anyhow::Context;
use clap::Parser;
use cloud::client::{FrameData, IncidentData};
use generator::profile::{GeneratorConfig, SyntheticEstimator};
use generator::script::ScriptedRecognizer;
use gui_bridge::bridge::GuiBridge;
use gui_bridge::model::VisualizationModel;
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use varcore::pipeline::{ReviewCommand, TickOutcome};
use varcore::rules::Severity;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod cloud;
mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "VAR incident review session driver")]
struct Args {
    /// Analyse a synthetic clip once, export the decision report and exit
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
    /// Length of the synthetic clip in seconds
    #[arg(long, default_value_t = 6.0)]
    duration: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Analysis passes during the offline run
    #[arg(long, default_value_t = 20)]
    ticks: usize,
    /// Severity selected on the decision panel (minor, moderate, severe)
    #[arg(long)]
    severity: Option<Severity>,
    #[arg(long, default_value_t = false)]
    offside: bool,
    #[arg(long, default_value_t = false)]
    goal_line: bool,
    /// Keep the HTTP bridge and analysis loop alive for the visualizer
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Replay referee commentary from a text file into the transcript
    #[arg(long)]
    transcript_script: Option<PathBuf>,
    /// Pose classification endpoint, e.g. http://localhost:5001/classify_pose
    #[arg(long)]
    classify_url: Option<String>,
    /// Send the offline result to the cloud analysis API
    #[arg(long, default_value_t = false)]
    remote: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.tick_ms, args.duration, args.seed)
    };
    if args.classify_url.is_some() {
        workflow_config.classify_endpoint = args.classify_url.clone();
    }

    let estimator = SyntheticEstimator::new(GeneratorConfig {
        seed: workflow_config.seed,
        failure_rate: workflow_config.failure_rate,
        ..Default::default()
    });
    let runner = Runner::new(workflow_config.clone(), Box::new(estimator))?;
    runner.load_clip("synthetic_incident.mp4")?;
    if let Some(severity) = args.severity {
        runner.apply(ReviewCommand::SetSeverity { severity })?;
    }

    if let Some(path) = &args.transcript_script {
        let mut recognizer = ScriptedRecognizer::load(path)?;
        let processed = runner.capture_speech(&mut recognizer)?;
        info!(
            "replayed {} recognition events ({})",
            processed,
            runner.speech_status()?
        );
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating analysis runtime")?;

    if args.offline {
        runtime.block_on(offline_review(&runner, &args))?;
    }

    if args.serve {
        let bridge = GuiBridge::spawn(runner.clone(), workflow_config.bind_address);
        println!(
            "[GUI] HTTP bridge on {} (Ctrl+C to stop)...",
            workflow_config.bind_address
        );
        runtime.block_on(async {
            runner
                .run(async {
                    if let Err(err) = signal::ctrl_c().await {
                        warn!("awaiting Ctrl+C failed: {}", err);
                    }
                })
                .await
        })?;
        drop(bridge);
    }

    Ok(())
}

async fn offline_review(runner: &Runner, args: &Args) -> anyhow::Result<()> {
    runner.apply(ReviewCommand::Start)?;
    let mut classifications = Vec::new();
    for _ in 0..args.ticks {
        if runner.advance_playback()? {
            break;
        }
        let report = runner.tick_and_classify(false)?;
        if let Some(handle) = report.classification {
            classifications.push(handle);
        }
    }
    for handle in classifications {
        if let Err(err) = handle.await {
            warn!("classification task failed: {}", err);
        }
    }
    runner.apply(ReviewCommand::Stop)?;

    runner.apply(ReviewCommand::SetOffsideMode {
        enabled: args.offside,
    })?;
    runner.apply(ReviewCommand::SetGoalLineMode {
        enabled: args.goal_line,
    })?;
    let outcome = runner.tick_and_classify(true)?;
    if let Some(handle) = outcome.classification {
        if let Err(err) = handle.await {
            warn!("classification task failed: {}", err);
        }
    }
    runner.dispatch(ReviewCommand::StepForward).await?;

    if args.remote {
        remote_review(runner, &outcome.outcome).await?;
    }

    let path = runner.export()?;
    let model = VisualizationModel::capture(runner)?;
    let badges: Vec<String> = model
        .badges
        .iter()
        .filter(|badge| badge.visible)
        .map(|badge| badge.text.clone())
        .collect();

    println!(
        "Offline review -> decision {}, badges {:?}, movement samples {}, processed {}, errors {}, throttled {}",
        model.decision.status,
        badges,
        model.movement_samples,
        model.metrics.processed,
        model.metrics.errors,
        model.metrics.throttled
    );
    println!("Report written to {}", path.display());

    let line = format!(
        "time={:.2} decision={} badges={:?} samples={} transcripts={}\n",
        model.current_time,
        model.decision.status,
        badges,
        model.movement_samples,
        model.transcripts.len()
    );
    let log_path = runner.config().export_dir.join("offline_review.log");
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Analyse, explain and store the reviewed frame through the cloud API.
async fn remote_review(runner: &Runner, outcome: &TickOutcome) -> anyhow::Result<()> {
    let TickOutcome::Analyzed(analysis) = outcome else {
        warn!("no analysed frame to send to the cloud");
        return Ok(());
    };
    let Some(keypoints) = analysis.keypoints.clone() else {
        warn!("no pose detected on the reviewed frame");
        return Ok(());
    };
    let frame = FrameData {
        keypoints,
        timestamp: chrono::Utc::now().timestamp_millis(),
    };
    let cloud = runner.cloud();
    let Some(result) = cloud.analyze_frame(&frame).await else {
        return Ok(());
    };
    println!(
        "Cloud analysis -> {} ({:.2})",
        result.incident_type, result.confidence
    );
    if let Some(explanation) = cloud
        .explain(&IncidentData {
            frame_data: vec![frame],
            incident_type: result.incident_type.clone(),
            confidence: result.confidence,
        })
        .await
    {
        println!("Cloud explanation -> {}", explanation.explanation);
    }
    let report = serde_json::to_value(runner.report()?)?;
    if let Some(receipt) = cloud.save_results(&report).await {
        println!("Cloud save -> {} ({})", receipt.status, receipt.filename);
    }
    Ok(())
}
