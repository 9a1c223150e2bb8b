//! 流式协议测试
//!
//! 覆盖初始化握手、完成判定、运行时指令翻译、传输故障，
//! 以及经 JSON-line 传输的完整往返。

mod common;

use async_trait::async_trait;
use common::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex, split};
use tokio::time::{sleep, timeout};
use trajex_sdk::driver::{CompletionReport, JsonLineTransport, motion_channel};
use trajex_sdk::prelude::*;
use trajex_sdk::protocol::{
    ExecutePhase, GatewayRequest, GatewayResponse, InitResponse, MotionStateSnapshot,
    StandstillEvent, StandstillReason, decode_request, encode_response,
};
use trajex_sdk::{DriverError, ExecutionError};

#[tokio::test(start_paused = true)]
async fn test_rejected_initialization_never_starts() {
    let (executor, gateway) =
        sim_executor(SimulatorConfig::new(100.0, 50.0).rejecting_init("trajectory not loaded"));
    let token = CancellationToken::new();

    let err = executor
        .execute(&arm(), &two_motions(), ExecuteOptions::default(), &token)
        .await
        .unwrap_err();
    match err {
        ExecutionError::InitializationRejected { reason, .. } => {
            assert_eq!(reason, "trajectory not loaded");
        },
        other => panic!("Expected rejection, got {:?}", other),
    }

    let requests = gateway.received_requests();
    assert_eq!(requests.len(), 1);
    assert!(matches!(requests[0], GatewayRequest::Initialize(_)));
    assert_eq!(gateway.position(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_initialization_timeout() {
    let (executor, mut endpoints) = scripted_executor();
    let token = CancellationToken::new();

    let gateway = tokio::spawn(async move {
        let mut endpoint = endpoints.recv().await.unwrap();
        let mut seen = Vec::new();
        while let Some(request) = endpoint.recv().await {
            seen.push(request);
        }
        seen
    });

    let err = executor
        .execute(&arm(), &two_motions(), ExecuteOptions::default(), &token)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::InitializationTimeout { timeout } if timeout == Duration::from_secs(5)
    ));

    // 超时不是拒绝：仍然发送 Stop，随后关闭流
    let seen = gateway.await.unwrap();
    assert_eq!(seen.len(), 2);
    assert!(matches!(seen[0], GatewayRequest::Initialize(_)));
    assert_eq!(seen[1], GatewayRequest::Stop);
}

#[tokio::test(start_paused = true)]
async fn test_completion_via_standstill_event() {
    let (executor, gateway) = sim_executor(
        SimulatorConfig::new(100.0, 50.0).with_completion(CompletionReport::StandstillEvent),
    );
    let token = CancellationToken::new();

    let summary = executor
        .execute(&arm(), &two_motions(), ExecuteOptions::default(), &token)
        .await
        .unwrap();
    assert_eq!(summary.completion, Completion::Standstill);
    assert_eq!(gateway.position(), 100.0);
}

#[tokio::test(start_paused = true)]
async fn test_completion_via_ended_snapshot() {
    let (executor, gateway) = sim_executor(SimulatorConfig::new(100.0, 50.0));
    let token = CancellationToken::new();

    let summary = executor
        .execute(&arm(), &two_motions(), ExecuteOptions::default(), &token)
        .await
        .unwrap();
    assert_eq!(summary.completion, Completion::Ended);
    assert_eq!(summary.final_state, TrajectoryExecutionState::Completed);
    assert_eq!(summary.final_location, Some(1.0));
    assert_eq!(gateway.position(), 100.0);
}

#[tokio::test(start_paused = true)]
async fn test_external_speed_change_reaches_gateway() {
    let (executor, gateway) = sim_executor(SimulatorConfig::new(200.0, 100.0));
    let playback = Arc::clone(executor.playback());
    let token = CancellationToken::new();

    tokio::spawn(async move {
        sleep(Duration::from_millis(500)).await;
        playback.set_external_override(&arm(), 50, None, None).unwrap();
    });

    let summary = executor
        .execute(&arm(), &two_motions(), ExecuteOptions::default(), &token)
        .await
        .unwrap();
    assert_eq!(summary.final_state, TrajectoryExecutionState::Completed);
    assert_eq!(summary.directives_sent, 1);

    let half = PlaybackSpeedPercent::new(50).unwrap();
    assert!(
        gateway
            .received_requests()
            .iter()
            .any(|r| matches!(r, GatewayRequest::SpeedOverride(o) if o.speed == half))
    );
    assert_eq!(gateway.state().speed, half);
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume_round_trip() {
    let (executor, gateway) = sim_executor(SimulatorConfig::new(200.0, 100.0));
    let playback = Arc::clone(executor.playback());
    let token = CancellationToken::new();

    let observer = gateway.clone();
    let script = tokio::spawn(async move {
        sleep(Duration::from_millis(500)).await;
        playback.pause(&arm());
        sleep(Duration::from_millis(500)).await;
        let paused_at = observer.position();
        sleep(Duration::from_secs(1)).await;
        let still_at = observer.position();
        playback.resume(&arm());
        (paused_at, still_at)
    });

    let mut states = Vec::new();
    let summary = executor
        .execute_with_consumer(
            &arm(),
            &two_motions(),
            ExecuteOptions::default(),
            &token,
            |mut progress| {
                let states = &mut states;
                async move {
                    while progress.changed().await.is_ok() {
                        let state = progress.borrow_and_update().state;
                        if states.last() != Some(&state) {
                            states.push(state);
                        }
                    }
                    Ok(())
                }
            },
        )
        .await
        .unwrap();

    let (paused_at, still_at) = script.await.unwrap();
    assert_eq!(paused_at, still_at);
    assert!(paused_at < 200.0);
    assert_eq!(summary.final_state, TrajectoryExecutionState::Completed);
    assert_eq!(summary.directives_sent, 2);

    let requests = gateway.received_requests();
    let pause = requests.iter().position(|r| *r == GatewayRequest::Pause);
    let resume = requests.iter().position(|r| *r == GatewayRequest::Resume);
    assert!(matches!((pause, resume), (Some(p), Some(r)) if p < r));

    assert!(states.contains(&TrajectoryExecutionState::Pausing));
    assert!(states.contains(&TrajectoryExecutionState::Paused));
}

fn execute_state(standstill: bool, location: f64, phase: ExecutePhase) -> GatewayResponse {
    GatewayResponse::State(MotionStateSnapshot::with_execute(
        standstill,
        TrajectoryId::new("0@sim-1"),
        location,
        phase,
    ))
}

#[tokio::test(start_paused = true)]
async fn test_pause_standstill_reported_after_resume_sent() {
    let (executor, mut endpoints) = scripted_executor();
    let playback = Arc::clone(executor.playback());
    let token = CancellationToken::new();

    let gateway = tokio::spawn(async move {
        let mut endpoint = endpoints.recv().await.unwrap();
        assert!(matches!(endpoint.recv().await, Some(GatewayRequest::Initialize(_))));
        endpoint
            .send(GatewayResponse::Init(InitResponse::accepted()))
            .await
            .unwrap();
        assert!(matches!(endpoint.recv().await, Some(GatewayRequest::Start(_))));
        endpoint
            .send(execute_state(false, 0.2, ExecutePhase::Running { time_to_end_ms: 800 }))
            .await
            .unwrap();

        playback.pause(&arm());
        assert_eq!(endpoint.recv().await, Some(GatewayRequest::Pause));
        endpoint
            .send(execute_state(false, 0.3, ExecutePhase::PausedByUser))
            .await
            .unwrap();

        // 网关先收到 Resume，之后才回报暂停静止
        sleep(Duration::from_millis(200)).await;
        playback.resume(&arm());
        assert_eq!(endpoint.recv().await, Some(GatewayRequest::Resume));
        for response in [
            execute_state(true, 0.3, ExecutePhase::PausedByUser),
            execute_state(false, 0.6, ExecutePhase::Running { time_to_end_ms: 400 }),
            execute_state(false, 0.95, ExecutePhase::Ended),
            execute_state(true, 1.0, ExecutePhase::Ended),
        ] {
            endpoint.send(response).await.unwrap();
        }

        assert_eq!(endpoint.recv().await, Some(GatewayRequest::Stop));
        endpoint
            .send(GatewayResponse::Standstill(StandstillEvent {
                reason: StandstillReason::Stopped,
                location: Some(1.0),
            }))
            .await
            .unwrap();
        assert_eq!(endpoint.recv().await, None);
    });

    let summary = timeout(
        Duration::from_secs(30),
        executor.execute(&arm(), &two_motions(), ExecuteOptions::default(), &token),
    )
    .await
    .expect("session did not finish after resume")
    .unwrap();
    assert_eq!(summary.final_state, TrajectoryExecutionState::Completed);
    assert_eq!(summary.completion, Completion::Ended);
    assert_eq!(summary.final_location, Some(1.0));
    assert_eq!(summary.directives_sent, 2);
    gateway.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_direction_change_reverses_actuator() {
    let (executor, gateway) = sim_executor(SimulatorConfig::new(800.0, 100.0));
    let playback = Arc::clone(executor.playback());
    let token = CancellationToken::new();
    let cancel = token.clone();

    let observer = gateway.clone();
    let script = tokio::spawn(async move {
        sleep(Duration::from_secs(2)).await;
        let turned_at = observer.position();
        playback
            .set_external_override(&arm(), 100, None, Some(PlaybackDirection::Backward))
            .unwrap();
        sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        turned_at
    });

    let err = executor
        .execute(&arm(), &two_motions(), ExecuteOptions::default(), &token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());

    let turned_at = script.await.unwrap();
    assert!(gateway.position() < turned_at);
    assert_eq!(gateway.state().direction, PlaybackDirection::Backward);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_drop_is_remote_stream_fault() {
    let (executor, mut endpoints) = scripted_executor();
    let token = CancellationToken::new();

    tokio::spawn(async move {
        let mut endpoint = endpoints.recv().await.unwrap();
        assert!(matches!(endpoint.recv().await, Some(GatewayRequest::Initialize(_))));
        endpoint
            .send(GatewayResponse::Init(InitResponse::accepted()))
            .await
            .unwrap();
        assert!(matches!(endpoint.recv().await, Some(GatewayRequest::Start(_))));
        drop(endpoint);
    });

    let err = executor
        .execute(&arm(), &two_motions(), ExecuteOptions::default(), &token)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::RemoteStreamFault(DriverError::ChannelClosed)
    ));
}

/// 通过 JSON-line 字节流与脚本化网关通信的 MotionGateway
struct LineGateway;

#[async_trait]
impl MotionGateway for LineGateway {
    async fn open_stream(&self, _motion_group: &MotionGroupId) -> Result<MotionStream, DriverError> {
        let (stream, endpoint) = motion_channel(16);
        let (client_io, server_io) = duplex(4096);
        let (client_read, client_write) = split(client_io);
        let _transport = JsonLineTransport::spawn(client_read, client_write, endpoint);
        tokio::spawn(line_server(server_io));
        Ok(stream)
    }
}

async fn line_server(io: tokio::io::DuplexStream) {
    let (read, mut write) = split(io);
    let mut lines = BufReader::new(read).lines();
    let mut trajectory = None;

    while let Ok(Some(line)) = lines.next_line().await {
        let replies = match decode_request(&line).unwrap() {
            GatewayRequest::Initialize(init) => {
                trajectory = Some(init.trajectory_id);
                vec![GatewayResponse::Init(InitResponse::accepted())]
            },
            GatewayRequest::Start(_) => {
                let id = trajectory.clone().unwrap();
                vec![
                    GatewayResponse::State(MotionStateSnapshot::with_execute(
                        false,
                        id.clone(),
                        0.5,
                        ExecutePhase::Running { time_to_end_ms: 500 },
                    )),
                    GatewayResponse::State(MotionStateSnapshot::with_execute(
                        true,
                        id,
                        1.0,
                        ExecutePhase::Ended,
                    )),
                ]
            },
            GatewayRequest::Stop => vec![GatewayResponse::Standstill(StandstillEvent {
                reason: StandstillReason::Stopped,
                location: Some(1.0),
            })],
            _ => Vec::new(),
        };
        for reply in replies {
            let mut line = encode_response(&reply).unwrap();
            line.push('\n');
            if write.write_all(line.as_bytes()).await.is_err() {
                return;
            }
        }
    }
}

#[tokio::test]
async fn test_execution_over_json_lines() {
    let executor = TrajectoryExecutor::new(
        LineGateway,
        SequentialPlanner::new(),
        Arc::new(PlaybackControlManager::new()),
        SessionConfig::default(),
    );
    let token = CancellationToken::new();

    let summary = executor
        .execute(&arm(), &two_motions(), ExecuteOptions::default(), &token)
        .await
        .unwrap();
    assert_eq!(summary.final_state, TrajectoryExecutionState::Completed);
    assert_eq!(summary.final_location, Some(1.0));
    assert_eq!(summary.trajectory_id, TrajectoryId::new("0@sim-1"));
}
