//! 连接层回环集成测试
//!
//! 用真实 TCP 套接字验证外设的建链、推送、关闭语义。

use drivesim_link::{
    CameraPose, ConnectionState, ControlRequest, Peripheral, SessionStatus,
    SettingsControlServer, TelemetryClient, VehicleTelemetry, VisualizationClient,
};
use serial_test::serial;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

/// 设置控制服务器测试端口（serial 保证不并发占用）
const SETTINGS_PORT: u16 = 45021;

fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

fn sample_telemetry(sim_time_s: f64) -> VehicleTelemetry {
    VehicleTelemetry {
        sim_time_s,
        position: [1.0, 0.0, 2.0],
        orientation: [1.0, 0.0, 0.0, 0.0],
        speed_kmh: 72.0,
        rpm: 2500.0,
        steering: -0.25,
    }
}

/// 遥测客户端：建链、推送、按 JSON 行送达、关闭
#[test]
#[serial]
fn telemetry_client_delivers_snapshots() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let mut client = TelemetryClient::telemetry(addr);
    let (stream, _) = listener.accept().unwrap();

    assert!(
        wait_for(|| client.state() == ConnectionState::Connected, Duration::from_secs(2)),
        "client should reach Connected"
    );

    client.push(sample_telemetry(1.5));

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let received: VehicleTelemetry = serde_json::from_str(&line).unwrap();
    assert_eq!(received.sim_time_s, 1.5);
    assert_eq!(received.speed_kmh, 72.0);

    client.close();
    assert_eq!(client.state(), ConnectionState::Closed);
    client.close(); // 幂等
    assert_eq!(client.state(), ConnectionState::Closed);
}

/// 可视化客户端：对端断开后连接自行进入 Closed，推送不再阻塞
#[test]
#[serial]
fn visualization_client_survives_peer_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let mut client = VisualizationClient::visualization(addr);
    let (stream, _) = listener.accept().unwrap();
    assert!(wait_for(
        || client.state() == ConnectionState::Connected,
        Duration::from_secs(2)
    ));

    // 对端断开
    drop(stream);
    drop(listener);

    // 写失败在 I/O 线程内被吞掉，连接最终进入 Closed
    let pose = CameraPose {
        sim_time_s: 0.0,
        position: [0.0; 3],
        orientation: [1.0, 0.0, 0.0, 0.0],
    };
    let deadline = Instant::now() + Duration::from_secs(4);
    while client.state() == ConnectionState::Connected && Instant::now() < deadline {
        client.push(pose);
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(client.state(), ConnectionState::Closed);

    // 之后的推送静默丢弃，永不上抛
    client.push(pose);
    client.close();
}

/// 设置控制服务器：入站控制行进队列，出站状态推送到对端
#[test]
#[serial]
fn settings_server_roundtrip() {
    let mut server = SettingsControlServer::start(SETTINGS_PORT);
    assert!(
        wait_for(|| server.state() == ConnectionState::Connected, Duration::from_secs(2)),
        "server should reach listening state"
    );

    let mut peer = TcpStream::connect(("127.0.0.1", SETTINGS_PORT)).unwrap();
    peer.write_all(b"pause on\nrecord on\nbogus line\n").unwrap();
    peer.flush().unwrap();

    assert!(wait_for(
        || server.try_recv() == Some(ControlRequest::SetPaused(true)),
        Duration::from_secs(2)
    ));
    assert!(wait_for(
        || server.try_recv() == Some(ControlRequest::SetRecording(true)),
        Duration::from_secs(2)
    ));
    // 非法行被丢弃
    assert!(server.try_recv().is_none());

    // 出站状态推送
    server.push(SessionStatus {
        paused: true,
        recording: true,
        frame: 7,
    });
    let mut reader = BufReader::new(peer.try_clone().unwrap());
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let status: SessionStatus = serde_json::from_str(&line).unwrap();
    assert_eq!(status.frame, 7);
    assert!(status.paused && status.recording);

    server.close();
    assert_eq!(server.state(), ConnectionState::Closed);
    server.close();
}

/// 关闭有界等待：close 在对端静默时也能及时返回
#[test]
#[serial]
fn close_is_bounded_with_silent_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let mut client = TelemetryClient::telemetry(addr);
    let (_stream, _) = listener.accept().unwrap();
    assert!(wait_for(
        || client.state() == ConnectionState::Connected,
        Duration::from_secs(2)
    ));

    let started = Instant::now();
    client.close();
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "close must return within the bounded join window"
    );
    assert_eq!(client.state(), ConnectionState::Closed);
}
