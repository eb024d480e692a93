//! Server and client talking over a real TCP socket on localhost.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use kobo_core::commands::{Command, RecordingTarget};
use kobo_core::enums::{Button, ButtonState};
use kobo_core::input::{IdleInput, InputSource};
use kobo_core::level::LevelSet;
use kobo_core::types::Direction;
use kobo_net::server::{CloseReason, SessionStatus};
use kobo_net::{GameClient, GameServer, NetConfig, NetError};
use kobo_sim::engine::SimConfig;
use kobo_sim::SimulationEngine;

struct HoldFire;

impl InputSource for HoldFire {
    fn player_direction(&self) -> Direction {
        Direction::East
    }

    fn button_state(&self, button: Button) -> ButtonState {
        match button {
            Button::A => ButtonState::Down,
            _ => ButtonState::Up,
        }
    }
}

fn loopback_config() -> NetConfig {
    NetConfig {
        bind_address: "127.0.0.1".to_string(),
        port: 0,
        idle_sleep_ms: 2,
        greeting_timeout_ms: 2_000,
        accept_timeout_ms: Some(5_000),
    }
}

fn two_player_engine() -> SimulationEngine {
    let config = SimConfig {
        two_player: true,
        ..SimConfig::default()
    };
    SimulationEngine::new(config, LevelSet::builtin().expect("builtin levels"))
}

fn connect_pair() -> (GameServer, GameClient) {
    let config = loopback_config();
    let listener = GameServer::bind(&config).expect("bind");
    let addr = listener.local_addr().expect("local addr").to_string();

    let client_config = config.clone();
    let client = thread::spawn(move || GameClient::connect(&addr, &client_config));
    let server = GameServer::accept(&listener, two_player_engine(), &config).expect("accept");
    let client = client
        .join()
        .expect("client thread")
        .expect("client connects");
    (server, client)
}

#[test]
fn test_frames_reach_the_client() {
    let (mut server, mut client) = connect_pair();
    assert!(server.has_remote());

    for _ in 0..3 {
        assert_eq!(
            server.tick(&IdleInput).expect("tick"),
            SessionStatus::Running
        );
    }

    let mut target = RecordingTarget::default();
    let mut replayed = 0;
    for _ in 0..50 {
        replayed += client
            .wait_frame(&mut target, Duration::from_millis(100))
            .expect("client poll");
        if client.frames_received() >= 3 {
            break;
        }
    }
    assert!(replayed > 0);
    assert_eq!(client.frames_received(), 3);

    let commands = &target.commands;
    assert!(matches!(commands.first(), Some(Command::SetViewOffset { .. })));
    assert!(
        commands
            .iter()
            .any(|c| matches!(c, Command::SetBackgroundCell { .. })),
        "level built before the client joined is sent with the first frame"
    );
    assert!(commands
        .iter()
        .any(|c| matches!(c, Command::SetPlayerStat { player: 1, .. })));
}

#[test]
fn test_client_input_drives_slot_one() {
    let (mut server, mut client) = connect_pair();
    let start = server.engine().player(1).map(|p| p.camera);

    for _ in 0..60 {
        client.send_input(&HoldFire).expect("send input");
        thread::sleep(Duration::from_millis(2));
        server.tick(&IdleInput).expect("tick");
    }

    let end = server.engine().player(1).map(|p| p.camera);
    assert_ne!(start, end, "remote ship never moved");
}

#[test]
fn test_client_disconnect_closes_session() {
    let (mut server, client) = connect_pair();
    let (reason_tx, reason_rx) = mpsc::channel();
    server.on_close(move |reason| {
        let _ = reason_tx.send(reason.clone());
    });

    drop(client);

    let mut outcome = None;
    for _ in 0..200 {
        match server.tick(&IdleInput) {
            Ok(_) => thread::sleep(Duration::from_millis(5)),
            Err(err) => {
                outcome = Some(err);
                break;
            }
        }
    }
    let err = outcome.expect("server noticed the disconnect");
    assert!(err.is_connection_loss(), "unexpected error {err:?}");
    assert!(!server.has_remote());

    let reason = reason_rx
        .recv_timeout(Duration::from_secs(1))
        .expect("close handler ran");
    assert!(matches!(
        reason,
        CloseReason::PeerClosed | CloseReason::Error(_)
    ));
    assert!(reason_rx.try_recv().is_err(), "handler ran more than once");

    // The session keeps running locally.
    assert!(server.tick(&IdleInput).is_ok());
}

#[test]
fn test_bad_greeting_is_refused() {
    use std::io::Write;
    use std::net::TcpStream;

    let config = loopback_config();
    let listener = GameServer::bind(&config).expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let intruder = thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).expect("connect");
        stream.write_all(b"GET").expect("write");
        thread::sleep(Duration::from_millis(200));
    });
    let result = GameServer::accept(&listener, two_player_engine(), &config);
    intruder.join().expect("intruder thread");
    assert!(matches!(result, Err(NetError::Handshake(bytes)) if bytes == b"GET"));
}
