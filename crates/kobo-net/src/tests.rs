#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use bytes::BytesMut;
    use glam::I16Vec2;

    use kobo_core::commands::{Command, CommandList, Opcode, RecordingTarget, SpriteImage};
    use kobo_core::enums::{ImageSet, StatKind};
    use kobo_core::input::IdleInput;
    use kobo_core::level::LevelSet;
    use kobo_core::types::CellPos;
    use kobo_sim::engine::SimConfig;
    use kobo_sim::SimulationEngine;

    use crate::codec::{
        decode_command, decode_payload, encode_command, encode_frame, pack_u12, payload_len,
        unpack_u12, FRAME_HEADER_LEN, MAX_FRAME_LEN,
    };
    use crate::config::NetConfig;
    use crate::error::NetError;
    use crate::handshake::check_greeting;
    use crate::server::{CloseReason, GameServer, SessionStatus};
    use crate::stream::{CommandStream, FeedStatus};

    fn sample_commands() -> CommandList {
        let mut list = CommandList::new();
        list.set_view_offset(I16Vec2::new(1900, 12));
        list.set_background_cell(CellPos::new(127, 3), SpriteImage::new(ImageSet::Fort1, 5));
        list.clear_background_cell(CellPos::new(0, 64));
        list.draw_background();
        list.draw_sprite(I16Vec2::new(2047, 0), SpriteImage::new(ImageSet::Player0, 9));
        list.draw_sprite(I16Vec2::new(300, 1500), SpriteImage::new(ImageSet::Arch1, 2));
        list.set_player_positions([I16Vec2::new(4, 4000), I16Vec2::new(4095, 17)]);
        list.set_player_stat(StatKind::Score, 0, 12_345);
        list.set_player_stat(StatKind::Lives, 1, -1);
        list
    }

    fn frame_of(commands: &[Command]) -> Vec<u8> {
        let mut list = CommandList::new();
        list.extend(commands.iter().copied());
        encode_frame(&list).to_vec()
    }

    fn test_engine() -> SimulationEngine {
        let levels = LevelSet::builtin().expect("builtin levels");
        SimulationEngine::new(SimConfig::default(), levels)
    }

    // ---- Codec ----

    #[test]
    fn test_u12_packing_covers_full_range() {
        for x in 0..4096i16 {
            let p = I16Vec2::new(x, 4095 - x);
            assert_eq!(unpack_u12(pack_u12(p)), p, "u12 pair {p:?}");
        }
    }

    #[test]
    fn test_u12_layout() {
        // x = 0xABC, y = 0x123
        let bytes = pack_u12(I16Vec2::new(0xABC, 0x123));
        assert_eq!(bytes, [0xBC, 0xA3, 0x12]);
    }

    #[test]
    fn test_payload_sizes_match_encoding() {
        for command in &sample_commands() {
            let mut out = BytesMut::new();
            encode_command(command, &mut out);
            assert_eq!(
                out.len(),
                1 + payload_len(command.opcode()),
                "encoded size of {command:?}"
            );
        }
    }

    #[test]
    fn test_commands_decode_after_opcode() {
        for command in &sample_commands() {
            let mut out = BytesMut::new();
            encode_command(command, &mut out);
            let opcode = Opcode::try_from(out[0]).expect("known opcode");
            let mut payload = &out[1..];
            let decoded = decode_payload(opcode, &mut payload).expect("decodes");
            assert_eq!(&decoded, command);
            assert!(payload.is_empty());
        }
    }

    #[test]
    fn test_frame_size_counts_header() {
        let list = sample_commands();
        let frame = encode_frame(&list);
        assert_eq!(frame[0], 0xFF);
        let size = i32::from_le_bytes([frame[1], frame[2], frame[3], frame[4]]);
        assert_eq!(size as usize, frame.len());

        let empty = encode_frame(&CommandList::new());
        assert_eq!(&empty[..], &[0xFF, 5, 0, 0, 0]);
    }

    #[test]
    fn test_short_payload_is_truncated() {
        let mut cursor: &[u8] = &[Opcode::DrawSprite as u8, 1, 2];
        assert!(matches!(
            decode_command(&mut cursor),
            Err(NetError::Truncated)
        ));
    }

    #[test]
    fn test_bad_stat_kind_is_desync() {
        let mut cursor: &[u8] = &[Opcode::SetPlayerStat as u8, 0x70, 0, 0, 0, 0];
        assert!(matches!(
            decode_command(&mut cursor),
            Err(NetError::Desync { opcode: 6, offset: 1 })
        ));
    }

    // ---- Reassembly ----

    #[test]
    fn test_partial_frame_waits_without_running() {
        let mut bytes = vec![0xFF];
        bytes.extend_from_slice(&37i32.to_le_bytes());
        bytes.extend(std::iter::repeat(Opcode::DrawBackground as u8).take(20));

        let mut stream = CommandStream::new();
        let status = stream.feed(&bytes).expect("no error on a partial frame");
        assert_eq!(
            status,
            FeedStatus {
                frames_completed: 0,
                awaiting: true
            }
        );
        assert!(stream.commands().is_empty());

        let mut target = RecordingTarget::default();
        assert_eq!(stream.run(&mut target), 0);
        assert!(target.commands.is_empty());
        assert_eq!(stream.buffered_len(), 25);
    }

    #[test]
    fn test_header_split_across_chunks() {
        let frame = frame_of(&[Command::DrawBackground]);
        let mut stream = CommandStream::new();
        let first = stream.feed(&frame[..3]).expect("partial header");
        assert!(first.awaiting);
        let second = stream.feed(&frame[3..]).expect("rest");
        assert_eq!(second.frames_completed, 1);
        assert!(!second.awaiting);
        assert_eq!(stream.commands().as_slice(), &[Command::DrawBackground]);
    }

    #[test]
    fn test_chunking_does_not_change_replay() {
        let list = sample_commands();
        let frames = [
            frame_of(list.as_slice()),
            frame_of(&list.as_slice()[3..]),
            frame_of(&[]),
            frame_of(&list.as_slice()[..2]),
        ];
        let wire: Vec<u8> = frames.concat();

        let mut whole = CommandStream::new();
        let mut all_at_once = RecordingTarget::default();
        let status = whole.feed(&wire).expect("feeds");
        assert_eq!(status.frames_completed, frames.len());
        whole.run(&mut all_at_once);

        let mut bytewise = CommandStream::new();
        let mut one_at_a_time = RecordingTarget::default();
        for byte in &wire {
            let status = bytewise.feed(std::slice::from_ref(byte)).expect("feeds");
            if status.frames_completed > 0 {
                bytewise.run(&mut one_at_a_time);
            }
        }

        assert_eq!(all_at_once.commands, one_at_a_time.commands);
        let expected = list.len() + (list.len() - 3) + 2;
        assert_eq!(all_at_once.commands.len(), expected);
    }

    #[test]
    fn test_new_frame_after_run_replaces_commands() {
        let a = frame_of(&[Command::DrawBackground]);
        let b = frame_of(&[Command::ClearBackgroundCell {
            cell: CellPos::new(1, 2),
        }]);

        let mut stream = CommandStream::new();
        stream.feed(&a).expect("a");
        stream.feed(&b).expect("b");
        assert_eq!(stream.commands().len(), 2, "unrun frames accumulate");

        let mut target = RecordingTarget::default();
        stream.run(&mut target);
        stream.feed(&a).expect("a again");
        assert_eq!(stream.commands().as_slice(), &[Command::DrawBackground]);
    }

    #[test]
    fn test_unknown_opcode_is_desync() {
        let wire = [0xFF, 8, 0, 0, 0, Opcode::DrawBackground as u8, 0x42, 0x00];
        let mut stream = CommandStream::new();
        let err = stream.feed(&wire).expect_err("desync");
        assert!(matches!(err, NetError::Desync { opcode: 0x42, offset: 6 }));
        assert!(stream.commands().is_empty(), "bad frame applied nothing");
    }

    #[test]
    fn test_desync_offset_counts_earlier_frames() {
        let mut wire = frame_of(&[Command::DrawBackground]);
        wire.extend_from_slice(&[0xFF, 6, 0, 0, 0, 0x99]);
        let mut stream = CommandStream::new();
        let err = stream.feed(&wire).expect_err("desync");
        assert!(matches!(err, NetError::Desync { opcode: 0x99, offset: 11 }));
    }

    #[test]
    fn test_stream_must_start_with_frame_start() {
        let mut stream = CommandStream::new();
        let err = stream.feed(&[Opcode::DrawBackground as u8]).expect_err("desync");
        assert!(matches!(err, NetError::Desync { opcode: 1, offset: 0 }));
    }

    #[test]
    fn test_undersized_frame_is_desync() {
        let mut stream = CommandStream::new();
        let err = stream.feed(&[0xFF, 2, 0, 0, 0]).expect_err("desync");
        assert!(matches!(err, NetError::Desync { opcode: 0xFF, .. }));
    }

    #[test]
    fn test_oversized_frame_is_desync() {
        let mut stream = CommandStream::new();
        let err = stream
            .feed(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F])
            .expect_err("desync");
        assert!(matches!(err, NetError::Desync { opcode: 0xFF, offset: 0 }));

        let mut wire = vec![0xFF];
        wire.extend_from_slice(&((MAX_FRAME_LEN + 1) as i32).to_le_bytes());
        let mut stream = CommandStream::new();
        assert!(matches!(stream.feed(&wire), Err(NetError::Desync { .. })));

        // The limit itself is still a frame worth waiting for.
        let mut wire = vec![0xFF];
        wire.extend_from_slice(&(MAX_FRAME_LEN as i32).to_le_bytes());
        let mut stream = CommandStream::new();
        assert!(stream.feed(&wire).unwrap().awaiting);
    }

    #[test]
    fn test_frame_start_inside_frame_is_desync() {
        let mut wire = vec![0xFF];
        wire.extend_from_slice(&((FRAME_HEADER_LEN * 2) as i32).to_le_bytes());
        wire.extend_from_slice(&[0xFF, 5, 0, 0, 0]);
        let mut stream = CommandStream::new();
        assert!(matches!(
            stream.feed(&wire),
            Err(NetError::Desync { opcode: 0xFF, offset: 5 })
        ));
    }

    #[test]
    fn test_engine_view_survives_the_wire() {
        let mut engine = test_engine();
        for _ in 0..30 {
            engine.tick(&[&IdleInput]);
        }
        let mut view = CommandList::new();
        engine.build_view(0, &mut view);

        let mut stream = CommandStream::new();
        stream.feed(&encode_frame(&view)).expect("feeds");
        let mut target = RecordingTarget::default();
        stream.run(&mut target);
        assert_eq!(target.commands, view.as_slice());
    }

    // ---- Handshake and config ----

    #[test]
    fn test_greeting_ignores_case() {
        assert!(check_greeting(b"HI!").is_ok());
        assert!(check_greeting(b"hi!").is_ok());
        match check_greeting(b"YO!") {
            Err(NetError::Handshake(bytes)) => assert_eq!(bytes, b"YO!"),
            other => panic!("expected handshake error, got {other:?}"),
        }
    }

    #[test]
    fn test_net_config_partial_json() {
        let config: NetConfig = serde_json::from_str(r#"{ "port": 4000 }"#).expect("parses");
        assert_eq!(config.port, 4000);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.idle_sleep_ms, 16);
        assert_eq!(config.accept_timeout(), None);
        assert_eq!(config.listen_addr(), "0.0.0.0:4000");
    }

    #[test]
    fn test_connection_loss_classification() {
        assert!(NetError::Disconnected.is_connection_loss());
        assert!(!NetError::Truncated.is_connection_loss());
        assert!(!NetError::Desync {
            opcode: 9,
            offset: 0
        }
        .is_connection_loss());
    }

    // ---- Server ----

    #[test]
    fn test_local_server_ticks_without_remote() {
        let mut server = GameServer::local(test_engine());
        assert!(!server.has_remote());
        for _ in 0..10 {
            let status = server.tick(&IdleInput).expect("local tick");
            assert_eq!(status, SessionStatus::Running);
        }
        assert_eq!(server.engine().tick_count(), 10);
        assert_eq!(server.last_summary().map(|s| s.tick), Some(10));

        let mut view = CommandList::new();
        server.build_local_view(&mut view);
        assert!(matches!(
            view.as_slice().first(),
            Some(Command::SetViewOffset { .. })
        ));
    }

    #[test]
    fn test_close_handler_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reasons = Arc::new(Mutex::new(Vec::new()));
        {
            let mut server = GameServer::local(test_engine());
            let calls = Arc::clone(&calls);
            let reasons = Arc::clone(&reasons);
            server.on_close(move |reason| {
                calls.fetch_add(1, Ordering::SeqCst);
                reasons.lock().expect("lock").push(reason.clone());
            });
            server.close(CloseReason::Shutdown);
            server.close(CloseReason::PeerClosed);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *reasons.lock().expect("lock"),
            vec![CloseReason::Shutdown]
        );
    }
}
