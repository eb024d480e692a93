#[cfg(test)]
mod tests {
    use glam::{I16Vec2, IVec2};

    use crate::commands::{Command, CommandList, Opcode, RecordingTarget, SpriteImage};
    use crate::constants::*;
    use crate::enums::*;
    use crate::input::{decode_input, encode_input, IdleInput, InputSource, ProxyInput};
    use crate::level::{LevelError, LevelSet};
    use crate::types::{CellPos, Direction, Playfield, Rect};

    fn playfield() -> Playfield {
        Playfield::new(I16Vec2::splat(WORLD_SIZE))
    }

    // ---- Playfield wrap ----

    #[test]
    fn test_wrap_is_idempotent() {
        let field = playfield();
        let samples = [
            I16Vec2::new(0, 0),
            I16Vec2::new(2047, 2047),
            I16Vec2::new(2048, 4000),
            I16Vec2::new(-1, -2048),
            I16Vec2::new(i16::MIN, i16::MAX),
        ];
        for p in samples {
            let once = field.wrap(p);
            assert_eq!(field.wrap(once), once, "wrap not idempotent for {p:?}");
            assert!(once.x >= 0 && once.x < WORLD_SIZE);
            assert!(once.y >= 0 && once.y < WORLD_SIZE);
        }
        assert_eq!(field.wrap(I16Vec2::new(-1, 2048)), I16Vec2::new(2047, 0));
    }

    #[test]
    fn test_shortest_delta_takes_short_way_round() {
        let field = playfield();
        let d = field.shortest_delta(I16Vec2::new(2040, 10), I16Vec2::new(8, 2030));
        assert_eq!(d, IVec2::new(16, -28));
        let d = field.shortest_delta(I16Vec2::new(100, 100), I16Vec2::new(150, 50));
        assert_eq!(d, IVec2::new(50, -50));
        assert_eq!(field.distance_squared(I16Vec2::new(0, 0), I16Vec2::new(2047, 0)), 1);
    }

    // ---- Rect ----

    #[test]
    fn test_rect_edges_and_contains() {
        let r = Rect::new(10, 20, 16, 8);
        assert_eq!((r.left(), r.top(), r.right(), r.bottom()), (10, 20, 26, 28));
        assert!(r.contains(I16Vec2::new(10, 20)));
        assert!(!r.contains(I16Vec2::new(26, 20)), "right edge is exclusive");
        assert_eq!(r.center(), I16Vec2::new(18, 24));
        assert_eq!(r.inflate(16), Rect::new(-6, 4, 48, 40));
    }

    #[test]
    fn test_overlaps_mod_self_shifted_by_world_size() {
        let world = I16Vec2::splat(WORLD_SIZE);
        let r = Rect::new(100, 200, 16, 16);
        let shifted = Rect::new(100 + WORLD_SIZE, 200 - WORLD_SIZE, 16, 16);
        assert!(r.overlaps_mod(&shifted, world));
        assert!(r.overlaps_mod(&r, world));
    }

    #[test]
    fn test_overlaps_mod_across_seam() {
        let world = I16Vec2::splat(WORLD_SIZE);
        let right_edge = Rect::new(2040, 500, 16, 16);
        let left_edge = Rect::new(4, 505, 8, 8);
        assert!(right_edge.overlaps_mod(&left_edge, world));
        assert!(left_edge.overlaps_mod(&right_edge, world));
        assert!(!right_edge.intersects(&left_edge), "plain test must not wrap");

        let apart = Rect::new(20, 505, 8, 8);
        assert!(!right_edge.overlaps_mod(&apart, world));
    }

    #[test]
    fn test_overlaps_mod_rejects_empty() {
        let world = I16Vec2::splat(WORLD_SIZE);
        let r = Rect::new(0, 0, 16, 16);
        assert!(!r.overlaps_mod(&Rect::new(0, 0, 0, 16), world));
    }

    // ---- Direction ----

    #[test]
    fn test_direction_rotate_wraps() {
        assert_eq!(Direction::North.rotate(-1), Direction::NorthWest);
        assert_eq!(Direction::NorthWest.rotate(1), Direction::North);
        assert_eq!(Direction::East.rotate(10), Direction::South);
        assert_eq!(Direction::Stopped.rotate(3), Direction::Stopped);
    }

    #[test]
    fn test_direction_deltas() {
        assert_eq!(Direction::North.to_delta(3), I16Vec2::new(0, -3));
        assert_eq!(Direction::SouthWest.to_delta(2), I16Vec2::new(-2, 2));
        assert_eq!(Direction::Stopped.to_delta(5), I16Vec2::ZERO);
        for d in Direction::COMPASS {
            let delta = d.to_delta(4).as_ivec2();
            assert_eq!(Direction::from_delta(delta), d, "from_delta inverse for {d:?}");
        }
        assert_eq!(Direction::from_delta(IVec2::ZERO), Direction::Stopped);
        assert_eq!(Direction::from_delta(IVec2::new(100, -10)), Direction::East);
    }

    #[test]
    fn test_turn_towards_is_shortest() {
        assert_eq!(Direction::North.turn_towards(Direction::East), 2);
        assert_eq!(Direction::North.turn_towards(Direction::West), -2);
        assert_eq!(Direction::NorthWest.turn_towards(Direction::NorthEast), 2);
        assert_eq!(Direction::North.turn_towards(Direction::Stopped), 0);
    }

    #[test]
    fn test_direction_wire_bits() {
        for bits in 0..16u8 {
            let d = Direction::from_bits(bits);
            if bits <= 8 {
                assert_eq!(d.bits(), bits);
            } else {
                assert_eq!(d, Direction::Stopped);
            }
        }
    }

    #[test]
    fn test_neighbour_mask_headings() {
        assert_eq!(Direction::from_neighbour_mask(1), Direction::North);
        assert_eq!(Direction::from_neighbour_mask(12), Direction::SouthWest);
        assert_eq!(Direction::from_neighbour_mask(7), Direction::East);
        assert_eq!(Direction::from_neighbour_mask(5), Direction::Stopped);
        assert_eq!(Direction::from_neighbour_mask(15), Direction::Stopped);
        assert_eq!(Direction::from_neighbour_mask(0), Direction::Stopped);
    }

    // ---- Enums ----

    #[test]
    fn test_collision_mask_groups() {
        assert!(CollisionMask::ENEMY.intersects(CollisionMask::ENEMY_NPC));
        assert!(CollisionMask::ENEMY.intersects(CollisionMask::ENEMY_BASE));
        assert!(!CollisionMask::ENEMY.intersects(CollisionMask::PLAYER));
        assert_eq!(CollisionMask::player(0), CollisionMask::PLAYER1);
        assert_eq!(CollisionMask::player(1), CollisionMask::PLAYER2);
        assert!(CollisionMask::NONE.is_empty());
    }

    #[test]
    fn test_button_state_bits() {
        assert!(ButtonState::Pressed.is_down() && ButtonState::Pressed.changed());
        assert!(!ButtonState::Released.is_down() && ButtonState::Released.changed());
        assert!(ButtonState::Down.is_down() && !ButtonState::Down.changed());
    }

    #[test]
    fn test_round_phase_serde() {
        for v in [RoundPhase::Playing, RoundPhase::LevelCleared, RoundPhase::GameOver] {
            let json = serde_json::to_string(&v).unwrap();
            let back: RoundPhase = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }

    // ---- Commands ----

    #[test]
    fn test_opcode_values() {
        assert_eq!(Opcode::SetViewOffset as u8, 0);
        assert_eq!(Opcode::SetPlayerStat as u8, 6);
        assert_eq!(Opcode::try_from(0xFF), Ok(Opcode::FrameStart));
        assert_eq!(Opcode::try_from(7), Err(7));
    }

    #[test]
    fn test_sprite_image_byte() {
        let image = SpriteImage::new(ImageSet::Fort2, 5);
        assert_eq!(image.to_byte(), 0xF5);
        assert_eq!(SpriteImage::from_byte(0xF5), image);
        assert_eq!(SpriteImage::new(ImageSet::Missile, 0x1F).index, 0x0F);
    }

    #[test]
    fn test_command_list_replay_order() {
        let mut list = CommandList::new();
        list.set_view_offset(I16Vec2::new(5, 6));
        list.set_background_cell(CellPos::new(1, 2), SpriteImage::new(ImageSet::Fort0, 7));
        list.draw_background();
        list.draw_sprite(I16Vec2::new(7, 8), SpriteImage::new(ImageSet::Player0, 2));
        list.clear_background_cell(CellPos::new(1, 2));

        let mut target = RecordingTarget::default();
        list.apply(&mut target);
        assert_eq!(target.commands, list.as_slice());

        let background: Vec<_> = list.background_changes().copied().collect();
        assert_eq!(background.len(), 2);
        assert!(matches!(background[1], Command::ClearBackgroundCell { .. }));
    }

    #[test]
    fn test_cell_from_world() {
        assert_eq!(CellPos::from_world(I16Vec2::new(0, 0)), CellPos::new(0, 0));
        assert_eq!(CellPos::from_world(I16Vec2::new(2047, 31)), CellPos::new(127, 1));
    }

    // ---- Input ----

    struct Fixed {
        direction: Direction,
        down: [bool; 4],
    }

    impl InputSource for Fixed {
        fn player_direction(&self) -> Direction {
            self.direction
        }

        fn button_state(&self, button: Button) -> ButtonState {
            if self.down[button as usize] {
                ButtonState::Down
            } else {
                ButtonState::Up
            }
        }
    }

    #[test]
    fn test_input_byte_layout() {
        let source = Fixed {
            direction: Direction::SouthWest,
            down: [true, false, false, true],
        };
        let byte = encode_input(&source);
        assert_eq!(byte, 0x59);
        assert_eq!(decode_input(byte), (0x09, Direction::SouthWest));
        assert_eq!(encode_input(&IdleInput), 0x80);
    }

    #[test]
    fn test_proxy_input_edges() {
        let mut proxy = ProxyInput::new();
        proxy.apply_byte(0x21);
        assert_eq!(proxy.button_state(Button::A), ButtonState::Pressed);
        assert_eq!(proxy.button_state(Button::B), ButtonState::Up);
        assert_eq!(proxy.player_direction(), Direction::East);
        proxy.end_tick();

        proxy.apply_byte(0x21);
        assert_eq!(proxy.button_state(Button::A), ButtonState::Down);
        proxy.end_tick();

        proxy.apply_byte(0x80);
        assert_eq!(proxy.button_state(Button::A), ButtonState::Released);
        assert_eq!(proxy.player_direction(), Direction::Stopped);
    }

    #[test]
    fn test_proxy_input_latches_press_within_tick() {
        let mut proxy = ProxyInput::new();
        proxy.apply_byte(0x01);
        proxy.apply_byte(0x00);
        assert_eq!(
            proxy.button_state(Button::A),
            ButtonState::Pressed,
            "a tap between ticks must still fire"
        );
        proxy.end_tick();
        assert_eq!(proxy.button_state(Button::A), ButtonState::Up);
    }

    // ---- Levels ----

    #[test]
    fn test_builtin_levels_load() {
        let levels = LevelSet::builtin().unwrap();
        assert_eq!(levels.len(), 20);
        let first = levels.get(0);
        assert_eq!(first.player_starts.len(), 2);
        assert_eq!(first.player_starts[0].location, I16Vec2::new(496, 1536));
        assert_eq!(first.player_starts[0].heading, Direction::West);
        assert_eq!(first.fortresses[0], Rect::new(768, 1024, 128, 128));
        assert_eq!(levels.get(12).fortresses.len(), 24);
        assert_eq!(levels.get(20), levels.get(0), "index wraps past the end");
    }

    #[test]
    fn test_level_validation() {
        let empty = r#"{ "levels": [] }"#;
        assert!(matches!(LevelSet::from_json(empty), Err(LevelError::Empty)));

        let no_starts = r#"{ "levels": [ { "player_starts": [], "fortresses": [] } ] }"#;
        assert!(matches!(
            LevelSet::from_json(no_starts),
            Err(LevelError::NoSpawnPoints { level: 0 })
        ));

        let bad_fort = r#"{ "levels": [ {
            "player_starts": [ { "location": [0, 0], "heading": "North" } ],
            "fortresses": [ { "origin": [0, 0], "size": [0, 64] } ] } ] }"#;
        assert!(matches!(
            LevelSet::from_json(bad_fort),
            Err(LevelError::EmptyFortress { level: 0, fortress: 0 })
        ));

        assert!(matches!(LevelSet::from_json("not json"), Err(LevelError::Parse(_))));
    }

    #[test]
    fn test_level_set_serde_validates() {
        let empty: Result<LevelSet, _> = serde_json::from_str(r#"{ "levels": [] }"#);
        let err = empty.expect_err("empty set must not deserialize");
        assert!(err.to_string().contains("no levels"));

        let levels = LevelSet::builtin().unwrap();
        let json = serde_json::to_string(&levels).unwrap();
        let back: LevelSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, levels);
    }

    #[test]
    fn test_level_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.json");
        std::fs::write(
            &path,
            r#"{ "levels": [ {
                "player_starts": [ { "location": [64, 64], "heading": "East" } ],
                "fortresses": [ { "origin": [512, 512], "size": [96, 96] } ],
                "enemies": 3 } ] }"#,
        )
        .unwrap();
        let levels = LevelSet::load(&path).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels.get(0).enemies, 3);

        let missing = LevelSet::load(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(LevelError::Io { .. })));
    }
}
