#[cfg(test)]
mod tests {
    use glam::IVec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use kobo_core::constants::{ENEMY_RELAXED_MIN, ENEMY_RELAXED_SPREAD};
    use kobo_core::types::Direction;

    use crate::spawn::{decide, launch_offset, spawn_probability, Emitter, SpawnDecision, SpawnTuning};
    use crate::steering::{pursuit_turn, relaxed_factor, steer};

    // ---- Steering ----

    #[test]
    fn test_pursuit_turn_is_capped() {
        // Player directly behind: shortest turn is 4, capped to a quarter turn.
        assert_eq!(pursuit_turn(Direction::North, IVec2::new(0, 100)).abs(), 2);
        assert_eq!(pursuit_turn(Direction::North, IVec2::new(100, 0)), 2);
        assert_eq!(pursuit_turn(Direction::North, IVec2::new(100, -100)), 1);
        assert_eq!(pursuit_turn(Direction::East, IVec2::new(50, 0)), 0);
    }

    #[test]
    fn test_steer_with_relaxed_one_always_decides() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let next = steer(Direction::North, 1, Some(IVec2::new(200, 0)), &mut rng);
            assert_eq!(next, Direction::East, "steers a quarter turn toward the ship");
        }
    }

    #[test]
    fn test_steer_wanders_one_step_without_player() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut seen_left = false;
        let mut seen_right = false;
        for _ in 0..200 {
            let next = steer(Direction::South, 1, None, &mut rng);
            match next {
                Direction::SouthWest => seen_left = true,
                Direction::SouthEast => seen_right = true,
                other => panic!("wander produced {other:?}"),
            }
        }
        assert!(seen_left && seen_right, "both wander directions should occur");
    }

    #[test]
    fn test_steer_mostly_keeps_heading() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let kept = (0..1000)
            .filter(|_| steer(Direction::West, 50, None, &mut rng) == Direction::West)
            .count();
        assert!(kept > 900, "relaxed enemies rarely turn, kept {kept}");
    }

    #[test]
    fn test_relaxed_factor_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..500 {
            let r = relaxed_factor(&mut rng);
            assert!((ENEMY_RELAXED_MIN..ENEMY_RELAXED_MIN + ENEMY_RELAXED_SPREAD).contains(&r));
        }
    }

    // ---- Spawn probability ----

    #[test]
    fn test_spawn_probability_near_and_far() {
        let tuning = SpawnTuning::default();
        let near_sq = tuning.near_distance_sq();
        assert_eq!(spawn_probability(0, &tuning), 0.9);
        assert_eq!(spawn_probability(near_sq, &tuning), 0.9);
        let at_double = spawn_probability(near_sq * 4, &tuning);
        assert!((at_double - 0.225).abs() < 1e-9, "inverse square falloff, got {at_double}");
        assert!(spawn_probability(near_sq * 100, &tuning) < spawn_probability(near_sq * 2, &tuning));
    }

    #[test]
    fn test_decide_without_players_does_nothing() {
        let tuning = SpawnTuning {
            attempt_period_ticks: 1,
            launch_period_ticks: 1,
            ..SpawnTuning::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for emitter in [Emitter::Core, Emitter::Leaf, Emitter::Wall] {
            assert_eq!(decide(emitter, None, 0, &tuning, &mut rng), SpawnDecision::Nothing);
        }
    }

    #[test]
    fn test_decide_roles() {
        let tuning = SpawnTuning {
            attempt_period_ticks: 1,
            launch_period_ticks: 1,
            near_chance: 1.0,
            ..SpawnTuning::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(decide(Emitter::Leaf, Some(0), 0, &tuning, &mut rng), SpawnDecision::FireShot);
        assert_eq!(decide(Emitter::Core, Some(0), 0, &tuning, &mut rng), SpawnDecision::LaunchEnemy);
        assert_eq!(decide(Emitter::Wall, Some(0), 0, &tuning, &mut rng), SpawnDecision::Nothing);
        assert_eq!(
            decide(Emitter::Core, Some(0), tuning.max_enemies, &tuning, &mut rng),
            SpawnDecision::Nothing,
            "launches stop at the enemy cap"
        );
    }

    #[test]
    fn test_decide_is_reproducible() {
        let tuning = SpawnTuning::default();
        let run = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..500)
                .map(|i| decide(Emitter::Leaf, Some(i * 1000), 0, &tuning, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn test_launch_offset_within_jitter() {
        let tuning = SpawnTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..200 {
            let (x, y) = launch_offset(&tuning, &mut rng);
            assert!(x.abs() <= tuning.launch_jitter && y.abs() <= tuning.launch_jitter);
        }
    }

    #[test]
    fn test_tuning_partial_json_uses_defaults() {
        let tuning: SpawnTuning = serde_json::from_str(r#"{ "near_chance": 0.5 }"#).unwrap();
        assert_eq!(tuning.near_chance, 0.5);
        assert_eq!(tuning.max_enemies, SpawnTuning::default().max_enemies);
    }
}
