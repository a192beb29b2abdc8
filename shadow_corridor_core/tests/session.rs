use rand::{Rng, SeedableRng, rngs::StdRng};
use shadow_corridor_core::{
    CellCoord,
    config::Config,
    map::Direction,
    maze::generate_maze,
    motion::MovementInput,
    player::MAX_VITAL,
    session::{GameEvent, Session},
};

/// `generate_maze(10, 4.0, StdRng::seed_from_u64(42))`.
const GOLDEN_MAZE: [&str; 21] = [
    "#####################",
    "#   #               #",
    "# ### # ### #########",
    "#     #   # #       #",
    "# ####### ### ##### #",
    "#   #   # #     #   #",
    "##### # # # ##### # #",
    "#     #   # #     # #",
    "# ### ##### # #######",
    "# # # #     # #     #",
    "# # # # ##### # ### #",
    "# # # # # # #   #   #",
    "# # # # # # # ### # #",
    "# #   #   # #   # # #",
    "# # ##### # ##### ###",
    "# #     # #     #   #",
    "# # ##### ##### # # #",
    "# # #     # #   # # #",
    "# ### ##### # ##### #",
    "#           #       #",
    "#####################",
];

#[test]
fn golden_seed_reproduces_maze() {
    let first = generate_maze(10, 4.0, &mut StdRng::seed_from_u64(42)).unwrap();
    for _ in 0..3 {
        let again = generate_maze(10, 4.0, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(again.start, first.start);
        assert_eq!(again.exit, first.exit);
        assert_eq!(again.maze.grid(), first.maze.grid());
    }

    assert_eq!(first.start, CellCoord::new(5, 5));
    assert_eq!(first.exit, CellCoord::new(0, 0));
    assert_eq!(first.maze.to_ascii().lines().collect::<Vec<_>>(), GOLDEN_MAZE);

    let grid = first.maze.grid();
    assert_eq!(grid.open_passage_count(), 99);
    assert_eq!(
        first.start_position(),
        first.maze.cell_center(first.start)
    );
}

#[test]
fn different_seeds_differ() {
    let a = generate_maze(10, 4.0, &mut StdRng::seed_from_u64(1)).unwrap();
    let b = generate_maze(10, 4.0, &mut StdRng::seed_from_u64(2)).unwrap();
    assert_ne!(a.maze.to_ascii(), b.maze.to_ascii());
}

#[test]
fn open_passages_are_passable_in_world_space() {
    let generated = generate_maze(8, 4.0, &mut StdRng::seed_from_u64(17)).unwrap();
    let maze = &generated.maze;
    let grid = maze.grid();
    for z in 0..8 {
        for x in 0..8 {
            let center = maze.cell_center(CellCoord::new(x, z));
            if grid.is_open(x, z, Direction::East) {
                let boundary = (x + 1) as f64 * 4.0;
                for offset in [-0.29, -0.01, 0.0, 0.01, 0.29] {
                    assert!(!maze.is_blocked(boundary + offset, center.z));
                }
            } else if x + 1 < 8 {
                let boundary = (x + 1) as f64 * 4.0;
                assert!(maze.is_blocked(boundary - 0.1, center.z));
                assert!(maze.is_blocked(boundary + 0.1, center.z));
            }
        }
    }
}

#[test]
fn sessions_are_deterministic_per_seed() {
    let a = Session::new(Config::default(), &mut StdRng::seed_from_u64(99)).unwrap();
    let b = Session::new(Config::default(), &mut StdRng::seed_from_u64(99)).unwrap();
    assert_eq!(a.start_cell(), b.start_cell());
    assert_eq!(a.exit_cell(), b.exit_cell());
    assert_eq!(a.enemies(), b.enemies());
}

#[test]
fn enemies_spawn_clear_of_the_player() {
    for seed in 0..30 {
        let session = Session::new(Config::default(), &mut StdRng::seed_from_u64(seed)).unwrap();
        let player = session.player().position;
        assert_eq!(session.enemies().len(), 3);
        for enemy in session.enemies() {
            assert!((enemy.position.x - player.x).abs() >= 12.0, "seed {seed}");
            assert!((enemy.position.z - player.z).abs() >= 12.0, "seed {seed}");
        }
    }
}

#[test]
fn long_random_run_keeps_invariants() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut session = Session::new(Config::default(), &mut rng).unwrap();
    let mut now = 0;

    for frame in 0..5000 {
        let input = MovementInput {
            forward: rng.random_bool(0.6),
            backward: rng.random_bool(0.1),
            left: rng.random_bool(0.2),
            right: rng.random_bool(0.2),
            running: rng.random_bool(0.3),
        };
        if frame % 40 == 0 {
            session.turn(rng.random_range(-1.0..1.0));
        }
        if frame % 300 == 0 {
            session.toggle_flashlight();
        }
        now += 16;
        let events = session.tick(&input, 0.016, now, &mut rng);

        let vitals = session.player().vitals;
        assert!((0.0..=MAX_VITAL).contains(&vitals.health()));
        assert!((0.0..=MAX_VITAL).contains(&vitals.sanity()));
        assert!(session.maze().cell_at(session.player().position).is_some());
        for enemy in session.enemies() {
            assert!(session.maze().cell_at(enemy.position).is_some());
        }

        if events.iter().any(|e| matches!(e, GameEvent::GameOver(_))) {
            assert!(session.is_over());
        }
        if session.is_over() {
            let position = session.player().position;
            assert!(session.tick(&input, 0.016, now + 16, &mut rng).is_empty());
            assert_eq!(session.player().position, position);
            break;
        }
    }
}
