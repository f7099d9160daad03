use std::time::Duration;

use pattern_recall_core::{
    CellDisplay, CellFeedback, Command, Event, InputRejection, Level, RoundPhase,
    SessionOutcome, FEEDBACK_DURATION, LEVEL_COUNT, MISTAKE_LIMIT,
};
use pattern_recall_world::{apply, query, Config, World};

const FRAME: Duration = Duration::from_millis(100);
const PAST_FEEDBACK: Duration = Duration::from_millis(1_100);

fn tick(world: &mut World, dt: Duration, events: &mut Vec<Event>) {
    apply(world, Command::Tick { dt }, events);
}

fn open_input(world: &mut World, events: &mut Vec<Event>) {
    for _ in 0..200 {
        if query::phase(world) == RoundPhase::Input {
            return;
        }
        tick(world, FRAME, events);
    }
    panic!("reveal never opened input");
}

fn pick_targets(world: &mut World, events: &mut Vec<Event>) {
    let targets: Vec<_> = query::targets(world).iter().copied().collect();
    for cell in targets {
        apply(world, Command::TogglePick { cell }, events);
    }
}

fn play_perfect_round(world: &mut World, events: &mut Vec<Event>) {
    open_input(world, events);
    pick_targets(world, events);
    apply(world, Command::Confirm, events);
    tick(world, PAST_FEEDBACK, events);
}

fn play_empty_round(world: &mut World, events: &mut Vec<Event>) {
    open_input(world, events);
    apply(world, Command::Confirm, events);
    tick(world, PAST_FEEDBACK, events);
}

#[test]
fn perfect_round_scores_targets_plus_level_bonus() {
    let mut world = World::new(Config::new(7));
    let mut events = Vec::new();
    open_input(&mut world, &mut events);
    pick_targets(&mut world, &mut events);
    let target_count = query::targets(&world).len() as u32;

    apply(&mut world, Command::Confirm, &mut events);

    let expected = target_count + 2;
    assert_eq!(query::phase(&world), RoundPhase::Feedback);
    assert_eq!(query::score(&world), expected);
    assert_eq!(query::mistakes(&world), 0);
    assert_eq!(
        events.last(),
        Some(&Event::AnswerChecked {
            perfect: true,
            gained: expected,
            score: expected,
            mistakes: 0,
        })
    );
    for &cell in query::targets(&world) {
        assert_eq!(query::cell_display(&world, cell), CellDisplay::Correct);
    }

    tick(&mut world, PAST_FEEDBACK, &mut events);
    assert_eq!(query::phase(&world), RoundPhase::Reveal);
    assert_eq!(query::level(&world), Level::new(1).expect("valid level"));
    assert!(events.contains(&Event::LevelAdvanced {
        level: Level::new(1).expect("valid level")
    }));
    assert_eq!(query::grid_shape(&world), Level::new(1).expect("valid level").shape());
}

#[test]
fn feedback_stays_visible_for_its_full_duration() {
    let mut world = World::new(Config::new(8));
    let mut events = Vec::new();
    open_input(&mut world, &mut events);
    apply(&mut world, Command::Confirm, &mut events);

    tick(&mut world, FEEDBACK_DURATION, &mut events);
    assert_eq!(query::phase(&world), RoundPhase::Feedback);

    tick(&mut world, Duration::from_millis(1), &mut events);
    assert_eq!(query::phase(&world), RoundPhase::Reveal);
}

#[test]
fn imperfect_round_retries_same_level_with_new_round() {
    let mut world = World::new(Config::new(9));
    let mut events = Vec::new();
    open_input(&mut world, &mut events);
    apply(&mut world, Command::Confirm, &mut events);

    assert_eq!(query::mistakes(&world), 1);
    assert_eq!(query::lives(&world), 2);
    assert!(query::feedback(&world)
        .values()
        .all(|verdict| *verdict == CellFeedback::Wrong));

    events.clear();
    tick(&mut world, PAST_FEEDBACK, &mut events);

    assert_eq!(query::phase(&world), RoundPhase::Reveal);
    assert_eq!(query::level(&world), Level::FIRST);
    assert!(query::picks(&world).is_empty());
    assert!(query::feedback(&world).is_empty());
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::RoundStarted { level, .. } if *level == Level::FIRST)));
}

#[test]
fn fourth_mistake_shows_feedback_then_ends_session() {
    let mut world = World::new(Config::new(10));
    let mut events = Vec::new();
    for _ in 1..MISTAKE_LIMIT {
        play_empty_round(&mut world, &mut events);
    }
    assert_eq!(query::mistakes(&world), MISTAKE_LIMIT - 1);
    assert_eq!(query::lives(&world), 0);

    open_input(&mut world, &mut events);
    apply(&mut world, Command::Confirm, &mut events);
    assert_eq!(query::mistakes(&world), MISTAKE_LIMIT);
    assert_eq!(query::phase(&world), RoundPhase::Feedback);

    tick(&mut world, PAST_FEEDBACK, &mut events);
    assert_eq!(query::phase(&world), RoundPhase::GameOver);
    assert_eq!(query::lives(&world), 0);
    assert_eq!(
        events.last(),
        Some(&Event::SessionEnded {
            outcome: SessionOutcome::GameOver,
            score: 0,
        })
    );
    assert!(query::board(&world)
        .iter()
        .all(|snapshot| snapshot.display == CellDisplay::Idle && !snapshot.picked));
}

#[test]
fn terminal_phase_ignores_everything_but_restart() {
    let mut world = World::new(Config::new(11));
    let mut events = Vec::new();
    for _ in 0..MISTAKE_LIMIT {
        play_empty_round(&mut world, &mut events);
    }
    assert_eq!(query::phase(&world), RoundPhase::GameOver);

    events.clear();
    apply(&mut world, Command::Confirm, &mut events);
    tick(&mut world, Duration::from_secs(10), &mut events);
    assert_eq!(query::phase(&world), RoundPhase::GameOver);
    assert_eq!(
        events,
        vec![
            Event::InputRejected {
                reason: InputRejection::WrongPhase {
                    phase: RoundPhase::GameOver
                }
            },
            Event::TimeAdvanced {
                dt: Duration::from_secs(10)
            },
        ]
    );
}

#[test]
fn clearing_last_level_congratulates() {
    let mut world = World::new(Config::new(12));
    let mut events = Vec::new();
    let mut expected_score = 0;

    for level in Level::all() {
        assert_eq!(query::level(&world), level);
        expected_score += query::targets(&world).len() as u32 + level.number() * 2;
        play_perfect_round(&mut world, &mut events);
    }

    assert_eq!(query::phase(&world), RoundPhase::Congrats);
    assert_eq!(query::level(&world), Level::LAST);
    assert_eq!(query::hud(&world).level, LEVEL_COUNT as u32);
    assert_eq!(query::score(&world), expected_score);
    assert_eq!(
        events.last(),
        Some(&Event::SessionEnded {
            outcome: SessionOutcome::Congrats,
            score: expected_score,
        })
    );
}

#[test]
fn restart_resets_counters_and_starts_revealing() {
    let mut world = World::new(Config::new(13));
    let mut events = Vec::new();
    play_perfect_round(&mut world, &mut events);
    for _ in 0..MISTAKE_LIMIT {
        play_empty_round(&mut world, &mut events);
    }
    assert_eq!(query::phase(&world), RoundPhase::GameOver);
    assert!(query::score(&world) > 0);

    events.clear();
    apply(&mut world, Command::Restart, &mut events);

    assert_eq!(query::phase(&world), RoundPhase::Reveal);
    assert_eq!(query::level(&world), Level::FIRST);
    assert_eq!(query::score(&world), 0);
    assert_eq!(query::mistakes(&world), 0);
    assert_eq!(query::lives(&world), 3);
    assert_eq!(events.first(), Some(&Event::SessionReset));
    assert!(matches!(
        events.get(1),
        Some(Event::RoundStarted { level, .. }) if *level == Level::FIRST
    ));
}

#[test]
fn same_seed_replays_identical_sessions() {
    let script = |world: &mut World| {
        let mut events = Vec::new();
        play_perfect_round(world, &mut events);
        play_empty_round(world, &mut events);
        play_perfect_round(world, &mut events);
        open_input(world, &mut events);
        (events, query::targets(world).clone(), query::score(world))
    };

    let mut first = World::new(Config::new(0xfeed));
    let mut second = World::new(Config::new(0xfeed));

    assert_eq!(script(&mut first), script(&mut second));
}
