use std::{collections::BTreeMap, time::Duration};

use brawl_arena_core::{
    BlockRecord, BlockType, Command, Event, MapDescriptor, MapLibrary, PlayerId, PresentationCue,
    WorldPoint,
};
use brawl_arena_system_match::{Config, MatchOrchestrator};
use brawl_arena_world::{self as world, query, World};

const TICK: Duration = Duration::from_millis(250);

struct Library(BTreeMap<String, MapDescriptor>);

impl MapLibrary for Library {
    fn map_names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    fn load_map(&self, name: &str) -> Option<MapDescriptor> {
        self.0.get(name).cloned()
    }
}

fn library() -> Library {
    let names = ["lobby", "trophy", "alpha", "beta", "gamma", "delta"];
    let maps = names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let lift = index as f32;
            let blocks = [-6.0, -2.0, 2.0, 6.0]
                .into_iter()
                .flat_map(|x| {
                    [
                        BlockRecord::new(BlockType::Spawn, WorldPoint::new(x, lift)),
                        BlockRecord::new(BlockType::Platform, WorldPoint::new(x, lift - 2.0)),
                    ]
                })
                .collect();
            ((*name).to_owned(), MapDescriptor::new(blocks))
        })
        .collect();
    Library(maps)
}

#[test]
fn identical_seeds_replay_identical_matches() {
    let first = replay(99);
    let second = replay(99);

    assert_eq!(first, second, "replay diverged between runs");
    assert!(
        first.iter().any(|command| matches!(
            command,
            Command::Present {
                cue: PresentationCue::MatchFinished
            }
        )),
        "replay never finished the match"
    );
}

fn replay(seed: u64) -> Vec<Command> {
    let library = library();
    let mut world = World::new();
    let mut orchestrator = MatchOrchestrator::new(Config {
        countdown_step: TICK,
        round_pause: TICK,
        trophy_pause: TICK,
        elimination_interval: TICK,
        rng_seed: seed,
        ..Config::default()
    });

    let mut log = Vec::new();
    let mut pending = Vec::new();
    orchestrator.open_lobby(&library, &mut pending);
    pending.extend((1..=4).map(|id| Command::JoinPlayer {
        player: PlayerId::new(id),
    }));

    // Player 1 outlasts everyone in the lobby and in every round.
    let victims: Vec<Command> = (2..=4)
        .map(|id| Command::KillPlayer {
            player: PlayerId::new(id),
        })
        .collect();
    let mut lobby_cleared = false;

    for _ in 0..2_000 {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: TICK }, &mut events);
        for command in std::mem::take(&mut pending) {
            world::apply(&mut world, command, &mut events);
        }

        let players = query::player_view(&world);
        let spawns = query::spawn_points(&world);
        orchestrator.handle(&events, &players, &spawns, &library, &mut pending);
        log.extend(pending.iter().cloned());

        let finished = events.contains(&Event::Cue {
            cue: PresentationCue::MatchFinished,
        });
        if finished {
            break;
        }
        let round_started = events.contains(&Event::Cue {
            cue: PresentationCue::RoundStarted,
        });
        if round_started || (!lobby_cleared && players.len() == 4) {
            lobby_cleared = true;
            pending.extend(victims.iter().cloned());
        }
    }
    log
}
