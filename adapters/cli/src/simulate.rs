use std::time::Duration;

use anyhow::{bail, Result};
use brawl_arena_core::{
    BlockCatalog, Command, Event, MapLibrary, MatchPhase, PlayerId, PresentationCue, Standing,
};
use brawl_arena_system_match::{LobbyGate, MatchOrchestrator};
use brawl_arena_world::{self as world, query, World};
use clap::Args;
use log::{info, warn};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::settings::Settings;

#[derive(Debug, Args)]
pub(crate) struct SimulateArgs {
    /// Number of scripted players
    #[arg(long, default_value_t = 4)]
    pub(crate) players: u32,
    /// Seed overriding the configured match seed
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Simulated tick length in milliseconds
    #[arg(long, default_value_t = 100)]
    pub(crate) tick_ms: u64,
    /// Abort after this many ticks
    #[arg(long, default_value_t = 50_000)]
    pub(crate) max_ticks: u64,
    /// Chance per tick that a live round claims a player
    #[arg(long, default_value_t = 0.1)]
    pub(crate) lethality: f64,
}

pub(crate) fn run(settings: &Settings, args: &SimulateArgs) -> Result<()> {
    let mut config = settings.match_config();
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    if (args.players as usize) < config.min_players {
        bail!(
            "a match needs at least {} players, got {}",
            config.min_players,
            args.players
        );
    }

    let store = settings.store();
    if store.map_names().is_empty() {
        warn!("no maps found; run `scaffold` first for a playable arena");
    }

    let mut world = World::with_config(world::Config::new(
        config.geometry,
        BlockCatalog::standard(),
    ));
    let mut scripts = ChaCha8Rng::seed_from_u64(config.rng_seed.wrapping_add(1));
    let lethality = args.lethality.clamp(0.0, 1.0);
    let gate = config.lobby_gate;
    let mut orchestrator = MatchOrchestrator::new(config);

    let mut pending = Vec::new();
    orchestrator.open_lobby(&store, &mut pending);
    for id in 1..=args.players {
        pending.push(Command::JoinPlayer {
            player: PlayerId::new(id),
        });
    }

    let dt = Duration::from_millis(args.tick_ms.max(1));
    let mut lobby_resolved = false;
    let mut round_live = false;
    let mut rounds = 0;
    let mut ranking: Vec<Standing> = Vec::new();

    for tick in 0..args.max_ticks {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt }, &mut events);
        for command in std::mem::take(&mut pending) {
            world::apply(&mut world, command, &mut events);
        }

        let mut finished = false;
        for event in &events {
            let Event::Cue { cue } = event else {
                continue;
            };
            println!("[{tick:>6}] {}", describe(cue));
            match cue {
                PresentationCue::RoundStarted => {
                    round_live = true;
                    rounds += 1;
                }
                PresentationCue::RoundResolved { .. } | PresentationCue::RoundTransition => {
                    round_live = false;
                }
                PresentationCue::Ranking { standings } => ranking.clone_from(standings),
                PresentationCue::MatchFinished => finished = true,
                _ => {}
            }
        }

        let players = query::player_view(&world);
        let spawns = query::spawn_points(&world);
        orchestrator.handle(&events, &players, &spawns, &store, &mut pending);

        if finished {
            info!("match finished after {tick} ticks and {rounds} rounds");
            for (place, standing) in ranking.iter().enumerate() {
                println!(
                    "{:>2}. player {} with {} wins",
                    place + 1,
                    standing.player.get(),
                    standing.wins
                );
            }
            return Ok(());
        }

        let alive: Vec<PlayerId> = players
            .iter()
            .filter(|player| !player.dead)
            .map(|player| player.id)
            .collect();
        match query::match_phase(&world) {
            MatchPhase::WaitingForPlayers
                if !lobby_resolved && players.len() == args.players as usize =>
            {
                lobby_resolved = true;
                match gate {
                    LobbyGate::LastStanding => {
                        let survivor = alive.choose(&mut scripts).copied();
                        for player in alive.iter().filter(|id| Some(**id) != survivor) {
                            pending.push(Command::KillPlayer { player: *player });
                        }
                    }
                    LobbyGate::StartSignal => pending.push(Command::RequestMatchStart),
                }
            }
            MatchPhase::Playing if round_live && alive.len() > 1 => {
                if scripts.gen_bool(lethality) {
                    if let Some(victim) = alive.choose(&mut scripts) {
                        pending.push(Command::KillPlayer { player: *victim });
                    }
                }
            }
            _ => {}
        }
    }

    bail!("match did not finish within {} ticks", args.max_ticks)
}

fn describe(cue: &PresentationCue) -> String {
    match cue {
        PresentationCue::RoundTransition => "next round".to_owned(),
        PresentationCue::Countdown { remaining: 0 } => "go!".to_owned(),
        PresentationCue::Countdown { remaining } => format!("{remaining}..."),
        PresentationCue::RoundStarted => "round started".to_owned(),
        PresentationCue::RoundResolved {
            winner: Some(player),
        } => format!("player {} wins the round", player.get()),
        PresentationCue::RoundResolved { winner: None } => "draw".to_owned(),
        PresentationCue::TrophyTransition => "trophy ceremony".to_owned(),
        PresentationCue::Ranking { standings } => {
            format!("ranking of {} players", standings.len())
        }
        PresentationCue::MatchFinished => "match finished".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_zero_reads_as_go() {
        assert_eq!(describe(&PresentationCue::Countdown { remaining: 0 }), "go!");
        assert_eq!(describe(&PresentationCue::Countdown { remaining: 2 }), "2...");
        assert_eq!(
            describe(&PresentationCue::RoundResolved {
                winner: Some(PlayerId::new(3))
            }),
            "player 3 wins the round"
        );
    }
}
