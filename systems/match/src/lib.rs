#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Match orchestration driving the lobby, round loop and trophy ceremony.
//!
//! The orchestrator is a pure system: it consumes world events together with
//! immutable player and spawn views, and answers with command batches. Timed
//! flows such as the countdown or the elimination ceremony are expressed as a
//! step [`Sequence`](sequence::Sequence) that advances at most one step per
//! observed tick.

mod sequence;
mod spawn;

use std::time::Duration;

use brawl_arena_core::{
    Command, Event, GridGeometry, MapLibrary, MatchPhase, PlayerId, PlayerView,
    PresentationCue, Standing, WorldPoint,
};
use brawl_arena_system_validation::validate_descriptor;
use log::{debug, error, info, warn};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

use self::sequence::{Advance, Sequence, Step};

pub use spawn::{assign_spawn_points, SpawnAssignment, SpawnPlan};

/// Condition that ends the lobby and starts the round loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LobbyGate {
    /// Start once every lobby player but one has died.
    #[default]
    LastStanding,
    /// Start once an explicit start request arrives.
    StartSignal,
}

/// Tuning parameters for the match lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Geometry used to validate candidate maps.
    pub geometry: GridGeometry,
    /// Players required before the lobby may start a match.
    pub min_players: usize,
    /// Round wins that end the match.
    pub wins_needed: u32,
    /// Number of countdown steps before movement unlocks.
    pub countdown_ticks: u32,
    /// Duration of a single countdown step.
    pub countdown_step: Duration,
    /// Pause between a resolved round and the next map.
    pub round_pause: Duration,
    /// Pause before the trophy ceremony starts.
    pub trophy_pause: Duration,
    /// Delay between eliminations during the ceremony.
    pub elimination_interval: Duration,
    /// Radius around a spawn that must be free of other players.
    pub spawn_tolerance: f32,
    /// Map loaded for the trophy ceremony.
    pub trophy_map: String,
    /// Map loaded whenever the lobby opens, if any.
    pub lobby_map: Option<String>,
    /// Condition that ends the lobby.
    pub lobby_gate: LobbyGate,
    /// Seed for map and spawn selection.
    pub rng_seed: u64,
}

impl Config {
    /// Creates a configuration with stock tuning for the provided geometry.
    #[must_use]
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            min_players: 2,
            wins_needed: 3,
            countdown_ticks: 3,
            countdown_step: Duration::from_secs(1),
            round_pause: Duration::from_secs(2),
            trophy_pause: Duration::from_secs(2),
            elimination_interval: Duration::from_secs(1),
            spawn_tolerance: 0.5,
            trophy_map: "trophy".to_owned(),
            lobby_map: Some("lobby".to_owned()),
            lobby_gate: LobbyGate::LastStanding,
            rng_seed: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(GridGeometry::default())
    }
}

/// Snapshot of the orchestrator's bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchState {
    /// Phase the orchestrator believes the match is in.
    pub phase: MatchPhase,
    /// Players currently on the roster.
    pub player_count: usize,
    /// Dead players currently on the roster.
    pub death_count: usize,
    /// Whether a round or ceremony sequence is running.
    pub sequence_in_flight: bool,
    /// Map picked for the current round, if any.
    pub current_map: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
enum Action {
    ScoreRound,
    Present(PresentationCue),
    LoadNextMap,
    LoadTrophyMap,
    ResetPlayers,
    PlacePlayers { tolerate_contention: bool },
    UnlockMovement,
    ShowRanking,
    Eliminate(PlayerId),
    FinishMatch,
}

struct Context<'a> {
    players: &'a PlayerView,
    spawn_points: &'a [WorldPoint],
    library: &'a dyn MapLibrary,
}

/// Drives the match lifecycle from world events.
#[derive(Debug)]
pub struct MatchOrchestrator {
    config: Config,
    phase: MatchPhase,
    player_count: usize,
    death_count: usize,
    first_round: bool,
    start_requested: bool,
    sequence: Option<Sequence<Action>>,
    current_map: Option<String>,
    rng: ChaCha8Rng,
}

impl MatchOrchestrator {
    /// Creates a new orchestrator waiting for players.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        Self {
            config,
            phase: MatchPhase::WaitingForPlayers,
            player_count: 0,
            death_count: 0,
            first_round: false,
            start_requested: false,
            sequence: None,
            current_map: None,
            rng,
        }
    }

    /// Configuration the orchestrator was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consumes world events and emits the commands that advance the match.
    ///
    /// `players` and `spawn_points` must reflect the world after the events
    /// were produced.
    pub fn handle(
        &mut self,
        events: &[Event],
        players: &PlayerView,
        spawn_points: &[WorldPoint],
        library: &dyn MapLibrary,
        out: &mut Vec<Command>,
    ) {
        let mut ticks = Vec::new();
        let mut joined = Vec::new();
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => ticks.push(*dt),
                Event::PlayerJoined { player } => joined.push(*player),
                Event::MatchStartRequested => self.start_requested = true,
                _ => {}
            }
        }

        // Counters mirror the roster, so departed players drop out of both.
        self.player_count = players.len();
        self.death_count = players.len() - players.alive_count();

        let context = Context {
            players,
            spawn_points,
            library,
        };

        if !joined.is_empty() && self.phase == MatchPhase::WaitingForPlayers {
            self.place_joiners(&joined, &context, out);
        }

        for dt in ticks {
            self.advance_sequence(dt, &context, out);
        }

        if self.sequence.is_none() {
            self.evaluate_guards(&context, out);
        }
    }

    /// Starts a round sequence unless one is already in flight.
    ///
    /// Returns `false` when the trigger was dropped.
    pub fn trigger_round(&mut self) -> bool {
        if self.sequence.is_some() {
            debug!("round trigger dropped; a sequence is already in flight");
            return false;
        }
        self.sequence = Some(Sequence::new(self.round_steps()));
        true
    }

    /// Whether a round or ceremony sequence is currently running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.sequence.is_some()
    }

    /// Captures the orchestrator's bookkeeping.
    #[must_use]
    pub fn state(&self) -> MatchState {
        MatchState {
            phase: self.phase,
            player_count: self.player_count,
            death_count: self.death_count,
            sequence_in_flight: self.sequence.is_some(),
            current_map: self.current_map.clone(),
        }
    }

    /// Loads the configured lobby map, if any.
    pub fn open_lobby(&mut self, library: &dyn MapLibrary, out: &mut Vec<Command>) {
        let Some(name) = self.config.lobby_map.clone() else {
            return;
        };
        match library.load_map(&name) {
            Some(descriptor) => out.push(Command::LoadMap { name, descriptor }),
            None => warn!("lobby map `{name}` is unavailable"),
        }
    }

    fn round_steps(&self) -> Vec<Step<Action>> {
        let mut steps = vec![
            Step::Run(Action::ScoreRound),
            Step::Wait(self.config.round_pause),
            Step::Run(Action::Present(PresentationCue::RoundTransition)),
            Step::Run(Action::LoadNextMap),
            Step::Run(Action::ResetPlayers),
            Step::Run(Action::PlacePlayers {
                tolerate_contention: false,
            }),
        ];
        for remaining in (1..=self.config.countdown_ticks).rev() {
            steps.push(Step::Run(Action::Present(PresentationCue::Countdown {
                remaining,
            })));
            steps.push(Step::Wait(self.config.countdown_step));
        }
        steps.push(Step::Run(Action::UnlockMovement));
        steps
    }

    fn trophy_steps(&self) -> Vec<Step<Action>> {
        vec![
            Step::Wait(self.config.trophy_pause),
            Step::Run(Action::Present(PresentationCue::TrophyTransition)),
            Step::Run(Action::LoadTrophyMap),
            Step::Run(Action::ResetPlayers),
            Step::Run(Action::PlacePlayers {
                tolerate_contention: true,
            }),
            Step::Run(Action::ShowRanking),
        ]
    }

    fn advance_sequence(&mut self, dt: Duration, context: &Context<'_>, out: &mut Vec<Command>) {
        let Some(sequence) = self.sequence.as_mut() else {
            return;
        };
        match sequence.advance(dt) {
            Advance::Waiting => {}
            Advance::Run(action) => self.execute(action, context, out),
            Advance::Finished => self.sequence = None,
        }
        if self.sequence.as_ref().is_some_and(Sequence::is_finished) {
            self.sequence = None;
        }
    }

    fn evaluate_guards(&mut self, context: &Context<'_>, out: &mut Vec<Command>) {
        match self.phase {
            MatchPhase::WaitingForPlayers => {
                if self.lobby_ready() {
                    self.start_match(out);
                }
            }
            MatchPhase::Playing => {
                if self.player_count == 0 {
                    warn!("every player left mid-match; reopening the lobby");
                    self.set_phase(MatchPhase::WaitingForPlayers, out);
                    self.open_lobby(context.library, out);
                } else if self.death_count + 1 >= self.player_count {
                    let winner = if context.players.alive_count() == 1 {
                        context
                            .players
                            .iter()
                            .find(|player| !player.dead)
                            .map(|player| player.id)
                    } else {
                        None
                    };
                    out.push(Command::Present {
                        cue: PresentationCue::RoundResolved { winner },
                    });
                    let _ = self.trigger_round();
                }
            }
            MatchPhase::Trophy => {}
        }
    }

    fn lobby_ready(&mut self) -> bool {
        if self.player_count < self.config.min_players {
            if self.start_requested {
                debug!("start request dropped; not enough players");
                self.start_requested = false;
            }
            return false;
        }
        match self.config.lobby_gate {
            LobbyGate::LastStanding => self.death_count + 1 >= self.player_count,
            LobbyGate::StartSignal => self.start_requested,
        }
    }

    fn start_match(&mut self, out: &mut Vec<Command>) {
        info!("starting match with {} players", self.player_count);
        self.start_requested = false;
        self.first_round = true;
        self.set_phase(MatchPhase::Playing, out);
        let _ = self.trigger_round();
    }

    fn set_phase(&mut self, phase: MatchPhase, out: &mut Vec<Command>) {
        self.phase = phase;
        out.push(Command::SetMatchPhase { phase });
    }

    fn execute(&mut self, action: Action, context: &Context<'_>, out: &mut Vec<Command>) {
        match action {
            Action::ScoreRound => self.score_round(context.players, out),
            Action::Present(cue) => out.push(Command::Present { cue }),
            Action::LoadNextMap => self.load_next_map(context.library, out),
            Action::LoadTrophyMap => {
                let name = self.config.trophy_map.clone();
                match context.library.load_map(&name) {
                    Some(descriptor) => out.push(Command::LoadMap { name, descriptor }),
                    None => warn!("trophy map `{name}` is unavailable"),
                }
            }
            Action::ResetPlayers => {
                for player in context.players.iter() {
                    out.push(Command::RespawnPlayer { player: player.id });
                    out.push(Command::SetPlayerMovement {
                        player: player.id,
                        enabled: false,
                    });
                }
                out.push(Command::SetCratePhysics { enabled: false });
            }
            Action::PlacePlayers {
                tolerate_contention,
            } => {
                let roster: Vec<PlayerId> = context.players.iter().map(|p| p.id).collect();
                let plan = assign_spawn_points(
                    &roster,
                    &[],
                    context.spawn_points,
                    self.config.spawn_tolerance,
                    tolerate_contention,
                    &mut self.rng,
                );
                push_placements(&plan, out);
            }
            Action::UnlockMovement => {
                for player in context.players.iter() {
                    out.push(Command::SetPlayerMovement {
                        player: player.id,
                        enabled: true,
                    });
                }
                out.push(Command::SetCratePhysics { enabled: true });
                out.push(Command::Present {
                    cue: PresentationCue::Countdown { remaining: 0 },
                });
                out.push(Command::Present {
                    cue: PresentationCue::RoundStarted,
                });
            }
            Action::ShowRanking => self.show_ranking(context.players, out),
            Action::Eliminate(player) => out.push(Command::KillPlayer { player }),
            Action::FinishMatch => {
                for player in context.players.iter() {
                    out.push(Command::SetPlayerWins {
                        player: player.id,
                        wins: 0,
                    });
                    out.push(Command::RemovePlayer { player: player.id });
                }
                self.player_count = 0;
                self.death_count = 0;
                self.first_round = false;
                self.start_requested = false;
                self.set_phase(MatchPhase::WaitingForPlayers, out);
                out.push(Command::Present {
                    cue: PresentationCue::MatchFinished,
                });
                info!("match finished; lobby reopened");
                self.open_lobby(context.library, out);
            }
        }
    }

    fn score_round(&mut self, players: &PlayerView, out: &mut Vec<Command>) {
        if self.first_round {
            self.first_round = false;
            for player in players.iter() {
                out.push(Command::SetPlayerWins {
                    player: player.id,
                    wins: 0,
                });
            }
            return;
        }

        let mut champion = false;
        for player in players.iter().filter(|player| !player.dead) {
            let wins = player.wins.saturating_add(1);
            out.push(Command::SetPlayerWins {
                player: player.id,
                wins,
            });
            champion |= wins >= self.config.wins_needed;
        }

        if champion {
            info!("a player reached {} wins", self.config.wins_needed);
            self.set_phase(MatchPhase::Trophy, out);
            let steps = self.trophy_steps();
            if let Some(sequence) = self.sequence.as_mut() {
                let skipped = sequence.skip_remaining();
                debug!("skipped {skipped} round steps for the trophy ceremony");
                sequence.extend(steps);
            }
        }
    }

    fn load_next_map(&mut self, library: &dyn MapLibrary, out: &mut Vec<Command>) {
        let trophy = self.config.trophy_map.as_str();
        let lobby = self.config.lobby_map.as_deref();
        let mut candidates: Vec<String> = library
            .map_names()
            .into_iter()
            .filter(|name| name != trophy && Some(name.as_str()) != lobby)
            .collect();
        candidates.shuffle(&mut self.rng);

        if candidates.len() > 1 {
            if let Some(previous) = &self.current_map {
                if let Some(index) = candidates.iter().position(|name| name == previous) {
                    let repeat = candidates.remove(index);
                    candidates.push(repeat);
                }
            }
        }

        for name in candidates {
            let Some(descriptor) = library.load_map(&name) else {
                warn!("map `{name}` is listed but could not be loaded");
                continue;
            };
            let report = validate_descriptor(&descriptor, &self.config.geometry);
            if !report.valid {
                debug!("skipping map `{name}`: {}", report.reason);
                continue;
            }
            info!("next round plays on `{name}`");
            out.push(Command::LoadMap {
                name: name.clone(),
                descriptor,
            });
            self.current_map = Some(name);
            return;
        }

        error!("no valid map available for the next round");
    }

    fn show_ranking(&mut self, players: &PlayerView, out: &mut Vec<Command>) {
        let mut standings: Vec<Standing> = players
            .iter()
            .map(|player| Standing {
                player: player.id,
                wins: player.wins,
            })
            .collect();
        standings.sort_by(|a, b| b.wins.cmp(&a.wins).then(a.player.cmp(&b.player)));

        let mut losers: Vec<Standing> = standings
            .iter()
            .copied()
            .filter(|standing| standing.wins < self.config.wins_needed)
            .collect();
        losers.sort_by(|a, b| a.wins.cmp(&b.wins).then(a.player.cmp(&b.player)));

        out.push(Command::Present {
            cue: PresentationCue::Ranking { standings },
        });

        let mut steps = Vec::with_capacity(losers.len() * 2 + 2);
        for loser in losers {
            steps.push(Step::Wait(self.config.elimination_interval));
            steps.push(Step::Run(Action::Eliminate(loser.player)));
        }
        steps.push(Step::Wait(self.config.elimination_interval));
        steps.push(Step::Run(Action::FinishMatch));
        if let Some(sequence) = self.sequence.as_mut() {
            sequence.extend(steps);
        }
    }

    fn place_joiners(
        &mut self,
        joined: &[PlayerId],
        context: &Context<'_>,
        out: &mut Vec<Command>,
    ) {
        let occupied: Vec<WorldPoint> = context
            .players
            .iter()
            .filter(|player| !player.dead && !joined.contains(&player.id))
            .map(|player| player.position)
            .collect();
        let plan = assign_spawn_points(
            joined,
            &occupied,
            context.spawn_points,
            self.config.spawn_tolerance,
            false,
            &mut self.rng,
        );
        push_placements(&plan, out);
    }
}

impl Default for MatchOrchestrator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn push_placements(plan: &SpawnPlan, out: &mut Vec<Command>) {
    for assignment in &plan.assignments {
        out.push(Command::PlacePlayer {
            player: assignment.player,
            position: assignment.position,
        });
    }
}
