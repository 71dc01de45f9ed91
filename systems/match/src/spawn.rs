use brawl_arena_core::{PlayerId, WorldPoint};
use log::{error, warn};
use rand::{seq::SliceRandom, Rng};

/// Spawn point chosen for a single player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnAssignment {
    /// Player being placed.
    pub player: PlayerId,
    /// Spawn position the player is teleported to.
    pub position: WorldPoint,
}

/// Outcome of a spawn assignment pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnPlan {
    /// Players that received a spawn, in request order.
    pub assignments: Vec<SpawnAssignment>,
    /// Players left where they are because no spawn was available.
    pub unplaced: Vec<PlayerId>,
}

/// Assigns each player a spawn point nobody else is standing on.
///
/// A spawn is available when no occupant lies within `tolerance` of it. The
/// occupants are the provided positions plus every spawn already handed out
/// during this pass. When nothing is available the player is skipped, unless
/// `tolerate_contention` allows reusing any spawn.
pub fn assign_spawn_points<R>(
    players: &[PlayerId],
    occupied: &[WorldPoint],
    spawn_points: &[WorldPoint],
    tolerance: f32,
    tolerate_contention: bool,
    rng: &mut R,
) -> SpawnPlan
where
    R: Rng + ?Sized,
{
    let mut taken = occupied.to_vec();
    let mut plan = SpawnPlan::default();

    for &player in players {
        let free: Vec<WorldPoint> = spawn_points
            .iter()
            .copied()
            .filter(|spawn| {
                taken
                    .iter()
                    .all(|occupant| occupant.distance(*spawn) > tolerance)
            })
            .collect();

        let choice = match free.choose(rng) {
            Some(spawn) => Some(*spawn),
            None if tolerate_contention => {
                let shared = spawn_points.choose(rng).copied();
                if shared.is_some() {
                    warn!(
                        "spawn points exhausted; player {} shares a spawn",
                        player.get()
                    );
                }
                shared
            }
            None => None,
        };

        match choice {
            Some(position) => {
                taken.push(position);
                plan.assignments.push(SpawnAssignment { player, position });
            }
            None => {
                error!("no free spawn point for player {}", player.get());
                plan.unplaced.push(player);
            }
        }
    }

    plan
}
