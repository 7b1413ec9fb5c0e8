mod collaborators;
mod config;
mod effects;
mod entity;
mod id_gen;
mod systems;
mod tick;
mod types;
mod world;

use std::sync::Arc;

use tracing::info;

use collaborators::{NullCrossZoneClient, NullGameEventBroker, NullPlayerGrain, NullWorldManager};
use tick::TickLoop;
use types::GridSquare;
use world::{Collaborators, WorldSimulation};

/// Runs a single zone server with null collaborators. A real deployment
/// wires `Collaborators` to gRPC/HTTP clients talking to the rest of the
/// cluster; that wiring lives outside this crate.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    let zone = GridSquare::new(0, 0);
    let collaborators = Collaborators {
        world_manager: Arc::new(NullWorldManager),
        player_grain: Arc::new(NullPlayerGrain),
        cross_zone: Arc::new(NullCrossZoneClient),
        event_broker: Arc::new(NullGameEventBroker),
    };

    let mut sim = WorldSimulation::new(zone, collaborators);
    sim.bootstrap();

    info!(?zone, tick_rate = config::TICK_RATE_HZ, "world simulation starting");

    TickLoop::new(sim).run().await;
}
