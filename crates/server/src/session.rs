use std::fmt;
use std::time::Duration;

use anyhow::Result;

use qnet::{LinkSimulator, LinkStats, SimulationConfig};

use crate::client::RemotePeer;
use crate::config::SessionConfig;
use crate::events::{SessionEvent, ShotOutcome};
use crate::server::AuthoritativePeer;

const CLIENT_PEER: u32 = 1;
const STATUS_INTERVAL_SECS: f64 = 1.0;

#[derive(Debug, Default, Clone)]
pub struct SessionReport {
    pub frames: u32,
    pub shots_fired: u32,
    pub hits: u32,
    pub misses: u32,
    pub unavailable: u32,
    pub damage: f32,
    pub errors: u32,
    pub out_of_order: u64,
    pub downlink: LinkStats,
    pub uplink: LinkStats,
}

impl SessionReport {
    fn record(&mut self, outcome: &ShotOutcome) {
        match outcome {
            ShotOutcome::Hit { damage, .. } => {
                self.hits += 1;
                self.damage += damage;
            }
            ShotOutcome::Unavailable => self.unavailable += 1,
            _ => self.misses += 1,
        }
    }

    pub fn hit_ratio(&self) -> f32 {
        let resolved = self.hits + self.misses + self.unavailable;
        if resolved == 0 {
            return 0.0;
        }
        self.hits as f32 / resolved as f32
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames:       {}", self.frames)?;
        writeln!(
            f,
            "shots:        {} fired, {} hit, {} missed, {} unavailable ({:.0}% hit)",
            self.shots_fired,
            self.hits,
            self.misses,
            self.unavailable,
            self.hit_ratio() * 100.0
        )?;
        writeln!(f, "damage:       {:.1}", self.damage)?;
        writeln!(
            f,
            "downlink:     {} sent, {} delivered, {} dropped, {} bytes",
            self.downlink.packets_sent,
            self.downlink.packets_delivered,
            self.downlink.packets_dropped,
            self.downlink.bytes_delivered
        )?;
        writeln!(
            f,
            "uplink:       {} sent, {} delivered, {} dropped",
            self.uplink.packets_sent, self.uplink.packets_delivered, self.uplink.packets_dropped
        )?;
        write!(
            f,
            "reordered:    {}    errors: {}",
            self.out_of_order, self.errors
        )
    }
}

/// One authoritative peer and one remote client joined by simulated links.
pub struct Session {
    config: SessionConfig,
    delta: f64,
    server: AuthoritativePeer,
    client: RemotePeer,
    downlink: LinkSimulator,
    uplink: LinkSimulator,
    now: f64,
    report: SessionReport,
}

impl Session {
    pub fn new(simulation: &SimulationConfig, config: SessionConfig) -> Result<Self> {
        let simulation = simulation.validated();
        let server = AuthoritativePeer::new(&simulation, config.bots, config.agents)?;
        let client = RemotePeer::new(&simulation, CLIENT_PEER, config.shot_interval_secs);

        Ok(Self {
            delta: simulation.tick_rate().tick_step(),
            downlink: LinkSimulator::new(config.downlink.clone(), config.seed),
            uplink: LinkSimulator::new(config.uplink.clone(), config.seed.wrapping_add(1)),
            server,
            client,
            config,
            now: 0.0,
            report: SessionReport::default(),
        })
    }

    pub fn run(mut self) -> Result<SessionReport> {
        let steps = (self.config.duration_secs.max(0.0) / self.delta).round() as u64;
        let status_every = ((STATUS_INTERVAL_SECS / self.delta).round() as u64).max(1);

        log::info!(
            "running {} frames with {} bots and {} agents",
            steps,
            self.config.bots,
            self.config.agents
        );

        for step in 1..=steps {
            self.step()?;

            if step % status_every == 0 {
                self.log_status();
            }
            if self.config.realtime {
                std::thread::sleep(Duration::from_secs_f64(self.delta));
            }
        }

        self.report.frames = self.server.driver().context().frame();
        self.report.out_of_order = self.client.out_of_order();
        self.report.downlink = self.downlink.stats().clone();
        self.report.uplink = self.uplink.stats().clone();
        Ok(self.report)
    }

    fn step(&mut self) -> Result<()> {
        self.now += self.delta;

        for packet in self.server.tick(self.delta)? {
            self.downlink.send(self.now, packet);
        }
        for packet in self.downlink.receive(self.now) {
            self.client.handle_packet(&packet);
        }
        for packet in self.uplink.receive(self.now) {
            self.server.handle_packet(CLIENT_PEER, &packet);
        }
        for packet in self.client.tick(self.delta)? {
            self.uplink.send(self.now, packet);
        }

        let events: Vec<_> = self
            .server
            .drain_events()
            .chain(self.client.drain_events())
            .collect();
        for event in events {
            self.handle_event(event);
        }
        Ok(())
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ObjectSpawned { object, kind } => {
                log::info!("object {} spawned as {:?}", object.id(), kind);
            }
            SessionEvent::ShotFired { target, view_frame } => {
                self.report.shots_fired += 1;
                log::debug!("shot at object {} seen at frame {:.2}", target.id(), view_frame);
            }
            SessionEvent::ShotResolved {
                target,
                view_frame,
                outcome,
            } => {
                self.report.record(&outcome);
                match outcome {
                    ShotOutcome::Hit {
                        hitbox,
                        distance,
                        damage,
                    } => log::info!(
                        "object {} hit on hitbox {} at {:.2}m for {:.1} (frame {:.2})",
                        target.id(),
                        hitbox.0,
                        distance,
                        damage,
                        view_frame
                    ),
                    other => log::info!(
                        "shot at object {} {} (frame {:.2})",
                        target.id(),
                        other.as_str(),
                        view_frame
                    ),
                }
            }
            SessionEvent::Error { message } => {
                self.report.errors += 1;
                log::warn!("{}", message);
            }
        }
    }

    fn log_status(&self) {
        let server = self.server.driver().context();
        let client = self.client.driver().context();
        log::info!(
            "server frame {} | client frame {} (server {}) | {} replicas | in flight {}/{}",
            server.frame(),
            client.frame(),
            client.server_frame(),
            self.client.driver().len(),
            self.downlink.in_flight(),
            self.uplink.in_flight()
        );
    }
}
