use glam::{Quat, Vec3};

use crate::config::SimulationConfig;
use crate::interpolation::{
    AgentState, InterpolationTarget, NavAgentSnapshot, NetworkSnapshot, StateInterpolator,
};
use crate::lerp::Lerp;
use crate::net::MessageWriter;
use crate::simulation::{FrameContext, ObjectAuthority, ObjectKind, PeerRole, SimulatedObject};
use crate::time::Frame;

/// Client-side presentation of a navigation agent.
#[derive(Debug, Clone, PartialEq)]
pub struct NavAgentView {
    pub position: Vec3,
    pub rotation: Quat,
    pub destination: Vec3,
    pub state: AgentState,
}

impl Default for NavAgentView {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            destination: Vec3::ZERO,
            state: AgentState::Idle,
        }
    }
}

impl InterpolationTarget<NavAgentSnapshot> for NavAgentView {
    fn final_interpolation(&mut self, snapshot: &NavAgentSnapshot, smoothing: f32) {
        self.position = self.position.lerp(snapshot.position, smoothing);
        self.rotation = Lerp::lerp(&self.rotation, &snapshot.rotation, smoothing);
        self.destination = snapshot.destination;
        self.state = snapshot.state;
    }

    fn state_reset(&mut self, snapshot: &NavAgentSnapshot, _first: bool) {
        self.position = snapshot.position;
        self.rotation = snapshot.rotation;
        self.destination = snapshot.destination;
        self.state = snapshot.state;
    }
}

/// Server-driven agent walking a looping route of waypoints.
#[derive(Debug)]
pub struct NavAgentObject {
    active: bool,
    route: Vec<Vec3>,
    next_waypoint: usize,
    arrive_radius: f32,
    state: NavAgentSnapshot,
    interpolator: StateInterpolator<NavAgentSnapshot>,
    view: NavAgentView,
}

impl NavAgentObject {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            active: true,
            route: Vec::new(),
            next_waypoint: 0,
            arrive_radius: 0.05,
            state: NavAgentSnapshot::default(),
            interpolator: StateInterpolator::from_config(config),
            view: NavAgentView::default(),
        }
    }

    /// Places the agent on the first waypoint, heading for the second.
    pub fn with_route(mut self, route: Vec<Vec3>, speed: f32) -> Self {
        if let Some(start) = route.first() {
            self.state.position = *start;
            self.view.position = *start;
        }
        self.next_waypoint = usize::from(route.len() > 1);
        self.state.speed = speed.max(0.0);
        self.route = route;
        self
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn state(&self) -> &NavAgentSnapshot {
        &self.state
    }

    pub fn view(&self) -> &NavAgentView {
        &self.view
    }

    fn walk(&mut self, dt: f32) {
        let Some(destination) = self.route.get(self.next_waypoint).copied() else {
            self.state.state = AgentState::Idle;
            return;
        };
        self.state.destination = destination;

        let offset = destination - self.state.position;
        let distance = offset.length();
        let step = self.state.speed * dt;

        if distance <= step.max(self.arrive_radius) {
            self.state.position = destination;
            self.state.state = AgentState::Arrived;
            self.next_waypoint = (self.next_waypoint + 1) % self.route.len();
            return;
        }

        let direction = offset / distance;
        self.state.position += direction * step;
        self.state.state = AgentState::Moving;

        let heading = Vec3::new(direction.x, 0.0, direction.z);
        if heading.length_squared() > 1e-6 {
            self.state.rotation = Quat::from_rotation_y(heading.x.atan2(heading.z));
        }
    }
}

impl SimulatedObject for NavAgentObject {
    fn kind(&self) -> ObjectKind {
        ObjectKind::NavAgent
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn position(&self) -> Vec3 {
        self.view.position
    }

    fn simulate(&mut self, ctx: &FrameContext) {
        if ctx.is_authoritative() {
            self.walk(ctx.delta_time);
            self.view.state_reset(&self.state, false);
        }
    }

    fn interpolate_frame(&mut self, ctx: &FrameContext) {
        if ctx.authority(None, false).should_interpolate() {
            self.interpolator
                .apply(ctx.local_time, ctx.delta_time, &mut self.view);
        }
    }

    fn write_snapshot(&self, writer: &mut MessageWriter) {
        self.state.write(writer);
    }

    fn receive_snapshot(&mut self, payload: &[u8], local_time: f64, frame: Frame, role: PeerRole) {
        if ObjectAuthority::resolve(role, None, false).should_interpolate() {
            self.interpolator.add_raw_state(payload, local_time, frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{SimulationContext, SimulationDriver};

    fn square_route() -> Vec<Vec3> {
        vec![
            Vec3::ZERO,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(0.0, 0.0, 2.0),
        ]
    }

    #[test]
    fn walks_route_on_server() {
        let config = SimulationConfig::default();
        let mut driver = SimulationDriver::new(SimulationContext::server(config.clone()));
        let id = driver.spawn(Box::new(
            NavAgentObject::new(&config).with_route(square_route(), 2.0),
        ));

        for _ in 0..30 {
            driver.step();
        }
        let halfway = driver.object(id).unwrap().position();
        assert!((halfway.x - 1.0).abs() < 0.05, "at {halfway:?}");

        for _ in 0..60 {
            driver.step();
        }
        let turned = driver.object(id).unwrap().position();
        assert!((turned.x - 2.0).abs() < 0.05);
        assert!(turned.z > 0.5);
    }

    #[test]
    fn empty_route_stays_idle() {
        let config = SimulationConfig::default();
        let mut agent = NavAgentObject::new(&config);
        agent.walk(1.0 / 60.0);
        assert_eq!(agent.state().state, AgentState::Idle);
        assert_eq!(agent.state().position, Vec3::ZERO);
    }

    #[test]
    fn heading_follows_travel_direction() {
        let config = SimulationConfig::default();
        let mut agent = NavAgentObject::new(&config).with_route(square_route(), 2.0);
        agent.walk(0.1);

        assert_eq!(agent.state().state, AgentState::Moving);
        let facing = agent.state().rotation * Vec3::Z;
        assert!((facing - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn replica_takes_states_from_snapshots() {
        let config = SimulationConfig::default();
        let mut server = NavAgentObject::new(&config).with_route(square_route(), 2.0);
        let mut replica = NavAgentObject::new(&config);
        let role = PeerRole::Client(1);

        server.walk(0.1);
        let mut writer = MessageWriter::new();
        server.write_snapshot(&mut writer);
        replica.receive_snapshot(&writer.finish(), 0.0, 6, role);

        let ctx = FrameContext {
            frame: 6,
            server_frame: 6,
            local_time: 0.2,
            delta_time: 1.0 / 60.0,
            role,
            config: &config,
        };
        replica.interpolate_frame(&ctx);

        assert_eq!(replica.view().state, AgentState::Moving);
        assert!((replica.position() - server.state().position).length() < 1e-5);
        assert_eq!(replica.view().destination, Vec3::new(2.0, 0.0, 0.0));
    }
}
