mod common;

use common::Loopback;
use glam::Vec3;
use qnet::{LinkConditions, NavAgentObject, ObjectKind, SimulationConfig};

fn lossy_link() -> LinkConditions {
    LinkConditions {
        loss_percent: 5.0,
        min_latency_ms: 40,
        max_latency_ms: 60,
        jitter_ms: 10,
    }
}

#[test]
fn remote_client_follows_authoritative_state() {
    let mut session = Loopback::new(SimulationConfig::default(), lossy_link(), lossy_link());
    let bot = session.spawn_bot();
    let agent = session.server.spawn(Box::new(
        NavAgentObject::new(&session.config)
            .with_route(vec![Vec3::new(0.0, 0.0, 5.0), Vec3::new(10.0, 0.0, 5.0)], 2.0),
    ));

    for _ in 0..120 {
        session.drive(bot, [1.0, 0.0, 0.0]);
        session.step();
    }

    assert_eq!(session.client.len(), 2);
    assert_eq!(session.client.object(bot).unwrap().kind(), ObjectKind::Player);
    assert_eq!(session.client.object(agent).unwrap().kind(), ObjectKind::NavAgent);

    let server_x = session.server.object(bot).unwrap().position().x;
    let client_x = session.client.object(bot).unwrap().position().x;
    assert!(server_x > 9.0, "server bot at {server_x}");
    assert!(client_x > 0.0 && client_x < server_x, "client bot at {client_x}");
    assert!(server_x - client_x < 2.5, "client trails by {}", server_x - client_x);

    let server_agent = session.server.object(agent).unwrap().position();
    let client_agent = session.client.object(agent).unwrap().position();
    assert!((server_agent - client_agent).length() < 1.5);
}

#[test]
fn client_frame_tracks_server_frame() {
    let mut session = Loopback::new(
        SimulationConfig::default(),
        LinkConditions::fixed_latency(50),
        LinkConditions::fixed_latency(50),
    );
    session.spawn_bot();
    session.run(90);

    let server_frame = session.server.context().server_frame();
    let client_estimate = session.client.context().server_frame();
    assert_eq!(server_frame, 90);
    assert!(client_estimate <= server_frame);
    assert!(server_frame - client_estimate <= 6, "client estimate {client_estimate}");
}

#[test]
fn view_frame_lags_by_interpolation_delay() {
    let mut session = Loopback::new(
        SimulationConfig::default(),
        LinkConditions::ideal(),
        LinkConditions::ideal(),
    );
    let bot = session.spawn_bot();
    for _ in 0..60 {
        session.drive(bot, [0.0, 0.0, 1.0]);
        session.step();
    }

    let view = session.client.object(bot).unwrap().remote_view().unwrap();
    let server_frame = session.server.context().frame() as f64;
    let behind = server_frame - view.frame;
    assert!((4.0..=8.0).contains(&behind), "view frame {} behind", behind);
}

#[test]
fn send_rate_thins_broadcasts() {
    let config = SimulationConfig {
        send_rate: 3,
        ..Default::default()
    };
    let mut session = Loopback::new(config, LinkConditions::ideal(), LinkConditions::ideal());
    session.spawn_bot();
    session.run(30);

    assert_eq!(session.downlink.stats().packets_sent, 10);
    assert_eq!(session.client.len(), 1);
}
