mod common;

use common::{CLIENT_PEER, Loopback};
use glam::Vec3;
use qnet::Hitbox;
use qnet::{
    HitRequest, HitboxId, LagCompensation, LinkConditions, ObjectId, RewindOutcome,
    SimulationConfig,
};

const TORSO_HEIGHT: f32 = 1.1;

fn moving_target() -> (Loopback, ObjectId) {
    let mut session = Loopback::new(
        SimulationConfig::default(),
        LinkConditions::fixed_latency(50),
        LinkConditions::fixed_latency(50),
    );
    let bot = session.spawn_bot();
    for _ in 0..90 {
        session.drive(bot, [1.0, 0.0, 0.0]);
        session.step();
    }
    (session, bot)
}

/// Fires at the torso of the target as the client currently displays it.
fn fire_at_view(session: &mut Loopback, target: ObjectId) -> HitRequest {
    let view = session
        .client
        .object(target)
        .and_then(|object| object.remote_view())
        .expect("client has an interpolated view of the target");

    let request = HitRequest {
        shooter: CLIENT_PEER,
        target: target.id(),
        origin: (view.position + Vec3::new(0.0, TORSO_HEIGHT, -10.0)).to_array(),
        direction: Vec3::Z.to_array(),
        max_distance: 50.0,
        view_frame: view.frame,
    };
    session.send_hit(request);
    request
}

fn deliver(session: &mut Loopback, target: ObjectId) -> HitRequest {
    while session.hit_requests.is_empty() {
        session.drive(target, [1.0, 0.0, 0.0]);
        session.step();
    }
    session.hit_requests.remove(0)
}

fn resolve(session: &mut Loopback, request: &HitRequest, frame: f64) -> RewindOutcome<f32> {
    let body = session
        .server
        .hitbox_body_mut(ObjectId(request.target))
        .unwrap();
    LagCompensation::raycast(
        body,
        frame,
        Vec3::from_array(request.origin),
        Vec3::from_array(request.direction),
        request.max_distance,
    )
    .unwrap()
}

#[test]
fn shot_at_displayed_pose_hits_after_rewind() {
    let (mut session, bot) = moving_target();
    fire_at_view(&mut session, bot);
    let request = deliver(&mut session, bot);

    let outcome = resolve(&mut session, &request, request.view_frame);
    let hits = outcome.hits();
    assert_eq!(hits.len(), 1, "outcome {outcome:?}");
    assert_eq!(hits[0].hitbox, HitboxId(1));
    assert!((hits[0].result - 9.82).abs() < 0.01);
}

#[test]
fn same_shot_misses_the_live_pose() {
    let (mut session, bot) = moving_target();
    fire_at_view(&mut session, bot);
    let request = deliver(&mut session, bot);

    let newest = session
        .server
        .hitbox_body_mut(bot)
        .and_then(|body| body.newest_frame())
        .unwrap();
    let outcome = resolve(&mut session, &request, (newest - 1) as f64);
    assert!(!outcome.is_hit(), "outcome {outcome:?}");
}

#[test]
fn rewind_restores_live_hitboxes() {
    let (mut session, bot) = moving_target();
    fire_at_view(&mut session, bot);
    let request = deliver(&mut session, bot);

    let live_x = session.server.object(bot).unwrap().position().x;
    resolve(&mut session, &request, request.view_frame);

    let body = session.server.hitbox_body_mut(bot).unwrap();
    let torso = body.hitbox(HitboxId(1)).unwrap();
    assert!((torso.pose.position.x - live_x).abs() < 1e-4);
    assert!(body.hitboxes().iter().all(|h| !h.collider_enabled()));
}

#[test]
fn stale_view_frames_are_unavailable() {
    let (mut session, bot) = moving_target();
    fire_at_view(&mut session, bot);
    let request = deliver(&mut session, bot);

    // Hold the request for longer than the one second of recorded history.
    for _ in 0..90 {
        session.drive(bot, [1.0, 0.0, 0.0]);
        session.step();
    }

    let outcome = resolve(&mut session, &request, request.view_frame);
    assert_eq!(outcome, RewindOutcome::Unavailable);
}
