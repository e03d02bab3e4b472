use approx::assert_relative_eq;
use sweep::{
    EntityKind, HitKind, MoveRequest, QueryFlag, SideId, SweepEngine, SweepQuery, Vec3, Wall,
    WallFlag, WallId, WallType, World, WorldBuilder,
    cell::{FaceSplit, box_corners},
    collision::{FaceRef, MoveOutcome, NoopHandler, Response, SweepNote, move_entity},
    resolve_passability,
};

const CENTER: f32 = 5.0;

fn at_x(x: f32) -> Vec3 {
    Vec3::new(x, CENTER, CENTER)
}

/// A single closed 10-unit box.
fn one_box() -> World {
    let mut b = WorldBuilder::new();
    b.add_box(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));
    b.build().unwrap()
}

/// Cells 0 and 1 side by side along +x, with an optional wall on cell 0's
/// right side. Returns the world and the wall's id.
fn corridor(wall: Option<Wall>) -> (World, Option<WallId>) {
    let mut b = WorldBuilder::new();
    let a = b.add_box(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));
    let c = b.add_box(Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 10.0, 10.0));
    b.connect(a, SideId::Right, c, SideId::Left);
    let id = wall.map(|w| {
        let id = b.add_wall(w);
        b.set_wall(a, SideId::Right, id);
        id
    });
    (b.build().unwrap(), id)
}

#[test]
fn open_portal_reaches_the_neighbor() {
    let (world, _) = corridor(None);
    let mut engine = SweepEngine::default();

    let r = engine.query(&world, &SweepQuery::new(at_x(5.0), at_x(15.0), 0, 1.0));
    assert_eq!(r.kind, HitKind::None);
    assert_eq!(r.cell, Some(1));
    assert_relative_eq!(r.point, at_x(15.0));
    assert!(r.notes.is_empty());
}

#[test]
fn solid_face_stops_the_sphere_one_radius_short() {
    let world = one_box();
    let mut engine = SweepEngine::default();

    let r = engine.query(&world, &SweepQuery::new(at_x(5.0), at_x(15.0), 0, 1.0));
    assert_eq!(r.kind, HitKind::Wall);
    assert_eq!(r.cell, Some(0));
    assert_relative_eq!(r.point, at_x(9.0), epsilon = 1.0e-4);
    assert_relative_eq!(r.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1.0e-5);
    let face = r.face.unwrap();
    assert_eq!((face.cell, face.side), (0, SideId::Right));
}

#[test]
fn door_blocks_until_opened() {
    let (mut world, wall) = corridor(Some(Wall::new(WallType::Door)));
    let mut engine = SweepEngine::default();
    let q = SweepQuery::new(at_x(5.0), at_x(15.0), 0, 1.0);

    let closed = engine.query(&world, &q);
    assert_eq!(closed.kind, HitKind::Wall);
    assert_relative_eq!(closed.point, at_x(9.0), epsilon = 1.0e-4);

    let wall = wall.unwrap();
    world.wall_mut(wall).unwrap().flags.add(WallFlag::DoorOpened);
    let opened = engine.query(&world, &q);
    assert_eq!(opened.kind, HitKind::None);
    assert_eq!(opened.cell, Some(1));
}

#[test]
fn entity_before_a_farther_wall_wins() {
    let (mut world, _) = corridor(None);
    let robot = world
        .entities
        .spawn(
            EntityKind::Robot {
                contact_attack: false,
            },
            at_x(15.0),
            1.0,
            1,
            0.0,
        )
        .unwrap();
    let mut engine = SweepEngine::default();

    // The far wall of cell 1 is at x = 20; the robot sits at the sweep's midpoint.
    let q = SweepQuery::new(at_x(5.0), at_x(25.0), 0, 1.0).with_flag(QueryFlag::CheckEntities);
    let r = engine.query(&world, &q);
    assert_eq!(r.kind, HitKind::Entity);
    assert_eq!(r.entity, Some(robot));
    assert_eq!(r.cell, Some(1));
    assert_relative_eq!(r.point, at_x(13.0), epsilon = 1.0e-4);

    // Without entity checks the wall is what stops it.
    let r = engine.query(&world, &SweepQuery::new(at_x(5.0), at_x(25.0), 0, 1.0));
    assert_eq!(r.kind, HitKind::Wall);
    assert_relative_eq!(r.point, at_x(19.0), epsilon = 1.0e-4);
}

#[test]
fn no_tunnelling_through_a_solid_face() {
    let world = one_box();
    let mut engine = SweepEngine::default();
    let targets = [
        at_x(10.5),
        at_x(12.0),
        at_x(1000.0),
        Vec3::new(30.0, 8.0, 5.0),
        Vec3::new(40.0, 2.0, 7.0),
    ];

    for p1 in targets {
        for radius in [0.0, 0.5, 1.0] {
            let r = engine.query(&world, &SweepQuery::new(at_x(5.0), p1, 0, radius));
            assert_eq!(r.kind, HitKind::Wall, "p1 {p1:?} radius {radius}");
            assert!(
                r.point.x <= 10.0 - radius + 1.0e-3,
                "p1 {p1:?} radius {radius} ended at {:?}",
                r.point
            );
            assert_eq!(r.cell, Some(0));
        }
    }
}

#[test]
fn repeated_query_gives_the_same_answer() {
    let (mut world, _) = corridor(Some(Wall::new(WallType::Door)));
    world
        .entities
        .spawn(EntityKind::Powerup, Vec3::new(8.0, 6.0, 5.0), 0.5, 0, 0.0)
        .unwrap();
    let mut engine = SweepEngine::default();
    let q = SweepQuery::new(at_x(2.0), Vec3::new(14.0, 7.0, 4.0), 0, 0.75)
        .with_flag(QueryFlag::CheckEntities)
        .with_flag(QueryFlag::CollectPath);

    let first = engine.query(&world, &q);
    let first_path = engine.last_path().to_vec();
    let second = engine.query(&world, &q);
    assert_eq!(first, second);
    assert_eq!(first_path, engine.last_path());
}

#[test]
fn slide_keeps_the_tangential_velocity() {
    for (response, expect_v, expect_x) in [
        (Response::Slide, Vec3::new(0.0, 0.0, 2.0), 9.0),
        (Response::Bounce, Vec3::new(-10.0, 0.0, 2.0), 3.0),
    ] {
        let mut world = one_box();
        let id = world
            .entities
            .spawn(EntityKind::Player, at_x(5.0), 1.0, 0, 0.0)
            .unwrap();
        let mut engine = SweepEngine::default();
        let req = MoveRequest {
            response,
            ..MoveRequest::with_defaults(id, Vec3::new(10.0, 0.0, 2.0), 1.0)
        };

        let r = move_entity(&mut engine, &mut world, req, &mut NoopHandler).unwrap();
        assert_eq!(r.outcome, MoveOutcome::Completed);
        assert_eq!(r.iterations, 2);
        assert_relative_eq!(r.velocity, expect_v, epsilon = 1.0e-4);
        assert_relative_eq!(r.end_pos, Vec3::new(expect_x, 5.0, 7.0), epsilon = 1.0e-3);
    }
}

#[test]
fn blasting_opens_a_wall_and_nothing_else() {
    let (mut world, wall) = corridor(Some(Wall::blastable(25.0)));
    let wall = wall.unwrap();
    let before = *world.wall(wall).unwrap();

    let solid = resolve_passability(&world, 0, SideId::Right);
    assert!(!solid.can_fly && solid.should_render && !solid.can_see_through);

    world.wall_mut(wall).unwrap().flags.add(WallFlag::Blasted);
    let blasted = resolve_passability(&world, 0, SideId::Right);
    assert!(blasted.can_fly && blasted.should_render && blasted.can_see_through);

    let after = *world.wall(wall).unwrap();
    assert_eq!(after.kind, before.kind);
    assert_eq!(after.state, before.state);
    assert_eq!(after.key, before.key);
    assert_eq!(after.hit_points, before.hit_points);

    let mut engine = SweepEngine::default();
    let r = engine.query(&world, &SweepQuery::new(at_x(5.0), at_x(15.0), 0, 1.0));
    assert_eq!(r.kind, HitKind::None);
}

#[test]
fn transparent_texture_only_adds_sight() {
    let kinds = [
        WallType::Normal,
        WallType::Blastable,
        WallType::Door,
        WallType::Illusion,
        WallType::Open,
        WallType::Closed,
        WallType::Cloaked,
    ];

    for kind in kinds {
        let passability = |transparent: bool| {
            let mut b = WorldBuilder::new();
            let a = b.add_box(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));
            let c = b.add_box(Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 10.0, 10.0));
            b.connect(a, SideId::Right, c, SideId::Left);
            b.set_transparent(a, SideId::Right, transparent);
            let w = b.add_wall(Wall::new(kind));
            b.set_wall(a, SideId::Right, w);
            let world = b.build().unwrap();
            resolve_passability(&world, 0, SideId::Right)
        };
        let (plain, clear) = (passability(false), passability(true));
        assert_eq!(plain.can_fly, clear.can_fly, "{kind:?}");
        assert!(clear.can_see_through >= plain.can_see_through, "{kind:?}");
    }
}

#[test]
fn points_on_a_portal_resolve() {
    let (world, _) = corridor(None);
    let mut engine = SweepEngine::default();
    let on_plane = at_x(10.0);

    let found = engine.find_point_cell(&world, &on_plane, 0);
    assert!(matches!(found, Some(0) | Some(1)));
    let found = engine.find_point_cell(&world, &on_plane, 1);
    assert!(matches!(found, Some(0) | Some(1)));

    let r = engine.query(&world, &SweepQuery::new(on_plane, at_x(15.0), 0, 0.0));
    assert_eq!(r.kind, HitKind::None);
    assert_eq!(r.cell, Some(1));

    let r = engine.query(&world, &SweepQuery::new(at_x(5.0), on_plane, 0, 0.0));
    assert_eq!(r.kind, HitKind::None);
    assert!(matches!(r.cell, Some(0) | Some(1)));
}

#[test]
fn slow_sweep_starting_inside_a_wall_still_hits_it() {
    let world = one_box();
    let mut engine = SweepEngine::default();

    for x in [9.1, 9.3, 9.5, 9.7, 9.9] {
        let r = engine.query(&world, &SweepQuery::new(at_x(x), at_x(x + 0.2), 0, 1.0));
        assert_eq!(r.kind, HitKind::Wall, "start {x}");
        assert_eq!(r.cell, Some(0));
        assert!(r.point.x <= x + 1.0e-4, "start {x} ended at {:?}", r.point);
        assert!(r.point.x >= 9.0 - 1.0e-4, "start {x} ended at {:?}", r.point);
        assert_relative_eq!(r.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1.0e-5);
        assert!(r.notes.is_empty());
    }

    // The deepest start is held where it began.
    let r = engine.query(&world, &SweepQuery::new(at_x(9.9), at_x(10.1), 0, 1.0));
    assert_relative_eq!(r.point, at_x(9.9), epsilon = 1.0e-5);
}

#[test]
fn warped_side_is_struck_on_each_triangle() {
    // Corner 2 pulled in to x = 9 folds the right side along its 0-2 diagonal.
    let mut corners = box_corners(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));
    corners[2].x = 9.0;
    let mut b = WorldBuilder::new();
    let verts: Vec<usize> = corners.iter().map(|&p| b.add_vertex(p)).collect();
    b.add_cell(std::array::from_fn(|i| verts[i]));
    let world = b.build().unwrap();
    assert_eq!(
        world.cell(0).unwrap().side(SideId::Right).split,
        FaceSplit::Tri02
    );

    let mut engine = SweepEngine::default();
    let flat = engine.query(
        &world,
        &SweepQuery::new(Vec3::new(5.0, 3.0, 7.0), Vec3::new(15.0, 3.0, 7.0), 0, 0.5),
    );
    assert_eq!(flat.kind, HitKind::Wall);
    assert_eq!(
        flat.face,
        Some(FaceRef {
            cell: 0,
            side: SideId::Right,
            face: 0
        })
    );
    assert_relative_eq!(flat.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1.0e-5);
    assert_relative_eq!(flat.point, Vec3::new(9.5, 3.0, 7.0), epsilon = 1.0e-4);

    let slanted = engine.query(
        &world,
        &SweepQuery::new(Vec3::new(5.0, 7.0, 3.0), Vec3::new(15.0, 7.0, 3.0), 0, 0.5),
    );
    assert_eq!(slanted.kind, HitKind::Wall);
    assert_eq!(slanted.face.map(|f| (f.side, f.face)), Some((SideId::Right, 1)));
    let expected = Vec3::new(-100.0, -10.0, 10.0).normalize();
    assert_relative_eq!(slanted.normal, expected, epsilon = 1.0e-5);
    // Resting 0.5 off the slanted plane through (10, 0, 0).
    assert_relative_eq!(slanted.point.x, 9.095, epsilon = 1.0e-3);
    assert_relative_eq!(
        expected.dot(&(slanted.point - Vec3::new(10.0, 0.0, 0.0))),
        0.5,
        epsilon = 1.0e-4
    );
    assert_eq!(slanted.cell, Some(0));
}

#[test]
fn sweep_hugging_a_wall_catches_the_next_cells_edge() {
    // Cell 1 sits on top of cell 0; both have solid right sides at x = 10.
    let mut b = WorldBuilder::new();
    let lower = b.add_box(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));
    let upper = b.add_box(Vec3::new(0.0, 10.0, 0.0), Vec3::new(10.0, 20.0, 10.0));
    b.connect(lower, SideId::Top, upper, SideId::Bottom);
    let world = b.build().unwrap();
    let mut engine = SweepEngine::default();

    // Half a radius into the wall: the seam between the two right sides is
    // within the edge tolerance.
    let r = engine.query(
        &world,
        &SweepQuery::new(Vec3::new(9.5, 5.0, 5.0), Vec3::new(9.5, 15.0, 5.0), 0, 1.0),
    );
    assert_eq!(r.kind, HitKind::Wall);
    assert_eq!(r.face.map(|f| (f.cell, f.side)), Some((1, SideId::Right)));
    assert_relative_eq!(r.point, Vec3::new(9.5, 9.0, 5.0), epsilon = 1.0e-4);
    assert_eq!(r.cell, Some(0));

    // 0.2 into the wall: the seam is out of reach and the sweep goes up.
    let r = engine.query(
        &world,
        &SweepQuery::new(Vec3::new(9.2, 5.0, 5.0), Vec3::new(9.2, 15.0, 5.0), 0, 1.0),
    );
    assert_eq!(r.kind, HitKind::None);
    assert_eq!(r.cell, Some(1));
}

#[test]
fn contact_outside_every_cell_falls_back_to_a_zero_radius_sweep() {
    let world = one_box();
    let mut engine = SweepEngine::default();

    // Backing out of the right wall along the path lands below the floor.
    let r = engine.query(
        &world,
        &SweepQuery::new(Vec3::new(9.5, 0.2, 5.0), Vec3::new(10.1, 0.8, 5.0), 0, 1.0),
    );
    assert!(r.notes.has(SweepNote::ZeroRadiusRetry));
    assert!(!r.notes.has(SweepNote::UnresolvedCell));
    assert_eq!(r.kind, HitKind::Wall);
    assert_eq!(r.cell, Some(0));
    assert_relative_eq!(r.point, Vec3::new(10.0, 0.7, 5.0), epsilon = 1.0e-4);
    assert_relative_eq!(r.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1.0e-5);
    assert_eq!(r.face.map(|f| f.side), Some(SideId::Right));
}

#[test]
fn slow_push_into_a_wall_reports_the_contact() {
    let mut world = one_box();
    let id = world
        .entities
        .spawn(EntityKind::Player, at_x(9.9), 1.0, 0, 0.0)
        .unwrap();
    let mut engine = SweepEngine::default();

    let r = move_entity(
        &mut engine,
        &mut world,
        MoveRequest::with_defaults(id, Vec3::new(0.2, 0.0, 0.0), 1.0),
        &mut NoopHandler,
    )
    .unwrap();
    assert_eq!(r.last_hit.map(|h| h.kind), Some(HitKind::Wall));
    assert!(r.end_pos.x <= 9.9 + 1.0e-4);
    assert_relative_eq!(r.velocity, Vec3::zeros(), epsilon = 1.0e-6);
}
