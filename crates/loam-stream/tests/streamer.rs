mod support;

use loam_geom::Vec2;
use loam_stream::ChunkStage;
use loam_world::{ChunkCoord, LodInfo};

use support::{Event, scenario_params, settle, streamer};

const ORIGIN: Vec2 = Vec2::ZERO;

fn near_table() -> Vec<LodInfo> {
    vec![
        LodInfo::new(0, 25.0, true),
        LodInfo::new(1, 60.0, false),
        LodInfo::new(2, 300.0, false),
    ]
}

fn wide_table() -> Vec<LodInfo> {
    vec![
        LodInfo::new(0, 25.0, true),
        LodInfo::new(1, 60.0, false),
        LodInfo::new(2, 500.0, false),
    ]
}

#[test]
fn origin_chunk_reaches_finest_mesh_and_collider() {
    let params = scenario_params(wide_table());
    let mut s = streamer(&params);
    settle(&mut s, ORIGIN);

    let origin = ChunkCoord::new(0, 0);
    assert_eq!(s.stage(origin), Some(ChunkStage::MeshReady(0)));
    assert_eq!(s.displayed_lod(origin), Some(0));
    assert!(s.has_collider(origin));
    assert!(s.is_visible(origin));

    // Radius ceil(500 / 238) = 3: a 7x7 window.
    assert_eq!(s.chunk_count(), 49);

    // Nearest edge of (3, 3) is ~841 away: created, never shown, never meshed.
    let far = ChunkCoord::new(3, 3);
    assert!(s.contains(far));
    assert!(!s.is_visible(far));
    assert_eq!(s.stage(far), Some(ChunkStage::HeightReady));
    assert!(s.cached_lods(far).is_empty());
    assert!(!s.sink().events.iter().any(|e| matches!(e, Event::Mesh(c, _) if *c == far)));

    // Neighbours sit 119 away from the viewer: coarsest band, no collider.
    assert_eq!(s.displayed_lod(ChunkCoord::new(1, 0)), Some(2));
    assert!(!s.has_collider(ChunkCoord::new(1, 0)));

    let colliders: Vec<_> = s
        .sink()
        .events
        .iter()
        .filter(|e| matches!(e, Event::Collider(..)))
        .cloned()
        .collect();
    assert_eq!(colliders, vec![Event::Collider(origin, 0)]);

    // 3x3 core plus the (2, -1..=1) strips on each side are within 500.
    let visible = s.visible_chunks();
    assert_eq!(visible.len(), 21);
    let stats = s.scheduler().stats();
    assert_eq!(stats.height_submitted, 49);
    assert_eq!(stats.mesh_submitted, 21);
    assert_eq!(stats.lost, 0);
    assert_eq!(stats.in_flight, 0);
}

#[test]
fn mesh_requests_are_not_repeated() {
    let params = scenario_params(near_table());
    let mut s = streamer(&params);

    s.on_viewer_moved(ORIGIN);
    assert!(s.scheduler().wait_idle(std::time::Duration::from_secs(60)));
    // Heights arrive, mesh jobs go out.
    s.process_completed();
    let after_heights = s.scheduler().stats().mesh_submitted;
    assert_eq!(after_heights, 9);

    // Recompute repeatedly before any mesh is dispatched; the LOD picks do not change.
    for _ in 0..3 {
        s.on_viewer_moved(Vec2::new(26.0, 0.0));
        s.on_viewer_moved(ORIGIN);
    }
    assert_eq!(s.scheduler().stats().mesh_submitted, after_heights);

    settle(&mut s, ORIGIN);
    assert_eq!(s.scheduler().stats().mesh_submitted, after_heights);
    for coord in s.visible_chunks() {
        let meshes = s
            .sink()
            .count(|e| matches!(e, Event::Mesh(c, _) if *c == coord));
        assert_eq!(meshes, 1, "chunk {coord:?}");
    }
}

#[test]
fn visibility_uses_nearest_edge_not_centre() {
    let params = scenario_params(near_table());
    let mut s = streamer(&params);
    settle(&mut s, ORIGIN);

    // Centre ~337 away, nearest corner ~168 away.
    assert!(s.is_visible(ChunkCoord::new(1, 1)));
    // Centre 476 away, nearest edge 357 away.
    assert!(!s.is_visible(ChunkCoord::new(2, 0)));
    assert_eq!(s.stage(ChunkCoord::new(2, 0)), Some(ChunkStage::HeightReady));
    assert_eq!(s.visible_chunks().len(), 9);
}

#[test]
fn nothing_is_shown_before_heights_arrive() {
    let params = scenario_params(near_table());
    let mut s = streamer(&params);
    s.on_viewer_moved(ORIGIN);
    assert_eq!(s.chunk_count(), 25);
    assert_eq!(s.stage(ChunkCoord::new(0, 0)), Some(ChunkStage::HeightPending));
    assert!(s.visible_chunks().is_empty());
    assert_eq!(s.sink().count(|e| matches!(e, Event::Created(_))), 25);
    assert_eq!(s.sink().count(|e| matches!(e, Event::Visible(..))), 0);
    assert_eq!(s.scheduler().stats().mesh_submitted, 0);
}

#[test]
fn recompute_waits_for_movement_threshold() {
    let mut params = scenario_params(vec![
        LodInfo::new(0, 10.0, true),
        LodInfo::new(2, 40.0, false),
    ]);
    params.edge = 31;
    params.world_scale = 2.0;
    params.move_threshold = 25.0;
    let mut s = streamer(&params);

    s.on_viewer_moved(ORIGIN);
    assert_eq!(s.last_update_position(), Some(ORIGIN));
    let created = s.chunk_count();

    // 40 world units is 20 mesh units: under the threshold.
    s.on_viewer_moved(Vec2::new(40.0, 0.0));
    assert_eq!(s.viewer_position(), Vec2::new(20.0, 0.0));
    assert_eq!(s.last_update_position(), Some(ORIGIN));
    assert_eq!(s.chunk_count(), created);

    // 60 world units is 30 mesh units, one chunk over: a new column appears.
    s.on_viewer_moved(Vec2::new(60.0, 0.0));
    assert_eq!(s.last_update_position(), Some(Vec2::new(30.0, 0.0)));
    assert!(s.chunk_count() > created);
    assert!(s.contains(ChunkCoord::new(3, 0)));
}

#[test]
fn lod_meshes_are_cached_across_moves() {
    let mut params = scenario_params(vec![
        LodInfo::new(0, 10.0, true),
        LodInfo::new(1, 30.0, false),
        LodInfo::new(2, 200.0, false),
    ]);
    params.edge = 95;
    let mut s = streamer(&params);
    let origin = ChunkCoord::new(0, 0);

    settle(&mut s, ORIGIN);
    assert_eq!(s.displayed_lod(origin), Some(0));

    // Centre on chunk (2, 0); the origin chunk drops to the coarse band.
    settle(&mut s, Vec2::new(188.0, 0.0));
    assert_eq!(s.displayed_lod(origin), Some(2));
    assert_eq!(s.displayed_lod(ChunkCoord::new(2, 0)), Some(0));
    assert!(s.has_collider(ChunkCoord::new(2, 0)));
    assert_eq!(s.cached_lods(origin), vec![0, 2]);

    let submitted = s.scheduler().stats().mesh_submitted;
    settle(&mut s, ORIGIN);
    assert_eq!(s.displayed_lod(origin), Some(0));
    assert_eq!(s.scheduler().stats().mesh_submitted, submitted);
    assert_eq!(
        s.sink().count(|e| *e == Event::Mesh(origin, 0)),
        2,
        "finest mesh shown twice, built once"
    );
    // The collider was handed over once and never again.
    assert_eq!(s.sink().count(|e| *e == Event::Collider(origin, 0)), 1);
}

#[test]
fn flipping_bands_before_a_mesh_lands_keeps_the_shown_stage() {
    let mut params = scenario_params(vec![
        LodInfo::new(0, 10.0, true),
        LodInfo::new(1, 30.0, false),
        LodInfo::new(2, 200.0, false),
    ]);
    params.edge = 95;
    let mut s = streamer(&params);
    let origin = ChunkCoord::new(0, 0);

    settle(&mut s, ORIGIN);
    assert_eq!(s.stage(origin), Some(ChunkStage::MeshReady(0)));
    let settled = s.scheduler().stats().mesh_submitted;

    // Origin chunk's nearest edge is 13 away: the LOD 1 band, not yet built.
    s.on_viewer_moved(Vec2::new(60.0, 0.0));
    assert_eq!(s.stage(origin), Some(ChunkStage::MeshPending(1)));
    assert_eq!(s.displayed_lod(origin), Some(0));
    let after_flip = s.scheduler().stats().mesh_submitted;
    assert!(after_flip > settled);

    // Back before anything is dispatched: still showing LOD 0, nothing resubmitted.
    s.on_viewer_moved(ORIGIN);
    assert_eq!(s.stage(origin), Some(ChunkStage::MeshReady(0)));
    assert_eq!(s.scheduler().stats().mesh_submitted, after_flip);

    settle(&mut s, ORIGIN);
    assert_eq!(s.stage(origin), Some(ChunkStage::MeshReady(0)));
    assert_eq!(s.displayed_lod(origin), Some(0));
    assert_eq!(s.cached_lods(origin), vec![0, 1]);
    assert_eq!(s.scheduler().stats().mesh_submitted, after_flip);
    assert_eq!(s.sink().count(|e| *e == Event::Mesh(origin, 1)), 0);

    // The late LOD 1 mesh is served from the cache on the next visit.
    settle(&mut s, Vec2::new(60.0, 0.0));
    assert_eq!(s.stage(origin), Some(ChunkStage::MeshReady(1)));
    assert_eq!(s.displayed_lod(origin), Some(1));
    assert_eq!(s.sink().count(|e| *e == Event::Mesh(origin, 1)), 1);
    assert_eq!(s.scheduler().stats().mesh_submitted, after_flip);
    assert_eq!(s.scheduler().stats().lost, 0);
}

#[test]
fn chunks_left_behind_are_hidden() {
    let mut params = scenario_params(vec![
        LodInfo::new(0, 10.0, true),
        LodInfo::new(1, 60.0, false),
    ]);
    params.edge = 31;
    let mut s = streamer(&params);
    let origin = ChunkCoord::new(0, 0);

    settle(&mut s, ORIGIN);
    assert!(s.is_visible(origin));

    settle(&mut s, Vec2::new(600.0, 0.0));
    assert!(!s.is_visible(origin));
    assert!(s.sink().events.contains(&Event::Visible(origin, false)));
    // Chunks are never dropped.
    assert!(s.contains(origin));
    assert_eq!(s.displayed_lod(origin), Some(0));
}
