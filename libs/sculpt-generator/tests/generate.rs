//! End-to-end generation scenarios against a deterministic box builder.

use glam::{DVec2, DVec3};
use sculpt_generator::{
    BuildFailure, BuildOptions, BuiltPartMesh, CacheContext, FillMeshProvider,
    GenerationOutcome, GeneratorSettings, GenerationWorker, MeshGenerator, StrokeMeshBuilder,
    StrokeNode,
};
use sculpt_mesh::{is_manifold, Mesh};
use sculpt_snapshot::{AttributeMap, Snapshot};
use std::sync::Arc;
use std::time::Duration;

/// Sweeps every stroke into the axis-aligned cuboid spanning its nodes.
///
/// A node with negative radius produces an open sheet instead, which fails
/// mesh validation — the hook the error scenarios use.
struct BoxBuilder;

impl StrokeMeshBuilder for BoxBuilder {
    fn build_part(
        &self,
        nodes: &[StrokeNode],
        _edges: &[(usize, usize)],
        _cross_section: &[DVec2],
        _cut_rotation_degrees: f64,
        _options: &BuildOptions,
    ) -> Result<BuiltPartMesh, BuildFailure> {
        if nodes.is_empty() {
            return Err(BuildFailure::EmptyStroke);
        }
        if nodes.iter().any(|node| node.radius < 0.0) {
            // An open quad sheet: valid indices, no closed surface.
            let center = nodes[0].position;
            let mut sheet = Mesh::new();
            sheet.add_vertex(center + DVec3::new(-1.0, -1.0, 0.0));
            sheet.add_vertex(center + DVec3::new(1.0, -1.0, 0.0));
            sheet.add_vertex(center + DVec3::new(1.0, 1.0, 0.0));
            sheet.add_vertex(center + DVec3::new(-1.0, 1.0, 0.0));
            sheet.add_face(&[0, 1, 2, 3]);
            return Ok(BuiltPartMesh {
                mesh: sheet,
                vertex_source_nodes: vec![0; 4],
            });
        }

        let mut min = nodes[0].position - DVec3::splat(nodes[0].radius);
        let mut max = nodes[0].position + DVec3::splat(nodes[0].radius);
        for node in &nodes[1..] {
            min = min.min(node.position - DVec3::splat(node.radius));
            max = max.max(node.position + DVec3::splat(node.radius));
        }
        let vertices = vec![
            DVec3::new(min.x, min.y, min.z),
            DVec3::new(max.x, min.y, min.z),
            DVec3::new(max.x, max.y, min.z),
            DVec3::new(min.x, max.y, min.z),
            DVec3::new(min.x, min.y, max.z),
            DVec3::new(max.x, min.y, max.z),
            DVec3::new(max.x, max.y, max.z),
            DVec3::new(min.x, max.y, max.z),
        ];
        let faces: Vec<Vec<u32>> = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
            vec![0, 1, 5, 4],
            vec![3, 7, 6, 2],
        ];
        let vertex_source_nodes = vertices
            .iter()
            .map(|vertex| {
                nodes
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| {
                        a.position
                            .distance_squared(*vertex)
                            .total_cmp(&b.position.distance_squared(*vertex))
                    })
                    .map(|(index, _)| index)
                    .unwrap_or(0)
            })
            .collect();
        let mut mesh = Mesh::new();
        for vertex in vertices {
            mesh.add_vertex(vertex);
        }
        for face in &faces {
            mesh.add_face(face);
        }
        Ok(BuiltPartMesh {
            mesh,
            vertex_source_nodes,
        })
    }
}

fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A snapshot of single-node cube parts under the root.
///
/// Each entry is (part id, x position, radius, extra part attributes,
/// extra component attributes).
fn cube_snapshot(cubes: &[(&str, f64, f64, &[(&str, &str)], &[(&str, &str)])]) -> Snapshot {
    let mut snapshot = Snapshot::default();
    let mut root_children = Vec::new();
    for (part_id, x, radius, part_attrs, component_attrs) in cubes {
        let mut part = attrs(part_attrs);
        part.insert("id".to_string(), part_id.to_string());
        snapshot.parts.insert(part_id.to_string(), part);

        snapshot.nodes.insert(
            format!("{part_id}-n1"),
            attrs(&[
                ("partId", part_id),
                ("x", &x.to_string()),
                ("y", "0"),
                ("z", "0"),
                ("radius", &radius.to_string()),
            ]),
        );

        let component_id = format!("{part_id}-c");
        let mut component = attrs(component_attrs);
        component.insert("id".to_string(), component_id.clone());
        component.insert("linkDataType".to_string(), "partId".to_string());
        component.insert("linkData".to_string(), part_id.to_string());
        snapshot.components.insert(component_id.clone(), component);
        root_children.push(component_id);
    }
    snapshot.root_component = attrs(&[("children", root_children.join(",").as_str())]);
    snapshot
}

fn generate(snapshot: Snapshot, cache: &mut CacheContext) -> GenerationOutcome {
    MeshGenerator::new(snapshot, &BoxBuilder, cache, GeneratorSettings::default()).generate()
}

#[test]
fn test_empty_snapshot_generates_empty_object() {
    let mut cache = CacheContext::new();
    let outcome = generate(Snapshot::default(), &mut cache);
    assert!(outcome.is_successful);
    assert!(outcome.object.vertices.is_empty());
    assert!(outcome.part_success.is_empty());
}

#[test]
fn test_single_cube_part() {
    let mut cache = CacheContext::new();
    let outcome = generate(cube_snapshot(&[("p1", 0.0, 1.0, &[], &[])]), &mut cache);
    assert!(outcome.is_successful);
    assert_eq!(outcome.object.vertices.len(), 8);
    assert_eq!(outcome.object.triangles.len(), 12);
    assert!(is_manifold(&outcome.object.triangles));
    assert_eq!(outcome.part_success.get("p1"), Some(&true));
    // Every triangle is attributed to the part's single node.
    assert!(outcome
        .object
        .triangle_source_nodes
        .iter()
        .all(|source| matches!(source, Some((part, _)) if part == "p1")));
}

#[test]
fn test_union_of_disjoint_cubes() {
    let mut cache = CacheContext::new();
    let snapshot = cube_snapshot(&[
        ("p1", 0.0, 1.0, &[], &[]),
        ("p2", 5.0, 1.0, &[], &[]),
    ]);
    let outcome = generate(snapshot, &mut cache);
    assert!(outcome.is_successful);
    // Disjoint cubes keep all vertices of both inputs.
    assert_eq!(outcome.object.vertices.len(), 16);
    assert_eq!(outcome.object.triangles.len(), 24);
    // Quad recovery restores the six quads of each cuboid.
    let quads = outcome
        .object
        .triangle_and_quads
        .iter()
        .filter(|face| face.len() == 4)
        .count();
    assert_eq!(quads, 12);
}

#[test]
fn test_subtraction_carves_a_cavity() {
    let mut cache = CacheContext::new();
    let snapshot = cube_snapshot(&[
        ("p1", 0.0, 2.0, &[], &[]),
        ("p2", 0.0, 0.5, &[], &[("combineMode", "Inversion")]),
    ]);
    let outcome = generate(snapshot, &mut cache);
    assert!(outcome.is_successful);
    // Outer shell plus the inverted inner cube.
    assert_eq!(outcome.object.vertices.len(), 16);
    assert!(is_manifold(&outcome.object.triangles));
}

#[test]
fn test_failed_part_keeps_fallback_geometry() {
    let mut cache = CacheContext::new();
    let snapshot = cube_snapshot(&[
        ("p1", 0.0, 1.0, &[], &[]),
        ("p2", 5.0, -1.0, &[], &[]),
    ]);
    let outcome = generate(snapshot, &mut cache);
    assert!(!outcome.is_successful);
    assert_eq!(outcome.part_success.get("p1"), Some(&true));
    assert_eq!(outcome.part_success.get("p2"), Some(&false));
    // The good cube is present and the failed part's sheet stays visible:
    // raw quad vertices plus the fallback preview triangulation.
    assert!(outcome.object.vertices.len() > 8);
    assert!(outcome
        .object
        .vertices
        .iter()
        .any(|vertex| vertex.x > 3.0));
}

#[test]
fn test_uncombined_component_becomes_island() {
    let mut cache = CacheContext::new();
    let snapshot = cube_snapshot(&[
        ("p1", 0.0, 1.0, &[], &[]),
        ("p2", 5.0, 1.0, &[], &[("combineMode", "Uncombined")]),
    ]);
    let outcome = generate(snapshot, &mut cache);
    assert!(outcome.is_successful);
    // The island's cube is spliced in alongside the combined body.
    assert_eq!(outcome.object.vertices.len(), 16);
    assert_eq!(outcome.object.triangles.len(), 24);
}

#[test]
fn test_second_generation_hits_the_cache() {
    let snapshot = cube_snapshot(&[
        ("p1", 0.0, 1.0, &[], &[]),
        ("p2", 5.0, 1.0, &[], &[]),
    ]);
    let mut cache = CacheContext::new();
    let first = generate(snapshot.clone(), &mut cache);
    let combinations_after_first = cache.combination_count();
    assert!(combinations_after_first > 0);

    // An unchanged snapshot re-generates byte-identically with zero new
    // cache entries.
    let second = generate(snapshot, &mut cache);
    assert_eq!(cache.combination_count(), combinations_after_first);
    assert_eq!(first.object.vertices, second.object.vertices);
    assert_eq!(first.object.triangles, second.object.triangles);
    assert_eq!(
        first.object.triangle_and_quads,
        second.object.triangle_and_quads
    );
}

#[test]
fn test_dirty_part_invalidates_only_its_chain() {
    let snapshot = cube_snapshot(&[
        ("p1", 0.0, 1.0, &[], &[]),
        ("p2", 5.0, 1.0, &[], &[]),
        ("p3", 10.0, 1.0, &[], &[]),
    ]);
    let mut cache = CacheContext::new();
    let first = generate(snapshot.clone(), &mut cache);
    let combinations_after_first = cache.combination_count();

    // Mark p2 dirty; its component chain rebuilds, the rest reloads.
    let mut edited = snapshot;
    if let Some(part) = edited.parts.get_mut("p2") {
        part.insert("__dirty".to_string(), "true".to_string());
    }
    let second = generate(edited, &mut cache);
    assert!(second.is_successful);
    assert_eq!(cache.combination_count(), combinations_after_first);
    assert_eq!(first.object.vertices, second.object.vertices);
}

#[test]
fn test_mirrored_part_generates_twin_geometry() {
    let mut cache = CacheContext::new();
    let snapshot = cube_snapshot(&[("p1", 2.0, 0.5, &[("xMirrored", "true")], &[])]);
    let outcome = generate(snapshot, &mut cache);
    assert!(outcome.is_successful);
    // Source cube around x = 2 plus its twin around x = -2.
    assert_eq!(outcome.object.vertices.len(), 16);
    assert!(outcome.object.vertices.iter().any(|v| v.x > 1.0));
    assert!(outcome.object.vertices.iter().any(|v| v.x < -1.0));
    assert_eq!(outcome.part_success.len(), 2);
    // The twin's nodes carry their mirror lineage.
    assert!(outcome
        .object
        .nodes
        .iter()
        .any(|node| node.mirror_from_part_id.as_deref() == Some("p1")));
}

#[test]
fn test_disabled_part_is_excluded() {
    let mut cache = CacheContext::new();
    let snapshot = cube_snapshot(&[
        ("p1", 0.0, 1.0, &[], &[]),
        ("p2", 5.0, 1.0, &[("disabled", "true")], &[]),
    ]);
    let outcome = generate(snapshot, &mut cache);
    assert!(outcome.is_successful);
    assert_eq!(outcome.object.vertices.len(), 8);
    // Disabled parts do not participate in the success map.
    assert!(!outcome.part_success.contains_key("p2"));
}

struct CubeFillProvider;

impl FillMeshProvider for CubeFillProvider {
    fn fill_snapshot(&self, fill_mesh_id: &str) -> Option<Snapshot> {
        if fill_mesh_id != "blob" {
            return None;
        }
        Some(cube_snapshot(&[("fill-part", 0.0, 1.0, &[], &[])]))
    }
}

#[test]
fn test_fill_mesh_substitutes_sub_generation() {
    let mut cache = CacheContext::new();
    let mut snapshot = cube_snapshot(&[("p1", 0.0, 1.0, &[("fillMesh", "blob")], &[])]);
    // A second stroke node gives the fill a direction and length.
    snapshot.nodes.insert(
        "p1-n2".to_string(),
        attrs(&[
            ("partId", "p1"),
            ("x", "4"),
            ("y", "0"),
            ("z", "0"),
            ("radius", "1"),
        ]),
    );
    snapshot.edges.insert(
        "p1-e1".to_string(),
        attrs(&[("partId", "p1"), ("from", "p1-n1"), ("to", "p1-n2")]),
    );
    let outcome = MeshGenerator::new(
        snapshot,
        &BoxBuilder,
        &mut cache,
        GeneratorSettings::default(),
    )
    .with_fill_meshes(&CubeFillProvider)
    .generate();
    assert!(outcome.is_successful);
    assert_eq!(outcome.object.vertices.len(), 8);
    // The fill cube is stretched along the stroke from x = 0 to x = 4.
    let max_x = outcome
        .object
        .vertices
        .iter()
        .map(|v| v.x)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_x = outcome
        .object
        .vertices
        .iter()
        .map(|v| v.x)
        .fold(f64::INFINITY, f64::min);
    assert!((max_x - min_x - 4.0).abs() < 1e-9);
}

#[test]
fn test_worker_coalesces_and_reports_latest() {
    let worker = GenerationWorker::spawn(Arc::new(BoxBuilder), None, GeneratorSettings::default());

    worker.submit(cube_snapshot(&[("p1", 0.0, 1.0, &[], &[])]));
    let first = worker
        .outcomes()
        .recv_timeout(Duration::from_secs(10))
        .expect("first outcome");
    assert!(first.is_successful);
    assert_eq!(first.object.vertices.len(), 8);

    // A burst of edits: the final state always generates, intermediate
    // states may coalesce away.
    worker.submit(cube_snapshot(&[("p1", 0.0, 1.0, &[], &[])]));
    worker.submit(cube_snapshot(&[
        ("p1", 0.0, 1.0, &[], &[]),
        ("p2", 5.0, 1.0, &[], &[]),
    ]));
    worker.submit(cube_snapshot(&[
        ("p1", 0.0, 1.0, &[], &[]),
        ("p2", 5.0, 1.0, &[], &[]),
        ("p3", 10.0, 1.0, &[], &[]),
    ]));

    let mut last = None;
    while let Ok(outcome) = worker.outcomes().recv_timeout(Duration::from_secs(10)) {
        let done = outcome.object.vertices.len() == 24;
        last = Some(outcome);
        if done {
            break;
        }
    }
    let last = last.expect("burst outcome");
    assert_eq!(last.object.vertices.len(), 24);
    assert!(last.generation_id > first.generation_id);
}
