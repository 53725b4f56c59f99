//! # Per-Part Mesh Production
//!
//! Resolves one part's records into a stroke-builder call, wraps the raw
//! geometry into a validated combinable mesh, and caches the build
//! products. Failed parts keep a triangulated fallback preview so the
//! error stays visible in the final object.

use crate::builder::{BuildOptions, NodeCutOverride, StrokeNode};
use crate::cache::{CacheContext, GeneratedPart};
use crate::cut_face;
use crate::generator::{GeneratorSettings, MeshGenerator};
use crate::object::{ObjectEdge, ObjectNode, PositionedNodeSource};
use glam::{DQuat, DVec3};
use sculpt_mesh::mesh::triangulate_faces;
use sculpt_mesh::CombinableMesh;
use sculpt_snapshot::{chamfer_template, PartRecord, PartTarget};

impl<'a> MeshGenerator<'a> {
    /// Builds (or rebuilds) one part's mesh and cache entry.
    ///
    /// Returns the combinable mesh for joined model parts; `None` for
    /// disabled parts, non-model targets, and failures. `has_error` and
    /// `retryable` report failures the caller may retry in degraded mode.
    pub(crate) fn combine_part_mesh(
        &mut self,
        part_id: &str,
        has_error: &mut bool,
        retryable: &mut bool,
        add_intermediate_nodes: bool,
    ) -> Option<CombinableMesh> {
        let part = match self.parsed.part(part_id) {
            Some(part) => part.clone(),
            None => {
                tracing::warn!(part = part_id, "part not found");
                return None;
            }
        };

        *retryable = true;
        if part.fill_mesh.is_some() {
            *retryable = false;
        }

        let mut template = cut_face::resolve_template(&self.parsed, part.cut_face.as_deref());
        if part.chamfered {
            chamfer_template(&mut template);
        }

        let joined = part.target == PartTarget::Model && !part.disabled;
        // Replace the cache slot wholesale; stale meshes drop here.
        self.cache
            .parts
            .insert(part_id.to_string(), GeneratedPart {
                joined,
                ..GeneratedPart::default()
            });

        // A mirror twin builds from its source part's skeleton.
        let search_part_id = part.mirror_from.clone().unwrap_or_else(|| part_id.to_string());
        let origin = self.parsed.origin;
        let node_records: Vec<_> = self
            .parsed
            .part_nodes(&search_part_id)
            .into_iter()
            .cloned()
            .collect();
        let node_index_by_id: std::collections::BTreeMap<String, usize> = node_records
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();

        let mut stroke_nodes = Vec::with_capacity(node_records.len());
        let mut node_cut_overrides = Vec::with_capacity(node_records.len());
        for node in &node_records {
            stroke_nodes.push(StrokeNode {
                position: DVec3::new(
                    node.x - origin.x,
                    origin.y - node.y,
                    origin.z - node.z,
                ),
                radius: node.radius,
            });
            node_cut_overrides.push(node.cut_face.as_deref().map(|node_cut_face| {
                let mut node_template =
                    cut_face::resolve_template(&self.parsed, Some(node_cut_face));
                if part.chamfered {
                    chamfer_template(&mut node_template);
                }
                NodeCutOverride {
                    template: node_template,
                    rotation_degrees: node.cut_rotation.unwrap_or(0.0),
                }
            }));
        }

        let mut edges = Vec::new();
        for edge in self.parsed.part_edges(&search_part_id) {
            let from = node_index_by_id.get(&edge.from);
            let to = node_index_by_id.get(&edge.to);
            match (from, to) {
                (Some(&from), Some(&to)) => edges.push((from, to)),
                _ => {
                    tracing::warn!(edge = edge.id.as_str(), "edge endpoint not found");
                }
            }
        }

        let options = BuildOptions {
            intermediate_nodes: add_intermediate_nodes,
            smooth: part.smooth,
            subdived: part.subdived,
            rounded: part.rounded,
            base: part.base,
            deform_thickness: part.deform_thickness,
            deform_width: part.deform_width,
            deform_unified: part.deform_unified,
            hollow_thickness: part.hollow_thickness,
            node_cut_overrides,
        };

        let mut build_succeeded = false;
        if part.fill_mesh.is_none() {
            let mirrored = part.mirror_from.is_some();
            let mut object_nodes = Vec::with_capacity(node_records.len());
            for (node, stroke_node) in node_records.iter().zip(&stroke_nodes) {
                let mut node_origin = stroke_node.position;
                if mirrored {
                    node_origin.x = -node_origin.x;
                }
                object_nodes.push(ObjectNode {
                    part_id: part_id.to_string(),
                    node_id: node.id.clone(),
                    origin: node_origin,
                    radius: node.radius,
                    color: part.color.unwrap_or(self.settings.default_part_color),
                    color_solubility: part.color_solubility,
                    metalness: part.metalness,
                    roughness: part.roughness,
                    countershaded: part.countershaded,
                    mirror_from_part_id: part.mirror_from.clone(),
                    mirrored_by_part_id: part.mirrored_by.clone(),
                    joined,
                });
            }
            let object_edges: Vec<ObjectEdge> = edges
                .iter()
                .map(|&(from, to)| ObjectEdge {
                    from: (part_id.to_string(), node_records[from].id.clone()),
                    to: (part_id.to_string(), node_records[to].id.clone()),
                })
                .collect();

            match self.builder.build_part(
                &stroke_nodes,
                &edges,
                &template,
                part.cut_rotation,
                &options,
            ) {
                Ok(built) => {
                    build_succeeded = true;
                    let mut built_mesh = built.mesh;
                    if mirrored {
                        built_mesh.mirror_x();
                    }
                    let vertices = built_mesh.vertices().to_vec();
                    let faces = built_mesh.faces().to_vec();
                    let mut object_node_vertices = Vec::with_capacity(vertices.len());
                    for (index, position) in vertices.iter().enumerate() {
                        let Some(&source) = built.vertex_source_nodes.get(index) else {
                            continue;
                        };
                        let Some(node) = node_records.get(source) else {
                            tracing::debug!(part = part_id, "vertex source node out of range");
                            continue;
                        };
                        object_node_vertices.push(PositionedNodeSource {
                            position: *position,
                            part_id: part_id.to_string(),
                            node_id: node.id.clone(),
                        });
                    }
                    if let Some(slot) = self.cache.parts.get_mut(part_id) {
                        slot.vertices = vertices;
                        slot.faces = faces;
                        slot.object_nodes = object_nodes;
                        slot.object_edges = object_edges;
                        slot.object_node_vertices = object_node_vertices;
                    }
                }
                Err(failure) => {
                    tracing::warn!(part = part_id, %failure, "stroke mesh build failed");
                    if let Some(slot) = self.cache.parts.get_mut(part_id) {
                        slot.object_nodes = object_nodes;
                        slot.object_edges = object_edges;
                    }
                }
            }
        } else {
            build_succeeded = self.fill_part_with_mesh(part_id, &part, &stroke_nodes);
            if build_succeeded && part.mirror_from.is_some() {
                if let Some(slot) = self.cache.parts.get_mut(part_id) {
                    for v in &mut slot.vertices {
                        v.x = -v.x;
                    }
                    for face in &mut slot.faces {
                        face.reverse();
                    }
                }
            }
        }

        let mut mesh_error = false;
        let mut mesh = None;
        if build_succeeded {
            let (vertices, faces) = match self.cache.parts.get(part_id) {
                Some(slot) => (slot.vertices.clone(), slot.faces.clone()),
                None => (Vec::new(), Vec::new()),
            };
            let built_mesh = CombinableMesh::new(&vertices, &faces);
            if built_mesh.is_null() {
                mesh_error = true;
                tracing::warn!(part = part_id, "built mesh is not combinable");
            } else {
                mesh = Some(built_mesh);
            }
        } else {
            mesh_error = true;
            tracing::warn!(part = part_id, "mesh build failed");
        }

        if let Some(slot) = self.cache.parts.get_mut(part_id) {
            if let Some(mesh) = &mesh {
                slot.mesh = Some(mesh.clone());
                let (preview_vertices, preview_faces) = mesh.fetch();
                slot.preview_vertices = preview_vertices;
                slot.preview_triangles = preview_faces
                    .iter()
                    .filter(|face| face.len() == 3)
                    .map(|face| [face[0], face[1], face[2]])
                    .collect();
                slot.is_successful = true;
            }
            if slot.preview_triangles.is_empty() {
                // Fallback preview from the raw geometry so the failed part
                // stays visible.
                slot.preview_vertices = slot.vertices.clone();
                slot.preview_triangles = triangulate_faces(&slot.faces);
                slot.is_successful = false;
            }
        }

        if part.disabled || part.target != PartTarget::Model {
            mesh = None;
        }
        if mesh_error && part.target == PartTarget::Model {
            *has_error = true;
        }
        mesh
    }

    /// Substitutes an externally provided fill mesh for the swept tube.
    ///
    /// The fill snapshot is generated by a nested generator with a fresh,
    /// isolated cache context and welding disabled, then reshaped along the
    /// part's stroke.
    fn fill_part_with_mesh(
        &mut self,
        part_id: &str,
        part: &PartRecord,
        stroke_nodes: &[StrokeNode],
    ) -> bool {
        let Some(provider) = self.fill_meshes else {
            tracing::warn!(part = part_id, "no fill mesh provider configured");
            return false;
        };
        let Some(fill_mesh_id) = part.fill_mesh.as_deref() else {
            return false;
        };
        let Some(fill_snapshot) = provider.fill_snapshot(fill_mesh_id) else {
            tracing::warn!(part = part_id, fill_mesh = fill_mesh_id, "fill mesh not found");
            return false;
        };

        let mut fill_cache = CacheContext::new();
        let fill_settings = GeneratorSettings {
            weld_enabled: false,
            ..self.settings.clone()
        };
        let outcome = MeshGenerator::new(fill_snapshot, self.builder, &mut fill_cache, fill_settings)
            .with_fill_meshes(provider)
            .generate();
        if outcome.object.vertices.is_empty() {
            tracing::warn!(part = part_id, "fill mesh generation produced nothing");
            return false;
        }

        let mut object = outcome.object;
        let transform = stroke_fit_transform(&object.vertices, stroke_nodes);
        for position in &mut object.vertices {
            *position = transform.apply(*position);
        }
        for node in &mut object.nodes {
            node.origin = transform.apply(node.origin);
            node.radius *= transform.scale;
        }

        let mut object_node_vertices = Vec::new();
        for (index, position) in object.vertices.iter().enumerate() {
            if let Some(Some((source_part, source_node))) =
                object.vertex_source_nodes.get(index)
            {
                object_node_vertices.push(PositionedNodeSource {
                    position: *position,
                    part_id: source_part.clone(),
                    node_id: source_node.clone(),
                });
            }
        }

        if let Some(slot) = self.cache.parts.get_mut(part_id) {
            slot.vertices = object.vertices;
            slot.faces = object.triangle_and_quads;
            slot.object_nodes = object.nodes;
            slot.object_edges = object.edges;
            slot.object_node_vertices = object_node_vertices;
        }
        true
    }
}

/// Rigid orient + uniform scale + translate fitting a mesh onto a stroke.
pub(crate) struct StrokeFit {
    pub rotation: DQuat,
    pub scale: f64,
    pub source_center: DVec3,
    pub target_center: DVec3,
}

impl StrokeFit {
    pub(crate) fn apply(&self, position: DVec3) -> DVec3 {
        self.rotation * ((position - self.source_center) * self.scale) + self.target_center
    }
}

/// Fits a fill mesh's bounding box onto the stroke polyline: the box's
/// longest axis rotates onto the stroke direction and scales to the stroke
/// length (or the node diameter for a single-node stroke).
pub(crate) fn stroke_fit_transform(vertices: &[DVec3], stroke_nodes: &[StrokeNode]) -> StrokeFit {
    let identity = StrokeFit {
        rotation: DQuat::IDENTITY,
        scale: 1.0,
        source_center: DVec3::ZERO,
        target_center: DVec3::ZERO,
    };
    if vertices.is_empty() || stroke_nodes.is_empty() {
        return identity;
    }

    let mut min = vertices[0];
    let mut max = vertices[0];
    for v in &vertices[1..] {
        min = min.min(*v);
        max = max.max(*v);
    }
    let extent = max - min;
    let source_center = (min + max) / 2.0;
    let (source_axis, source_length) = if extent.x >= extent.y && extent.x >= extent.z {
        (DVec3::X, extent.x)
    } else if extent.y >= extent.z {
        (DVec3::Y, extent.y)
    } else {
        (DVec3::Z, extent.z)
    };

    let first = stroke_nodes[0];
    let last = stroke_nodes[stroke_nodes.len() - 1];
    let span = last.position - first.position;
    let (target_axis, target_length) = if span.length() > f64::EPSILON {
        (span.normalize(), span.length())
    } else {
        (DVec3::X, (first.radius * 2.0).max(f64::EPSILON))
    };

    StrokeFit {
        rotation: DQuat::from_rotation_arc(source_axis, target_axis),
        scale: if source_length > f64::EPSILON {
            target_length / source_length
        } else {
            1.0
        },
        source_center,
        target_center: (first.position + last.position) / 2.0,
    }
}
