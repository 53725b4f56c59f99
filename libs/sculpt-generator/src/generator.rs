//! # Generation Pipeline
//!
//! One `MeshGenerator` runs one generation: mirror preprocessing, typed
//! ingestion, cache maintenance, dirty scanning, hierarchical combination,
//! root seam welding and quad recovery, island and error collection, and
//! final postprocessing. The generator never aborts; failures degrade
//! their subtree and surface through the success flags.

use crate::builder::{FillMeshProvider, StrokeMeshBuilder};
use crate::cache::CacheContext;
use crate::dirty::{self, DirtySets};
use crate::object::{GeneratedObject, GenerationOutcome, PositionedNodeSource};
use config::constants::{
    DEFAULT_PART_COLOR, ERROR_PART_COLOR, SEAM_WELD_DISTANCE,
    SMOOTH_SHADING_THRESHOLD_DEGREES,
};
use sculpt_mesh::normal::{smooth_triangle_vertex_normals, triangle_normals};
use sculpt_mesh::repair::{recover_quads, weld_seam_to_fixed_point};
use sculpt_mesh::PositionKey;
use sculpt_snapshot::snapshot::{attribute, is_true_value};
use sculpt_snapshot::{Color, CombineMode, ParsedSnapshot, Snapshot, ROOT_COMPONENT_ID};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

/// Tunable generation behavior.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Run the root seam weld pass (disabled for fill-mesh
    /// sub-generations).
    pub weld_enabled: bool,
    /// Let the builder insert smoothing nodes; the degraded retry turns
    /// this off per part.
    pub interpolation_enabled: bool,
    /// Crease angle for smooth normal generation, in degrees.
    pub smooth_shading_threshold_degrees: f64,
    /// Color for parts without one of their own.
    pub default_part_color: Color,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            weld_enabled: true,
            interpolation_enabled: true,
            smooth_shading_threshold_degrees: SMOOTH_SHADING_THRESHOLD_DEGREES,
            default_part_color: Color::from_array(DEFAULT_PART_COLOR),
        }
    }
}

/// One generation run over one snapshot.
///
/// The cache context is borrowed, not owned: the caller decides how long
/// caches live and whether independent pipelines share anything (they
/// should not).
pub struct MeshGenerator<'a> {
    pub(crate) parsed: ParsedSnapshot,
    pub(crate) builder: &'a dyn StrokeMeshBuilder,
    pub(crate) fill_meshes: Option<&'a dyn FillMeshProvider>,
    pub(crate) cache: &'a mut CacheContext,
    pub(crate) settings: GeneratorSettings,
    pub(crate) dirty: DirtySets,
    pub(crate) is_successful: bool,
    pub(crate) object: GeneratedObject,
    pub(crate) node_vertices: Vec<PositionedNodeSource>,
    generation_id: u64,
}

impl<'a> MeshGenerator<'a> {
    /// Prepares a generation: expands mirrors and builds the typed view.
    pub fn new(
        snapshot: Snapshot,
        builder: &'a dyn StrokeMeshBuilder,
        cache: &'a mut CacheContext,
        settings: GeneratorSettings,
    ) -> Self {
        let mut snapshot = snapshot;
        preprocess_mirror(&mut snapshot);
        Self {
            parsed: ParsedSnapshot::parse(&snapshot),
            builder,
            fill_meshes: None,
            cache,
            settings,
            dirty: DirtySets::default(),
            is_successful: true,
            object: GeneratedObject::default(),
            node_vertices: Vec::new(),
            generation_id: 0,
        }
    }

    /// Attaches a fill-mesh provider.
    pub fn with_fill_meshes(mut self, provider: &'a dyn FillMeshProvider) -> Self {
        self.fill_meshes = Some(provider);
        self
    }

    /// Tags the outcome with a generation id.
    pub fn with_generation_id(mut self, generation_id: u64) -> Self {
        self.generation_id = generation_id;
        self
    }

    /// Runs the generation to completion.
    ///
    /// Always terminates and always returns an object; an empty snapshot
    /// yields an empty object with `is_successful == true`.
    pub fn generate(mut self) -> GenerationOutcome {
        let started = Instant::now();

        for (mirror_id, source_id) in self
            .parsed
            .parts
            .values()
            .filter_map(|part| {
                part.mirror_from
                    .clone()
                    .map(|source| (part.id.clone(), source))
            })
            .collect::<Vec<_>>()
        {
            self.cache.part_mirror_ids.insert(mirror_id, source_id);
        }

        self.cache.evict_absent(&self.parsed);
        self.dirty = dirty::scan(&self.parsed);
        self.cache
            .invalidate_dirty_combinations(&self.dirty.components);
        // The root always recombines; its children hit their caches.
        self.dirty
            .components
            .insert(ROOT_COMPONENT_ID.to_string());

        let (combined, _) = self.combine_component_mesh(ROOT_COMPONENT_ID);

        let (seam_free, shared_quad_edges) = match self.cache.components.get(ROOT_COMPONENT_ID) {
            Some(root) => {
                self.object.nodes = root.object_nodes.clone();
                self.object.edges = root.object_edges.clone();
                self.node_vertices = root.object_node_vertices.clone();
                (
                    root.seam_free_vertices.clone(),
                    root.shared_quad_edges.clone(),
                )
            }
            None => Default::default(),
        };

        if let Some(mesh) = &combined {
            let (vertices, faces) = mesh.fetch();
            let (vertices, faces) = if self.settings.weld_enabled {
                let (vertices, faces, welded) =
                    weld_seam_to_fixed_point(vertices, faces, SEAM_WELD_DISTANCE, &seam_free);
                if welded > 0 {
                    tracing::debug!(welded, "seam weld merged vertices");
                }
                (vertices, faces)
            } else {
                (vertices, faces)
            };
            recover_quads(
                &vertices,
                &faces,
                &shared_quad_edges,
                &mut self.object.triangle_and_quads,
            );
            self.object.triangles = faces
                .iter()
                .filter(|face| face.len() == 3)
                .map(|face| [face[0], face[1], face[2]])
                .collect();
            self.object.vertices = vertices;
        }

        self.collect_uncombined_component(ROOT_COMPONENT_ID);
        self.collect_incombinable_component_meshes(ROOT_COMPONENT_ID);
        self.collect_errored_parts();
        self.postprocess_object();

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            vertices = self.object.vertices.len(),
            successful = self.is_successful,
            "mesh generation finished"
        );

        let part_success: BTreeMap<String, bool> = self
            .cache
            .parts
            .iter()
            .filter(|(_, part)| part.joined)
            .map(|(id, part)| (id.clone(), part.is_successful))
            .collect();

        GenerationOutcome {
            generation_id: self.generation_id,
            object: self.object,
            is_successful: self.is_successful,
            part_success,
        }
    }

    /// Splices keep-uncombined subtrees into the object as islands.
    fn collect_uncombined_component(&mut self, component_id: &str) {
        let (combine_mode, children) = match self.parsed.component(component_id) {
            Some(component) => (component.combine_mode, component.children.clone()),
            None => return,
        };
        if combine_mode == CombineMode::Uncombined {
            let (mesh, shared_quad_edges, nodes, edges, node_vertices) =
                match self.cache.components.get(component_id) {
                    Some(cache) => (
                        cache.mesh.clone(),
                        cache.shared_quad_edges.clone(),
                        cache.object_nodes.clone(),
                        cache.object_edges.clone(),
                        cache.object_node_vertices.clone(),
                    ),
                    None => return,
                };
            let Some(mesh) = mesh.filter(|mesh| !mesh.is_null()) else {
                tracing::warn!(
                    component = component_id,
                    "uncombined component has no mesh"
                );
                return;
            };
            self.object.nodes.extend(nodes);
            self.object.edges.extend(edges);
            self.node_vertices.extend(node_vertices);
            self.collect_island_mesh(&mesh, &shared_quad_edges);
            return;
        }
        for child_id in children {
            self.collect_uncombined_component(&child_id);
        }
    }

    /// Splices incombinable fold leftovers into the object as islands.
    fn collect_incombinable_component_meshes(&mut self, component_id: &str) {
        let (combine_mode, children) = match self.parsed.component(component_id) {
            Some(component) => (component.combine_mode, component.children.clone()),
            None => return,
        };
        if combine_mode == CombineMode::Uncombined {
            return;
        }
        if let Some(cache) = self.cache.components.get(component_id) {
            let meshes = cache.incombinable_meshes.clone();
            let shared_quad_edges = cache.shared_quad_edges.clone();
            for mesh in meshes {
                self.is_successful = false;
                self.collect_island_mesh(&mesh, &shared_quad_edges);
            }
        }
        for child_id in children {
            self.collect_incombinable_component_meshes(&child_id);
        }
    }

    /// Appends one disjoint mesh to the object buffers.
    fn collect_island_mesh(
        &mut self,
        mesh: &sculpt_mesh::CombinableMesh,
        shared_quad_edges: &BTreeSet<sculpt_mesh::repair::QuadEdgeKey>,
    ) {
        if mesh.is_null() {
            return;
        }
        let (vertices, faces) = mesh.fetch();
        let mut triangle_and_quads = Vec::new();
        recover_quads(&vertices, &faces, shared_quad_edges, &mut triangle_and_quads);

        let offset = self.object.vertices.len() as u32;
        self.object.vertices.extend(vertices);
        self.object.triangles.extend(
            faces
                .iter()
                .filter(|face| face.len() == 3)
                .map(|face| [face[0] + offset, face[1] + offset, face[2] + offset]),
        );
        self.object.triangle_and_quads.extend(
            triangle_and_quads
                .iter()
                .map(|face| face.iter().map(|index| index + offset).collect::<Vec<_>>()),
        );
    }

    /// Appends failed parts' raw geometry so errors stay visible.
    fn collect_errored_parts(&mut self) {
        let errored: Vec<_> = self
            .cache
            .parts
            .values()
            .filter(|part| !part.is_successful && part.joined)
            .map(|part| {
                (
                    part.vertices.clone(),
                    part.faces.clone(),
                    part.preview_vertices.clone(),
                    part.preview_triangles.clone(),
                )
            })
            .collect();
        for (vertices, faces, preview_vertices, preview_triangles) in errored {
            let offset = self.object.vertices.len() as u32;
            self.object.vertices.extend(vertices);
            self.object.triangle_and_quads.extend(
                faces
                    .iter()
                    .map(|face| face.iter().map(|index| index + offset).collect::<Vec<_>>()),
            );
            let offset = self.object.vertices.len() as u32;
            self.object.vertices.extend(preview_vertices);
            self.object.triangles.extend(
                preview_triangles
                    .iter()
                    .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
            );
        }
    }

    /// Normals, per-vertex/per-triangle attribution, and colors.
    fn postprocess_object(&mut self) {
        self.object.triangle_normals =
            triangle_normals(&self.object.vertices, &self.object.triangles);

        let mut source_map: BTreeMap<PositionKey, (String, String)> = BTreeMap::new();
        for source in &self.node_vertices {
            source_map
                .entry(PositionKey::new(source.position))
                .or_insert_with(|| (source.part_id.clone(), source.node_id.clone()));
        }
        self.object.vertex_source_nodes = self
            .object
            .vertices
            .iter()
            .map(|position| source_map.get(&PositionKey::new(*position)).cloned())
            .collect();

        // Triangle attribution: majority vote across attributed corners.
        self.object.triangle_source_nodes = self
            .object
            .triangles
            .iter()
            .map(|triangle| {
                let mut votes: Vec<(String, String)> = Vec::with_capacity(3);
                for &corner in triangle {
                    if let Some(Some(source)) =
                        self.object.vertex_source_nodes.get(corner as usize)
                    {
                        votes.push(source.clone());
                    }
                }
                votes
                    .iter()
                    .max_by_key(|candidate| {
                        votes.iter().filter(|other| other == candidate).count()
                    })
                    .cloned()
            })
            .collect();

        let node_colors: BTreeMap<(String, String), Color> = self
            .object
            .nodes
            .iter()
            .map(|node| {
                (
                    (node.part_id.clone(), node.node_id.clone()),
                    node.color,
                )
            })
            .collect();
        let failed_parts: BTreeSet<String> = self
            .cache
            .parts
            .iter()
            .filter(|(_, part)| part.joined && !part.is_successful)
            .map(|(id, _)| id.clone())
            .collect();
        let default_color = self.settings.default_part_color;
        let error_color = Color::from_array(ERROR_PART_COLOR);
        self.object.triangle_colors = self
            .object
            .triangle_source_nodes
            .iter()
            .map(|source| match source {
                Some(source) if failed_parts.contains(&source.0) => error_color,
                Some(source) => node_colors.get(source).copied().unwrap_or(default_color),
                None => default_color,
            })
            .collect();

        self.object.triangle_vertex_normals = smooth_triangle_vertex_normals(
            &self.object.vertices,
            &self.object.triangles,
            &self.object.triangle_normals,
            self.settings.smooth_shading_threshold_degrees,
        );
    }
}

/// Derives a deterministic twin id from a source id.
///
/// Reverses the id's alphanumeric characters in place, leaving punctuation
/// (dashes, braces) where it is, so UUID-shaped ids stay UUID-shaped. The
/// mapping is an involution: reversing twice restores the source id.
pub fn reverse_id(id: &str) -> String {
    let mut characters: Vec<char> = id.chars().collect();
    let slots: Vec<usize> = characters
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_ascii_alphanumeric())
        .map(|(index, _)| index)
        .collect();
    let reversed: Vec<char> = slots
        .iter()
        .rev()
        .map(|&index| characters[index])
        .collect();
    for (&slot, &value) in slots.iter().zip(&reversed) {
        characters[slot] = value;
    }
    characters.into_iter().collect()
}

/// Expands `xMirrored` parts into synthesized mirror twins.
///
/// Each mirrored part gains a twin part (and twin components for every
/// component linking it) with ids derived by [`reverse_id`], marked dirty
/// and linked back to its source; twins register as siblings of their
/// source components.
pub(crate) fn preprocess_mirror(snapshot: &mut Snapshot) {
    let mut source_to_twin: BTreeMap<String, String> = BTreeMap::new();
    let mut new_parts = Vec::new();
    for (part_id, attrs) in &snapshot.parts {
        if !is_true_value(attribute(attrs, "xMirrored")) {
            continue;
        }
        let twin_id = reverse_id(part_id);
        let mut twin = attrs.clone();
        twin.insert("__mirrorFromPartId".to_string(), part_id.clone());
        twin.insert("id".to_string(), twin_id.clone());
        twin.insert("__dirty".to_string(), "true".to_string());
        source_to_twin.insert(part_id.clone(), twin_id.clone());
        new_parts.push((twin_id, twin));
    }
    if source_to_twin.is_empty() {
        return;
    }

    for (source_id, twin_id) in &source_to_twin {
        if let Some(attrs) = snapshot.parts.get_mut(source_id) {
            attrs.insert("__mirroredByPartId".to_string(), twin_id.clone());
        }
    }
    for (twin_id, attrs) in new_parts {
        snapshot.parts.insert(twin_id, attrs);
    }

    // Parent lookup for registering twin components next to their sources.
    let mut parent_of: BTreeMap<String, Option<String>> = BTreeMap::new();
    for (component_id, attrs) in &snapshot.components {
        for child_id in attribute(attrs, "children").split(',') {
            if !child_id.is_empty() {
                parent_of.insert(child_id.to_string(), Some(component_id.clone()));
            }
        }
    }
    for child_id in attribute(&snapshot.root_component, "children").split(',') {
        if !child_id.is_empty() {
            parent_of.insert(child_id.to_string(), None);
        }
    }

    let mut new_components = Vec::new();
    for (component_id, attrs) in &snapshot.components {
        if attribute(attrs, "linkDataType") != "partId" {
            continue;
        }
        let Some(twin_part_id) = source_to_twin.get(attribute(attrs, "linkData")) else {
            continue;
        };
        let twin_component_id = reverse_id(component_id);
        let mut twin = attrs.clone();
        twin.insert("linkData".to_string(), twin_part_id.clone());
        twin.insert("id".to_string(), twin_component_id.clone());
        twin.insert("__dirty".to_string(), "true".to_string());
        let parent = parent_of.get(component_id).cloned().flatten();
        new_components.push((twin_component_id, twin, parent));
    }
    for (twin_component_id, attrs, parent) in new_components {
        snapshot
            .components
            .insert(twin_component_id.clone(), attrs);
        let children = match parent {
            Some(parent_id) => snapshot
                .components
                .get_mut(&parent_id)
                .map(|attrs| attrs.entry("children".to_string()).or_default()),
            None => Some(
                snapshot
                    .root_component
                    .entry("children".to_string())
                    .or_default(),
            ),
        };
        if let Some(children) = children {
            if children.is_empty() {
                *children = twin_component_id;
            } else {
                children.push(',');
                children.push_str(&twin_component_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sculpt_snapshot::AttributeMap;

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_reverse_id_is_an_involution() {
        let id = "{3fa15b02-6c4d-4a1e-9d21-77e0b5c4a933}";
        let twin = reverse_id(id);
        assert_ne!(twin, id);
        assert_eq!(reverse_id(&twin), id);
        // Punctuation stays in place.
        assert!(twin.starts_with('{') && twin.ends_with('}'));
        assert_eq!(twin.len(), id.len());
    }

    #[test]
    fn test_preprocess_mirror_synthesizes_twin() {
        let mut snapshot = Snapshot::default();
        snapshot
            .parts
            .insert("ab12".to_string(), attrs(&[("xMirrored", "true")]));
        snapshot.components.insert(
            "cd34".to_string(),
            attrs(&[("linkDataType", "partId"), ("linkData", "ab12")]),
        );
        snapshot.root_component = attrs(&[("children", "cd34")]);

        preprocess_mirror(&mut snapshot);

        let twin_part_id = reverse_id("ab12");
        assert!(snapshot.parts.contains_key(&twin_part_id));
        let twin = &snapshot.parts[&twin_part_id];
        assert_eq!(attribute(twin, "__mirrorFromPartId"), "ab12");
        assert_eq!(attribute(twin, "__dirty"), "true");
        assert_eq!(
            attribute(&snapshot.parts["ab12"], "__mirroredByPartId"),
            twin_part_id
        );

        let twin_component_id = reverse_id("cd34");
        assert!(snapshot.components.contains_key(&twin_component_id));
        assert_eq!(
            attribute(&snapshot.components[&twin_component_id], "linkData"),
            twin_part_id
        );
        let root_children = attribute(&snapshot.root_component, "children");
        assert!(root_children.contains(&twin_component_id));
    }

    #[test]
    fn test_preprocess_mirror_without_mirrored_parts_is_a_no_op() {
        let mut snapshot = Snapshot::default();
        snapshot
            .parts
            .insert("p1".to_string(), AttributeMap::new());
        let before = snapshot.clone();
        preprocess_mirror(&mut snapshot);
        assert_eq!(snapshot.parts.len(), before.parts.len());
    }
}
