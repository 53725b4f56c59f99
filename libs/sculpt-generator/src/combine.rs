//! # Hierarchical Combination
//!
//! Walks the component tree, folds sibling meshes through the boolean
//! combiner, and memoizes every intermediate combination under a
//! deterministic expression id. Failures degrade the affected branch and
//! mark the generation unsuccessful; they never abort it.

use crate::cache::GeneratedComponent;
use crate::generator::MeshGenerator;
use config::constants::INTERSECTION_WELD_DISTANCE;
use sculpt_mesh::repair::{collect_shared_quad_edges, weld_seam_to_fixed_point};
use sculpt_mesh::{combine, CombinableMesh, Method, PositionKey, VertexSource};
use sculpt_snapshot::{CombineMode, ComponentRecord};
use std::collections::BTreeSet;

impl<'a> MeshGenerator<'a> {
    /// Combines one component's subtree into a single mesh.
    ///
    /// A non-dirty component returns a copy of its cached mesh. Otherwise
    /// the subtree is rebuilt and the cache slot replaced.
    pub(crate) fn combine_component_mesh(
        &mut self,
        component_id: &str,
    ) -> (Option<CombinableMesh>, CombineMode) {
        let (combine_mode, link_part, children) = match self.parsed.component(component_id) {
            Some(component) => (
                component.combine_mode,
                component.link_part.clone(),
                component.children.clone(),
            ),
            None => {
                tracing::warn!(component = component_id, "component not found");
                return (None, CombineMode::Normal);
            }
        };

        if !self.dirty.components.contains(component_id) {
            if let Some(cached) = self.cache.components.get(component_id) {
                if let Some(mesh) = &cached.mesh {
                    return (Some(mesh.clone()), combine_mode);
                }
            }
        }

        let mut accumulator = GeneratedComponent::default();
        let mesh = match link_part {
            Some(part_id) => self.combine_linked_part(&part_id, &mut accumulator),
            None => self.combine_child_groups(&children, &mut accumulator),
        };

        accumulator.mesh = mesh.as_ref().filter(|m| !m.is_null()).cloned();
        let result = accumulator.mesh.clone();
        self.cache
            .components
            .insert(component_id.to_string(), accumulator);
        (result, combine_mode)
    }

    /// Part-linked component: build the part, absorb its provenance.
    fn combine_linked_part(
        &mut self,
        part_id: &str,
        accumulator: &mut GeneratedComponent,
    ) -> Option<CombinableMesh> {
        let mut has_error = false;
        let mut retryable = true;
        let mut mesh = self.combine_part_mesh(
            part_id,
            &mut has_error,
            &mut retryable,
            self.settings.interpolation_enabled,
        );
        if has_error {
            mesh = None;
            if retryable && self.settings.interpolation_enabled {
                has_error = false;
                tracing::warn!(part = part_id, "retrying part without intermediate nodes");
                mesh = self.combine_part_mesh(part_id, &mut has_error, &mut retryable, false);
            }
            if has_error {
                self.is_successful = false;
            }
        }

        if let Some(part_cache) = self.cache.parts.get(part_id) {
            for position in &part_cache.vertices {
                accumulator
                    .seam_free_vertices
                    .insert(PositionKey::new(*position));
            }
            collect_shared_quad_edges(
                &part_cache.vertices,
                &part_cache.faces,
                &mut accumulator.shared_quad_edges,
            );
            accumulator
                .object_nodes
                .extend(part_cache.object_nodes.iter().cloned());
            accumulator
                .object_edges
                .extend(part_cache.object_edges.iter().cloned());
            accumulator
                .object_node_vertices
                .extend(part_cache.object_node_vertices.iter().cloned());
        }
        mesh
    }

    /// Material/color key used by the sibling sub-grouping hook.
    ///
    /// `+` flags color-soluble parts, `-` colorless ones; groups return the
    /// empty key.
    pub(crate) fn component_color_key(&self, component: &ComponentRecord) -> String {
        let Some(part_id) = &component.link_part else {
            return String::new();
        };
        let Some(part) = self.parsed.part(part_id) else {
            tracing::warn!(part = part_id.as_str(), "part not found");
            return String::new();
        };
        if part.color_solubility > 0.0 {
            return "+".to_string();
        }
        match part.color {
            Some(color) => format!(
                "#{:02x}{:02x}{:02x}",
                (color.r * 255.0) as u8,
                (color.g * 255.0) as u8,
                (color.b * 255.0) as u8
            ),
            None => "-".to_string(),
        }
    }

    /// Group component: partition children into combine-mode runs, fold
    /// each run, then fold the runs.
    fn combine_child_groups(
        &mut self,
        children: &[String],
        accumulator: &mut GeneratedComponent,
    ) -> Option<CombinableMesh> {
        // First, group by combine mode; subtraction never merges into a
        // preceding run.
        let mut child_info: Vec<(String, CombineMode, String)> = Vec::new();
        for child_id in children {
            let Some(child) = self.parsed.component(child_id) else {
                tracing::warn!(component = child_id.as_str(), "component not found");
                continue;
            };
            let color_key = self.component_color_key(child);
            child_info.push((child_id.clone(), child.combine_mode, color_key));
        }

        let mut groups: Vec<(CombineMode, Vec<(String, String)>)> = Vec::new();
        let mut last_mode = None;
        for (child_id, mode, color_key) in child_info {
            if last_mode != Some(mode) || mode == CombineMode::Inversion {
                groups.push((mode, Vec::new()));
                last_mode = Some(mode);
            }
            if let Some(group) = groups.last_mut() {
                group.1.push((child_id, color_key));
            }
        }

        // Secondly, sub-group by color within each run.
        let mut group_meshes: Vec<(CombinableMesh, CombineMode, String)> = Vec::new();
        for (mode, members) in groups {
            let mut used = vec![false; members.len()];
            let mut subgroups: Vec<Vec<String>> = Vec::new();
            let mut last_color: Option<String> = None;
            for i in 0..members.len() {
                if used[i] {
                    continue;
                }
                // Color-based sub-grouping hook, currently forced to a
                // single group.
                let color_key = "white".to_string();
                if last_color.as_deref() != Some(color_key.as_str()) {
                    subgroups.push(Vec::new());
                    last_color = Some(color_key.clone());
                }
                used[i] = true;
                if let Some(subgroup) = subgroups.last_mut() {
                    subgroup.push(members[i].0.clone());
                }
                if color_key.is_empty() {
                    continue;
                }
                for j in i + 1..members.len() {
                    if used[j] || members[j].1.is_empty() || members[j].1 != color_key {
                        continue;
                    }
                    used[j] = true;
                    if let Some(subgroup) = subgroups.last_mut() {
                        subgroup.push(members[j].0.clone());
                    }
                }
            }

            let mut sub_meshes: Vec<(CombinableMesh, CombineMode, String)> = Vec::new();
            let mut sub_expressions: Vec<String> = Vec::new();
            for subgroup in subgroups {
                let expression = subgroup.join("|");
                let Some(sub_mesh) = self.combine_child_group(&subgroup, accumulator) else {
                    continue;
                };
                if sub_mesh.is_null() {
                    continue;
                }
                sub_expressions.push(expression.clone());
                sub_meshes.push((sub_mesh, CombineMode::Normal, expression));
            }
            let Some(group_mesh) = self.combine_multiple_meshes(sub_meshes, true) else {
                continue;
            };
            group_meshes.push((group_mesh, mode, sub_expressions.join("&")));
        }
        self.combine_multiple_meshes(group_meshes, true)
    }

    /// Folds one sub-group of sibling components.
    ///
    /// Keep-uncombined children are skipped entirely (collected later as
    /// islands); uncombinable child meshes route to the accumulator's
    /// island list. Child provenance merges into the parent either way.
    fn combine_child_group(
        &mut self,
        component_ids: &[String],
        accumulator: &mut GeneratedComponent,
    ) -> Option<CombinableMesh> {
        let mut meshes: Vec<(CombinableMesh, CombineMode, String)> = Vec::new();
        for component_id in component_ids {
            let (sub_mesh, child_mode) = self.combine_component_mesh(component_id);
            if child_mode == CombineMode::Uncombined {
                continue;
            }

            if let Some(child_cache) = self.cache.components.get(component_id) {
                accumulator
                    .seam_free_vertices
                    .extend(child_cache.seam_free_vertices.iter().copied());
                accumulator
                    .shared_quad_edges
                    .extend(child_cache.shared_quad_edges.iter().copied());
                accumulator
                    .object_nodes
                    .extend(child_cache.object_nodes.iter().cloned());
                accumulator
                    .object_edges
                    .extend(child_cache.object_edges.iter().cloned());
                accumulator
                    .object_node_vertices
                    .extend(child_cache.object_node_vertices.iter().cloned());
            }

            let Some(sub_mesh) = sub_mesh else {
                continue;
            };
            if sub_mesh.is_null() {
                continue;
            }
            if !sub_mesh.is_combinable() {
                tracing::debug!(
                    component = component_id.as_str(),
                    "child mesh is uncombinable, keeping as island"
                );
                accumulator.incombinable_meshes.push(sub_mesh);
                continue;
            }
            meshes.push((sub_mesh, child_mode, component_id.clone()));
        }
        self.combine_multiple_meshes(meshes, true)
    }

    /// Left-folds meshes through the boolean combiner, memoizing each step.
    ///
    /// The accumulated expression id keys the combination cache; failed
    /// combinations are cached as explicit `None` markers. A failing step
    /// drops that sibling's contribution and the fold continues.
    pub(crate) fn combine_multiple_meshes(
        &mut self,
        meshes: Vec<(CombinableMesh, CombineMode, String)>,
        recombine: bool,
    ) -> Option<CombinableMesh> {
        let mut current: Option<CombinableMesh> = None;
        let mut expression = String::new();
        for (sub_mesh, mode, sub_expression) in meshes {
            if sub_mesh.is_null() {
                tracing::debug!("child mesh is null");
                continue;
            }
            if !sub_mesh.is_combinable() {
                tracing::debug!("child mesh is uncombinable");
                continue;
            }
            let Some(folded) = current.take() else {
                current = Some(sub_mesh);
                expression = sub_expression;
                continue;
            };

            let method = if mode == CombineMode::Inversion {
                Method::Difference
            } else {
                Method::Union
            };
            expression.push_str(method.marker());
            expression.push_str(&sub_expression);
            if recombine {
                expression.push('!');
            }

            let memoized = self.cache.cached_combinations.get(&expression).cloned();
            let step = match memoized {
                Some(cached) => cached,
                None => {
                    let combined = self.combine_two_meshes(&folded, &sub_mesh, method, recombine);
                    self.cache
                        .cached_combinations
                        .insert(expression.clone(), combined.clone());
                    combined
                }
            };
            match step {
                Some(mesh) if !mesh.is_null() => current = Some(mesh),
                _ => {
                    self.is_successful = false;
                    tracing::warn!(expression = expression.as_str(), "mesh combine failed");
                    current = Some(folded);
                }
            }
        }
        current.filter(|mesh| !mesh.is_null())
    }

    /// One boolean step, optionally followed by seam recombination.
    ///
    /// Recombination welds debris vertices created along the intersection
    /// curve (input-matching vertices are protected), revalidates, and
    /// keeps the repaired mesh only when it is still combinable.
    pub(crate) fn combine_two_meshes(
        &mut self,
        first: &CombinableMesh,
        second: &CombinableMesh,
        method: Method,
        recombine: bool,
    ) -> Option<CombinableMesh> {
        if first.is_null() || second.is_null() {
            return None;
        }
        let combined = combine(first, second, method)?;
        let mut result = combined.mesh;
        if recombine && result.is_combinable() {
            let (vertices, faces) = result.fetch();
            let seam_free: BTreeSet<PositionKey> = vertices
                .iter()
                .zip(&combined.vertex_sources)
                .filter(|(_, source)| !matches!(source, VertexSource::Unknown))
                .map(|(position, _)| PositionKey::new(*position))
                .collect();
            let (welded_vertices, welded_faces, affected) = weld_seam_to_fixed_point(
                vertices,
                faces,
                INTERSECTION_WELD_DISTANCE,
                &seam_free,
            );
            if affected > 0 {
                let repaired = CombinableMesh::new(&welded_vertices, &welded_faces);
                if !repaired.is_null() && repaired.is_combinable() {
                    result = repaired;
                } else {
                    tracing::debug!("seam recombination rejected, keeping raw result");
                }
            }
        }
        if result.is_null() {
            None
        } else {
            Some(result)
        }
    }
}
