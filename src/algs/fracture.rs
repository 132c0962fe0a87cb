//! Fracture descriptor: traces of tagged faces and the derived node roles.
//!
//! A [`Fracture`] is built against one grid. Each call to
//! [`Fracture::add_trace`] validates a face mask as a simple path or a simple
//! cycle of faces (faces are linked through shared nodes) and rejects masks
//! that overlap an earlier trace. [`Fracture::compute_tips_and_intersections`]
//! then classifies every node touched by a tagged face:
//!
//! - **tip**: touched by one trace, by exactly one tagged face, and not on the
//!   domain boundary; the crack closes there and the node stays shared;
//! - **intersection**: touched by two or more traces, or by three or more
//!   tagged faces;
//! - **interior**: every other fracture node, including trace ends that reach
//!   the domain boundary; these are duplicated.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::{MeshFractureError, TraceDefect};
use crate::topology::grid::Grid;

/// Role of a node touched by at least one fracture face.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    Interior,
    Tip,
    Intersection,
}

/// Tip / intersection / interior classification of fracture nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRoles {
    tips: BTreeSet<usize>,
    intersections: BTreeSet<usize>,
    interior: BTreeSet<usize>,
}

impl NodeRoles {
    pub fn tip_nodes(&self) -> &BTreeSet<usize> {
        &self.tips
    }

    pub fn intersection_nodes(&self) -> &BTreeSet<usize> {
        &self.intersections
    }

    pub fn interior_nodes(&self) -> &BTreeSet<usize> {
        &self.interior
    }

    pub fn role(&self, node: usize) -> Option<NodeRole> {
        if self.tips.contains(&node) {
            Some(NodeRole::Tip)
        } else if self.intersections.contains(&node) {
            Some(NodeRole::Intersection)
        } else if self.interior.contains(&node) {
            Some(NodeRole::Interior)
        } else {
            None
        }
    }

    /// All fracture nodes in ascending order.
    pub fn fracture_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.tips
            .iter()
            .merge(self.intersections.iter())
            .merge(self.interior.iter())
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.tips.is_empty() && self.intersections.is_empty() && self.interior.is_empty()
    }
}

/// One validated fracture trace, faces and nodes in chain order.
///
/// An open trace of `k` faces has `k + 1` nodes; a closed one has `k`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trace {
    faces: Vec<usize>,
    nodes: Vec<usize>,
    closed: bool,
}

impl Trace {
    /// Validates `mask` against `grid` as trace number `index`.
    pub fn from_mask(grid: &Grid, mask: &[bool], index: usize) -> Result<Self, MeshFractureError> {
        let malformed = |reason| MeshFractureError::MalformedTrace {
            trace: index,
            reason,
        };

        if mask.len() != grid.num_faces() {
            return Err(malformed(TraceDefect::MaskLength {
                expected: grid.num_faces(),
                found: mask.len(),
            }));
        }
        let faces: Vec<usize> = mask.iter().positions(|&t| t).collect();
        if faces.is_empty() {
            return Err(malformed(TraceDefect::Empty));
        }

        for &face in &faces {
            let cells = grid.cells_of_face(face).len();
            if cells != 2 {
                return Err(malformed(TraceDefect::BoundaryFace { face, cells }));
            }
        }

        let incident = faces_by_node(grid, &faces);
        if let Some((&node, members)) = incident.iter().find(|(_, members)| members.len() > 2) {
            return Err(malformed(TraceDefect::Branching {
                node,
                degree: members.len(),
            }));
        }

        let components = count_components(grid, &faces, &incident);
        if components > 1 {
            return Err(malformed(TraceDefect::Disconnected { components }));
        }

        // Connected with every node of degree <= 2: a simple path or a simple cycle.
        let start = incident
            .iter()
            .find(|(_, members)| members.len() == 1)
            .map(|(&node, _)| node);
        let closed = start.is_none();
        let start = match start {
            Some(node) => node,
            None => first_node(grid, faces[0])?,
        };
        let (faces, nodes) = walk_chain(grid, &incident, start, faces.len());
        Ok(Self {
            faces,
            nodes,
            closed,
        })
    }

    pub fn faces(&self) -> &[usize] {
        &self.faces
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of faces.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// First and last node of an open trace.
    pub fn endpoints(&self) -> Option<(usize, usize)> {
        if self.closed {
            return None;
        }
        Some((*self.nodes.first()?, *self.nodes.last()?))
    }

    /// The trace as a boolean face mask of length `num_faces`.
    pub fn mask(&self, num_faces: usize) -> Vec<bool> {
        let mut mask = vec![false; num_faces];
        for &f in &self.faces {
            if let Some(slot) = mask.get_mut(f) {
                *slot = true;
            }
        }
        mask
    }
}

/// Fracture traces recorded against one grid.
#[derive(Clone, Debug)]
pub struct Fracture<'g> {
    grid: &'g Grid,
    traces: Vec<Trace>,
    trace_of_face: Vec<Option<usize>>,
    roles: Option<NodeRoles>,
}

impl<'g> Fracture<'g> {
    /// An empty descriptor for `grid`.
    pub fn new(grid: &'g Grid) -> Self {
        Self {
            grid,
            traces: Vec::new(),
            trace_of_face: vec![None; grid.num_faces()],
            roles: None,
        }
    }

    /// Builds a descriptor from an arbitrary tag mask.
    ///
    /// The tagged faces are cut into maximal chains at nodes that are not
    /// shared by exactly two tagged faces, and every chain becomes a trace.
    /// An all-false mask yields a descriptor with no traces.
    pub fn from_mask(grid: &'g Grid, mask: &[bool]) -> Result<Self, MeshFractureError> {
        if mask.len() != grid.num_faces() {
            return Err(MeshFractureError::MalformedTrace {
                trace: 0,
                reason: TraceDefect::MaskLength {
                    expected: grid.num_faces(),
                    found: mask.len(),
                },
            });
        }
        let mut fracture = Self::new(grid);
        for chain in decompose_chains(grid, mask)? {
            let mut chain_mask = vec![false; grid.num_faces()];
            for f in chain {
                chain_mask[f] = true;
            }
            fracture.add_trace(&chain_mask)?;
        }
        fracture.compute_tips_and_intersections();
        Ok(fracture)
    }

    /// The grid this descriptor was built for.
    pub fn grid(&self) -> &'g Grid {
        self.grid
    }

    /// Validates `mask` as a new trace and appends it; returns the trace index.
    ///
    /// Previously computed node roles are discarded.
    pub fn add_trace(&mut self, mask: &[bool]) -> Result<usize, MeshFractureError> {
        let index = self.traces.len();
        let trace = Trace::from_mask(self.grid, mask, index)?;
        if let Some((face, first)) = trace
            .faces()
            .iter()
            .find_map(|&f| self.trace_of_face[f].map(|owner| (f, owner)))
        {
            return Err(MeshFractureError::OverlappingTraces {
                face,
                first,
                second: index,
            });
        }
        for &f in trace.faces() {
            self.trace_of_face[f] = Some(index);
        }
        log::debug!(
            "fracture trace {index}: {} faces, closed={}",
            trace.len(),
            trace.is_closed()
        );
        self.traces.push(trace);
        self.roles = None;
        self.debug_assert_invariants();
        Ok(index)
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn num_traces(&self) -> usize {
        self.traces.len()
    }

    /// One boolean face mask per trace, in insertion order.
    pub fn face_tag_sets(&self) -> impl Iterator<Item = Vec<bool>> + '_ {
        let num_faces = self.grid.num_faces();
        self.traces.iter().map(move |t| t.mask(num_faces))
    }

    /// Union of all traces.
    pub fn tag(&self) -> Vec<bool> {
        self.trace_of_face.iter().map(Option::is_some).collect()
    }

    /// Tagged faces in ascending order.
    pub fn tagged_faces(&self) -> Vec<usize> {
        self.trace_of_face.iter().positions(Option::is_some).collect()
    }

    /// Number of tagged faces over all traces.
    pub fn num_tagged(&self) -> usize {
        self.traces.iter().map(Trace::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Trace owning `face`, if any.
    pub fn trace_of_face(&self, face: usize) -> Option<usize> {
        self.trace_of_face.get(face).copied().flatten()
    }

    /// Classifies the fracture nodes and stores the result.
    ///
    /// Deterministic: repeated calls without new traces give the same sets.
    pub fn compute_tips_and_intersections(&mut self) -> &NodeRoles {
        let roles = self.classify_nodes();
        self.roles.insert(roles)
    }

    /// Node roles from the last [`Fracture::compute_tips_and_intersections`] call.
    pub fn roles(&self) -> Option<&NodeRoles> {
        self.roles.as_ref()
    }

    pub fn tip_nodes(&self) -> Option<&BTreeSet<usize>> {
        self.roles.as_ref().map(NodeRoles::tip_nodes)
    }

    pub fn intersection_nodes(&self) -> Option<&BTreeSet<usize>> {
        self.roles.as_ref().map(NodeRoles::intersection_nodes)
    }

    /// Computes node roles without storing them.
    pub fn classify_nodes(&self) -> NodeRoles {
        let mut degree: BTreeMap<usize, usize> = BTreeMap::new();
        let mut traces_at: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for (t, trace) in self.traces.iter().enumerate() {
            for &f in trace.faces() {
                for &n in self.grid.nodes_of_face(f) {
                    *degree.entry(n).or_default() += 1;
                    traces_at.entry(n).or_default().insert(t);
                }
            }
        }

        let on_boundary = self.grid.boundary_nodes();
        let mut roles = NodeRoles::default();
        for (&node, &deg) in &degree {
            let num_traces = traces_at.get(&node).map_or(0, BTreeSet::len);
            if num_traces >= 2 || deg >= 3 {
                roles.intersections.insert(node);
            } else if deg == 1 && !on_boundary.get(node).copied().unwrap_or(false) {
                roles.tips.insert(node);
            } else {
                roles.interior.insert(node);
            }
        }
        roles
    }
}

impl DebugInvariants for Fracture<'_> {
    fn validate_invariants(&self) -> Result<(), MeshFractureError> {
        if self.trace_of_face.len() != self.grid.num_faces() {
            return Err(MeshFractureError::InconsistentTopology(format!(
                "fracture tracks {} faces, grid has {}",
                self.trace_of_face.len(),
                self.grid.num_faces()
            )));
        }
        for (t, trace) in self.traces.iter().enumerate() {
            for &f in trace.faces() {
                if self.trace_of_face.get(f).copied().flatten() != Some(t) {
                    return Err(MeshFractureError::InconsistentTopology(format!(
                        "face {f} of trace {t} is not owned by it"
                    )));
                }
            }
        }
        if self.num_tagged() != self.trace_of_face.iter().flatten().count() {
            return Err(MeshFractureError::InconsistentTopology(
                "tagged face count disagrees with traces".into(),
            ));
        }
        Ok(())
    }
}

fn faces_by_node(grid: &Grid, faces: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut incident: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &f in faces {
        for &n in grid.nodes_of_face(f) {
            incident.entry(n).or_default().push(f);
        }
    }
    incident
}

fn count_components(
    grid: &Grid,
    faces: &[usize],
    incident: &BTreeMap<usize, Vec<usize>>,
) -> usize {
    let mut seen: BTreeSet<usize> = BTreeSet::new();
    let mut components = 0;
    for &root in faces {
        if !seen.insert(root) {
            continue;
        }
        components += 1;
        let mut stack = vec![root];
        while let Some(f) = stack.pop() {
            for n in grid.nodes_of_face(f) {
                for &g in incident.get(n).into_iter().flatten() {
                    if seen.insert(g) {
                        stack.push(g);
                    }
                }
            }
        }
    }
    components
}

/// Walks a path or cycle whose nodes all have degree <= 2, starting at `start`.
fn walk_chain(
    grid: &Grid,
    incident: &BTreeMap<usize, Vec<usize>>,
    start: usize,
    len: usize,
) -> (Vec<usize>, Vec<usize>) {
    let mut faces = Vec::with_capacity(len);
    let mut used: BTreeSet<usize> = BTreeSet::new();
    let mut nodes = vec![start];
    let mut node = start;
    let mut prev: Option<usize> = None;
    while faces.len() < len {
        let next = incident
            .get(&node)
            .into_iter()
            .flatten()
            .copied()
            .find(|&f| Some(f) != prev && !used.contains(&f));
        let Some(face) = next else { break };
        used.insert(face);
        faces.push(face);
        node = other_node(grid, face, node);
        prev = Some(face);
        if faces.len() < len || node != start {
            nodes.push(node);
        }
    }
    (faces, nodes)
}

fn first_node(grid: &Grid, face: usize) -> Result<usize, MeshFractureError> {
    grid.nodes_of_face(face).first().copied().ok_or_else(|| {
        MeshFractureError::InconsistentTopology(format!("tagged face {face} has no nodes"))
    })
}

fn other_node(grid: &Grid, face: usize, node: usize) -> usize {
    grid.nodes_of_face(face)
        .iter()
        .copied()
        .find(|&n| n != node)
        .unwrap_or(node)
}

/// Splits the tagged faces into maximal chains.
///
/// Chains start and stop at nodes whose tagged degree is not 2; components
/// without such nodes are closed loops and come out as one chain each.
fn decompose_chains(grid: &Grid, mask: &[bool]) -> Result<Vec<Vec<usize>>, MeshFractureError> {
    let faces: Vec<usize> = mask.iter().positions(|&t| t).collect();
    let incident = faces_by_node(grid, &faces);
    let mut used: BTreeSet<usize> = BTreeSet::new();
    let mut chains = Vec::new();

    let grow = |start_node: usize, first: usize, used: &mut BTreeSet<usize>| {
        let mut chain = vec![first];
        used.insert(first);
        let mut node = other_node(grid, first, start_node);
        while incident.get(&node).map_or(0, Vec::len) == 2 {
            let next = incident[&node].iter().copied().find(|f| !used.contains(f));
            let Some(face) = next else { break };
            used.insert(face);
            chain.push(face);
            node = other_node(grid, face, node);
        }
        chain
    };

    for (&node, members) in &incident {
        if members.len() == 2 {
            continue;
        }
        for &f in members {
            if !used.contains(&f) {
                chains.push(grow(node, f, &mut used));
            }
        }
    }
    for &f in &faces {
        if !used.contains(&f) {
            let start = first_node(grid, f)?;
            chains.push(grow(start, f, &mut used));
        }
    }
    Ok(chains)
}
