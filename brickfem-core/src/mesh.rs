//! Tetrahedral mesh with face queries and tagged regions.
//!
//! Stores point coordinates, convex connectivity and a map of region ids to
//! sets of faces (and optionally convexes). Faces are addressed as
//! `(convex, local face)` where local face `f` is opposite local vertex `f`.

use crate::element::{face_vertices, Geometry};
use crate::error::{Error, Result};
use crate::types::Point3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Supported convex types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// 4-node tetrahedron.
    Tet4,
    /// 10-node tetrahedron; the geometry is taken from the 4 corners.
    Tet10,
}

impl ElementType {
    /// Number of nodes for this convex type.
    pub fn n_nodes(self) -> usize {
        match self {
            ElementType::Tet4 => 4,
            ElementType::Tet10 => 10,
        }
    }
}

/// Convex connectivity - point indices of a convex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Convex {
    /// Convex type.
    pub element_type: ElementType,
    /// Point indices (0-based); the first four are the vertices.
    pub nodes: Vec<usize>,
}

impl Convex {
    /// The four vertex point ids.
    pub fn vertices(&self) -> [usize; 4] {
        [self.nodes[0], self.nodes[1], self.nodes[2], self.nodes[3]]
    }
}

/// A face of a convex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Face {
    /// Convex index.
    pub convex: usize,
    /// Local face number (0..4), opposite the local vertex of the same number.
    pub face: usize,
}

impl Face {
    /// Create a face reference.
    pub fn new(convex: usize, face: usize) -> Self {
        Self { convex, face }
    }
}

/// A tagged set of faces and/or convexes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshRegion {
    faces: Vec<Face>,
    convexes: Vec<usize>,
}

impl MeshRegion {
    /// Region made of faces.
    pub fn from_faces(faces: impl IntoIterator<Item = Face>) -> Self {
        let mut faces: Vec<Face> = faces.into_iter().collect();
        faces.sort();
        faces.dedup();
        Self {
            faces,
            convexes: Vec::new(),
        }
    }

    /// Region made of whole convexes.
    pub fn from_convexes(convexes: impl IntoIterator<Item = usize>) -> Self {
        let mut convexes: Vec<usize> = convexes.into_iter().collect();
        convexes.sort_unstable();
        convexes.dedup();
        Self {
            faces: Vec::new(),
            convexes,
        }
    }

    /// Faces of the region.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Convexes of the region.
    pub fn convexes(&self) -> &[usize] {
        &self.convexes
    }

    /// True when the region holds neither faces nor convexes.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.convexes.is_empty()
    }
}

/// Tetrahedral finite element mesh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    /// Point coordinates.
    points: Vec<Point3>,
    /// Convex connectivity.
    convexes: Vec<Convex>,
    /// Tagged regions.
    regions: BTreeMap<usize, MeshRegion>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(n_points: usize, n_convexes: usize) -> Self {
        Self {
            points: Vec::with_capacity(n_points),
            convexes: Vec::with_capacity(n_convexes),
            regions: BTreeMap::new(),
        }
    }

    /// Add a point to the mesh, returning its index.
    pub fn add_point(&mut self, point: Point3) -> usize {
        let idx = self.points.len();
        self.points.push(point);
        idx
    }

    /// Add a convex to the mesh, returning its index.
    pub fn add_convex(&mut self, element_type: ElementType, nodes: Vec<usize>) -> Result<usize> {
        if nodes.len() != element_type.n_nodes() {
            return Err(Error::Mesh(format!(
                "Convex type {:?} requires {} nodes, got {}",
                element_type,
                element_type.n_nodes(),
                nodes.len()
            )));
        }

        for &node_idx in &nodes {
            if node_idx >= self.points.len() {
                return Err(Error::Mesh(format!(
                    "Point index {} out of bounds (mesh has {} points)",
                    node_idx,
                    self.points.len()
                )));
            }
        }

        let idx = self.convexes.len();
        self.convexes.push(Convex {
            element_type,
            nodes,
        });
        Ok(idx)
    }

    /// Number of points.
    pub fn nbpts(&self) -> usize {
        self.points.len()
    }

    /// Number of convexes.
    pub fn nbcvs(&self) -> usize {
        self.convexes.len()
    }

    /// Point coordinates.
    pub fn pts(&self) -> &[Point3] {
        &self.points
    }

    /// Coordinates of one point.
    pub fn point(&self, idx: usize) -> Option<&Point3> {
        self.points.get(idx)
    }

    /// All convexes.
    pub fn convexes(&self) -> &[Convex] {
        &self.convexes
    }

    /// One convex.
    pub fn convex(&self, idx: usize) -> Result<&Convex> {
        self.convexes
            .get(idx)
            .ok_or_else(|| Error::Mesh(format!("convex {} does not exist", idx)))
    }

    /// Affine geometry of a convex.
    pub fn convex_geometry(&self, idx: usize) -> Result<Geometry> {
        let v = self.convex(idx)?.vertices();
        Geometry::new([
            self.points[v[0]],
            self.points[v[1]],
            self.points[v[2]],
            self.points[v[3]],
        ])
    }

    /// Volume of a convex.
    pub fn convex_volume(&self, idx: usize) -> Result<f64> {
        Ok(self.convex_geometry(idx)?.volume())
    }

    /// The four faces of a convex.
    pub fn faces(&self, convex: usize) -> [Face; 4] {
        [0, 1, 2, 3].map(|f| Face::new(convex, f))
    }

    /// Global point ids of the vertices of a face.
    pub fn face_points(&self, face: Face) -> Result<[usize; 3]> {
        let v = self.convex(face.convex)?.vertices();
        Ok(face_vertices(face.face).map(|k| v[k]))
    }

    /// Faces that belong to a single convex.
    pub fn boundary_faces(&self) -> Vec<Face> {
        let mut seen: HashMap<[usize; 3], (Face, usize)> = HashMap::new();
        for (cv, convex) in self.convexes.iter().enumerate() {
            let v = convex.vertices();
            for f in 0..4 {
                let mut key = face_vertices(f).map(|k| v[k]);
                key.sort_unstable();
                seen.entry(key)
                    .and_modify(|(_, count)| *count += 1)
                    .or_insert((Face::new(cv, f), 1));
            }
        }
        let mut faces: Vec<Face> = seen
            .into_values()
            .filter(|&(_, count)| count == 1)
            .map(|(face, _)| face)
            .collect();
        faces.sort();
        faces
    }

    /// Ids of the points satisfying a predicate.
    pub fn points_where(&self, predicate: impl Fn(&Point3) -> bool) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| predicate(p))
            .map(|(i, _)| i)
            .collect()
    }

    /// Convex faces whose three vertices are all in `pids`.
    pub fn faces_from_pid(&self, pids: &[usize]) -> Vec<Face> {
        let mut marked = vec![false; self.points.len()];
        for &p in pids {
            if let Some(m) = marked.get_mut(p) {
                *m = true;
            }
        }
        let mut faces = Vec::new();
        for (cv, convex) in self.convexes.iter().enumerate() {
            let v = convex.vertices();
            for f in 0..4 {
                if face_vertices(f).iter().all(|&k| marked[v[k]]) {
                    faces.push(Face::new(cv, f));
                }
            }
        }
        faces
    }

    /// Axis-aligned bounding box `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (lo.inf(p), hi.sup(p))
        }))
    }

    /// Tag a region, replacing any previous content.
    pub fn set_region(&mut self, id: usize, region: MeshRegion) {
        self.regions.insert(id, region);
    }

    /// Look up a region.
    pub fn region(&self, id: usize) -> Result<&MeshRegion> {
        self.regions
            .get(&id)
            .ok_or_else(|| Error::Mesh(format!("region {} is not defined", id)))
    }

    /// Ids of the defined regions, in increasing order.
    pub fn region_ids(&self) -> Vec<usize> {
        self.regions.keys().copied().collect()
    }

    /// Verify connectivity and regions of a mesh built without
    /// [`Mesh::add_convex`], e.g. one read back from a file.
    pub fn check(&self) -> Result<()> {
        let nbpts = self.points.len();
        for (cv, convex) in self.convexes.iter().enumerate() {
            let expected = convex.element_type.n_nodes();
            if convex.nodes.len() != expected {
                return Err(Error::Mesh(format!(
                    "convex {} has {} nodes, {:?} requires {}",
                    cv,
                    convex.nodes.len(),
                    convex.element_type,
                    expected
                )));
            }
            if let Some(&p) = convex.nodes.iter().find(|&&p| p >= nbpts) {
                return Err(Error::Mesh(format!(
                    "convex {} references point {} (mesh has {} points)",
                    cv, p, nbpts
                )));
            }
        }

        let nbcvs = self.convexes.len();
        for (id, region) in &self.regions {
            let bad_face = region.faces.iter().find(|f| f.convex >= nbcvs || f.face >= 4);
            if let Some(f) = bad_face {
                return Err(Error::Mesh(format!(
                    "region {} references face {} of convex {}",
                    id, f.face, f.convex
                )));
            }
            if let Some(&cv) = region.convexes.iter().find(|&&cv| cv >= nbcvs) {
                return Err(Error::Mesh(format!(
                    "region {} references convex {} (mesh has {} convexes)",
                    id, cv, nbcvs
                )));
            }
        }
        Ok(())
    }

    /// Structured box mesh of `n[0] × n[1] × n[2]` cubes, each split into six
    /// tetrahedra sharing the main diagonal.
    pub fn regular_simplices(origin: Point3, size: Point3, n: [usize; 3]) -> Result<Self> {
        if n.iter().any(|&k| k == 0) {
            return Err(Error::Mesh("box subdivisions must be positive".into()));
        }
        let [nx, ny, nz] = n;
        let mut mesh = Mesh::with_capacity((nx + 1) * (ny + 1) * (nz + 1), 6 * nx * ny * nz);
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    mesh.add_point(Point3::new(
                        origin[0] + size[0] * i as f64 / nx as f64,
                        origin[1] + size[1] * j as f64 / ny as f64,
                        origin[2] + size[2] * k as f64 / nz as f64,
                    ));
                }
            }
        }

        let id = |i: usize, j: usize, k: usize| i + (nx + 1) * (j + (ny + 1) * k);
        // Kuhn subdivision: paths from corner 0 to corner 7 along the axes
        const PATHS: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    for path in &PATHS {
                        let mut c = [i, j, k];
                        let mut nodes = vec![id(c[0], c[1], c[2])];
                        for &axis in path {
                            c[axis] += 1;
                            nodes.push(id(c[0], c[1], c[2]));
                        }
                        mesh.add_convex(ElementType::Tet4, nodes)?;
                    }
                }
            }
        }
        Ok(mesh)
    }
}
