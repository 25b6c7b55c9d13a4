//! Boundary slices for visualisation.
//!
//! A slice is a triangulated surface whose nodes remember the convex and
//! barycentric position they come from, so any mesh fem field on the mesh can
//! be interpolated onto it.

use crate::element::face_to_barycentric;
use crate::error::{Error, Result};
use crate::fem::MeshFem;
use crate::mesh::Mesh;
use crate::types::Point3;
use tracing::debug;

/// A point of a slice.
#[derive(Debug, Clone, Copy)]
pub struct SliceNode {
    pub convex: usize,
    /// Barycentric coordinates in `convex`.
    pub barycentric: [f64; 4],
    pub point: Point3,
}

/// Triangulated boundary of a mesh.
#[derive(Debug, Clone)]
pub struct Slice {
    nodes: Vec<SliceNode>,
    triangles: Vec<[usize; 3]>,
}

impl Slice {
    /// Boundary faces of `mesh`, each split into `refinement²` triangles.
    pub fn boundary(mesh: &Mesh, refinement: usize) -> Result<Self> {
        if refinement == 0 {
            return Err(Error::InvalidParameter("slice refinement must be at least 1".into()));
        }
        let n = refinement;
        let faces = mesh.boundary_faces();
        let per_face = (n + 1) * (n + 2) / 2;
        let mut nodes = Vec::with_capacity(faces.len() * per_face);
        let mut triangles = Vec::with_capacity(faces.len() * n * n);

        for face in faces {
            let geometry = mesh.convex_geometry(face.convex)?;
            let base = nodes.len();
            // node (i, j) of the face lattice, row by row
            let index = |i: usize, j: usize| base + j * (n + 1) - j * (j.saturating_sub(1)) / 2 + i;
            for j in 0..=n {
                for i in 0..=(n - j) {
                    let t = [
                        1.0 - (i + j) as f64 / n as f64,
                        i as f64 / n as f64,
                        j as f64 / n as f64,
                        0.0,
                    ];
                    let l = face_to_barycentric(face.face, &t);
                    nodes.push(SliceNode {
                        convex: face.convex,
                        barycentric: l,
                        point: geometry.map(&l),
                    });
                }
            }
            for j in 0..n {
                for i in 0..(n - j) {
                    triangles.push([index(i, j), index(i + 1, j), index(i, j + 1)]);
                    if i + j + 1 < n {
                        triangles.push([index(i + 1, j), index(i + 1, j + 1), index(i, j + 1)]);
                    }
                }
            }
        }

        debug!(
            nodes = nodes.len(),
            triangles = triangles.len(),
            refinement,
            "built boundary slice"
        );
        Ok(Self { nodes, triangles })
    }

    pub fn nodes(&self) -> &[SliceNode] {
        &self.nodes
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Values of `field` (a field of `mf`) at the slice nodes, `qdim` per node.
    pub fn interpolate(&self, mf: &MeshFem, field: &[f64]) -> Result<Vec<f64>> {
        if field.len() != mf.nbdof() {
            return Err(Error::Export(format!(
                "field has {} values, {} expects {}",
                field.len(),
                mf.name(),
                mf.nbdof()
            )));
        }
        if self.nodes.iter().any(|node| node.convex >= mf.mesh().nbcvs()) {
            return Err(Error::Export("slice does not belong to the fem's mesh".into()));
        }
        let mut values = Vec::with_capacity(self.nodes.len() * mf.qdim());
        for node in &self.nodes {
            values.extend(mf.eval_at(node.convex, &node.barycentric, field));
        }
        Ok(values)
    }
}
