//! Lagrange finite element spaces on a mesh ("mesh fems").
//!
//! A [`MeshFem`] combines a shared mesh, a [`FemKind`] and a field dimension
//! `qdim`. Degrees of freedom are numbered convex by convex in the order
//! their nodes are first met; vector fields interleave components, so dof
//! `basic * qdim + c` is component `c` of basic dof `basic`.
//!
//! Discontinuous spaces own their nodes per convex. With a non-zero `alpha`
//! the nodes are pulled towards the barycentre, `L' = (1 - α) L + α/4`, which
//! keeps them strictly inside the convex.

use crate::element::tet10::TET10_EDGES;
use crate::element::{create_element, displacement_gradient, Element, Geometry};
use crate::error::{Error, Result};
use crate::mesh::{Face, Mesh};
use crate::types::Point3;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Family and degree of a Lagrange space on tetrahedra.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FemKind {
    /// `FEM_PK(3,k)`: continuous for k ≥ 1, one value per convex for k = 0.
    Pk { degree: usize },
    /// `FEM_PK_DISCONTINUOUS(3,k[,alpha])`.
    PkDiscontinuous { degree: usize, alpha: f64 },
}

impl FemKind {
    /// Polynomial degree.
    pub fn degree(&self) -> usize {
        match *self {
            FemKind::Pk { degree } | FemKind::PkDiscontinuous { degree, .. } => degree,
        }
    }

    /// Node shrink factor (zero for continuous spaces).
    pub fn alpha(&self) -> f64 {
        match *self {
            FemKind::Pk { .. } => 0.0,
            FemKind::PkDiscontinuous { alpha, .. } => alpha,
        }
    }

    /// True when dofs are not shared between convexes.
    pub fn is_discontinuous(&self) -> bool {
        matches!(self, FemKind::PkDiscontinuous { .. }) || self.degree() == 0
    }
}

impl fmt::Display for FemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FemKind::Pk { degree } => write!(f, "FEM_PK(3,{})", degree),
            FemKind::PkDiscontinuous { degree, alpha } if alpha == 0.0 => {
                write!(f, "FEM_PK_DISCONTINUOUS(3,{})", degree)
            }
            FemKind::PkDiscontinuous { degree, alpha } => {
                write!(f, "FEM_PK_DISCONTINUOUS(3,{},{})", degree, alpha)
            }
        }
    }
}

impl FromStr for FemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let bad = || Error::Fem(format!("cannot parse fem name '{}'", s));

        let open = compact.find('(').ok_or_else(bad)?;
        let args = compact[open..]
            .strip_prefix('(')
            .and_then(|a| a.strip_suffix(')'))
            .ok_or_else(bad)?;
        let args: Vec<&str> = args.split(',').collect();
        if args.first() != Some(&"3") {
            return Err(Error::Fem(format!(
                "only 3D simplex fems are available, got '{}'",
                s
            )));
        }
        let degree: usize = args
            .get(1)
            .and_then(|d| d.parse().ok())
            .ok_or_else(bad)?;

        match (&compact[..open], args.len()) {
            ("FEM_PK", 2) => Ok(FemKind::Pk { degree }),
            ("FEM_PK_DISCONTINUOUS", 2) => Ok(FemKind::PkDiscontinuous { degree, alpha: 0.0 }),
            ("FEM_PK_DISCONTINUOUS", 3) => {
                let alpha = args[2].parse().map_err(|_| bad())?;
                Ok(FemKind::PkDiscontinuous { degree, alpha })
            }
            _ => Err(bad()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NodeKey {
    Vertex(usize),
    Edge(usize, usize),
}

/// A finite element space on a mesh.
#[derive(Debug, Clone)]
pub struct MeshFem {
    mesh: Arc<Mesh>,
    kind: FemKind,
    qdim: usize,
    element: &'static dyn Element,
    /// Basic dof of each local node, per convex.
    convex_basic: Vec<Vec<usize>>,
    /// Position of each basic dof.
    basic_nodes: Vec<Point3>,
}

impl MeshFem {
    /// Build the dof tables of `kind` on `mesh`.
    pub fn new(mesh: Arc<Mesh>, kind: FemKind, qdim: usize) -> Result<Self> {
        if qdim == 0 {
            return Err(Error::Fem("qdim must be at least 1".into()));
        }
        let alpha = kind.alpha();
        if !(0.0..1.0).contains(&alpha) {
            return Err(Error::Fem(format!("alpha must lie in [0, 1), got {}", alpha)));
        }
        let element = create_element(kind.degree())?;
        let local_nodes = shrink_nodes(&element.nodes(), alpha);

        let mut convex_basic = Vec::with_capacity(mesh.nbcvs());
        let mut basic_nodes = Vec::new();
        let mut shared: HashMap<NodeKey, usize> = HashMap::new();

        for cv in 0..mesh.nbcvs() {
            let geometry = mesh.convex_geometry(cv)?;
            let vertices = mesh.convex(cv)?.vertices();
            let mut ids = Vec::with_capacity(local_nodes.len());
            for (k, l) in local_nodes.iter().enumerate() {
                let key = if kind.is_discontinuous() {
                    None
                } else if k < 4 {
                    Some(NodeKey::Vertex(vertices[k]))
                } else {
                    let (i, j) = TET10_EDGES[k - 4];
                    let (a, b) = (vertices[i], vertices[j]);
                    Some(NodeKey::Edge(a.min(b), a.max(b)))
                };
                let id = match key {
                    Some(key) => *shared.entry(key).or_insert_with(|| {
                        basic_nodes.push(geometry.map(l));
                        basic_nodes.len() - 1
                    }),
                    None => {
                        basic_nodes.push(geometry.map(l));
                        basic_nodes.len() - 1
                    }
                };
                ids.push(id);
            }
            convex_basic.push(ids);
        }

        debug!(
            fem = %kind,
            qdim,
            nbdof = basic_nodes.len() * qdim,
            "built mesh fem"
        );

        Ok(Self {
            mesh,
            kind,
            qdim,
            element,
            convex_basic,
            basic_nodes,
        })
    }

    /// The underlying mesh.
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Fem family and degree.
    pub fn kind(&self) -> FemKind {
        self.kind
    }

    /// Field dimension.
    pub fn qdim(&self) -> usize {
        self.qdim
    }

    /// Fem name, e.g. `FEM_PK(3,2)`.
    pub fn name(&self) -> String {
        self.kind.to_string()
    }

    /// Reference element of the space.
    pub fn element(&self) -> &'static dyn Element {
        self.element
    }

    /// Number of scalar basic dofs.
    pub fn nb_basic_dof(&self) -> usize {
        self.basic_nodes.len()
    }

    /// Total number of dofs.
    pub fn nbdof(&self) -> usize {
        self.basic_nodes.len() * self.qdim
    }

    /// Number of dofs on one convex.
    pub fn nb_dof_of_convex(&self, cv: usize) -> usize {
        self.convex_basic[cv].len() * self.qdim
    }

    /// Basic dofs of a convex, in local node order.
    pub fn basic_dofs(&self, cv: usize) -> &[usize] {
        &self.convex_basic[cv]
    }

    /// Dofs of a convex, interleaved by component.
    pub fn cell_dofs(&self, cv: usize) -> Vec<usize> {
        let q = self.qdim;
        self.convex_basic[cv]
            .iter()
            .flat_map(|&b| (0..q).map(move |c| b * q + c))
            .collect()
    }

    /// Positions of the basic dofs.
    pub fn basic_dof_nodes(&self) -> &[Point3] {
        &self.basic_nodes
    }

    /// Position of a dof.
    pub fn dof_coordinates(&self, dof: usize) -> Point3 {
        self.basic_nodes[dof / self.qdim]
    }

    /// Barycentric coordinates of the local nodes (after shrinking).
    pub fn local_nodes(&self) -> Vec<[f64; 4]> {
        shrink_nodes(&self.element().nodes(), self.kind.alpha())
    }

    /// Shape function values at a barycentric point.
    pub fn shape_functions(&self, l: &[f64; 4]) -> Vec<f64> {
        self.element().shape_functions(&self.unshrink(l))
    }

    /// Physical shape function gradients at a barycentric point.
    pub fn gradients(&self, geometry: &Geometry, l: &[f64; 4]) -> Vec<Vector3<f64>> {
        let scale = 1.0 / (1.0 - self.kind.alpha());
        geometry
            .gradients(self.element(), &self.unshrink(l))
            .into_iter()
            .map(|g| g * scale)
            .collect()
    }

    /// Field values on a convex, in `cell_dofs` order.
    pub fn local_values(&self, cv: usize, field: &[f64]) -> Vec<f64> {
        self.cell_dofs(cv).iter().map(|&d| field[d]).collect()
    }

    /// Interpolated field value (qdim components) at a point of a convex.
    pub fn eval_at(&self, cv: usize, l: &[f64; 4], field: &[f64]) -> Vec<f64> {
        let q = self.qdim;
        let n = self.shape_functions(l);
        let mut value = vec![0.0; q];
        for (&b, &na) in self.convex_basic[cv].iter().zip(n.iter()) {
            for (c, v) in value.iter_mut().enumerate() {
                *v += na * field[b * q + c];
            }
        }
        value
    }

    /// Gradient `∂u_i/∂x_j` of a 3-component field at a point of a convex.
    pub fn grad_at(&self, cv: usize, geometry: &Geometry, l: &[f64; 4], field: &[f64]) -> Result<Matrix3<f64>> {
        if self.qdim != 3 {
            return Err(Error::Fem(format!(
                "gradient of a vector field needs qdim 3, got {}",
                self.qdim
            )));
        }
        let grads = self.gradients(geometry, l);
        Ok(displacement_gradient(&grads, &self.local_values(cv, field)))
    }

    /// Basic dofs whose node lies on a face.
    pub fn basic_dofs_on_face(&self, face: Face) -> Vec<usize> {
        self.element()
            .nodes()
            .iter()
            .zip(self.convex_basic[face.convex].iter())
            .filter(|(l, _)| self.kind.degree() > 0 && l[face.face].abs() < 1e-12)
            .map(|(_, &b)| b)
            .collect()
    }

    /// Map shrunk barycentric coordinates back onto the reference element.
    fn unshrink(&self, l: &[f64; 4]) -> [f64; 4] {
        let alpha = self.kind.alpha();
        if alpha == 0.0 {
            return *l;
        }
        l.map(|li| (li - 0.25 * alpha) / (1.0 - alpha))
    }

    /// Serialise the dof description, optionally with the mesh.
    pub fn to_json(&self, with_mesh: bool) -> Result<String> {
        let file = MeshFemFile {
            fem: self.name(),
            qdim: self.qdim,
            nbdof: self.nbdof(),
            convex_dofs: self.convex_basic.clone(),
            mesh: with_mesh.then(|| self.mesh.as_ref().clone()),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Rebuild a mesh fem from its JSON description.
    ///
    /// The mesh is taken from the file when present, otherwise `mesh` is used.
    pub fn from_json(content: &str, mesh: Option<Arc<Mesh>>) -> Result<Self> {
        let file: MeshFemFile = serde_json::from_str(content)?;
        let mesh = match (file.mesh, mesh) {
            (Some(m), _) => {
                m.check()?;
                Arc::new(m)
            }
            (None, Some(m)) => m,
            (None, None) => {
                return Err(Error::Fem(
                    "mesh fem file has no mesh and none was supplied".into(),
                ))
            }
        };
        let mf = MeshFem::new(mesh, file.fem.parse()?, file.qdim)?;
        if mf.nbdof() != file.nbdof || mf.convex_basic != file.convex_dofs {
            return Err(Error::Fem(format!(
                "dof table of {} does not match the mesh",
                file.fem
            )));
        }
        Ok(mf)
    }

    /// Write the JSON description to disk.
    pub fn save(&self, path: impl AsRef<Path>, with_mesh: bool) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json(with_mesh)?)?;
        Ok(())
    }

    /// Read a JSON description from disk.
    pub fn load(path: impl AsRef<Path>, mesh: Option<Arc<Mesh>>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content, mesh)
    }
}

#[derive(Serialize, Deserialize)]
struct MeshFemFile {
    fem: String,
    qdim: usize,
    nbdof: usize,
    convex_dofs: Vec<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mesh: Option<Mesh>,
}

fn shrink_nodes(nodes: &[[f64; 4]], alpha: f64) -> Vec<[f64; 4]> {
    nodes
        .iter()
        .map(|l| l.map(|li| (1.0 - alpha) * li + 0.25 * alpha))
        .collect()
}
