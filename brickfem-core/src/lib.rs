//! brickfem Core - tetrahedral finite elements with brick-based models
//!
//! Finite element library with:
//! - Linear and quadratic Lagrange spaces on tetrahedral meshes
//! - Models composed from a chain of bricks (material laws, incompressibility,
//!   loads, Dirichlet conditions)
//! - Parallel assembly using Rayon
//! - Sparse direct solvers (faer) driven by a linear or Newton solve
//! - Stress recovery, boundary slices and VTK export
//!
//! # Architecture
//!
//! The library is designed around these core abstractions:
//!
//! - [`Mesh`]: Points, tetrahedra and tagged regions
//! - [`MeshFem`]: A finite element space on a mesh
//! - [`Brick`] trait: One physical term of a model
//! - [`Model`]: A displacement space plus a chain of bricks
//! - [`Solver`] trait: Linear system solution strategies

pub mod types;
pub mod element;
pub mod mesh;
pub mod gid;
pub mod fem;
pub mod integration;
pub mod material;
pub mod hyperelastic;
pub mod sparse;
pub mod assembly;
pub mod solver;
pub mod model;
pub mod bricks;
pub mod solve;
pub mod stress;
pub mod slice;
pub mod vtk;
pub mod io;
pub mod error;

pub use types::{Point3, StressTensor, StrainTensor};
pub use element::{Element, create_element};
pub use mesh::{Face, Mesh, MeshRegion};
pub use fem::{FemKind, MeshFem};
pub use integration::{IntegrationMethod, MeshIm};
pub use material::Material;
pub use hyperelastic::HyperelasticLaw;
pub use sparse::CsrMatrix;
pub use solver::{LinearSolverKind, Solver};
pub use model::{Brick, BrickId, Model, ModelState};
pub use solve::{standard_solve, SolveOptions, SolveReport};
pub use stress::StressRange;
pub use slice::Slice;
pub use error::{Error, Result};
