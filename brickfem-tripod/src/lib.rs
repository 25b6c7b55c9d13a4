//! Tripod demo: a loaded tripod clamped at its feet.
//!
//! The pipeline imports a GiD mesh, tags the top (y = 13) and bottom
//! (y = -10) faces, builds an elasticity model (linear or not, compressible
//! or not), solves it and writes the Von Mises stress and displacement to a
//! VTK file plus raw dumps of the fields.

use brickfem_core::bricks::{
    Dirichlet, IsotropicLinearizedElasticity, LinearIncompressibility, NonlinearElasticity,
    NonlinearIncompressibility, SourceTerm,
};
use brickfem_core::gid::import_gid;
use brickfem_core::io::write_raw;
use brickfem_core::slice::Slice;
use brickfem_core::stress::{von_mises, StressRange};
use brickfem_core::vtk::{export_slice, VtkField, VtkFormat};
use brickfem_core::{
    standard_solve, FemKind, HyperelasticLaw, IntegrationMethod, Material, Mesh, MeshFem, MeshIm,
    MeshRegion, Model, ModelState, SolveOptions, SolveReport,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Region receiving the load.
pub const NEUMANN_BOUNDARY: usize = 1;
/// Region where the displacement is held at zero.
pub const DIRICHLET_BOUNDARY: usize = 2;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] brickfem_core::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Run settings. Defaults reproduce the classic demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripodConfig {
    /// GiD mesh file.
    pub mesh: PathBuf,
    /// Directory receiving the output files.
    pub out_dir: PathBuf,
    /// Degree of the displacement fem (1 or 2).
    pub degree: usize,
    pub linear: bool,
    /// Requires `degree > 1`.
    pub incompressible: bool,
    pub youngs_modulus: f64,
    pub poissons_ratio: f64,
    /// Surface load density on the top faces.
    pub load: [f64; 3],
    pub top_y: f64,
    pub bottom_y: f64,
    /// Tolerance of the point selection on `top_y` / `bottom_y`.
    pub tolerance: f64,
    pub vtk_binary: bool,
}

impl Default for TripodConfig {
    fn default() -> Self {
        Self {
            mesh: PathBuf::from("tripod.GiD.msh"),
            out_dir: PathBuf::from("."),
            degree: 2,
            linear: true,
            incompressible: false,
            youngs_modulus: 1e3,
            poissons_ratio: 0.3,
            load: [0.0, -10.0, 0.0],
            top_y: 13.0,
            bottom_y: -10.0,
            tolerance: 1e-6,
            vtk_binary: false,
        }
    }
}

impl TripodConfig {
    /// Load a JSON configuration; missing keys take their default.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.degree) {
            return Err(Error::Config(format!(
                "degree must be 1 or 2, got {}",
                self.degree
            )));
        }
        if self.incompressible && self.degree <= 1 {
            return Err(Error::Config(
                "the incompressible model needs degree > 1".into(),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::Config("tolerance must be positive".into()));
        }
        Ok(())
    }
}

/// What a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct TripodReport {
    pub nbcvs: usize,
    pub nbpts: usize,
    pub fem: String,
    pub nbdof: usize,
    pub top_faces: usize,
    pub bottom_faces: usize,
    pub solve: SolveReport,
    pub von_mises: StressRange,
    pub files: Vec<PathBuf>,
}

/// Import the configured mesh and run the pipeline.
pub fn run(config: &TripodConfig) -> Result<TripodReport> {
    config.validate()?;
    info!(path = %config.mesh.display(), "importing the mesh");
    let mesh = import_gid(&config.mesh)?;
    run_with_mesh(mesh, config)
}

/// Run the pipeline on an already loaded mesh.
pub fn run_with_mesh(mut mesh: Mesh, config: &TripodConfig) -> Result<TripodReport> {
    config.validate()?;
    let (top_faces, bottom_faces) = tag_boundaries(&mut mesh, config)?;
    let mesh = Arc::new(mesh);

    let degree = config.degree;
    let mfu = Arc::new(MeshFem::new(
        mesh.clone(),
        format!("FEM_PK(3,{})", degree).parse::<FemKind>()?,
        3,
    )?);
    let mfe = MeshFem::new(
        mesh.clone(),
        format!("FEM_PK_DISCONTINUOUS(3,{},0.01)", degree).parse::<FemKind>()?,
        1,
    )?;
    let mfd = Arc::new(MeshFem::new(mesh.clone(), FemKind::Pk { degree: 0 }, 1)?);
    let mfp = Arc::new(MeshFem::new(
        mesh.clone(),
        "FEM_PK_DISCONTINUOUS(3,0)".parse::<FemKind>()?,
        1,
    )?);
    let mim = Arc::new(MeshIm::new(
        mesh.clone(),
        "IM_TETRAHEDRON(5)".parse::<IntegrationMethod>()?,
    ));

    info!(
        nbcvs = mesh.nbcvs(),
        nbpts = mesh.nbpts(),
        qdim = mfu.qdim(),
        fem = %mfu.name(),
        nbdof = mfu.nbdof(),
        "finite element spaces ready"
    );

    let material = Material::new(config.youngs_modulus, config.poissons_ratio)?;
    let (lambda, mu) = (material.lame_lambda(), material.lame_mu());
    debug!(lambda, mu, "material");

    let mut model = Model::new(mfu.clone(), mim)?;
    let b0 = match (config.linear, config.incompressible) {
        (true, incompressible) => {
            let b0 = model.add_brick(Box::new(IsotropicLinearizedElasticity::new(lambda, mu)))?;
            if incompressible {
                model.add_brick(Box::new(LinearIncompressibility::new(mfp)))?;
            }
            b0
        }
        (false, true) => {
            let mut law: HyperelasticLaw = "Mooney Rivlin".parse()?;
            law.set_params(&[lambda, mu])?;
            let b0 = model.add_brick(Box::new(NonlinearElasticity::new(law)))?;
            model.add_brick(Box::new(NonlinearIncompressibility::new(mfp)))?;
            b0
        }
        (false, false) => {
            let mut law: HyperelasticLaw = "SaintVenant Kirchhoff".parse()?;
            law.set_params(&[lambda, mu])?;
            model.add_brick(Box::new(NonlinearElasticity::new(law)))?
        }
    };
    let b2 = model.add_brick(Box::new(SourceTerm::with_data_fem(NEUMANN_BOUNDARY, mfd)))?;
    model.set_param(b2, "source_term", &config.load)?;
    model.add_brick(Box::new(Dirichlet::penalized(DIRICHLET_BOUNDARY)))?;

    info!("running solve");
    let mut state = ModelState::new(&model);
    let options = SolveOptions::from_args(&["noisy", "lsolver", "superlu"])?;
    let solve = standard_solve(&model, &mut state, &options)?;
    info!(iterations = solve.iterations, "solve done");

    let vm = von_mises(&model, b0, &state, &mfe)?;
    let u = state.displacement(&model).to_vec();
    let range = StressRange::from_values(&vm)?;
    info!(min = range.min, max = range.max, "Von Mises range");

    let files = export(config, &mesh, &mfu, &u, &mfe, &vm)?;

    Ok(TripodReport {
        nbcvs: mesh.nbcvs(),
        nbpts: mesh.nbpts(),
        fem: mfu.name(),
        nbdof: mfu.nbdof(),
        top_faces,
        bottom_faces,
        solve,
        von_mises: range,
        files,
    })
}

/// Tag the top and bottom faces as the Neumann and Dirichlet regions.
fn tag_boundaries(mesh: &mut Mesh, config: &TripodConfig) -> Result<(usize, usize)> {
    let tol = config.tolerance;
    let pid_top = mesh.points_where(|p| (p[1] - config.top_y).abs() < tol);
    let pid_bot = mesh.points_where(|p| (p[1] - config.bottom_y).abs() < tol);
    let ftop = mesh.faces_from_pid(&pid_top);
    let fbot = mesh.faces_from_pid(&pid_bot);
    if ftop.is_empty() || fbot.is_empty() {
        return Err(Error::Config(format!(
            "no boundary faces at y = {} ({} faces) or y = {} ({} faces)",
            config.top_y,
            ftop.len(),
            config.bottom_y,
            fbot.len()
        )));
    }
    let counts = (ftop.len(), fbot.len());
    debug!(top = counts.0, bottom = counts.1, "tagged boundary faces");
    mesh.set_region(NEUMANN_BOUNDARY, MeshRegion::from_faces(ftop));
    mesh.set_region(DIRICHLET_BOUNDARY, MeshRegion::from_faces(fbot));
    Ok(counts)
}

fn export(
    config: &TripodConfig,
    mesh: &Mesh,
    mfu: &MeshFem,
    u: &[f64],
    mfe: &MeshFem,
    vm: &[f64],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&config.out_dir)?;
    let path = |name: &str| config.out_dir.join(name);

    let slice = Slice::boundary(mesh, config.degree)?;
    let format = if config.vtk_binary {
        VtkFormat::Binary
    } else {
        VtkFormat::Ascii
    };
    export_slice(
        path("tripod.vtk"),
        &slice,
        &[
            VtkField::new(mfe, vm, "Von Mises Stress"),
            VtkField::new(mfu, u, "Displacement"),
        ],
        format,
    )?;
    info!(
        "view the tripod with, for example, mayavi -d {} -f WarpVector -m BandedSurfaceMap",
        path("tripod.vtk").display()
    );

    mfu.save(path("tripod.mf"), true)?;
    write_raw(path("tripod.U"), u)?;
    mfe.save(path("tripod.mfe"), false)?;
    write_raw(path("tripod.VM"), vm)?;

    Ok(["tripod.vtk", "tripod.mf", "tripod.U", "tripod.mfe", "tripod.VM"]
        .iter()
        .map(|name| path(name))
        .collect())
}
