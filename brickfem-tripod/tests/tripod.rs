use brickfem_core::gid::save_gid;
use brickfem_core::io::read_raw;
use brickfem_core::{Mesh, MeshFem, Point3};
use brickfem_tripod::{run, run_with_mesh, Error, TripodConfig};
use std::path::PathBuf;

/// Column spanning y = -10 .. 13 like the tripod.
fn column() -> Mesh {
    Mesh::regular_simplices(
        Point3::new(-2.0, -10.0, -2.0),
        Point3::new(4.0, 23.0, 4.0),
        [2, 4, 2],
    )
    .unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("brickfem-tripod-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn run_case(name: &str, linear: bool, incompressible: bool) {
    let dir = scratch_dir(name);
    let mesh_path = dir.join("column.GiD.msh");
    save_gid(&column(), &mesh_path).unwrap();

    let config = TripodConfig {
        mesh: mesh_path,
        out_dir: dir.join("out"),
        linear,
        incompressible,
        ..TripodConfig::default()
    };
    let report = run(&config).unwrap();

    assert_eq!(report.nbcvs, 96);
    assert_eq!(report.nbdof, 5 * 9 * 5 * 3);
    assert_eq!(report.fem, "FEM_PK(3,2)");
    assert_eq!(report.top_faces, 8);
    assert_eq!(report.bottom_faces, 8);
    assert!(report.solve.converged);
    assert!(report.von_mises.min >= 0.0);
    assert!(report.von_mises.min <= report.von_mises.max);
    assert!(report.von_mises.max > 0.0);

    for file in &report.files {
        let len = std::fs::metadata(file).unwrap().len();
        assert!(len > 0, "{} is empty", file.display());
    }

    let out = dir.join("out");
    let u = read_raw(out.join("tripod.U")).unwrap();
    assert_eq!(u.len(), report.nbdof);
    // the top is pushed down
    let mfu = MeshFem::load(out.join("tripod.mf"), None).unwrap();
    let top_uy: Vec<f64> = (0..mfu.nbdof())
        .filter(|&d| d % 3 == 1 && (mfu.dof_coordinates(d)[1] - 13.0).abs() < 1e-9)
        .map(|d| u[d])
        .collect();
    assert!(!top_uy.is_empty());
    assert!(top_uy.iter().all(|&v| v < 0.0));

    let vm = read_raw(out.join("tripod.VM")).unwrap();
    let mfe = MeshFem::load(out.join("tripod.mfe"), Some(mfu.mesh().clone())).unwrap();
    assert_eq!(vm.len(), mfe.nbdof());

    let vtk = std::fs::read_to_string(out.join("tripod.vtk")).unwrap();
    assert!(vtk.contains("SCALARS Von_Mises_Stress float 1"));
    assert!(vtk.contains("VECTORS Displacement float"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_linear_compressible() {
    run_case("lin", true, false);
}

#[test]
fn test_linear_incompressible() {
    run_case("lin-inc", true, true);
}

#[test]
fn test_nonlinear_compressible() {
    run_case("nl", false, false);
}

#[test]
fn test_nonlinear_incompressible() {
    run_case("nl-inc", false, true);
}

#[test]
fn test_incompressible_needs_quadratic_fem() {
    let config = TripodConfig {
        degree: 1,
        incompressible: true,
        ..TripodConfig::default()
    };
    assert!(matches!(run_with_mesh(column(), &config), Err(Error::Config(_))));
}

#[test]
fn test_missing_boundary_is_reported() {
    let config = TripodConfig {
        top_y: 99.0,
        out_dir: scratch_dir("missing"),
        ..TripodConfig::default()
    };
    assert!(matches!(run_with_mesh(column(), &config), Err(Error::Config(_))));
}

#[test]
fn test_missing_mesh_file() {
    let config = TripodConfig {
        mesh: PathBuf::from("/nonexistent/tripod.GiD.msh"),
        ..TripodConfig::default()
    };
    assert!(run(&config).is_err());
}
