use cgmath::{InnerSpace, Vector3};

use drake_ngin::geometry::{MeshData, cuboid, plane, uv_sphere};

fn max_extent(mesh: &MeshData) -> Vector3<f32> {
    mesh.vertices.iter().fold(Vector3::new(0.0, 0.0, 0.0), |acc, v| {
        Vector3::new(
            acc.x.max(v.position[0].abs()),
            acc.y.max(v.position[1].abs()),
            acc.z.max(v.position[2].abs()),
        )
    })
}

fn assert_indices_in_range(mesh: &MeshData) {
    assert_eq!(mesh.indices.len() % 3, 0);
    for &index in &mesh.indices {
        assert!((index as usize) < mesh.vertices.len());
    }
}

#[test]
fn cuboid_has_four_vertices_per_face() {
    let mesh = cuboid(30.0, 30.0, 40.0).unwrap();
    assert_eq!(mesh.vertices.len(), 24);
    assert_eq!(mesh.indices.len(), 36);
    assert_indices_in_range(&mesh);
}

#[test]
fn cuboid_spans_its_half_extents() {
    let mesh = cuboid(30.0, 10.0, 40.0).unwrap();
    let extent = max_extent(&mesh);
    assert_eq!(extent, Vector3::new(15.0, 5.0, 20.0));
}

#[test]
fn cuboid_normals_are_axis_aligned_units() {
    let mesh = cuboid(2.0, 4.0, 6.0).unwrap();
    for vertex in &mesh.vertices {
        let normal = Vector3::from(vertex.normal);
        assert!((normal.magnitude() - 1.0).abs() < 1e-6);
        let components = [normal.x.abs(), normal.y.abs(), normal.z.abs()];
        assert_eq!(components.iter().filter(|&&c| c > 0.5).count(), 1);
    }
}

#[test]
fn cuboid_faces_point_away_from_the_centre() {
    let mesh = cuboid(10.0, 10.0, 10.0).unwrap();
    for vertex in &mesh.vertices {
        let position = Vector3::from(vertex.position);
        let normal = Vector3::from(vertex.normal);
        assert!(
            position.dot(normal) > 0.0,
            "normal {:?} points inwards at {:?}",
            normal,
            position
        );
    }
}

#[test]
fn sphere_vertices_sit_on_the_radius_with_radial_normals() {
    let radius = 100.0;
    let mesh = uv_sphere(radius, 50, 50).unwrap();
    assert_eq!(mesh.vertices.len(), 51 * 51);
    assert_indices_in_range(&mesh);
    for vertex in &mesh.vertices {
        let position = Vector3::from(vertex.position);
        let normal = Vector3::from(vertex.normal);
        assert!((position.magnitude() - radius).abs() < 1e-2);
        assert!((normal.magnitude() - 1.0).abs() < 1e-4);
        // Radial normal: parallel to the position vector.
        assert!(position.normalize().dot(normal) > 0.999);
    }
}

#[test]
fn plane_faces_up() {
    let mesh = plane(2000.0, 2000.0).unwrap();
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices.len(), 6);
    for vertex in &mesh.vertices {
        assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertex.position[1], 0.0);
    }
}

#[test]
fn builders_reject_degenerate_parameters() {
    assert!(cuboid(0.0, 1.0, 1.0).is_err());
    assert!(cuboid(1.0, -2.0, 1.0).is_err());
    assert!(plane(0.0, 5.0).is_err());
    assert!(uv_sphere(-1.0, 16, 12).is_err());
    assert!(uv_sphere(1.0, 2, 12).is_err());
    assert!(uv_sphere(1.0, 16, 1).is_err());
}
