use cgmath::{Quaternion, Rad, Rotation3, Vector3};

use drake_ngin::data_structures::{instance::Instance, scene_graph::SceneGraph};

fn translated(x: f32, y: f32, z: f32) -> Instance {
    Instance::from(Vector3::new(x, y, z))
}

fn assert_close(actual: Vector3<f32>, expected: Vector3<f32>) {
    let delta = actual - expected;
    assert!(
        delta.x.abs() < 1e-4 && delta.y.abs() < 1e-4 && delta.z.abs() < 1e-4,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

#[test]
fn component_keys_are_unique() {
    let mut graph = SceneGraph::new();
    graph.add_group("wing", None, Instance::new()).unwrap();
    assert!(graph.add_group("wing", None, Instance::new()).is_err());
    assert_eq!(graph.len(), 1);
}

#[test]
fn named_lookup_resolves_to_the_inserted_node() {
    let mut graph = SceneGraph::new();
    let root = graph.add_group("dragon", None, Instance::new()).unwrap();
    let head = graph
        .add_group("head", Some(root), translated(0.0, 16.0, 26.0))
        .unwrap();

    assert_eq!(graph.node("dragon"), Some(root));
    assert_eq!(graph.node("head"), Some(head));
    assert_eq!(graph.node("tail"), None);
}

#[test]
fn world_transforms_compose_down_a_chain() {
    let mut graph = SceneGraph::new();
    let root = graph.add_group("root", None, translated(10.0, 0.0, 0.0)).unwrap();
    let middle = graph
        .add_group("middle", Some(root), translated(0.0, 5.0, 0.0))
        .unwrap();
    let leaf = graph
        .add_group("leaf", Some(middle), translated(0.0, 0.0, 2.0))
        .unwrap();

    graph.update_world_transforms();
    assert_close(graph.world(leaf).position, Vector3::new(10.0, 5.0, 2.0));
}

#[test]
fn parent_rotation_swings_child_positions() {
    let mut graph = SceneGraph::new();
    let pivot = graph
        .add_group(
            "pivot",
            None,
            Instance {
                rotation: Quaternion::from_angle_y(Rad(std::f32::consts::FRAC_PI_2)),
                ..Instance::new()
            },
        )
        .unwrap();
    // A quarter turn around Y maps +Z onto +X.
    let tip = graph
        .add_group("tip", Some(pivot), translated(0.0, 0.0, 8.0))
        .unwrap();

    graph.update_world_transforms();
    assert_close(graph.world(tip).position, Vector3::new(8.0, 0.0, 0.0));
}

#[test]
fn parent_scale_stretches_child_offsets() {
    let mut graph = SceneGraph::new();
    let root = graph
        .add_group(
            "root",
            None,
            Instance {
                scale: Vector3::new(2.0, 2.0, 2.0),
                ..Instance::new()
            },
        )
        .unwrap();
    let child = graph
        .add_group("child", Some(root), translated(1.0, 2.0, 3.0))
        .unwrap();

    graph.update_world_transforms();
    assert_close(graph.world(child).position, Vector3::new(2.0, 4.0, 6.0));
    let scale = graph.world(child).scale;
    assert_close(scale, Vector3::new(2.0, 2.0, 2.0));
}

#[test]
fn sibling_subtrees_do_not_affect_each_other() {
    let mut graph = SceneGraph::new();
    let root = graph.add_group("root", None, Instance::new()).unwrap();
    let left = graph
        .add_group("wing_l", Some(root), translated(-14.0, 10.0, 8.0))
        .unwrap();
    let right = graph
        .add_group("wing_r", Some(root), translated(14.0, 10.0, 8.0))
        .unwrap();

    graph.local_mut(left).rotation = Quaternion::from_angle_z(Rad(1.0));
    graph.update_world_transforms();

    assert_close(graph.world(right).position, Vector3::new(14.0, 10.0, 8.0));
    assert_eq!(graph.world(right).rotation, Quaternion::from_angle_z(Rad(0.0)));
}

#[test]
fn re_running_the_pass_tracks_local_mutations() {
    let mut graph = SceneGraph::new();
    let root = graph.add_group("root", None, translated(0.0, 0.0, 0.0)).unwrap();
    let child = graph
        .add_group("child", Some(root), translated(0.0, 1.0, 0.0))
        .unwrap();

    graph.update_world_transforms();
    assert_close(graph.world(child).position, Vector3::new(0.0, 1.0, 0.0));

    graph.local_mut(root).position = Vector3::new(5.0, 0.0, 0.0);
    graph.update_world_transforms();
    assert_close(graph.world(child).position, Vector3::new(5.0, 1.0, 0.0));
}

#[test]
fn missing_parents_are_rejected() {
    let mut other = SceneGraph::new();
    let a = other.add_group("a", None, Instance::new()).unwrap();
    // `b` indexes a slot that only exists in `other`.
    let b = other.add_group("b", Some(a), Instance::new()).unwrap();

    let mut graph = SceneGraph::new();
    graph.add_group("root", None, Instance::new()).unwrap();
    assert!(graph.add_group("child", Some(b), Instance::new()).is_err());
}
