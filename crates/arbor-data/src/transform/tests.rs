// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use arbor_core::event::EventBus;
use arbor_core::math::{Mat4, Vec3};

use super::*;
use crate::ecs::{Component, ComponentError, EntityId, InstanceId};

// --- HELPERS ---

fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

fn entity(index: u32) -> EntityId {
    EntityId::new(index, 0)
}

/// Creates a component wired to a fresh bus, plus `count` root instances owned
/// by entities `0..count`.
fn setup(count: u32) -> (TransformComponent, EventBus<TransformEvent>, Vec<InstanceId>) {
    let bus = EventBus::new();
    let mut transforms = TransformComponent::new().with_event_sender(bus.sender());
    let instances = (0..count).map(|i| transforms.create(entity(i))).collect();
    (transforms, bus, instances)
}

fn assert_world(transforms: &TransformComponent, instance: InstanceId, expected: Mat4) {
    let actual = transforms.world_transform(instance);
    assert!(
        actual.approx_eq(&expected),
        "World transform of {instance} is {actual:?}, expected {expected:?}"
    );
}

fn changes(event: &TransformEvent) -> &[TransformChanged] {
    match event {
        TransformEvent::WorldTransformsChanged(changes) => changes,
    }
}

// --- HIERARCHY SCENARIOS ---

#[test]
fn test_parent_translation_reaches_child() {
    let (mut transforms, _bus, ids) = setup(2);
    let (root, child) = (ids[0], ids[1]);
    transforms.set_parent(child, Some(root));
    transforms.set_local_transform(child, translation(1.0, 0.0, 0.0));

    transforms.set_local_transform(root, translation(5.0, 0.0, 0.0));

    assert_world(&transforms, child, translation(6.0, 0.0, 0.0));
}

#[test]
fn test_reparenting_keeps_local_and_recomputes_world() {
    let (mut transforms, _bus, ids) = setup(3);
    let (root, other_root, child) = (ids[0], ids[1], ids[2]);
    transforms.set_parent(child, Some(root));
    transforms.set_local_transform(child, translation(1.0, 0.0, 0.0));
    transforms.set_local_transform(other_root, translation(0.0, 10.0, 0.0));

    transforms.set_parent(child, Some(other_root));

    assert_eq!(transforms.local_transform(child), translation(1.0, 0.0, 0.0));
    assert_world(&transforms, child, translation(1.0, 10.0, 0.0));
    assert_eq!(transforms.first_child(root), None);
    assert_eq!(transforms.children(other_root).collect::<Vec<_>>(), [child]);
}

#[test]
fn test_removing_a_root_leaves_a_root_sibling_chain() {
    let (mut transforms, _bus, ids) = setup(3);
    transforms.set_parent(ids[1], Some(ids[0]));
    transforms.set_parent(ids[2], Some(ids[0]));

    assert!(transforms.discard(entity(0)));

    let c1 = transforms.instance_of(entity(1)).expect("c1 survives");
    let c2 = transforms.instance_of(entity(2)).expect("c2 survives");
    assert_eq!(transforms.num_registered(), 2);
    assert_eq!(transforms.parent(c1), None);
    assert_eq!(transforms.parent(c2), None);
    assert_eq!(transforms.previous_sibling(c1), None);
    assert_eq!(transforms.next_sibling(c1), Some(c2));
    assert_eq!(transforms.previous_sibling(c2), Some(c1));
    assert_eq!(transforms.next_sibling(c2), None);
}

#[test]
fn test_removed_children_take_the_removed_slot_in_sibling_order() {
    let (mut transforms, _bus, ids) = setup(6);
    // 0 -> [1, 2, 3], 2 -> [4, 5]
    for (child, parent) in [(1, 0), (2, 0), (3, 0), (4, 2), (5, 2)] {
        transforms.set_parent(ids[child], Some(ids[parent]));
    }

    transforms.on_instance_removed(ids[2]);

    let order: Vec<_> = transforms.children(ids[0]).collect();
    assert_eq!(order, [ids[1], ids[4], ids[5], ids[3]]);
    assert_eq!(transforms.parent(ids[4]), Some(ids[0]));
    assert_eq!(*transforms.store().links(ids[2]), Links::DETACHED);
}

#[test]
fn test_set_parent_is_idempotent() {
    let (mut transforms, bus, ids) = setup(3);
    transforms.set_parent(ids[1], Some(ids[0]));
    transforms.set_parent(ids[2], Some(ids[0]));
    transforms.set_local_transform(ids[0], translation(2.0, 0.0, 0.0));
    let links_before: Vec<Links> = ids.iter().map(|i| *transforms.store().links(*i)).collect();
    let worlds_before = transforms.store().world_column().to_vec();
    let published = transforms.published_batches();
    bus.drain();

    transforms.set_parent(ids[1], Some(ids[0]));

    let links_after: Vec<Links> = ids.iter().map(|i| *transforms.store().links(*i)).collect();
    assert_eq!(links_before, links_after);
    assert_eq!(worlds_before, transforms.store().world_column());
    assert_eq!(transforms.published_batches(), published, "A no-op must not notify");
    assert!(bus.drain().is_empty());
}

#[test]
fn test_reparenting_to_current_parent_keeps_sibling_order() {
    // The guard compares the parent of the instance with the requested parent.
    // Comparing the parent of the requested parent with the instance instead
    // would relink the first child to the end of the list.
    let (mut transforms, _bus, ids) = setup(3);
    transforms.set_parent(ids[1], Some(ids[0]));
    transforms.set_parent(ids[2], Some(ids[0]));

    transforms.set_parent(ids[1], Some(ids[0]));

    assert_eq!(transforms.children(ids[0]).collect::<Vec<_>>(), [ids[1], ids[2]]);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "would create a cycle")]
fn test_parenting_under_own_child_is_rejected() {
    // The inverted relation: the requested parent is a child of the instance.
    let (mut transforms, _bus, ids) = setup(2);
    transforms.set_parent(ids[1], Some(ids[0]));

    transforms.set_parent(ids[0], Some(ids[1]));
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "would create a cycle")]
fn test_parenting_under_deep_descendant_is_rejected() {
    let (mut transforms, _bus, ids) = setup(4);
    for i in 1..4 {
        transforms.set_parent(ids[i], Some(ids[i - 1]));
    }

    transforms.set_parent(ids[0], Some(ids[3]));
}

#[test]
fn test_self_parenting_and_invalid_instance_are_ignored() {
    let (mut transforms, _bus, ids) = setup(1);
    let published = transforms.published_batches();

    transforms.set_parent(ids[0], Some(ids[0]));
    transforms.set_parent(InstanceId::INVALID, Some(ids[0]));

    assert_eq!(transforms.parent(ids[0]), None);
    assert_eq!(transforms.published_batches(), published);
}

#[test]
fn test_unparenting_makes_a_root_with_world_as_local() {
    let (mut transforms, _bus, ids) = setup(2);
    transforms.set_local_transform(ids[0], translation(3.0, 0.0, 0.0));
    transforms.set_parent(ids[1], Some(ids[0]));
    transforms.set_local_transform(ids[1], translation(0.0, 1.0, 0.0));

    transforms.set_parent(ids[1], None);

    assert_eq!(transforms.parent(ids[1]), None);
    assert_eq!(transforms.first_child(ids[0]), None);
    assert_world(&transforms, ids[1], translation(0.0, 1.0, 0.0));
}

// --- COMPACTION ---

#[test]
fn test_compaction_repairs_every_reference_to_the_moved_row() {
    let (mut transforms, _bus, ids) = setup(6);
    // 0 -> [1, 5, 2], 5 -> [3, 4]
    for (child, parent) in [(1, 0), (5, 0), (2, 0), (3, 5), (4, 5)] {
        transforms.set_parent(ids[child], Some(ids[parent]));
    }
    transforms.set_local_transform(ids[0], translation(1.0, 0.0, 0.0));
    transforms.set_local_transform(ids[5], translation(0.0, 1.0, 0.0));
    transforms.set_local_transform(ids[4], translation(0.0, 0.0, 1.0));

    // Entity 1 sits at row 1; freeing it moves row 5 (entity 5) into it.
    assert!(transforms.discard(entity(1)));

    let at = |e: u32| transforms.instance_of(entity(e)).expect("entity survives");
    assert_eq!(at(5), InstanceId(1));
    assert_eq!(transforms.children(at(0)).collect::<Vec<_>>(), [at(5), at(2)]);
    assert_eq!(transforms.children(at(5)).collect::<Vec<_>>(), [at(3), at(4)]);
    assert_eq!(transforms.parent(at(3)), Some(at(5)));
    assert_eq!(transforms.previous_sibling(at(2)), Some(at(5)));
    assert_world(&transforms, at(4), translation(1.0, 1.0, 1.0));
}

#[test]
fn test_moved_first_child_updates_parent_head() {
    let (mut transforms, _bus, ids) = setup(3);
    transforms.set_parent(ids[2], Some(ids[0]));

    transforms.discard(entity(1));

    let parent = transforms.instance_of(entity(0)).expect("parent survives");
    let child = transforms.instance_of(entity(2)).expect("child survives");
    assert_eq!(child, InstanceId(1));
    assert_eq!(transforms.first_child(parent), Some(child));
    assert_eq!(transforms.parent(child), Some(parent));
}

// --- PROPAGATION ---

#[test]
fn test_lone_root_skips_the_world_cache() {
    let (mut transforms, bus, ids) = setup(1);

    transforms.set_local_transform(ids[0], translation(4.0, 0.0, 0.0));

    assert_eq!(*transforms.store().world(ids[0]), Mat4::IDENTITY);
    assert_world(&transforms, ids[0], translation(4.0, 0.0, 0.0));
    let events = bus.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(
        changes(&events[0]),
        [TransformChanged {
            entity: entity(0),
            world: translation(4.0, 0.0, 0.0)
        }]
    );
}

#[test]
fn test_one_event_per_call_in_pre_order() {
    let (mut transforms, bus, ids) = setup(4);
    // 0 -> [1 -> [3], 2]
    for (child, parent) in [(1, 0), (2, 0), (3, 1)] {
        transforms.set_parent(ids[child], Some(ids[parent]));
    }
    bus.drain();

    transforms.set_local_transform(ids[0], translation(1.0, 1.0, 0.0));

    let events = bus.drain();
    assert_eq!(events.len(), 1, "The whole sweep should be a single batch");
    let order: Vec<_> = changes(&events[0]).iter().map(|c| c.entity.index).collect();
    assert_eq!(order, [0, 1, 3, 2]);
}

#[test]
fn test_deferred_mode_coalesces_until_dispatch() {
    let bus = EventBus::new();
    let mut transforms = TransformComponent::new()
        .with_delivery_mode(DeliveryMode::Deferred)
        .with_event_sender(bus.sender());
    let a = transforms.create(entity(0));
    let b = transforms.create(entity(1));

    transforms.set_local_transform(a, translation(1.0, 0.0, 0.0));
    transforms.set_local_transform(b, translation(0.0, 1.0, 0.0));
    transforms.set_local_transform(a, translation(2.0, 0.0, 0.0));

    assert!(bus.drain().is_empty(), "Nothing leaves before the dispatch");
    assert_eq!(transforms.pending_notifications(), 2);

    transforms.dispatch_message_queue();

    let events = bus.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(
        changes(&events[0]),
        [
            TransformChanged {
                entity: entity(0),
                world: translation(2.0, 0.0, 0.0)
            },
            TransformChanged {
                entity: entity(1),
                world: translation(0.0, 1.0, 0.0)
            },
        ]
    );
    assert_eq!(transforms.pending_notifications(), 0);
}

#[test]
fn test_deferred_notification_of_a_discarded_entity_is_dropped() {
    let bus = EventBus::new();
    let mut transforms = TransformComponent::new()
        .with_delivery_mode(DeliveryMode::Deferred)
        .with_event_sender(bus.sender());
    let a = transforms.create(entity(0));
    let b = transforms.create(entity(1));
    let c = transforms.create(entity(2));
    transforms.set_local_transform(a, translation(1.0, 0.0, 0.0));
    transforms.set_local_transform(b, translation(0.0, 1.0, 0.0));
    transforms.set_local_transform(c, translation(0.0, 0.0, 1.0));

    assert!(transforms.discard(entity(0)));
    assert_eq!(transforms.pending_notifications(), 2);

    // Entity 2 took the freed slot and must still coalesce in place.
    let c = transforms.instance_of(entity(2)).expect("still registered");
    transforms.set_local_transform(c, translation(0.0, 0.0, 3.0));
    transforms.dispatch_message_queue();

    let events = bus.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(
        changes(&events[0]),
        [
            TransformChanged {
                entity: entity(2),
                world: translation(0.0, 0.0, 3.0)
            },
            TransformChanged {
                entity: entity(1),
                world: translation(0.0, 1.0, 0.0)
            },
        ]
    );
}

#[test]
fn test_set_world_transform_under_a_parent() {
    let (mut transforms, _bus, ids) = setup(2);
    let parent_world = translation(5.0, 0.0, 0.0) * Mat4::from_rotation_z(arbor_core::math::FRAC_PI_2);
    transforms.set_local_transform(ids[0], parent_world);
    transforms.set_parent(ids[1], Some(ids[0]));

    transforms
        .set_world_transform(ids[1], translation(1.0, 2.0, 3.0))
        .expect("parent is invertible");

    assert_world(&transforms, ids[1], translation(1.0, 2.0, 3.0));
    let expected_local = parent_world.inverse().expect("invertible") * translation(1.0, 2.0, 3.0);
    assert!(transforms.local_transform(ids[1]).approx_eq(&expected_local));
}

#[test]
fn test_set_world_transform_on_root_sets_local() {
    let (mut transforms, _bus, ids) = setup(1);

    transforms
        .set_world_transform(ids[0], translation(7.0, 0.0, 0.0))
        .expect("roots never fail");

    assert_eq!(transforms.local_transform(ids[0]), translation(7.0, 0.0, 0.0));
}

#[test]
fn test_singular_parent_is_a_degenerate_transform() {
    let (mut transforms, _bus, ids) = setup(2);
    transforms.set_local_transform(ids[0], Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0)));
    transforms.set_parent(ids[1], Some(ids[0]));
    transforms.set_local_transform(ids[1], translation(1.0, 0.0, 0.0));

    let result = transforms.set_world_transform(ids[1], translation(3.0, 3.0, 3.0));

    assert_eq!(
        result,
        Err(TransformError::DegenerateTransform {
            instance: ids[1],
            parent: ids[0]
        })
    );
    assert_eq!(transforms.local_transform(ids[1]), translation(1.0, 0.0, 0.0));
}

#[test]
fn test_deep_chain_propagates_without_recursion() {
    const DEPTH: u32 = 100_000;
    let mut transforms = TransformComponent::new();
    let range = transforms.create_many(&(0..DEPTH).map(entity).collect::<Vec<_>>());
    for row in range.clone().skip(1) {
        transforms.set_parent(InstanceId(row), Some(InstanceId(row - 1)));
        transforms.set_local_transform(InstanceId(row), translation(1.0, 0.0, 0.0));
    }

    transforms.set_local_transform(InstanceId(0), translation(0.5, 0.0, 0.0));

    let leaf = InstanceId(range.end - 1);
    assert!((transforms.world_transform(leaf).translation().x - (DEPTH as f32 - 0.5)).abs() < 1.0);
}

// --- BULK LOADING ---

#[test]
fn test_set_parents_links_a_loaded_block() {
    let bus = EventBus::new();
    let mut transforms = TransformComponent::new().with_event_sender(bus.sender());
    let entities: Vec<_> = (0..4).map(entity).collect();
    let range = transforms.create_many(&entities);
    for row in range.clone() {
        transforms.set_local_transform(InstanceId(row), translation(1.0, 0.0, 0.0));
    }
    bus.drain();

    transforms.set_parents(range, &entities, &[u32::MAX, 0, 0, 1]);

    assert_eq!(transforms.children(InstanceId(0)).collect::<Vec<_>>(), [InstanceId(1), InstanceId(2)]);
    assert_eq!(transforms.parent(InstanceId(3)), Some(InstanceId(1)));
    assert_world(&transforms, InstanceId(3), translation(3.0, 0.0, 0.0));
    let events = bus.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(changes(&events[0]).len(), 4, "Every loaded instance is propagated once");
}

#[test]
fn test_set_parents_links_children_listed_before_their_parents() {
    let bus = EventBus::new();
    let mut transforms = TransformComponent::new().with_event_sender(bus.sender());
    let entities: Vec<_> = (0..5).map(entity).collect();
    let range = transforms.create_many(&entities);
    for row in range.clone() {
        transforms.set_local_transform(InstanceId(row), translation(1.0, 0.0, 0.0));
    }
    bus.drain();

    // Rows 0 and 2 name parents further down the block; rows 1 and 3 are
    // sibling roots, and row 4 hangs off the second one.
    transforms.set_parents(range, &entities, &[2, u32::MAX, 1, u32::MAX, 3]);

    assert_eq!(transforms.parent(InstanceId(0)), Some(InstanceId(2)));
    assert_eq!(transforms.parent(InstanceId(2)), Some(InstanceId(1)));
    assert_eq!(transforms.parent(InstanceId(4)), Some(InstanceId(3)));
    assert_world(&transforms, InstanceId(1), translation(1.0, 0.0, 0.0));
    assert_world(&transforms, InstanceId(2), translation(2.0, 0.0, 0.0));
    assert_world(&transforms, InstanceId(0), translation(3.0, 0.0, 0.0));
    assert_world(&transforms, InstanceId(4), translation(2.0, 0.0, 0.0));
    let events = bus.drain();
    assert_eq!(events.len(), 1);
    let mut announced: Vec<_> = changes(&events[0]).iter().map(|c| c.entity.index).collect();
    announced.sort_unstable();
    assert_eq!(announced, [0, 1, 2, 3, 4], "Each row is propagated once");
    let grandchild = changes(&events[0])
        .iter()
        .find(|c| c.entity == entity(0))
        .expect("row 0 is announced");
    assert!(grandchild.world.approx_eq(&translation(3.0, 0.0, 0.0)));
}

#[test]
fn test_set_parents_leaves_unresolved_parents_as_roots() {
    let mut transforms = TransformComponent::new();
    let entities: Vec<_> = (0..2).map(entity).collect();
    let range = transforms.create_many(&entities);

    transforms.set_parents(range, &entities, &[u32::MAX, 9]);

    assert_eq!(transforms.parent(InstanceId(1)), None);
}

// --- MESSAGES ---

#[test]
fn test_send_resolves_entities_and_instances() {
    let (mut transforms, _bus, ids) = setup(2);

    transforms
        .send(TransformMessage::SetParent {
            target: Target::Entity(entity(1)),
            parent: Some(Target::Instance(ids[0])),
        })
        .expect("both targets resolve");
    transforms
        .send(TransformMessage::SetLocalTransform {
            target: Target::Entity(entity(0)),
            local: translation(0.0, 0.0, 2.0),
        })
        .expect("entity 0 resolves");

    assert_eq!(transforms.parent(ids[1]), Some(ids[0]));
    assert_world(&transforms, ids[1], translation(0.0, 0.0, 2.0));
}

#[test]
fn test_send_reports_unknown_targets() {
    let (mut transforms, _bus, _ids) = setup(1);

    let unknown_entity = transforms.send(TransformMessage::SetLocalTransform {
        target: Target::Entity(entity(42)),
        local: Mat4::IDENTITY,
    });
    let unknown_instance = transforms.send(TransformMessage::SetWorldTransform {
        target: Target::Instance(InstanceId(3)),
        world: Mat4::IDENTITY,
    });

    assert_eq!(unknown_entity, Err(TransformError::UnknownEntity(entity(42))));
    assert_eq!(
        unknown_instance,
        Err(TransformError::UnknownInstance {
            instance: InstanceId(3),
            registered: 1
        })
    );
}

#[test]
fn test_posted_messages_run_in_order_at_dispatch() {
    let (mut transforms, _bus, ids) = setup(2);
    transforms.post(TransformMessage::SetLocalTransform {
        target: Target::Instance(ids[0]),
        local: translation(1.0, 0.0, 0.0),
    });
    transforms.post(TransformMessage::SetParent {
        target: Target::Entity(entity(7)),
        parent: None,
    });
    transforms.post(TransformMessage::SetLocalTransform {
        target: Target::Instance(ids[0]),
        local: translation(2.0, 0.0, 0.0),
    });
    assert_eq!(transforms.queued_messages(), 3);
    assert_eq!(transforms.local_transform(ids[0]), Mat4::IDENTITY);

    let applied = transforms.dispatch_message_queue();

    assert_eq!(applied, 2, "The message for the unknown entity is skipped");
    assert_eq!(transforms.queued_messages(), 0);
    assert_eq!(transforms.local_transform(ids[0]), translation(2.0, 0.0, 0.0));
}

// --- SERIALIZATION ---

#[test]
fn test_serialize_then_deserialize_restores_columns() {
    let (mut transforms, _bus, ids) = setup(3);
    transforms.set_parent(ids[1], Some(ids[0]));
    transforms.set_local_transform(ids[0], translation(1.0, 2.0, 3.0));
    transforms.set_local_transform(ids[2], Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0)));
    let mut blob = Vec::new();
    transforms.serialize(&mut blob).expect("writing to a Vec cannot fail");
    assert_eq!(blob.len(), 2 * 3 * std::mem::size_of::<Mat4>());

    let mut restored = TransformComponent::new();
    let range = restored.create_many(&[entity(10), entity(11), entity(12)]);
    restored
        .deserialize(&mut blob.as_slice(), InstanceId(range.start), 3)
        .expect("blob has both columns");

    assert_eq!(restored.store().local_column(), transforms.store().local_column());
    assert_eq!(restored.store().world_column(), transforms.store().world_column());
}

#[test]
fn test_deserialize_rejects_unallocated_rows() {
    let mut transforms = TransformComponent::new();
    transforms.create(entity(0));

    let result = transforms.deserialize(&mut [0u8; 0].as_slice(), InstanceId(0), 2);

    assert!(matches!(
        result,
        Err(ComponentError::OutOfRange {
            offset: 0,
            count: 2,
            registered: 1
        })
    ));
}

#[test]
fn test_deserialize_reports_truncated_streams() {
    let mut transforms = TransformComponent::new();
    transforms.create(entity(0));

    let result = transforms.deserialize(&mut [0u8; 10].as_slice(), InstanceId(0), 1);

    assert!(matches!(result, Err(ComponentError::Io(_))));
}
