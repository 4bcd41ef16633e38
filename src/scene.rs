//! Scene graph queries: atoms and the force receivers they own.
//!
//! An atom is any entity tagged with [`Atom`] and a [`Name`]. Its force
//! receivers are named descendants tagged with [`ForceReceiver`]. Targets are
//! always resolved by name against the current atom, so a despawned body
//! simply stops resolving.

use bevy::prelude::*;

/// Sentinel chooser value meaning "no selection".
pub const NONE: &str = "None";

/// Marker for a selectable group of bodies.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Atom;

/// Marker for a body that can be driven by a motion target.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ForceReceiver;

/// Names of all atoms in the world, sorted.
pub fn atom_names(world: &mut World) -> Vec<String> {
    let mut query = world.query_filtered::<&Name, With<Atom>>();
    let mut names: Vec<String> = query.iter(world).map(|n| n.as_str().to_owned()).collect();
    names.sort();
    names
}

/// Find an atom by exact name.
pub fn find_atom(world: &mut World, name: &str) -> Option<Entity> {
    let mut query = world.query_filtered::<(Entity, &Name), With<Atom>>();
    query
        .iter(world)
        .find(|(_, n)| n.as_str() == name)
        .map(|(entity, _)| entity)
}

/// Force receivers under `atom`, in hierarchy order.
pub fn force_receivers(world: &World, atom: Entity) -> Vec<(Entity, String)> {
    let mut found = Vec::new();
    let mut stack = vec![atom];
    while let Some(entity) = stack.pop() {
        if entity != atom && world.get::<ForceReceiver>(entity).is_some() {
            if let Some(name) = world.get::<Name>(entity) {
                found.push((entity, name.as_str().to_owned()));
            }
        }
        if let Some(children) = world.get::<Children>(entity) {
            stack.extend(children.to_vec().into_iter().rev());
        }
    }
    found
}

/// Names of the force receivers under `atom`.
pub fn force_receiver_names(world: &World, atom: Entity) -> Vec<String> {
    force_receivers(world, atom)
        .into_iter()
        .map(|(_, name)| name)
        .collect()
}

/// Resolve a force receiver by name, ignoring ASCII case.
pub fn resolve_force_receiver(world: &World, atom: Entity, name: &str) -> Option<Entity> {
    if world.get_entity(atom).is_err() {
        return None;
    }
    force_receivers(world, atom)
        .into_iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(entity, _)| entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_rig(world: &mut World) -> Entity {
        let atom = world.spawn((Name::new("Person"), Atom)).id();
        let hip = world
            .spawn((Name::new("hip"), ForceReceiver, ChildOf(atom)))
            .id();
        world.spawn((Name::new("pelvis"), ForceReceiver, ChildOf(hip)));
        world.spawn((Name::new("decor"), ChildOf(atom)));
        world.spawn((Name::new("head"), ForceReceiver, ChildOf(atom)));
        atom
    }

    #[test]
    fn lists_atoms_sorted() {
        let mut world = World::new();
        world.spawn((Name::new("Toy"), Atom));
        spawn_rig(&mut world);
        world.spawn(Name::new("NotAnAtom"));

        assert_eq!(atom_names(&mut world), vec!["Person", "Toy"]);
    }

    #[test]
    fn receivers_in_hierarchy_order() {
        let mut world = World::new();
        let atom = spawn_rig(&mut world);

        assert_eq!(force_receiver_names(&world, atom), vec!["hip", "pelvis", "head"]);
    }

    #[test]
    fn resolve_ignores_case() {
        let mut world = World::new();
        let atom = spawn_rig(&mut world);

        let hip = resolve_force_receiver(&world, atom, "HIP");
        assert!(hip.is_some());
        assert_eq!(world.get::<Name>(hip.unwrap()).unwrap().as_str(), "hip");
        assert!(resolve_force_receiver(&world, atom, "decor").is_none());
        assert!(resolve_force_receiver(&world, atom, NONE).is_none());
    }

    #[test]
    fn despawned_receiver_stops_resolving() {
        let mut world = World::new();
        let atom = spawn_rig(&mut world);
        let head = resolve_force_receiver(&world, atom, "head").unwrap();

        world.despawn(head);
        assert!(resolve_force_receiver(&world, atom, "head").is_none());

        world.despawn(atom);
        assert!(resolve_force_receiver(&world, atom, "hip").is_none());
    }

    #[test]
    fn find_atom_is_exact() {
        let mut world = World::new();
        let atom = spawn_rig(&mut world);
        assert_eq!(find_atom(&mut world, "Person"), Some(atom));
        assert_eq!(find_atom(&mut world, "person"), None);
    }
}
