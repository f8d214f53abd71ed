//! Doubly-linked chains of entities (snake segments)
//!
//! Links are stored on each entity as ids. Every operation here keeps the
//! relation symmetric (`a.behind == b` iff `b.in_front == a`) and acyclic.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};
use crate::error::{GameError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainLinks {
    pub in_front: Option<EntityId>,
    pub behind: Option<EntityId>,
}

fn index_of(entities: &[Entity], id: EntityId) -> Result<usize> {
    entities
        .iter()
        .position(|e| e.id == id)
        .ok_or(GameError::UnknownEntity(id))
}

fn links(entities: &[Entity], id: EntityId) -> Option<ChainLinks> {
    entities.iter().find(|e| e.id == id).map(|e| e.links)
}

fn links_mut(entities: &mut [Entity], id: EntityId) -> Option<&mut ChainLinks> {
    entities.iter_mut().find(|e| e.id == id).map(|e| &mut e.links)
}

/// Make `part` follow `leader`, or detach it from whatever is in front when `leader` is None.
///
/// `part` keeps everything behind it. If `leader` already had something behind
/// it, that part becomes the head of its own chain.
pub fn follow(entities: &mut [Entity], part: EntityId, leader: Option<EntityId>) -> Result<()> {
    index_of(entities, part)?;
    if let Some(leader) = leader {
        if leader == part {
            return Err(GameError::illegal(format!("{:?} cannot follow itself", part)));
        }
        index_of(entities, leader)?;
        // Walking forward from the leader must not reach the part
        let mut cursor = Some(leader);
        let mut steps = 0;
        while let Some(id) = cursor {
            if id == part {
                return Err(GameError::illegal(format!(
                    "{:?} following {:?} would make a cycle",
                    part, leader
                )));
            }
            steps += 1;
            if steps > entities.len() {
                return Err(GameError::illegal("chain already contains a cycle"));
            }
            cursor = links(entities, id).and_then(|l| l.in_front);
        }
    }

    detach_front(entities, part);
    let Some(leader) = leader else {
        return Ok(());
    };
    if let Some(displaced) = links(entities, leader).and_then(|l| l.behind) {
        if let Some(l) = links_mut(entities, displaced) {
            l.in_front = None;
        }
    }
    if let Some(l) = links_mut(entities, leader) {
        l.behind = Some(part);
    }
    if let Some(l) = links_mut(entities, part) {
        l.in_front = Some(leader);
    }
    Ok(())
}

fn detach_front(entities: &mut [Entity], part: EntityId) {
    let Some(front) = links(entities, part).and_then(|l| l.in_front) else {
        return;
    };
    if let Some(l) = links_mut(entities, front) {
        l.behind = None;
    }
    if let Some(l) = links_mut(entities, part) {
        l.in_front = None;
    }
}

/// Cut `part` out of its chain. What was behind it becomes a new head.
pub fn detach(entities: &mut [Entity], part: EntityId) {
    detach_front(entities, part);
    let Some(behind) = links(entities, part).and_then(|l| l.behind) else {
        return;
    };
    if let Some(l) = links_mut(entities, behind) {
        l.in_front = None;
    }
    if let Some(l) = links_mut(entities, part) {
        l.behind = None;
    }
}

/// Clear the links the remaining entities hold to an entity that left the world
pub fn unlink_removed(entities: &mut [Entity], removed: &mut Entity) {
    if let Some(front) = removed.links.in_front.take() {
        if let Some(l) = links_mut(entities, front) {
            l.behind = None;
        }
    }
    if let Some(behind) = removed.links.behind.take() {
        if let Some(l) = links_mut(entities, behind) {
            l.in_front = None;
        }
    }
}

/// The head of the chain `part` is in
pub fn head(entities: &[Entity], part: EntityId) -> Result<EntityId> {
    index_of(entities, part)?;
    let mut current = part;
    for _ in 0..entities.len() {
        match links(entities, current).and_then(|l| l.in_front) {
            Some(front) => current = front,
            None => return Ok(current),
        }
    }
    Err(GameError::illegal("chain contains a cycle"))
}

/// Number of parts behind `part`, not counting `part`
pub fn number_behind(entities: &[Entity], part: EntityId) -> Result<usize> {
    index_of(entities, part)?;
    Ok(parts_from(entities, part).len() - 1)
}

/// `part` followed by every part behind it, front to back
pub fn parts_from(entities: &[Entity], part: EntityId) -> Vec<EntityId> {
    let mut parts = Vec::new();
    let mut cursor = Some(part);
    while let Some(id) = cursor {
        if parts.contains(&id) || parts.len() > entities.len() {
            break;
        }
        parts.push(id);
        cursor = links(entities, id).and_then(|l| l.behind);
    }
    parts
}

/// Every link points at an existing entity that links back
pub fn is_symmetric(entities: &[Entity]) -> bool {
    entities.iter().all(|e| {
        let front_ok = e
            .links
            .in_front
            .is_none_or(|f| links(entities, f).is_some_and(|l| l.behind == Some(e.id)));
        let behind_ok = e
            .links
            .behind
            .is_none_or(|b| links(entities, b).is_some_and(|l| l.in_front == Some(e.id)));
        front_ok && behind_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::IdAllocator;
    use glam::Vec2;
    use proptest::prelude::*;

    fn parts(n: usize) -> Vec<Entity> {
        let mut ids = IdAllocator::default();
        (0..n)
            .map(|_| Entity::snake_part(ids.next_id(), Vec2::ZERO, Default::default()))
            .collect()
    }

    fn chain_of(n: usize) -> Vec<Entity> {
        let mut entities = parts(n);
        for i in 1..n {
            let (part, leader) = (entities[i].id, entities[i - 1].id);
            follow(&mut entities, part, Some(leader)).unwrap();
        }
        entities
    }

    #[test]
    fn test_five_chain() {
        let mut entities = chain_of(5);
        let head_id = entities[0].id;
        assert_eq!(number_behind(&entities, head_id).unwrap(), 4);
        assert_eq!(head(&entities, entities[4].id).unwrap(), head_id);
        assert!(is_symmetric(&entities));

        detach(&mut entities, head_id);
        let new_head = entities[1].id;
        assert!(is_symmetric(&entities));
        assert_eq!(number_behind(&entities, new_head).unwrap(), 3);
        assert_eq!(head(&entities, entities[4].id).unwrap(), new_head);
        assert_eq!(number_behind(&entities, head_id).unwrap(), 0);
    }

    #[test]
    fn test_cycles_are_illegal() {
        let mut entities = chain_of(3);
        let (first, last) = (entities[0].id, entities[2].id);
        assert!(matches!(
            follow(&mut entities, first, Some(last)),
            Err(GameError::IllegalOperation(_))
        ));
        assert!(matches!(
            follow(&mut entities, first, Some(first)),
            Err(GameError::IllegalOperation(_))
        ));
        assert!(is_symmetric(&entities));
        assert!(matches!(
            follow(&mut entities, first, Some(EntityId(999))),
            Err(GameError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_follow_displaces_existing_follower() {
        let mut entities = chain_of(3);
        let mut extra = parts(1).pop().unwrap();
        extra.id = EntityId(100);
        let extra_id = extra.id;
        entities.push(extra);
        let (first, second) = (entities[0].id, entities[1].id);
        follow(&mut entities, extra_id, Some(first)).unwrap();
        assert!(is_symmetric(&entities));
        assert_eq!(head(&entities, second).unwrap(), second);
        assert_eq!(number_behind(&entities, first).unwrap(), 1);
    }

    #[test]
    fn test_unlink_removed() {
        let mut entities = chain_of(3);
        let mut middle = entities.remove(1);
        unlink_removed(&mut entities, &mut middle);
        assert!(is_symmetric(&entities));
        assert_eq!(middle.links, ChainLinks::default());
        assert_eq!(head(&entities, entities[1].id).unwrap(), entities[1].id);
    }

    proptest! {
        #[test]
        fn prop_follow_keeps_symmetry(ops in prop::collection::vec((0usize..6, prop::option::of(0usize..6)), 0..40)) {
            let mut entities = parts(6);
            for (part, leader) in ops {
                let part = entities[part].id;
                let leader = leader.map(|l| entities[l].id);
                let _ = follow(&mut entities, part, leader);
                prop_assert!(is_symmetric(&entities));
                for e in &entities {
                    prop_assert!(head(&entities, e.id).is_ok());
                }
            }
        }
    }
}
