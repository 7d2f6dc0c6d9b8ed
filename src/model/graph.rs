use crate::model::{Container, Id};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The in-memory working model: every container of one project keyed by its
/// real identifier. Built fresh per batch from the persisted snapshot and
/// only handed to the store after the whole batch succeeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerGraph {
    pub containers: HashMap<Id, Container>,
}

impl ContainerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.containers.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Container> {
        self.containers.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Container> {
        self.containers.get_mut(id)
    }

    pub fn insert(&mut self, container: Container) {
        self.containers.insert(container.id.clone(), container);
    }

    /// Containers directly under the given parent, in child-link order.
    pub fn children_of(&self, id: &str) -> Vec<&Container> {
        let Some(parent) = self.containers.get(id) else {
            return Vec::new();
        };
        parent
            .children
            .iter()
            .filter_map(|link| self.containers.get(&link.child_id))
            .collect()
    }

    /// Containers holding a child link to the given id, deduplicated in case
    /// the same parent links it more than once.
    pub fn parents_of(&self, id: &str) -> Vec<&Container> {
        self.containers
            .values()
            .filter(|candidate| candidate.has_child(id))
            .unique_by(|parent| parent.id.clone())
            .collect()
    }

    /// Ids of containers that still point at `id` through a child link or a
    /// relation edge. Used for the dangling-edge policy check on delete.
    pub fn referrers_of(&self, id: &str) -> Vec<Id> {
        self.containers
            .values()
            .filter(|other| {
                other.id != id
                    && (other.has_child(id)
                        || other.relations.iter().any(|edge| edge.target_id == id))
            })
            .map(|other| other.id.clone())
            .sorted()
            .collect()
    }

    /// Remove a container and every edge pointing at it from elsewhere.
    /// Returns the removed container, if it existed.
    pub fn remove(&mut self, id: &str) -> Option<Container> {
        let removed = self.containers.remove(id)?;
        for other in self.containers.values_mut() {
            other.children.retain(|link| link.child_id != id);
            other.relations.retain(|edge| edge.target_id != id);
        }
        Some(removed)
    }
}
