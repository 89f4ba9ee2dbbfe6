//! Rotation families: every credential descended from one login-time root.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of revoking a family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRevocation {
    /// Root credential of the family (created at login)
    pub root_id: Uuid,

    /// Every member of the family, root first, in breadth-first order
    pub member_ids: Vec<Uuid>,

    /// How many members flipped from unrevoked to revoked in this call
    pub newly_revoked: usize,
}

impl FamilyRevocation {
    /// Number of credentials in the family
    pub fn size(&self) -> usize {
        self.member_ids.len()
    }

    /// True when the family was already fully revoked before the call
    pub fn was_already_revoked(&self) -> bool {
        self.newly_revoked == 0
    }
}

/// Collects `root_id` and all of its descendants, breadth-first.
///
/// `children` maps a credential id to the ids rotated from it. Usually every
/// entry holds one child; a node has several only after a reuse race. The
/// visited set keeps a corrupted index from looping.
pub fn collect_descendants(root_id: Uuid, children: &HashMap<Uuid, Vec<Uuid>>) -> Vec<Uuid> {
    let mut members = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([root_id]);

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        members.push(id);
        if let Some(next) = children.get(&id) {
            queue.extend(next.iter().copied());
        }
    }

    members
}
