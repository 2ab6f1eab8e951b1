use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::RecordId;

/// Two records known to describe the same entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrueLink {
    pub left: RecordId,
    pub right: RecordId,
}

/// Group record ids by originating index; each group is sorted with the
/// original first and duplicates in number order.
pub fn true_link_groups<'a, I>(ids: I) -> BTreeMap<u64, Vec<RecordId>>
where
    I: IntoIterator<Item = &'a RecordId>,
{
    let mut groups: BTreeMap<u64, Vec<RecordId>> = BTreeMap::new();
    for id in ids {
        groups.entry(id.index).or_default().push(*id);
    }
    for members in groups.values_mut() {
        members.sort();
        members.dedup();
    }
    groups
}

/// Every pair of records sharing an index, later member on the left.
pub fn true_link_pairs<'a, I>(ids: I) -> Vec<TrueLink>
where
    I: IntoIterator<Item = &'a RecordId>,
{
    let mut links = Vec::new();
    for members in true_link_groups(ids).into_values() {
        for (later_pos, later) in members.iter().enumerate() {
            for earlier in &members[..later_pos] {
                links.push(TrueLink {
                    left: *later,
                    right: *earlier,
                });
            }
        }
    }
    links
}
