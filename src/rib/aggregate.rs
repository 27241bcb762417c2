use crate::prefix::{self, Prefix};
use crate::rib::RouteEntry;

/// Coalesce sibling routes in place until no further merge is possible.
///
/// Two entries merge when they have equal mask lengths, identical prefix bits
/// apart from the final bit, and equal attributes; the pair is replaced by the
/// parent prefix one bit shorter. Each merge shrinks the list, so the pass
/// always terminates, and the fixed point is independent of merge order.
pub fn coalesce(entries: &mut Vec<RouteEntry>) {
    while merge_one(entries) {}
}

fn merge_one(entries: &mut Vec<RouteEntry>) -> bool {
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            if let Some(parent) = merged_prefix(&entries[i], &entries[j]) {
                entries[i].prefix = parent;
                entries.remove(j);
                return true;
            }
        }
    }
    false
}

/// The parent prefix covering both entries, if they are mergeable siblings
fn merged_prefix(a: &RouteEntry, b: &RouteEntry) -> Option<Prefix> {
    if a.prefix.netmask != b.prefix.netmask || a.prefix.netmask == 0 {
        return None;
    }
    if a.attributes != b.attributes {
        return None;
    }
    let mask = a.prefix.netmask;
    // Duplicate announcements are kept as-is, not merged
    if prefix::same_network(a.prefix.network, b.prefix.network, mask) {
        return None;
    }
    let parent = prefix::shorten(mask);
    if !prefix::same_network(a.prefix.network, b.prefix.network, parent) {
        return None;
    }
    Some(Prefix::new(
        a.prefix.network.min(b.prefix.network),
        parent,
    ))
}
