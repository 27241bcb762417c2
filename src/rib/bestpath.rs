use std::net::Ipv4Addr;

use itertools::Itertools;

use crate::rib::{RouteEntry, RouteStore};

/// Pick at most one route for a destination address.
///
/// Longest-prefix match narrows the field, then each tie-break keeps only the
/// entries with the best value for that step. The final step orders neighbor
/// addresses numerically (by u32 value), which makes the result unique and
/// stable for fixed inputs.
pub fn best_route(store: &RouteStore, dest: Ipv4Addr) -> Option<&RouteEntry> {
    let dest = u32::from(dest);

    let candidates: Vec<&RouteEntry> = store
        .entries()
        .filter(|entry| entry.prefix.contains(dest))
        .collect();

    // Longest prefix wins outright
    let candidates = candidates.into_iter().max_set_by_key(|e| e.prefix.len());

    // Highest local preference
    let candidates = candidates
        .into_iter()
        .max_set_by_key(|e| e.attributes.local_pref);

    // Self-originated routes are preferred when any candidate has the flag
    let candidates = {
        let (own, learned): (Vec<&RouteEntry>, Vec<&RouteEntry>) = candidates
            .into_iter()
            .partition(|e| e.attributes.self_origin);
        match (own.len(), learned.len()) {
            (0, _) => learned,
            (_, _) => own,
        }
    };

    // Shortest AS path
    let candidates = candidates
        .into_iter()
        .min_set_by_key(|e| e.attributes.as_path.len());

    // Best origin (IGP > EGP > UNK)
    let candidates = candidates
        .into_iter()
        .max_set_by_key(|e| e.attributes.origin.preference());

    // Lowest neighbor address
    candidates
        .into_iter()
        .min_by_key(|e| u32::from(e.learned_from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Origin;
    use crate::rib::RouteAttributes;

    fn insert(
        store: &mut RouteStore,
        from: Ipv4Addr,
        prefix: &str,
        attributes: RouteAttributes,
    ) {
        store.insert(
            from,
            RouteEntry::new(prefix.parse().unwrap(), attributes, from),
        );
    }

    fn base() -> RouteAttributes {
        RouteAttributes {
            local_pref: 100,
            self_origin: false,
            as_path: vec![2, 3],
            origin: Origin::Igp,
        }
    }

    #[test]
    fn test_no_candidates() {
        let store = RouteStore::new();
        assert!(best_route(&store, Ipv4Addr::new(10, 0, 0, 1)).is_none());

        let mut store = RouteStore::new();
        let neighbor = Ipv4Addr::new(192, 0, 0, 2);
        insert(&mut store, neighbor, "192.0.0.0/16", base());
        assert!(best_route(&store, Ipv4Addr::new(10, 0, 0, 1)).is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut store = RouteStore::new();
        let cust1 = Ipv4Addr::new(10, 0, 0, 2);
        let cust2 = Ipv4Addr::new(172, 0, 0, 2);
        insert(&mut store, cust1, "10.0.0.0/8", base());
        insert(&mut store, cust2, "10.1.0.0/16", base());

        let best = best_route(&store, Ipv4Addr::new(10, 1, 2, 3)).unwrap();
        assert_eq!(best.learned_from, cust2);
        // Outside the /16, the /8 still matches
        let best = best_route(&store, Ipv4Addr::new(10, 2, 2, 3)).unwrap();
        assert_eq!(best.learned_from, cust1);
    }

    #[test]
    fn test_highest_local_pref_wins() {
        let mut store = RouteStore::new();
        let a = Ipv4Addr::new(192, 168, 0, 2);
        let b = Ipv4Addr::new(192, 168, 1, 2);
        insert(&mut store, a, "10.0.0.0/8", base());
        let preferred = RouteAttributes {
            local_pref: 200,
            ..base()
        };
        insert(&mut store, b, "10.0.0.0/8", preferred);

        let best = best_route(&store, Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_eq!(best.learned_from, b);
    }

    #[test]
    fn test_self_origin_preferred() {
        let mut store = RouteStore::new();
        let a = Ipv4Addr::new(192, 168, 0, 2);
        let b = Ipv4Addr::new(192, 168, 1, 2);
        insert(&mut store, a, "10.0.0.0/8", base());
        let own = RouteAttributes {
            self_origin: true,
            ..base()
        };
        insert(&mut store, b, "10.0.0.0/8", own);

        let best = best_route(&store, Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_eq!(best.learned_from, b);
    }

    #[test]
    fn test_shortest_as_path_wins() {
        let mut store = RouteStore::new();
        let a = Ipv4Addr::new(192, 168, 0, 2);
        let b = Ipv4Addr::new(192, 168, 1, 2);
        insert(&mut store, a, "10.0.0.0/8", base()); // ASPath [2, 3]
        let shorter = RouteAttributes {
            as_path: vec![4],
            ..base()
        };
        insert(&mut store, b, "10.0.0.0/8", shorter);

        let best = best_route(&store, Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_eq!(best.learned_from, b);
    }

    #[test]
    fn test_best_origin_wins() {
        let mut store = RouteStore::new();
        let igp = Ipv4Addr::new(192, 168, 2, 2);
        let egp = Ipv4Addr::new(192, 168, 1, 2);
        let unk = Ipv4Addr::new(192, 168, 0, 2);
        for (neighbor, origin) in [(igp, Origin::Igp), (egp, Origin::Egp), (unk, Origin::Unk)] {
            let attributes = RouteAttributes { origin, ..base() };
            insert(&mut store, neighbor, "10.0.0.0/8", attributes);
        }

        let best = best_route(&store, Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_eq!(best.learned_from, igp);
    }

    #[test]
    fn test_lowest_neighbor_address_numeric() {
        let mut store = RouteStore::new();
        // "10.0.0.2" sorts after "9.0.0.2" numerically, before it as a string
        let nine = Ipv4Addr::new(9, 0, 0, 2);
        let ten = Ipv4Addr::new(10, 0, 0, 2);
        insert(&mut store, ten, "172.16.0.0/16", base());
        insert(&mut store, nine, "172.16.0.0/16", base());

        let best = best_route(&store, Ipv4Addr::new(172, 16, 5, 5)).unwrap();
        assert_eq!(best.learned_from, nine);
    }

    #[test]
    fn test_deterministic() {
        let mut store = RouteStore::new();
        for octet in [2u8, 7, 5, 9] {
            let neighbor = Ipv4Addr::new(192, 168, octet, 2);
            insert(&mut store, neighbor, "10.0.0.0/8", base());
        }
        let first = best_route(&store, Ipv4Addr::new(10, 0, 0, 1))
            .unwrap()
            .learned_from;
        for _ in 0..10 {
            let again = best_route(&store, Ipv4Addr::new(10, 0, 0, 1))
                .unwrap()
                .learned_from;
            assert_eq!(again, first);
        }
        assert_eq!(first, Ipv4Addr::new(192, 168, 2, 2));
    }
}
