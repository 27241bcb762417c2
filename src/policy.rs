use crate::config::Relation;

/// May traffic transit between a source neighbor and a nexthop neighbor?
/// At least one end of the path must be a paying customer.
pub fn forwarding_allowed(source: Relation, nexthop: Relation) -> bool {
    source == Relation::Customer || nexthop == Relation::Customer
}

/// Should reachability learned on `source` be re-announced to `target`?
/// Routes from customers go to everyone; routes from peers and providers go
/// only to customers. The originating neighbor is excluded by the caller.
pub fn should_propagate(source: Relation, target: Relation) -> bool {
    source == Relation::Customer || target == Relation::Customer
}
