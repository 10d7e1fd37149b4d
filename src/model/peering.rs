use serde::{Deserialize, Serialize};

use crate::model::{generate_id, Id, PeerEndpoint, Record, RecordKind, Reference, Target, Timestamps};

/// A BGP session between two peer endpoints. The endpoints point at the
/// peering, not the other way round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peering {
    pub id: Id,
    /// Status slug.
    pub status: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Peering {
    pub const MAX_ENDPOINTS: usize = 2;

    pub fn new(status: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            status: status.into(),
            timestamps: Timestamps::now(),
        }
    }

    /// Point the endpoints of one peering at each other.
    ///
    /// `endpoints` must be every endpoint currently attached to the peering.
    /// With exactly two, each one's `peer` becomes the other; with any other
    /// count every `peer` is cleared. Returns the ids whose `peer` changed.
    pub fn update_peers(endpoints: &mut [PeerEndpoint]) -> Vec<Id> {
        let wanted: Vec<Option<Id>> = match endpoints {
            [a, b] => vec![Some(b.id), Some(a.id)],
            _ => vec![None; endpoints.len()],
        };

        let mut changed = Vec::new();
        for (endpoint, peer) in endpoints.iter_mut().zip(wanted) {
            if endpoint.peer != peer {
                endpoint.peer = peer;
                endpoint.touch();
                changed.push(endpoint.id);
            }
        }
        changed
    }
}

impl Record for Peering {
    const KIND: RecordKind = RecordKind::Peering;

    fn id(&self) -> Id {
        self.id
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference {
            field: "status",
            target: Target::Status(self.status.clone()),
        }]
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints(peering: &Peering, count: usize) -> Vec<PeerEndpoint> {
        (0..count).map(|_| PeerEndpoint::new(peering.id)).collect()
    }

    #[test]
    fn test_two_endpoints_are_paired() {
        let peering = Peering::new("active");
        let mut eps = endpoints(&peering, 2);

        let changed = Peering::update_peers(&mut eps);

        assert_eq!(changed.len(), 2);
        assert_eq!(eps[0].peer, Some(eps[1].id));
        assert_eq!(eps[1].peer, Some(eps[0].id));
    }

    #[test]
    fn test_single_endpoint_stays_unpaired() {
        let peering = Peering::new("active");
        let mut eps = endpoints(&peering, 1);

        let changed = Peering::update_peers(&mut eps);

        assert!(changed.is_empty());
        assert_eq!(eps[0].peer, None);
    }

    #[test]
    fn test_stale_peer_is_cleared() {
        let peering = Peering::new("active");
        let mut eps = endpoints(&peering, 1);
        eps[0].peer = Some(generate_id());

        let changed = Peering::update_peers(&mut eps);

        assert_eq!(changed, vec![eps[0].id]);
        assert_eq!(eps[0].peer, None);
    }

    #[test]
    fn test_more_than_two_endpoints_are_all_cleared() {
        let peering = Peering::new("active");
        let mut eps = endpoints(&peering, 3);
        eps[0].peer = Some(eps[1].id);
        eps[1].peer = Some(eps[0].id);

        Peering::update_peers(&mut eps);

        assert!(eps.iter().all(|e| e.peer.is_none()));
    }

    #[test]
    fn test_already_paired_endpoints_report_no_change() {
        let peering = Peering::new("active");
        let mut eps = endpoints(&peering, 2);
        Peering::update_peers(&mut eps);

        assert!(Peering::update_peers(&mut eps).is_empty());
    }
}
