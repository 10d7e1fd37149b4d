use anyhow::Result;

use crate::logic::create_endpoint;
use crate::model::{
    AddressFamily, AfiSafi, AutonomousSystem, CoreKind, CoreObject, Id, PeerEndpoint, PeerGroup,
    PeerGroupTemplate, Peering, PeeringRole, RoutingInstance,
};
use crate::store::{CoreStore, RecordStoreExt, Store};

/// Status slugs offered to autonomous systems and peerings.
const STATUSES: &[(&str, &str)] = &[
    ("Active", "active"),
    ("Planned", "planned"),
    ("Provisioning", "provisioning"),
    ("Offline", "offline"),
    ("Decommissioning", "decommissioning"),
    ("Remote", "remote"),
];

/// Make sure every status slug exists. Existing statuses are left alone, so
/// this is safe to run on every start.
pub async fn load_statuses<S: Store + ?Sized>(store: &S) -> Result<()> {
    for (name, slug) in STATUSES {
        if store.find_status(slug).await?.is_none() {
            log::info!("Creating status {}", slug);
            store.upsert_core_object(CoreObject::status(*name, *slug)).await?;
        }
    }
    Ok(())
}

async fn core<S: Store + ?Sized>(store: &S, kind: CoreKind, name: &str) -> Result<Id> {
    let object = CoreObject::new(kind, name);
    let id = object.id;
    store.upsert_core_object(object).await?;
    Ok(id)
}

/// Demo topology: two routers in AS 65000 peering with each other over one
/// shared peer group template.
pub async fn load_seed_data<S: Store + ?Sized>(store: &S) -> Result<()> {
    let edge1 = core(store, CoreKind::Device, "edge1").await?;
    let edge2 = core(store, CoreKind::Device, "edge2").await?;
    let loopback1 = core(store, CoreKind::IpAddress, "10.0.0.1/32").await?;
    let loopback2 = core(store, CoreKind::IpAddress, "10.0.0.2/32").await?;
    let transit = core(store, CoreKind::Provider, "Transit Co").await?;
    let secret = core(store, CoreKind::Secret, "ibgp-md5").await?;

    let mut asn = AutonomousSystem::new(65000, "active");
    asn.description = "Internal backbone".to_string();
    asn.provider = Some(transit);
    store.save(&asn).await?;

    let role = PeeringRole::new("Internal", "internal", "2196f3");
    store.save(&role).await?;

    let mut template = PeerGroupTemplate::new("IBGP");
    template.role = Some(role.id);
    template.autonomous_system = Some(asn.id);
    template.secret = Some(secret);
    template.import_policy = "IBGP-IN".to_string();
    template.export_policy = "IBGP-OUT".to_string();
    template.extra_attributes = Some(serde_json::json!({ "bfd": { "enabled": true } }));
    store.save(&template).await?;

    let peering = Peering::new("active");
    store.save(&peering).await?;

    for (device, loopback) in [(edge1, loopback1), (edge2, loopback2)] {
        let mut instance = RoutingInstance::new(device);
        instance.router_id = Some(loopback);
        instance.autonomous_system = Some(asn.id);
        store.save(&instance).await?;

        store
            .save(&AddressFamily::new(AfiSafi::Ipv4Unicast, instance.id))
            .await?;

        let mut group = PeerGroup::new("IBGP", instance.id);
        group.template = Some(template.id);
        group.source_ip = Some(loopback);
        store.save(&group).await?;

        let mut endpoint = PeerEndpoint::new(peering.id);
        endpoint.routing_instance = Some(instance.id);
        endpoint.source_ip = Some(loopback);
        endpoint.peer_group = Some(group.id);
        create_endpoint(store, endpoint).await?;
    }

    log::info!("Seeded demo peering {} between edge1 and edge2", peering.id);
    Ok(())
}
