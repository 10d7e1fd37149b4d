//! By-reference representations for every record and catalog kind.

use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::model::{
    AddressFamily, AutonomousSystem, CoreKind, Id, PeerEndpoint, PeerGroup, PeerGroupTemplate, PeeringRole,
    RecordKind, RoutingInstance,
};
use crate::serializers::representation::RenderContext;
use crate::store::{decode, Store};

/// Reference to a record, or a bare `{id, url}` when it no longer exists.
pub async fn record_ref<S: Store + ?Sized>(ctx: &mut RenderContext<'_, S>, kind: RecordKind, id: Id) -> Result<Value> {
    match ctx.load_record(kind, id).await? {
        Some(data) => brief(ctx, kind, &data).await,
        None => {
            log::warn!("Dangling reference to {} {}", kind, id);
            Ok(json!({ "id": id, "url": ctx.record_url(kind, id) }))
        }
    }
}

/// Reference to a host-application object.
pub async fn core_ref<S: Store + ?Sized>(ctx: &mut RenderContext<'_, S>, kind: CoreKind, id: Id) -> Result<Value> {
    let url = ctx.core_url(kind, id);
    match ctx.core_object(kind, id).await? {
        Some(object) => {
            let mut fields = Map::new();
            fields.insert("id".into(), json!(id));
            fields.insert("url".into(), json!(url));
            fields.insert("display".into(), json!(object.name));
            if let Some(slug) = object.slug {
                fields.insert("slug".into(), json!(slug));
            }
            Ok(Value::Object(fields))
        }
        None => {
            log::warn!("Dangling reference to {} {}", kind, id);
            Ok(json!({ "id": id, "url": url }))
        }
    }
}

/// By-reference representation of a stored record.
pub async fn brief<S: Store + ?Sized>(ctx: &mut RenderContext<'_, S>, kind: RecordKind, data: &Value) -> Result<Value> {
    let id: Id = decode_field(data, "id")?;
    let mut fields = Map::new();
    fields.insert("id".into(), json!(id));
    fields.insert("url".into(), json!(ctx.record_url(kind, id)));

    match kind {
        RecordKind::AutonomousSystem => {
            let asn: AutonomousSystem = decode(data.clone())?;
            fields.insert("display".into(), json!(format!("AS{}", asn.asn)));
            fields.insert("asn".into(), json!(asn.asn));
        }
        RecordKind::PeeringRole => {
            let role: PeeringRole = decode(data.clone())?;
            fields.insert("display".into(), json!(role.name));
            fields.insert("name".into(), json!(role.name));
            fields.insert("slug".into(), json!(role.slug));
        }
        RecordKind::PeerGroupTemplate => {
            let template: PeerGroupTemplate = decode(data.clone())?;
            fields.insert("display".into(), json!(template.name));
            fields.insert("name".into(), json!(template.name));
        }
        RecordKind::PeerGroup => {
            let group: PeerGroup = decode(data.clone())?;
            fields.insert("display".into(), json!(group.name));
            fields.insert("name".into(), json!(group.name));
        }
        RecordKind::PeerEndpoint => {
            let endpoint: PeerEndpoint = decode(data.clone())?;
            fields.insert("display".into(), json!(endpoint_display(ctx, &endpoint).await?));
        }
        RecordKind::Peering => {
            fields.insert("display".into(), json!(peering_display(ctx, id).await?));
        }
        RecordKind::RoutingInstance => {
            let instance: RoutingInstance = decode(data.clone())?;
            fields.insert("display".into(), json!(instance_display(ctx, &instance).await?));
        }
        RecordKind::AddressFamily => {
            let family: AddressFamily = decode(data.clone())?;
            let device = device_name(ctx, Some(family.routing_instance)).await?;
            let display = match device {
                Some(device) => format!("{} AF - {}", family.afi_safi.label(), device),
                None => format!("{} AF", family.afi_safi.label()),
            };
            fields.insert("display".into(), json!(display));
            fields.insert(
                "afi_safi".into(),
                json!({ "value": family.afi_safi.value(), "label": family.afi_safi.label() }),
            );
        }
    }

    Ok(Value::Object(fields))
}

fn decode_field<T: serde::de::DeserializeOwned>(data: &Value, field: &str) -> anyhow::Result<T> {
    let raw = data.get(field).cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(raw)?)
}

async fn device_name<S: Store + ?Sized>(
    ctx: &mut RenderContext<'_, S>,
    routing_instance: Option<Id>,
) -> anyhow::Result<Option<String>> {
    let Some(ri) = routing_instance else { return Ok(None) };
    let Some(data) = ctx.load_record(RecordKind::RoutingInstance, ri).await? else {
        return Ok(None);
    };
    let device: Id = decode_field(&data, "device")?;
    Ok(ctx.core_object(CoreKind::Device, device).await?.map(|d| d.name))
}

async fn endpoint_display<S: Store + ?Sized>(ctx: &mut RenderContext<'_, S>, endpoint: &PeerEndpoint) -> anyhow::Result<String> {
    let address = match endpoint.source_ip {
        Some(ip) => ctx.core_object(CoreKind::IpAddress, ip).await?.map(|o| o.name),
        None => None,
    };
    let device = device_name(ctx, endpoint.routing_instance).await?;

    Ok(match (address, device) {
        (Some(address), Some(device)) => format!("{} ({})", address, device),
        (Some(address), None) => address,
        (None, Some(device)) => device,
        (None, None) => format!("Endpoint {}", endpoint.id),
    })
}

async fn peering_display<S: Store + ?Sized>(ctx: &mut RenderContext<'_, S>, id: Id) -> anyhow::Result<String> {
    let mut sides = Vec::new();
    for data in ctx.referencing(RecordKind::PeerEndpoint, "peering", id).await? {
        let endpoint: PeerEndpoint = decode(data)?;
        sides.push(endpoint_display(ctx, &endpoint).await?);
    }
    if sides.is_empty() {
        return Ok(format!("Peering {}", id));
    }
    Ok(sides.join(" ↔ "))
}

async fn instance_display<S: Store + ?Sized>(ctx: &mut RenderContext<'_, S>, instance: &RoutingInstance) -> anyhow::Result<String> {
    let device = ctx
        .core_object(CoreKind::Device, instance.device)
        .await?
        .map(|d| d.name)
        .unwrap_or_else(|| instance.device.to_string());
    let asn = match instance.autonomous_system {
        Some(id) => ctx
            .load_record(RecordKind::AutonomousSystem, id)
            .await?
            .and_then(|data| data.get("asn").and_then(Value::as_u64)),
        None => None,
    };
    Ok(match asn {
        Some(asn) => format!("{} - AS{}", device, asn),
        None => device,
    })
}
