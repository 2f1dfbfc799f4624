//! Purpose: Device, track, and view operations over the scoped helper.
//! Exports: identity queries, view navigation, parameter enumeration.
//! Role: Glue over the host API; every host touch goes through `with_handle`.
//! Invariants: No raw acquire/release pairs; handles never outlive one call.

use std::collections::BTreeMap;

use crate::core::error::{Error, ErrorKind};
use crate::core::ident::{IdInput, normalize_id, track_path_from_path};
use crate::core::scope::with_handle_named;
use crate::host::{Atom, HostApi, HostHandle, iterate_ids};

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterInfo {
    pub id: u64,
    pub name: String,
    pub automation_state: i64,
}

/// ID of the object at `path`.
pub fn id_from_path<A: HostApi>(host: &A, path: &str) -> Result<u64, Error> {
    with_handle_named(host, path, "id_from_path", |object| Ok(object.id()))
}

/// Path of the object with the given ID.
pub fn path_from_id<A: HostApi>(host: &A, id: impl Into<IdInput>) -> Result<String, Error> {
    let id = normalize_id(&id.into())?;
    with_handle_named(host, id, "path_from_id", |object| Ok(object.path()))
}

/// ID of the device this script lives in.
pub fn this_device_id<A: HostApi>(host: &A) -> Result<u64, Error> {
    with_handle_named(host, "this_device", "this_device_id", |device| {
        Ok(device.id())
    })
}

/// ID of the track holding this script's device.
pub fn this_track_id<A: HostApi>(host: &A) -> Result<u64, Error> {
    let device_path = with_handle_named(host, "live_set this_device", "this_track_id", |device| {
        Ok(device.path())
    })?;
    let track_path = track_path_from_path(&device_path)?;
    with_handle_named(host, track_path.as_str(), "this_track_id", |track| {
        Ok(track.id())
    })
}

/// Focus the device-chain view and select the device.
pub fn navigate_to_device<A: HostApi>(host: &A, device_id: impl Into<IdInput>) -> Result<(), Error> {
    const METHOD: &str = "navigate_to_device";
    let id = normalize_id(&device_id.into())?;
    with_handle_named(host, "live_app view", METHOD, |view| {
        view.call("focus_view", &[Atom::from("Detail/DeviceChain")])?;
        Ok(())
    })?;
    with_handle_named(host, "live_set view", METHOD, |set_view| {
        set_view.call("select_device", &[Atom::from("id"), Atom::from(id)])?;
        Ok(())
    })
}

/// IDs of all parameters on a device, in host order.
pub fn device_parameter_ids<A: HostApi>(
    host: &A,
    device_id: impl Into<IdInput>,
) -> Result<Vec<u64>, Error> {
    let id = normalize_id(&device_id.into())?;
    let atoms = with_handle_named(host, id, "device_parameter_ids", |device| {
        Ok(device.get("parameters")?)
    })?;
    iterate_ids(&atoms, Ok)
}

/// Parameter name to ID, for callers addressing parameters symbolically.
/// Duplicate names keep the last occurrence, matching host enumeration order.
pub fn device_parameter_names<A: HostApi>(
    host: &A,
    device_id: impl Into<IdInput>,
) -> Result<BTreeMap<String, u64>, Error> {
    const METHOD: &str = "device_parameter_names";
    let mut names = BTreeMap::new();
    for id in device_parameter_ids(host, device_id)? {
        let name = with_handle_named(host, id, METHOD, |parameter| {
            first_sym(&parameter.get("name")?, "name", METHOD)
        })?;
        names.insert(name, id);
    }
    Ok(names)
}

/// Full parameter records: id, name, automation state.
pub fn device_parameter_infos<A: HostApi>(
    host: &A,
    device_id: impl Into<IdInput>,
) -> Result<Vec<ParameterInfo>, Error> {
    const METHOD: &str = "device_parameter_infos";
    let mut infos = Vec::new();
    for id in device_parameter_ids(host, device_id)? {
        let info = with_handle_named(host, id, METHOD, |parameter| {
            let name = first_sym(&parameter.get("name")?, "name", METHOD)?;
            let automation_state = first_int(&parameter.get("automation_state")?, METHOD)?;
            Ok(ParameterInfo {
                id,
                name,
                automation_state,
            })
        })?;
        infos.push(info);
    }
    Ok(infos)
}

fn first_sym(atoms: &[Atom], property: &str, method: &str) -> Result<String, Error> {
    atoms
        .first()
        .and_then(Atom::as_sym)
        .map(str::to_string)
        .ok_or_else(|| {
            Error::new(ErrorKind::DeviceOperation)
                .with_message("host returned no symbol for property")
                .with_method(method)
                .with_context("property", property)
        })
}

fn first_int(atoms: &[Atom], method: &str) -> Result<i64, Error> {
    atoms.first().and_then(Atom::as_i64).ok_or_else(|| {
        Error::new(ErrorKind::DeviceOperation)
            .with_message("host returned no numeric value")
            .with_method(method)
    })
}
