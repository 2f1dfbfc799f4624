//! Purpose: Define the stable public surface of livescope.
//! Exports: Identifier conformance, scoped invocation, host seam types, and
//! the session glue operations (devices, clips, notes, observers).
//! Role: The one public path callers and bindings should import from.
//! Invariants: Raw acquire/release pairs are never part of this surface;
//! every host touch flows through `with_handle` or an observer lifecycle.

mod clips;
mod device;
mod notes;
mod observer;

pub use crate::core::error::{Error, ErrorKind, report};
pub use crate::core::ident::{
    COLLECTION_SEGMENTS, IdInput, PATH_ROOTS, canonicalize, index_after_segment, normalize_id,
    prefix_id, track_path_from_path,
};
pub use crate::core::scope::{with_handle, with_handle_named};
pub use crate::host::{
    Atom, HostApi, HostError, HostHandle, HostResult, ObserverCallback, TaskScheduler,
    atoms_to_input, defer, iterate_ids,
};
pub use clips::{
    add_notes_to_clip, create_clip_slot_for_track, create_midi_clip, create_scene_at_bottom,
    dump_notes_to_next_empty_clip, next_empty_clip_slot_id,
};
pub use device::{
    ParameterInfo, device_parameter_ids, device_parameter_infos, device_parameter_names,
    id_from_path, navigate_to_device, path_from_id, this_device_id, this_track_id,
};
pub use notes::{MAX_PITCH, MAX_VELOCITY, Note, NoteList};
pub use observer::PathObserver;
