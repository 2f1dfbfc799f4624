//! Purpose: Clip, clip-slot, and scene operations over the scoped helper.
//! Exports: clip creation, note insertion, empty-slot search, scene creation.
//! Role: Glue over the host API; call sequencing mirrors the host's session model.
//! Invariants: Tracks must report `has_midi_input` before any MIDI clip work.
//! Invariants: Fail-loud; no operation returns a sentinel in place of an error.

use crate::core::error::{Error, ErrorKind};
use crate::core::ident::{IdInput, normalize_id};
use crate::core::scope::with_handle_named;
use crate::host::{Atom, HostApi, HostHandle, atoms_to_input, iterate_ids};

use super::device::path_from_id;
use super::notes::NoteList;

/// Create an empty MIDI clip of `length` beats in the given clip slot and
/// return the new clip's ID. The clip's loop end is pinned to its length.
pub fn create_midi_clip<A: HostApi>(
    host: &A,
    length: f64,
    slot: impl Into<IdInput>,
) -> Result<u64, Error> {
    const METHOD: &str = "create_midi_clip";
    if !length.is_finite() || length <= 0.0 {
        return Err(Error::new(ErrorKind::Validation)
            .with_message("clip length must be a positive number of beats")
            .with_method(METHOD)
            .with_received(length));
    }
    let slot_id = normalize_id(&slot.into())?;
    let clip_ref = with_handle_named(host, slot_id, METHOD, |slot| {
        slot.call("create_clip", &[Atom::Float(length)])?;
        Ok(slot.get("clip")?)
    })?;
    let clip_id = normalize_id(&atoms_to_input(&clip_ref))?;
    with_handle_named(host, clip_id, METHOD, |clip| {
        clip.set("loop_end", &[Atom::Float(length)])?;
        Ok(())
    })?;
    Ok(clip_id)
}

/// Insert notes into an existing MIDI clip via the host's dict-taking call.
pub fn add_notes_to_clip<A: HostApi>(
    host: &A,
    clip: impl Into<IdInput>,
    notes: &NoteList,
) -> Result<(), Error> {
    const METHOD: &str = "add_notes_to_clip";
    notes.validate()?;
    let clip_id = normalize_id(&clip.into())?;
    let payload = serde_json::to_value(notes).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode notes payload")
            .with_method(METHOD)
            .with_source(err)
    })?;
    let count = notes.notes.len();
    with_handle_named(host, clip_id, METHOD, |clip| {
        clip.call_dict("add_new_notes", &payload)
            .map_err(|err| Error::from(err).with_context("notes_count", count))?;
        Ok(())
    })
}

/// ID of the first empty clip slot on a track, scanning from `start_index`.
/// `None` when every slot holds a clip.
pub fn next_empty_clip_slot_id<A: HostApi>(
    host: &A,
    track: impl Into<IdInput>,
    start_index: usize,
) -> Result<Option<u64>, Error> {
    const METHOD: &str = "next_empty_clip_slot_id";
    let track_id = normalize_id(&track.into())?;
    let slots = with_handle_named(host, track_id, METHOD, |track| {
        require_midi_input(track, track_id, METHOD)?;
        Ok(track.get("clip_slots")?)
    })?;
    let slot_ids = iterate_ids(&slots, Ok)?;
    for &slot_id in slot_ids.iter().skip(start_index) {
        let has_clip = with_handle_named(host, slot_id, METHOD, |slot| {
            let atoms = slot.get("has_clip")?;
            Ok(atoms.first().and_then(Atom::as_i64).unwrap_or(0))
        })?;
        if has_clip == 0 {
            return Ok(Some(slot_id));
        }
    }
    Ok(None)
}

/// Append a scene at the bottom of the scene list; returns its index.
pub fn create_scene_at_bottom<A: HostApi>(host: &A) -> Result<usize, Error> {
    const METHOD: &str = "create_scene_at_bottom";
    with_handle_named(host, "live_set", METHOD, |song| {
        song.call("create_scene", &[Atom::Int(-1)])?;
        let scenes = song.get("scenes")?;
        let count = iterate_ids(&scenes, Ok)?.len();
        Ok(count.saturating_sub(1))
    })
}

/// Create a fresh empty clip slot on a track by appending a scene, and
/// return the new slot's ID.
pub fn create_clip_slot_for_track<A: HostApi>(
    host: &A,
    track: impl Into<IdInput>,
) -> Result<u64, Error> {
    const METHOD: &str = "create_clip_slot_for_track";
    let track_id = normalize_id(&track.into())?;
    with_handle_named(host, track_id, METHOD, |track| {
        require_midi_input(track, track_id, METHOD)
    })?;
    let scene_index = create_scene_at_bottom(host)?;
    let track_path = path_from_id(host, track_id)?;
    let slot_path = format!("{track_path} clip_slots {scene_index}");
    with_handle_named(host, slot_path.as_str(), METHOD, |slot| Ok(slot.id()))
}

/// Insert notes into the next empty clip slot on a track, creating a scene
/// when none is free. Returns the new clip's ID.
///
/// `length` overrides the computed clip length when given.
pub fn dump_notes_to_next_empty_clip<A: HostApi>(
    host: &A,
    track: impl Into<IdInput>,
    notes: &NoteList,
    length: Option<f64>,
) -> Result<u64, Error> {
    let track_id = normalize_id(&track.into())?;
    notes.validate()?;
    let slot_id = match next_empty_clip_slot_id(host, track_id, 0)? {
        Some(id) => id,
        None => create_clip_slot_for_track(host, track_id)?,
    };
    let clip_length = length.unwrap_or_else(|| notes.clip_length());
    let clip_id = create_midi_clip(host, clip_length, slot_id)?;
    add_notes_to_clip(host, clip_id, notes)?;
    Ok(clip_id)
}

fn require_midi_input<H: HostHandle>(
    track: &H,
    track_id: u64,
    method: &str,
) -> Result<(), Error> {
    let atoms = track.get("has_midi_input")?;
    let has_midi = atoms.first().and_then(Atom::as_i64).unwrap_or(0) != 0;
    if has_midi {
        return Ok(());
    }
    Err(Error::new(ErrorKind::TrackOperation)
        .with_message("track cannot hold MIDI clips")
        .with_method(method)
        .with_context("track_id", track_id))
}
