// Scripted in-process stand-in for the host object API. Tracks every
// acquisition, release, call, and dict call so contract tests can assert
// on lifecycle behavior, and simulates just enough of the session model
// (scenes, clip slots, clips) for the glue operations to run end to end.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use livescope::api::{Atom, HostApi, HostError, HostHandle, HostResult, ObserverCallback};

#[derive(Default)]
pub struct LiveModel {
    next_id: u64,
    objects: HashMap<u64, ObjectState>,
    aliases: HashMap<String, u64>,
    scene_count: usize,
    pub acquires: Vec<String>,
    pub releases: Vec<u64>,
    pub calls: Vec<(String, String, Vec<Atom>)>,
    pub dict_calls: Vec<(String, String, serde_json::Value)>,
    observers: HashMap<u64, ObserverCallback>,
}

pub struct ObjectState {
    pub id: u64,
    pub path: String,
    pub props: HashMap<String, Vec<Atom>>,
}

pub struct FakeLive {
    model: Rc<RefCell<LiveModel>>,
}

impl FakeLive {
    pub fn new() -> Self {
        Self {
            model: Rc::new(RefCell::new(LiveModel::default())),
        }
    }

    /// Register an object at `path` with the given properties; returns its ID.
    pub fn add_object(&self, path: &str, props: &[(&str, Vec<Atom>)]) -> u64 {
        let mut model = self.model.borrow_mut();
        model.add_object(path, props)
    }

    /// Make `alias` resolve to the object currently registered at `path`.
    pub fn alias(&self, alias: &str, path: &str) {
        let mut model = self.model.borrow_mut();
        let id = model.aliases[path];
        model.aliases.insert(alias.to_string(), id);
    }

    pub fn prop(&self, id: u64, name: &str) -> Option<Vec<Atom>> {
        self.model.borrow().objects.get(&id)?.props.get(name).cloned()
    }

    pub fn acquires(&self) -> Vec<String> {
        self.model.borrow().acquires.clone()
    }

    pub fn release_count(&self) -> usize {
        self.model.borrow().releases.len()
    }

    pub fn calls(&self) -> Vec<(String, String, Vec<Atom>)> {
        self.model.borrow().calls.clone()
    }

    pub fn dict_calls(&self) -> Vec<(String, String, serde_json::Value)> {
        self.model.borrow().dict_calls.clone()
    }

    pub fn scene_count(&self) -> usize {
        self.model.borrow().scene_count
    }

    /// Every acquired handle was released, and none was released twice.
    pub fn assert_balanced(&self) {
        let model = self.model.borrow();
        assert_eq!(
            model.acquires.len(),
            model.releases.len(),
            "acquire/release imbalance: {:?} vs {:?}",
            model.acquires,
            model.releases
        );
    }

    /// Deliver a change notification to the observer attached at `path`.
    pub fn fire(&self, path: &str, atoms: &[Atom]) {
        let callback = {
            let mut model = self.model.borrow_mut();
            let id = model.aliases[path];
            model.observers.remove(&id)
        };
        if let Some(mut callback) = callback {
            callback(atoms);
            let mut model = self.model.borrow_mut();
            let id = model.aliases[path];
            if model.objects.contains_key(&id) {
                model.observers.insert(id, callback);
            }
        }
    }

    pub fn observer_attached(&self, path: &str) -> bool {
        let model = self.model.borrow();
        match model.aliases.get(path) {
            Some(id) => model.observers.contains_key(id),
            None => false,
        }
    }
}

impl LiveModel {
    fn add_object(&mut self, path: &str, props: &[(&str, Vec<Atom>)]) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        let props = props
            .iter()
            .map(|(name, atoms)| (name.to_string(), atoms.clone()))
            .collect();
        self.objects.insert(
            id,
            ObjectState {
                id,
                path: path.to_string(),
                props,
            },
        );
        self.aliases.insert(path.to_string(), id);
        id
    }

    fn resolve(&self, target: &str) -> Option<u64> {
        if let Some(rest) = target.strip_prefix("id ") {
            let id: u64 = rest.trim().parse().ok()?;
            return self.objects.contains_key(&id).then_some(id);
        }
        self.aliases.get(target).copied()
    }

    fn track_paths(&self) -> Vec<(u64, String)> {
        let mut tracks: Vec<(u64, String)> = self
            .objects
            .values()
            .filter(|object| {
                let tokens: Vec<&str> = object.path.split_whitespace().collect();
                tokens.len() == 3 && tokens[0] == "live_set" && tokens[1] == "tracks"
            })
            .map(|object| (object.id, object.path.clone()))
            .collect();
        tracks.sort_by(|a, b| a.1.cmp(&b.1));
        tracks
    }

    fn create_scene(&mut self) {
        let index = self.scene_count;
        self.scene_count += 1;
        let scene_id = self.add_object(&format!("live_set scenes {index}"), &[]);
        if let Some(&song_id) = self.aliases.get("live_set") {
            if let Some(song) = self.objects.get_mut(&song_id) {
                let scenes = song.props.entry("scenes".to_string()).or_default();
                scenes.push(Atom::Sym("id".into()));
                scenes.push(Atom::Int(scene_id as i64));
            }
        }
        for (track_id, track_path) in self.track_paths() {
            let slot_path = format!("{track_path} clip_slots {index}");
            let slot_id = self.add_object(&slot_path, &[("has_clip", vec![Atom::Int(0)])]);
            if let Some(track) = self.objects.get_mut(&track_id) {
                let slots = track.props.entry("clip_slots".to_string()).or_default();
                slots.push(Atom::Sym("id".into()));
                slots.push(Atom::Int(slot_id as i64));
            }
        }
    }

    fn create_clip(&mut self, slot_id: u64) {
        let slot_path = self.objects[&slot_id].path.clone();
        let clip_id = self.add_object(&format!("{slot_path} clip"), &[]);
        if let Some(slot) = self.objects.get_mut(&slot_id) {
            slot.props
                .insert("has_clip".to_string(), vec![Atom::Int(1)]);
            slot.props.insert(
                "clip".to_string(),
                vec![Atom::Sym("id".into()), Atom::Int(clip_id as i64)],
            );
        }
    }
}

pub struct FakeHandle {
    id: u64,
    model: Rc<RefCell<LiveModel>>,
    released: bool,
}

impl HostHandle for FakeHandle {
    fn id(&self) -> u64 {
        self.id
    }

    fn path(&self) -> String {
        self.model.borrow().objects[&self.id].path.clone()
    }

    fn get(&self, property: &str) -> HostResult<Vec<Atom>> {
        assert!(!self.released, "get on released handle");
        let model = self.model.borrow();
        let object = &model.objects[&self.id];
        object
            .props
            .get(property)
            .cloned()
            .ok_or_else(|| HostError::new(format!("no property {property} on {}", object.path)))
    }

    fn set(&mut self, property: &str, value: &[Atom]) -> HostResult<()> {
        assert!(!self.released, "set on released handle");
        let mut model = self.model.borrow_mut();
        let id = self.id;
        if let Some(object) = model.objects.get_mut(&id) {
            object.props.insert(property.to_string(), value.to_vec());
        }
        Ok(())
    }

    fn call(&mut self, method: &str, args: &[Atom]) -> HostResult<Vec<Atom>> {
        assert!(!self.released, "call on released handle");
        let mut model = self.model.borrow_mut();
        let path = model.objects[&self.id].path.clone();
        model
            .calls
            .push((path.clone(), method.to_string(), args.to_vec()));
        match method {
            "create_scene" if path == "live_set" => model.create_scene(),
            "create_clip" => {
                let slot_id = self.id;
                model.create_clip(slot_id);
            }
            _ => {}
        }
        Ok(Vec::new())
    }

    fn call_dict(&mut self, method: &str, payload: &serde_json::Value) -> HostResult<Vec<Atom>> {
        assert!(!self.released, "call_dict on released handle");
        let mut model = self.model.borrow_mut();
        let path = model.objects[&self.id].path.clone();
        model
            .dict_calls
            .push((path, method.to_string(), payload.clone()));
        Ok(Vec::new())
    }

    fn release(&mut self) {
        assert!(!self.released, "double release of handle {}", self.id);
        self.released = true;
        let mut model = self.model.borrow_mut();
        let id = self.id;
        model.releases.push(id);
        model.observers.remove(&id);
    }
}

impl HostApi for FakeLive {
    type Handle = FakeHandle;

    fn acquire(&self, target: &str) -> HostResult<Self::Handle> {
        let mut model = self.model.borrow_mut();
        model.acquires.push(target.to_string());
        let id = model
            .resolve(target)
            .ok_or_else(|| HostError::new(format!("no object for {target}")))?;
        Ok(FakeHandle {
            id,
            model: Rc::clone(&self.model),
            released: false,
        })
    }

    fn observe(&self, path: &str, callback: ObserverCallback) -> HostResult<Self::Handle> {
        let mut model = self.model.borrow_mut();
        model.acquires.push(path.to_string());
        let id = model
            .resolve(path)
            .ok_or_else(|| HostError::new(format!("no object for {path}")))?;
        model.observers.insert(id, callback);
        Ok(FakeHandle {
            id,
            model: Rc::clone(&self.model),
            released: false,
        })
    }
}

/// Standard scaffolding: a song with two scenes and one MIDI track whose
/// first slot is occupied and second is free.
pub fn seed_session(live: &FakeLive) -> Session {
    let song = live.add_object("live_set", &[("tempo", vec![Atom::Float(120.0)])]);
    let track = live.add_object(
        "live_set tracks 0",
        &[("has_midi_input", vec![Atom::Int(1)])],
    );
    let slot0 = live.add_object(
        "live_set tracks 0 clip_slots 0",
        &[("has_clip", vec![Atom::Int(1)])],
    );
    let slot1 = live.add_object(
        "live_set tracks 0 clip_slots 1",
        &[("has_clip", vec![Atom::Int(0)])],
    );
    {
        let mut model = live.model.borrow_mut();
        model.scene_count = 2;
        model.add_object("live_set scenes 0", &[]);
        model.add_object("live_set scenes 1", &[]);
    }
    let scenes = {
        let model = live.model.borrow();
        let s0 = model.aliases["live_set scenes 0"];
        let s1 = model.aliases["live_set scenes 1"];
        vec![
            Atom::Sym("id".into()),
            Atom::Int(s0 as i64),
            Atom::Sym("id".into()),
            Atom::Int(s1 as i64),
        ]
    };
    {
        let mut model = live.model.borrow_mut();
        if let Some(object) = model.objects.get_mut(&song) {
            object.props.insert("scenes".to_string(), scenes);
        }
        if let Some(object) = model.objects.get_mut(&track) {
            object.props.insert(
                "clip_slots".to_string(),
                vec![
                    Atom::Sym("id".into()),
                    Atom::Int(slot0 as i64),
                    Atom::Sym("id".into()),
                    Atom::Int(slot1 as i64),
                ],
            );
        }
    }
    Session {
        song,
        track,
        slot0,
        slot1,
    }
}

pub struct Session {
    pub song: u64,
    pub track: u64,
    pub slot0: u64,
    pub slot1: u64,
}

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
