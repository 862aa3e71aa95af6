use std::path::Path;

use anyhow::Context as _;
use serde::{Serialize, de::DeserializeOwned};

use crate::foundation::error::BlackboxResult;

/// A named settings snapshot.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset<T> {
    pub name: String,
    pub content: T,
    /// System presets are not edited in place by users.
    #[serde(default)]
    pub system: bool,
    /// Name of the preset this one was copied from.
    #[serde(default)]
    pub based_on: Option<String>,
}

impl<T> Preset<T> {
    pub fn user(name: impl Into<String>, content: T) -> Self {
        Self {
            name: name.into(),
            content,
            system: false,
            based_on: None,
        }
    }

    pub fn system(name: impl Into<String>, content: T) -> Self {
        Self {
            system: true,
            ..Self::user(name, content)
        }
    }
}

/// Serialized form of a preset collection.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct SavedPresets<T> {
    pub presets: Vec<Preset<T>>,
    #[serde(default)]
    pub active: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresetEvent {
    /// The active selection changed, or the active preset's content or name did.
    ActivePresetChanged(Option<String>),
    /// Any change to the collection.
    Changed,
}

type Subscriber = Box<dyn FnMut(&PresetEvent) + Send>;
type Validator<T> = Box<dyn Fn(&mut T) + Send>;

/// Named presets with one active selection and change notifications.
///
/// Subscribers run synchronously, in subscription order.
pub struct Presets<T> {
    presets: Vec<Preset<T>>,
    active: Option<usize>,
    subscribers: Vec<Subscriber>,
    validator: Option<Validator<T>>,
}

impl<T> Default for Presets<T> {
    fn default() -> Self {
        Self {
            presets: Vec::new(),
            active: None,
            subscribers: Vec::new(),
            validator: None,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Presets<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presets")
            .field("presets", &self.presets)
            .field("active", &self.active_name())
            .finish()
    }
}

impl<T> Presets<T> {
    pub fn count(&self) -> usize {
        self.presets.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset<T>> {
        self.presets.iter()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.presets.iter().position(|p| p.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Preset<T>> {
        self.position(name).map(|i| &self.presets[i])
    }

    pub fn active(&self) -> Option<&Preset<T>> {
        self.active.and_then(|i| self.presets.get(i))
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active().map(|p| p.name.as_str())
    }

    pub fn active_content(&self) -> Option<&T> {
        self.active().map(|p| &p.content)
    }
}

impl<T: Clone> Presets<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `validator` over every preset's content as it is added or updated.
    pub fn with_validator(mut self, validator: impl Fn(&mut T) + Send + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&PresetEvent) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn emit(&mut self, event: PresetEvent) {
        for sub in &mut self.subscribers {
            sub(&event);
        }
    }

    fn emit_active(&mut self) {
        let name = self.active_name().map(str::to_string);
        self.emit(PresetEvent::ActivePresetChanged(name));
    }

    fn validate(&self, content: &mut T) {
        if let Some(v) = &self.validator {
            v(content);
        }
    }

    /// Add a preset. A name collision updates the existing preset instead.
    ///
    /// The first preset added becomes active.
    pub fn add(&mut self, mut preset: Preset<T>) {
        if self.position(&preset.name).is_some() {
            let system = preset.system;
            self.update_settings(Some(&preset.name.clone()), preset.content, system);
            return;
        }
        self.validate(&mut preset.content);
        self.presets.push(preset);
        if self.active.is_none() {
            self.active = Some(self.presets.len() - 1);
            self.emit_active();
        }
        self.emit(PresetEvent::Changed);
    }

    /// `name`, or the first free name in its `"<base> copy"`, `"<base> copy 2"`, ... series.
    pub fn unique_name(&self, name: &str) -> String {
        let (base, mut copies_seen) = split_copy_suffix(name);
        let mut candidate = name.to_string();
        while self.position(&candidate).is_some() {
            copies_seen += 1;
            candidate = if copies_seen == 1 {
                format!("{base} copy")
            } else {
                format!("{base} copy {copies_seen}")
            };
        }
        candidate
    }

    /// Copy `name` (or the active preset) as a user preset, activating the copy when the
    /// original was active. Returns the copy's name.
    pub fn duplicate(&mut self, name: Option<&str>) -> Option<String> {
        let index = match name {
            Some(n) => self.position(n)?,
            None => self.active?,
        };
        let original = &self.presets[index];
        let copy = Preset {
            name: self.unique_name(&original.name),
            content: original.content.clone(),
            system: false,
            based_on: Some(original.name.clone()),
        };
        let copy_name = copy.name.clone();
        self.add(copy);
        if self.active == Some(index) {
            self.activate(&copy_name);
        }
        Some(copy_name)
    }

    pub fn activate(&mut self, name: &str) {
        let Some(index) = self.position(name) else {
            return;
        };
        if self.active != Some(index) {
            self.active = Some(index);
            self.emit_active();
        }
    }

    /// Replace a preset's content, adding it when no preset has that name.
    ///
    /// A user edit of a system preset lands on a fresh user copy. A system write over a user
    /// preset first moves the user's version aside under a copy name.
    pub fn update_settings(&mut self, name: Option<&str>, mut content: T, by_system: bool) {
        let index = match name {
            Some(n) => self.position(n),
            None => self.active,
        };
        let Some(index) = index else {
            match name {
                Some(n) => self.add(Preset {
                    name: n.to_string(),
                    content,
                    system: by_system,
                    based_on: None,
                }),
                None => tracing::debug!("no active preset to update"),
            }
            return;
        };

        let system = self.presets[index].system;
        if system && !by_system {
            if let Some(copy) = self.duplicate(Some(&self.presets[index].name.clone())) {
                self.update_settings(Some(&copy), content, by_system);
            }
            return;
        }
        if !system && by_system {
            self.duplicate(Some(&self.presets[index].name.clone()));
        }

        self.validate(&mut content);
        let preset = &mut self.presets[index];
        preset.content = content;
        preset.system = by_system;
        if self.active == Some(index) {
            self.emit_active();
        }
        self.emit(PresetEvent::Changed);
    }

    /// Rename the active preset, made unique against the others.
    pub fn rename(&mut self, name: &str) {
        let Some(index) = self.active else {
            return;
        };
        if self.presets[index].name == name {
            return;
        }
        let new_name = self.unique_name(name);
        let old_name = std::mem::replace(&mut self.presets[index].name, new_name.clone());
        for p in &mut self.presets {
            if p.based_on.as_deref() == Some(old_name.as_str()) {
                p.based_on = Some(new_name.clone());
            }
        }
        self.emit_active();
        self.emit(PresetEvent::Changed);
    }

    /// Remove the active preset; the preset now at its index (or the new last one) becomes active.
    pub fn remove(&mut self) {
        let Some(index) = self.active else {
            return;
        };
        self.presets.remove(index);
        self.active = if self.presets.is_empty() {
            None
        } else {
            Some(index.min(self.presets.len() - 1))
        };
        self.emit_active();
        self.emit(PresetEvent::Changed);
    }

    pub fn to_saved(&self, include_system: bool) -> SavedPresets<T> {
        SavedPresets {
            presets: self
                .presets
                .iter()
                .filter(|p| include_system || !p.system)
                .cloned()
                .collect(),
            active: self.active_name().map(str::to_string),
        }
    }

    /// Merge saved presets in, then restore the saved active selection if it exists.
    pub fn load_saved(&mut self, saved: SavedPresets<T>, include_system: bool) {
        for preset in saved.presets {
            if include_system || !preset.system {
                self.add(preset);
            }
        }
        if let Some(active) = saved.active {
            self.activate(&active);
        }
    }
}

impl<T: Clone + Serialize + DeserializeOwned> Presets<T> {
    pub fn to_json_string(&self, include_system: bool) -> BlackboxResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_saved(include_system))?)
    }

    pub fn load_json_str(&mut self, s: &str, include_system: bool) -> BlackboxResult<()> {
        let saved: SavedPresets<T> = serde_json::from_str(s)?;
        self.load_saved(saved, include_system);
        Ok(())
    }

    pub fn save(&self, path: &Path, include_system: bool) -> BlackboxResult<()> {
        let text = self.to_json_string(include_system)?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write presets '{}'", path.display()))?;
        Ok(())
    }

    pub fn load(&mut self, path: &Path, include_system: bool) -> BlackboxResult<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read presets '{}'", path.display()))?;
        self.load_json_str(&text, include_system)
    }
}

/// Split `"<base> copy"` / `"<base> copy <n>"` into the base and the copies already seen.
fn split_copy_suffix(name: &str) -> (&str, u32) {
    if let Some(base) = name.strip_suffix(" copy") {
        return (base, 1);
    }
    if let Some((base, n)) = name.rsplit_once(" copy ")
        && !n.is_empty()
        && n.bytes().all(|b| b.is_ascii_digit())
        && let Ok(n) = n.parse()
    {
        return (base, n);
    }
    (name, 0)
}

#[cfg(test)]
#[path = "../../tests/unit/config/presets.rs"]
mod tests;
