//! Toolkit-agnostic controls.
//!
//! Subsystems register the controls they expose in a [`ControlRegistry`] and
//! remove them again when torn down. A UI layer renders whatever is
//! registered and reports user actions back as `DriverCommand`s.

use bevy::prelude::*;

use crate::scene::NONE;

/// Kind of a registered control.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Chooser,
    Button,
    Toggle,
    Slider,
    Text,
}

/// A registered control.
#[derive(Reflect, Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub id: String,
    pub label: String,
    pub kind: ControlKind,
}

/// Controls currently exposed, in registration order.
#[derive(Reflect, Debug, Clone, Default)]
pub struct ControlRegistry {
    controls: Vec<Control>,
}

impl ControlRegistry {
    /// Register a control. Re-registering an id replaces the old entry.
    pub fn register(&mut self, id: impl Into<String>, label: impl Into<String>, kind: ControlKind) {
        let control = Control {
            id: id.into(),
            label: label.into(),
            kind,
        };
        match self.controls.iter_mut().find(|c| c.id == control.id) {
            Some(existing) => *existing = control,
            None => self.controls.push(control),
        }
    }

    /// Remove a control. Returns whether it was registered.
    pub fn destroy(&mut self, id: &str) -> bool {
        let before = self.controls.len();
        self.controls.retain(|c| c.id != id);
        self.controls.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

/// A named list of choices with one selected value.
///
/// Setting the value here never runs selection logic; that happens in the
/// owner of the chooser, which then records the outcome with
/// [`Chooser::set_value`].
#[derive(Reflect, Debug, Clone, PartialEq, Eq)]
pub struct Chooser {
    pub key: String,
    pub label: String,
    choices: Vec<String>,
    value: String,
}

impl Chooser {
    pub fn new(key: impl Into<String>, label: impl Into<String>, choices: Vec<String>) -> Self {
        let value = choices.first().cloned().unwrap_or_else(|| NONE.to_owned());
        Self {
            key: key.into(),
            label: label.into(),
            choices,
            value,
        }
    }

    /// Chooser whose only choice is "None".
    pub fn empty(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, vec![NONE.to_owned()])
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn set_choices(&mut self, choices: Vec<String>) {
        self.choices = choices;
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn is_none(&self) -> bool {
        self.value == NONE
    }
}
