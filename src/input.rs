//! Input routing
//!
//! Raw pointer and touch events (already converted to play-field meters,
//! relative to the center) become per-slot aim and drop commands. Each touch
//! is bound to the slot it started in for its lifetime; the mouse drives any
//! slot not currently held by a touch.

use std::collections::HashMap;

use crate::sim::SlotLayout;

/// Platform-independent input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f32, y: f32 },
    PointerDown { x: f32, y: f32 },
    TouchStart { id: i32, x: f32, y: f32 },
    TouchMove { id: i32, x: f32, y: f32 },
    TouchEnd { id: i32, x: f32, y: f32 },
    /// The system took the touch over; frees its slot without dropping
    TouchCancel { id: i32 },
    /// Keyboard: every slot drops at once
    DropAll,
}

/// Command for one slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotCommand {
    Aim { slot: usize, x: f32, y: f32 },
    Drop { slot: usize },
}

/// Tracks which touch owns which slot
#[derive(Debug, Clone)]
pub struct InputRouter {
    touches: HashMap<i32, usize>,
    owners: Vec<Option<i32>>,
}

impl InputRouter {
    pub fn new(num_slots: usize) -> Self {
        Self {
            touches: HashMap::new(),
            owners: vec![None; num_slots],
        }
    }

    /// Slot currently captured by a touch
    pub fn touch_slot(&self, id: i32) -> Option<usize> {
        self.touches.get(&id).copied()
    }

    /// Translate one event into slot commands
    pub fn route(&mut self, event: InputEvent, layout: &SlotLayout, commands: &mut Vec<SlotCommand>) {
        match event {
            InputEvent::PointerMove { x, y } => {
                if let Some(slot) = self.mouse_slot(layout, x, y) {
                    commands.push(SlotCommand::Aim { slot, x, y });
                }
            }
            InputEvent::PointerDown { x, y } => {
                if let Some(slot) = self.mouse_slot(layout, x, y) {
                    commands.push(SlotCommand::Aim { slot, x, y });
                    commands.push(SlotCommand::Drop { slot });
                }
            }
            InputEvent::TouchStart { id, x, y } => {
                if self.touches.contains_key(&id) {
                    return;
                }
                let Some(slot) = layout.slot_containing(x, y) else {
                    return;
                };
                if self.owners[slot].is_some() {
                    return;
                }
                self.owners[slot] = Some(id);
                self.touches.insert(id, slot);
                commands.push(SlotCommand::Aim { slot, x, y });
            }
            InputEvent::TouchMove { id, x, y } => {
                if let Some(slot) = self.touch_slot(id) {
                    commands.push(SlotCommand::Aim { slot, x, y });
                }
            }
            InputEvent::TouchEnd { id, x, y } => {
                if let Some(slot) = self.touches.remove(&id) {
                    self.owners[slot] = None;
                    commands.push(SlotCommand::Aim { slot, x, y });
                    commands.push(SlotCommand::Drop { slot });
                }
            }
            InputEvent::TouchCancel { id } => {
                if let Some(slot) = self.touches.remove(&id) {
                    self.owners[slot] = None;
                }
            }
            InputEvent::DropAll => {
                commands.extend((0..self.owners.len()).map(|slot| SlotCommand::Drop { slot }));
            }
        }
    }

    fn mouse_slot(&self, layout: &SlotLayout, x: f32, y: f32) -> Option<usize> {
        layout
            .slot_containing(x, y)
            .filter(|&slot| self.owners[slot].is_none())
    }
}

/// Live registration of input listeners
///
/// Released exactly once: explicitly through [`InputSubscription::release`]
/// or when dropped.
pub struct InputSubscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl InputSubscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn release(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for InputSubscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for InputSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSubscription")
            .field("attached", &self.release.is_some())
            .finish()
    }
}
