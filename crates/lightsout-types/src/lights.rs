//! The five-light start gantry.
//!
//! Lights come on strictly left to right, one at a time, and all go out
//! together. [`LightSequence`] enforces that ordering: the only light that
//! may be lit next is the one immediately after the last lit light.

use serde::{Deserialize, Serialize};

use crate::enums::LightState;

/// Number of lights on the gantry.
pub const LIGHT_COUNT: usize = 5;

/// Errors raised when the lighting order would be broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LightSequenceError {
    /// The requested light is not the next one in order.
    #[error("light {requested} cannot be lit; next light in order is {expected}")]
    OutOfOrder {
        /// The index the caller tried to light.
        requested: usize,
        /// The index that must be lit next ([`LIGHT_COUNT`] once all are lit).
        expected: usize,
    },
}

/// Ordered row of start lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightSequence {
    slots: [LightState; LIGHT_COUNT],
}

impl LightSequence {
    /// A gantry with every light unlit.
    pub const fn new() -> Self {
        Self {
            slots: [LightState::Unlit; LIGHT_COUNT],
        }
    }

    /// Number of lights currently lit.
    ///
    /// Because lights are lit in order, this is also the index of the next
    /// light to come on.
    pub fn lit_count(&self) -> usize {
        self.slots
            .iter()
            .take_while(|slot| **slot == LightState::Lit)
            .count()
    }

    /// Light the slot at `index`, which must be the next one in order.
    ///
    /// # Errors
    ///
    /// Returns [`LightSequenceError::OutOfOrder`] if `index` is not equal to
    /// [`lit_count`](Self::lit_count).
    pub fn light(&mut self, index: usize) -> Result<(), LightSequenceError> {
        let expected = self.lit_count();
        if index != expected {
            return Err(LightSequenceError::OutOfOrder {
                requested: index,
                expected,
            });
        }
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(LightSequenceError::OutOfOrder {
                requested: index,
                expected,
            })?;
        *slot = LightState::Lit;
        Ok(())
    }

    /// Turn every light off at once.
    pub fn extinguish_all(&mut self) {
        self.slots = [LightState::Unlit; LIGHT_COUNT];
    }

    /// Whether all lights are on.
    pub fn is_fully_lit(&self) -> bool {
        self.lit_count() == LIGHT_COUNT
    }

    /// Whether all lights are off.
    pub fn is_dark(&self) -> bool {
        self.slots.iter().all(|slot| *slot == LightState::Unlit)
    }

    /// The individual light states, left to right.
    pub const fn slots(&self) -> &[LightState; LIGHT_COUNT] {
        &self.slots
    }
}
