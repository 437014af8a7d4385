//! Coalescing input buffer for one session.
//!
//! Holds at most one pending action. A newer action overwrites an unconsumed
//! older one, so a burst of button presses between two ticks collapses into
//! the last press. The tick loop drains it once per tick and hands the action
//! to the game rules, which decide what it means for the current state.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::game::InputAction;

#[derive(Debug, Clone, Default)]
pub struct InputChannel {
    slot: Arc<Mutex<Option<InputAction>>>,
}

impl InputChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `action`, returning whatever unconsumed action it replaced.
    pub fn push(&self, action: InputAction) -> Option<InputAction> {
        self.slot.lock().replace(action)
    }

    /// Take the pending action, leaving the buffer empty.
    pub fn take(&self) -> Option<InputAction> {
        self.slot.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::game::Direction;

    #[test]
    fn newest_action_wins() {
        let input = InputChannel::new();
        assert_eq!(input.push(InputAction::Direction(Direction::UP)), None);
        assert_eq!(
            input.push(InputAction::Direction(Direction::LEFT)),
            Some(InputAction::Direction(Direction::UP))
        );

        assert_eq!(input.take(), Some(InputAction::Direction(Direction::LEFT)));
        assert_eq!(input.take(), None);
        assert!(input.is_empty());
    }

    #[test]
    fn clones_share_the_slot() {
        let input = InputChannel::new();
        let sender = input.clone();
        sender.push(InputAction::Jump);
        sender.push(InputAction::Jump);
        assert_eq!(input.take(), Some(InputAction::Jump));
        assert!(sender.is_empty());
    }
}
