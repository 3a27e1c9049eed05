#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    Quit,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::PanUp => 0,
            InputAction::PanDown => 1,
            InputAction::PanLeft => 2,
            InputAction::PanRight => 3,
            InputAction::Quit => 4,
        }
    }
}

/// Digit keys pressed this frame, one bit per digit `0..=9`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HotkeySet(u16);

impl HotkeySet {
    pub fn insert(&mut self, digit: u8) {
        if digit <= 9 {
            self.0 |= 1 << digit;
        }
    }

    pub fn contains(self, digit: u8) -> bool {
        digit <= 9 && self.0 & (1 << digit) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Pressed digits in key order: 1 through 9, then 0.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 0]
            .into_iter()
            .filter(move |digit| self.contains(*digit))
    }
}
