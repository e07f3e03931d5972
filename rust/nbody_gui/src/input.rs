use winit::{
    event::MouseButton as WinitMouseButton,
    keyboard::{Key as WinitKey, ModifiersState, NamedKey},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Home,
    Char(char),
}

impl Key {
    pub fn from_winit(key: &WinitKey) -> Option<Self> {
        match key {
            WinitKey::Named(named) => match named {
                NamedKey::ArrowLeft => Some(Self::Left),
                NamedKey::ArrowRight => Some(Self::Right),
                NamedKey::ArrowUp => Some(Self::Up),
                NamedKey::ArrowDown => Some(Self::Down),
                NamedKey::Space => Some(Self::Space),
                NamedKey::Home => Some(Self::Home),
                _ => None,
            },
            WinitKey::Character(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some(Self::Char(ch)),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Held modifiers. `precision` (ctrl) repeats movement keys, `rotate`
/// (shift) turns the arrows into camera rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub precision: bool,
    pub rotate: bool,
}

impl Modifiers {
    pub fn from_winit(state: ModifiersState) -> Self {
        Self {
            precision: state.control_key(),
            rotate: state.shift_key(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
}

impl MouseButton {
    pub fn from_winit(button: WinitMouseButton) -> Option<Self> {
        match button {
            WinitMouseButton::Left => Some(Self::Primary),
            WinitMouseButton::Right => Some(Self::Secondary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown { key: Key, modifiers: Modifiers },
    KeyUp { key: Key },
    MouseDown { button: MouseButton },
    MouseUp { button: MouseButton },
    /// Position in physical pixels from the top left of the window.
    CursorMoved { x: f32, y: f32 },
    CursorLeft,
}
