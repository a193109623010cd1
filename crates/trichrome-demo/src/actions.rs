//! User actions and the color sources behind them.

use trichrome_engine::color::{ClearColor, Rgb};
use winit::keyboard::KeyCode;

/// A color change waiting for the next frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ColorAction {
    Background(ClearColor),
    Fill(Rgb),
}

/// What a key press asks for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyAction {
    CycleBackground,
    CycleFill,
    Quit,
}

pub fn key_action(code: KeyCode) -> Option<KeyAction> {
    match code {
        KeyCode::KeyB => Some(KeyAction::CycleBackground),
        KeyCode::KeyT => Some(KeyAction::CycleFill),
        KeyCode::Escape => Some(KeyAction::Quit),
        _ => None,
    }
}

/// Fixed list of colors with a cursor; stands in for a color picker.
///
/// The cursor starts on the first entry, which is the color already shown.
#[derive(Debug, Clone)]
pub struct Palette<T> {
    colors: Vec<T>,
    cursor: usize,
}

impl<T: Copy> Palette<T> {
    pub fn new(colors: Vec<T>) -> Self {
        Self { colors, cursor: 0 }
    }

    pub fn current(&self) -> Option<T> {
        self.colors.get(self.cursor).copied()
    }

    /// Moves to the next color, wrapping around. `None` for an empty palette.
    pub fn advance(&mut self) -> Option<T> {
        if self.colors.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.colors.len();
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(key_action(KeyCode::KeyB), Some(KeyAction::CycleBackground));
        assert_eq!(key_action(KeyCode::KeyT), Some(KeyAction::CycleFill));
        assert_eq!(key_action(KeyCode::Escape), Some(KeyAction::Quit));
        assert_eq!(key_action(KeyCode::KeyA), None);
    }

    #[test]
    fn palette_cycles_and_wraps() {
        let mut p = Palette::new(vec![1, 2, 3]);
        assert_eq!(p.current(), Some(1));
        assert_eq!(p.advance(), Some(2));
        assert_eq!(p.advance(), Some(3));
        assert_eq!(p.advance(), Some(1));
    }

    #[test]
    fn single_entry_palette_repeats() {
        let mut p = Palette::new(vec![Rgb::from_u8(0, 0, 0)]);
        assert_eq!(p.advance(), Some(Rgb::from_u8(0, 0, 0)));
        assert_eq!(p.advance(), Some(Rgb::from_u8(0, 0, 0)));
    }

    #[test]
    fn empty_palette_yields_nothing() {
        let mut p: Palette<ClearColor> = Palette::new(Vec::new());
        assert_eq!(p.current(), None);
        assert_eq!(p.advance(), None);
    }
}
