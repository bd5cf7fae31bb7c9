//! Open flags derived from the input event that triggered an open.

use bitflags::bitflags;

use crate::settings::FilerOptions;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpenFlags: u8 {
        /// Alternate behavior: follow links, open as text, mount first
        const SHIFT = 1 << 0;
        /// Replace this window's contents instead of opening a new window
        const SAME_WINDOW = 1 << 1;
        /// Close this window after a successful launch
        const CLOSE_WINDOW = 1 << 2;
    }
}

/// The parts of an input event that matter for opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Button { button: u32, shift: bool, control: bool },
    Key { shift: bool },
    Other,
}

pub fn derive_open_flags(event: InputEvent, options: &FilerOptions) -> OpenFlags {
    let mut flags = OpenFlags::empty();
    match event {
        InputEvent::Button { button, shift, control } => {
            if shift {
                flags |= OpenFlags::SHIFT;
            }
            if options.new_window_on_1 ^ (button == 1) {
                flags |= OpenFlags::SAME_WINDOW;
            }
            if button != 1 {
                flags |= OpenFlags::CLOSE_WINDOW;
            }
            if !options.single_click && control {
                flags ^= OpenFlags::SAME_WINDOW | OpenFlags::CLOSE_WINDOW;
            }
        }
        InputEvent::Key { shift } => {
            flags |= OpenFlags::SAME_WINDOW;
            if shift {
                flags |= OpenFlags::SHIFT;
            }
        }
        InputEvent::Other => {}
    }
    flags
}
