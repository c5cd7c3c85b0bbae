//! OS input injection
//!
//! The engine only ever talks to an [`Effector`]. Calls are fire-and-forget:
//! [`dispatch`] logs a failure and moves on, so a refused click never reaches
//! the classifier that produced it.

use crate::error::CortexError;
use crate::types::{Action, MouseButton};
use std::sync::{Arc, Mutex, MutexGuard};

pub trait Effector {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), CortexError>;
    fn click(&mut self, button: MouseButton, count: u8) -> Result<(), CortexError>;
    fn button_down(&mut self, button: MouseButton) -> Result<(), CortexError>;
    fn button_up(&mut self, button: MouseButton) -> Result<(), CortexError>;
    /// Positive scrolls up
    fn scroll(&mut self, amount: i32) -> Result<(), CortexError>;

    /// Physical pointer position, used for the no-face dwell fallback
    fn cursor_position(&mut self) -> Option<(i32, i32)> {
        None
    }

    fn screen_size(&mut self) -> Option<(u32, u32)> {
        None
    }
}

impl<E: Effector + ?Sized> Effector for Box<E> {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), CortexError> {
        (**self).move_cursor(x, y)
    }

    fn click(&mut self, button: MouseButton, count: u8) -> Result<(), CortexError> {
        (**self).click(button, count)
    }

    fn button_down(&mut self, button: MouseButton) -> Result<(), CortexError> {
        (**self).button_down(button)
    }

    fn button_up(&mut self, button: MouseButton) -> Result<(), CortexError> {
        (**self).button_up(button)
    }

    fn scroll(&mut self, amount: i32) -> Result<(), CortexError> {
        (**self).scroll(amount)
    }

    fn cursor_position(&mut self) -> Option<(i32, i32)> {
        (**self).cursor_position()
    }

    fn screen_size(&mut self) -> Option<(u32, u32)> {
        (**self).screen_size()
    }
}

/// Deliver one action. Returns `false` if the effector refused it.
pub fn dispatch<E: Effector + ?Sized>(effector: &mut E, action: &Action) -> bool {
    let result = match *action {
        Action::MoveCursor { x, y } => effector.move_cursor(x, y),
        Action::Click { button, count } => effector.click(button, count),
        Action::ButtonDown(button) => effector.button_down(button),
        Action::ButtonUp(button) => effector.button_up(button),
        Action::Scroll(amount) => effector.scroll(amount),
    };
    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to deliver {:?}: {}", action, e);
            false
        }
    }
}

/// Dry-run effector that only logs
#[derive(Debug, Default)]
pub struct LogEffector;

impl Effector for LogEffector {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), CortexError> {
        log::trace!("move cursor to ({x}, {y})");
        Ok(())
    }

    fn click(&mut self, button: MouseButton, count: u8) -> Result<(), CortexError> {
        log::info!("[dry-run] {} click x{}", button.as_str(), count);
        Ok(())
    }

    fn button_down(&mut self, button: MouseButton) -> Result<(), CortexError> {
        log::info!("[dry-run] {} button down", button.as_str());
        Ok(())
    }

    fn button_up(&mut self, button: MouseButton) -> Result<(), CortexError> {
        log::info!("[dry-run] {} button up", button.as_str());
        Ok(())
    }

    fn scroll(&mut self, amount: i32) -> Result<(), CortexError> {
        log::info!("[dry-run] scroll {amount}");
        Ok(())
    }
}

/// Records every delivered action; can be told to fail or to report a pointer
#[derive(Debug, Default, Clone)]
pub struct RecordingEffector {
    pub actions: Vec<Action>,
    pub fail: bool,
    pub pointer: Option<(i32, i32)>,
}

impl RecordingEffector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded actions excluding cursor motion
    pub fn discrete(&self) -> Vec<Action> {
        self.actions.iter().copied().filter(Action::is_discrete).collect()
    }

    fn record(&mut self, action: Action) -> Result<(), CortexError> {
        if self.fail {
            return Err(CortexError::Effector("injected failure".to_string()));
        }
        self.actions.push(action);
        Ok(())
    }
}

impl Effector for RecordingEffector {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), CortexError> {
        self.record(Action::MoveCursor { x, y })
    }

    fn click(&mut self, button: MouseButton, count: u8) -> Result<(), CortexError> {
        self.record(Action::Click { button, count })
    }

    fn button_down(&mut self, button: MouseButton) -> Result<(), CortexError> {
        self.record(Action::ButtonDown(button))
    }

    fn button_up(&mut self, button: MouseButton) -> Result<(), CortexError> {
        self.record(Action::ButtonUp(button))
    }

    fn scroll(&mut self, amount: i32) -> Result<(), CortexError> {
        self.record(Action::Scroll(amount))
    }

    fn cursor_position(&mut self) -> Option<(i32, i32)> {
        self.pointer
    }
}

/// Cloneable handle that serializes access to one effector across threads
pub struct SharedEffector<E> {
    inner: Arc<Mutex<E>>,
}

impl<E> Clone for SharedEffector<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Effector> SharedEffector<E> {
    pub fn new(effector: E) -> Self {
        Self {
            inner: Arc::new(Mutex::new(effector)),
        }
    }

    /// Lock the underlying effector, recovering from a poisoned lock
    pub fn lock(&self) -> MutexGuard<'_, E> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with<T>(&self, f: impl FnOnce(&mut E) -> Result<T, CortexError>) -> Result<T, CortexError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| CortexError::Effector("effector lock poisoned".to_string()))?;
        f(&mut guard)
    }
}

impl<E: Effector> Effector for SharedEffector<E> {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), CortexError> {
        self.with(|e| e.move_cursor(x, y))
    }

    fn click(&mut self, button: MouseButton, count: u8) -> Result<(), CortexError> {
        self.with(|e| e.click(button, count))
    }

    fn button_down(&mut self, button: MouseButton) -> Result<(), CortexError> {
        self.with(|e| e.button_down(button))
    }

    fn button_up(&mut self, button: MouseButton) -> Result<(), CortexError> {
        self.with(|e| e.button_up(button))
    }

    fn scroll(&mut self, amount: i32) -> Result<(), CortexError> {
        self.with(|e| e.scroll(amount))
    }

    fn cursor_position(&mut self) -> Option<(i32, i32)> {
        self.with(|e| Ok(e.cursor_position())).ok().flatten()
    }

    fn screen_size(&mut self) -> Option<(u32, u32)> {
        self.with(|e| Ok(e.screen_size())).ok().flatten()
    }
}

#[cfg(feature = "input")]
pub use enigo_backend::EnigoEffector;

#[cfg(feature = "input")]
mod enigo_backend {
    use super::Effector;
    use crate::error::CortexError;
    use crate::types::MouseButton;
    use enigo::{Axis, Button, Coordinate, Direction, Enigo, Mouse, Settings};

    /// Real input injection through enigo
    pub struct EnigoEffector {
        enigo: Enigo,
    }

    impl EnigoEffector {
        pub fn new() -> Result<Self, CortexError> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| CortexError::Effector(format!("enigo init: {e:?}")))?;
            Ok(Self { enigo })
        }
    }

    fn button(b: MouseButton) -> Button {
        match b {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        }
    }

    fn err(e: impl std::fmt::Debug) -> CortexError {
        CortexError::Effector(format!("{e:?}"))
    }

    impl Effector for EnigoEffector {
        fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), CortexError> {
            self.enigo.move_mouse(x, y, Coordinate::Abs).map_err(err)
        }

        fn click(&mut self, b: MouseButton, count: u8) -> Result<(), CortexError> {
            for _ in 0..count.max(1) {
                self.enigo.button(button(b), Direction::Click).map_err(err)?;
            }
            Ok(())
        }

        fn button_down(&mut self, b: MouseButton) -> Result<(), CortexError> {
            self.enigo.button(button(b), Direction::Press).map_err(err)
        }

        fn button_up(&mut self, b: MouseButton) -> Result<(), CortexError> {
            self.enigo.button(button(b), Direction::Release).map_err(err)
        }

        fn scroll(&mut self, amount: i32) -> Result<(), CortexError> {
            // enigo scrolls down for positive lengths
            self.enigo.scroll(-amount, Axis::Vertical).map_err(err)
        }

        fn cursor_position(&mut self) -> Option<(i32, i32)> {
            self.enigo.location().ok()
        }

        fn screen_size(&mut self) -> Option<(u32, u32)> {
            let (w, h) = self.enigo.main_display().ok()?;
            Some((u32::try_from(w).ok()?, u32::try_from(h).ok()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_routes_actions() {
        let mut fx = RecordingEffector::new();
        assert!(dispatch(&mut fx, &Action::left_click()));
        assert!(dispatch(&mut fx, &Action::Scroll(-3)));
        assert_eq!(fx.actions, vec![Action::left_click(), Action::Scroll(-3)]);
    }

    #[test]
    fn test_dispatch_swallows_failures() {
        let mut fx = RecordingEffector {
            fail: true,
            ..Default::default()
        };
        assert!(!dispatch(&mut fx, &Action::right_click()));
        assert!(fx.actions.is_empty());
    }

    #[test]
    fn test_shared_effector_sees_all_clones() {
        let shared = SharedEffector::new(RecordingEffector::new());
        let mut a = shared.clone();
        let mut b: Box<dyn Effector> = Box::new(shared.clone());
        dispatch(&mut a, &Action::ButtonDown(MouseButton::Left));
        dispatch(&mut b, &Action::ButtonUp(MouseButton::Left));
        assert_eq!(shared.lock().actions.len(), 2);
    }
}
