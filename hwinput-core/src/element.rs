//! Clickable points of UI elements.
//!
//! The automation tree itself lives elsewhere; the sequencer only needs
//! "where do I click element E", expressed by [`ClickablePoint`].  On
//! Windows, [`UiaElement`] answers it through UI Automation.

use crate::errors::InjectionError;
use crate::geometry::ScreenPoint;

/// Something with a point that, when clicked, hits the element itself.
pub trait ClickablePoint {
    fn clickable_point(&self) -> Result<ScreenPoint, InjectionError>;
}

impl ClickablePoint for ScreenPoint {
    fn clickable_point(&self) -> Result<ScreenPoint, InjectionError> {
        Ok(*self)
    }
}

#[cfg(windows)]
pub use self::uia::UiaElement;

#[cfg(windows)]
mod uia {
    use windows::Win32::Foundation::{BOOL, HWND, POINT};
    use windows::Win32::UI::Accessibility::IUIAutomationElement;

    use super::ClickablePoint;
    use crate::com::with_automation;
    use crate::errors::InjectionError;
    use crate::geometry::ScreenPoint;

    /// A UI Automation element, obtained through this thread's shared
    /// automation client.  Only usable on the thread that created it.
    pub struct UiaElement {
        element: IUIAutomationElement,
    }

    impl UiaElement {
        /// Element for a top-level or child window handle.
        pub fn from_window(hwnd: isize) -> Result<Self, InjectionError> {
            let element = with_automation(|uia| {
                unsafe { uia.ElementFromHandle(HWND(hwnd as *mut core::ffi::c_void)) }
                    .map_err(|e| InjectionError::ComError(format!("ElementFromHandle: {e}")))
            })?;
            Ok(Self { element })
        }

        pub fn name(&self) -> String {
            unsafe { self.element.CurrentName() }
                .map(|b| b.to_string())
                .unwrap_or_default()
        }
    }

    impl ClickablePoint for UiaElement {
        fn clickable_point(&self) -> Result<ScreenPoint, InjectionError> {
            let mut point = POINT::default();
            let mut found = BOOL::default();
            unsafe { self.element.GetClickablePoint(&mut point, &mut found) }?;
            if !found.as_bool() {
                return Err(InjectionError::NoClickablePoint(format!(
                    "element {:?} reports no clickable point",
                    self.name()
                )));
            }
            Ok(ScreenPoint::new(point.x, point.y))
        }
    }
}
