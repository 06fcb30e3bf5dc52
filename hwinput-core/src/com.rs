//! Per-thread UI Automation client.
//!
//! Element lookups need a COM apartment and an `IUIAutomation` instance.
//! Both are created the first time a thread asks for them through
//! [`with_automation`] and live until that thread exits, so repeated
//! `click-window` style requests on one thread share a single client.
//!
//! Interfaces obtained here belong to the creating thread's apartment and
//! must not be used from another thread.

use std::cell::RefCell;

use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED,
};
use windows::Win32::UI::Accessibility::{CUIAutomation, IUIAutomation};

use crate::errors::InjectionError;

/// `RPC_E_CHANGED_MODE`: the thread already lives in an STA.
const RPC_E_CHANGED_MODE: u32 = 0x8001_0106;

/// Whether a `CoInitializeEx` result needs a balancing `CoUninitialize`.
///
/// `S_OK` and `S_FALSE` do.  `RPC_E_CHANGED_MODE` leaves COM usable through
/// the existing STA but must not be balanced.
fn needs_uninit(hr: u32) -> Result<bool, InjectionError> {
    match hr {
        0x0 | 0x1 => Ok(true),
        RPC_E_CHANGED_MODE => {
            log::warn!("CoInitializeEx: thread already has an STA apartment, reusing it");
            Ok(false)
        }
        other => Err(InjectionError::ComError(format!(
            "CoInitializeEx failed: HRESULT 0x{other:08X}"
        ))),
    }
}

/// RAII membership in the thread's COM apartment.
#[must_use = "COMGuard must be kept alive for the duration of COM usage"]
struct COMGuard {
    should_uninit: bool,
    _not_send: std::marker::PhantomData<*const ()>,
}

impl COMGuard {
    fn init() -> Result<Self, InjectionError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        Ok(Self {
            should_uninit: needs_uninit(hr.0 as u32)?,
            _not_send: std::marker::PhantomData,
        })
    }
}

impl Drop for COMGuard {
    fn drop(&mut self) {
        if self.should_uninit {
            unsafe { CoUninitialize() };
        }
    }
}

/// Field order matters: the client is released before the apartment is
/// left.
struct Automation {
    uia: IUIAutomation,
    _com: COMGuard,
}

impl Automation {
    fn create() -> Result<Self, InjectionError> {
        let com = COMGuard::init()?;
        let uia: IUIAutomation =
            unsafe { CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER)? };
        log::debug!("UI Automation client created for this thread");
        Ok(Self { uia, _com: com })
    }
}

thread_local! {
    static AUTOMATION: RefCell<Option<Automation>> = const { RefCell::new(None) };
}

/// Run `f` with this thread's UI Automation client, creating it (and
/// joining the COM apartment) on first use.
///
/// A failed creation is not cached; the next call tries again.
pub fn with_automation<R>(
    f: impl FnOnce(&IUIAutomation) -> Result<R, InjectionError>,
) -> Result<R, InjectionError> {
    let uia = AUTOMATION.with(|cell| -> Result<IUIAutomation, InjectionError> {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(Automation::create()?);
        }
        match slot.as_ref() {
            Some(automation) => Ok(automation.uia.clone()),
            None => Err(InjectionError::ComError(
                "UI Automation client unavailable".to_owned(),
            )),
        }
    })?;
    // The borrow is released before `f` runs, so `f` may call back in.
    f(&uia)
}
