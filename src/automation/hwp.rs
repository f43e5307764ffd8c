//! COM automation of the Hangul word processor (`HWPFrame.HwpObject`).
//!
//! The automation object is late-bound: every call goes through `IDispatch`, looking
//! up the member by name and passing `VARIANT` arguments. Actions with parameters
//! follow Hangul's action model:
//!
//! 1. fetch the parameter set from `HParameterSet.<Name>`
//! 2. `HAction.GetDefault(action, set.HSet)` to fill in defaults
//! 3. assign the fields that matter
//! 4. `HAction.Execute(action, set.HSet)`, which returns the success flag
//!
//! COM is initialized as a single-threaded apartment on the thread that connects,
//! so the handle must stay on that thread (the UI thread in practice).

use super::{AutomationError, AutomationProvider, DocumentAutomation, KeepFlags, SaveFormat};
use camino::Utf8Path;
use windows::Win32::System::Com::{
    CLSCTX_LOCAL_SERVER, CLSIDFromProgID, COINIT_APARTMENTTHREADED, CoCreateInstance,
    CoInitializeEx, CoUninitialize, DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET,
    DISPATCH_PROPERTYPUT, DISPPARAMS, IDispatch,
};
use windows::Win32::System::Ole::DISPID_PROPERTYPUT;
use windows::core::{BSTR, GUID, HSTRING, IUnknown, Interface, PCWSTR, VARIANT};

const LOCALE_USER_DEFAULT: u32 = 0x0400;

/// Keeps COM initialized on the current thread while alive.
struct ComApartment;

impl ComApartment {
    fn enter() -> Result<Self, AutomationError> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(|e| AutomationError::ConnectFailed(format!("CoInitializeEx: {}", e)))?;
        Ok(Self)
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

/// Check whether the automation object is registered on this machine.
pub fn is_available(prog_id: &str) -> bool {
    let Ok(_apartment) = ComApartment::enter() else {
        return false;
    };
    unsafe { CLSIDFromProgID(&HSTRING::from(prog_id)) }.is_ok()
}

/// Creates [`HwpAutomation`] connections.
#[derive(Debug, Clone)]
pub struct HwpProvider {
    prog_id: String,
    security_module: String,
    visible: bool,
}

impl HwpProvider {
    pub fn new(prog_id: impl Into<String>, security_module: impl Into<String>, visible: bool) -> Self {
        Self {
            prog_id: prog_id.into(),
            security_module: security_module.into(),
            visible,
        }
    }
}

impl AutomationProvider for HwpProvider {
    fn connect(&self) -> Result<Box<dyn DocumentAutomation>, AutomationError> {
        let apartment = ComApartment::enter()?;

        let clsid = unsafe { CLSIDFromProgID(&HSTRING::from(self.prog_id.as_str())) }
            .map_err(|_| AutomationError::NotRegistered(self.prog_id.clone()))?;

        let object: IDispatch = unsafe { CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER) }
            .map_err(|e| AutomationError::ConnectFailed(e.to_string()))?;

        tracing::info!("Connected to {}", self.prog_id);

        let automation = HwpAutomation {
            object,
            _apartment: apartment,
        };

        if !self.security_module.is_empty() {
            let registered = automation.call_bool(
                &automation.object,
                "RegisterModule",
                &[text("FilePathCheckDLL"), text(&self.security_module)],
            )?;
            if !registered {
                tracing::warn!(
                    "Security module '{}' could not be registered; Hangul may prompt for file access",
                    self.security_module
                );
            }
        }

        if self.visible {
            let windows = get_object(&automation.object, "XHwpWindows")?;
            let first = invoke(
                &windows,
                "Item",
                DISPATCH_FLAGS(DISPATCH_METHOD.0 | DISPATCH_PROPERTYGET.0),
                &[VARIANT::from(0i32)],
            )
            .and_then(|v| to_dispatch("Item", &v))?;
            put(&first, "Visible", VARIANT::from(true))?;
        }

        Ok(Box::new(automation))
    }
}

/// One live connection to the Hangul automation object.
pub struct HwpAutomation {
    // Declared before the apartment so it is released before CoUninitialize
    object: IDispatch,
    _apartment: ComApartment,
}

impl HwpAutomation {
    fn call_bool(
        &self,
        target: &IDispatch,
        name: &str,
        args: &[VARIANT],
    ) -> Result<bool, AutomationError> {
        let result = invoke(target, name, DISPATCH_METHOD, args)?;
        Ok(bool::try_from(&result).unwrap_or(false))
    }

    fn action(&self) -> Result<IDispatch, AutomationError> {
        get_object(&self.object, "HAction")
    }

    /// Fetch `HParameterSet.<set_name>` and its `HSet`, with `action`'s defaults loaded.
    fn parameter_set(
        &self,
        action: &IDispatch,
        action_name: &str,
        set_name: &str,
    ) -> Result<(IDispatch, IDispatch), AutomationError> {
        let sets = get_object(&self.object, "HParameterSet")?;
        let set = get_object(&sets, set_name)?;
        let hset = get_object(&set, "HSet")?;
        invoke(
            action,
            "GetDefault",
            DISPATCH_METHOD,
            &[text(action_name), unknown(&hset)?],
        )?;
        Ok((set, hset))
    }

    fn execute(
        &self,
        action: &IDispatch,
        action_name: &str,
        hset: &IDispatch,
    ) -> Result<bool, AutomationError> {
        self.call_bool(action, "Execute", &[text(action_name), unknown(hset)?])
    }
}

impl DocumentAutomation for HwpAutomation {
    fn open(&mut self, path: &Utf8Path) -> Result<bool, AutomationError> {
        self.call_bool(&self.object, "Open", &[text(path.as_str()), text(""), text("")])
    }

    fn move_to_doc_end(&mut self) -> Result<bool, AutomationError> {
        let action = self.action()?;
        self.call_bool(&action, "Run", &[text("MoveDocEnd")])
    }

    fn insert_file(&mut self, path: &Utf8Path, keep: KeepFlags) -> Result<bool, AutomationError> {
        let action = self.action()?;
        let (set, hset) = self.parameter_set(&action, "InsertFile", "HInsertFile")?;

        put(&set, "filename", text(path.as_str()))?;
        put(&set, "KeepSection", flag(keep.section))?;
        put(&set, "KeepCharshape", flag(keep.char_shape))?;
        put(&set, "KeepParashape", flag(keep.para_shape))?;
        put(&set, "KeepStyle", flag(keep.style))?;

        self.execute(&action, "InsertFile", &hset)
    }

    fn save_as(&mut self, path: &Utf8Path, format: SaveFormat) -> Result<bool, AutomationError> {
        match format {
            SaveFormat::Hwp | SaveFormat::Hwpx => self.call_bool(
                &self.object,
                "SaveAs",
                &[text(path.as_str()), text(format.as_str()), text("")],
            ),
            SaveFormat::Pdf => {
                let action = self.action()?;
                let (set, hset) = self.parameter_set(&action, "FileSaveAs_S", "HFileOpenSave")?;
                put(&set, "filename", text(path.as_str()))?;
                put(&set, "Format", text(format.as_str()))?;
                self.execute(&action, "FileSaveAs_S", &hset)
            }
        }
    }

    fn clear(&mut self) -> Result<(), AutomationError> {
        // 1 = discard changes without a save prompt
        invoke(&self.object, "Clear", DISPATCH_METHOD, &[VARIANT::from(1i32)]).map(|_| ())
    }

    fn quit(&mut self) -> Result<(), AutomationError> {
        invoke(&self.object, "Quit", DISPATCH_METHOD, &[])?;
        tracing::debug!("Hangul automation object quit");
        Ok(())
    }
}

fn text(value: &str) -> VARIANT {
    VARIANT::from(BSTR::from(value))
}

fn flag(value: bool) -> VARIANT {
    VARIANT::from(i32::from(value))
}

fn unknown(object: &IDispatch) -> Result<VARIANT, AutomationError> {
    let unknown: IUnknown = object.cast().map_err(|e| call_error("QueryInterface", e))?;
    Ok(VARIANT::from(unknown))
}

fn call_error(call: &str, error: windows::core::Error) -> AutomationError {
    AutomationError::CallFailed {
        call: call.to_string(),
        message: error.message().to_string(),
    }
}

fn dispid(target: &IDispatch, name: &str) -> Result<i32, AutomationError> {
    let wide = HSTRING::from(name);
    let names = [PCWSTR(wide.as_ptr())];
    let mut id = 0i32;
    unsafe {
        target.GetIDsOfNames(&GUID::zeroed(), names.as_ptr(), 1, LOCALE_USER_DEFAULT, &mut id)
    }
    .map_err(|e| call_error(name, e))?;
    Ok(id)
}

fn invoke(
    target: &IDispatch,
    name: &str,
    flags: DISPATCH_FLAGS,
    args: &[VARIANT],
) -> Result<VARIANT, AutomationError> {
    let id = dispid(target, name)?;

    // IDispatch expects arguments in reverse order
    let mut reversed: Vec<VARIANT> = args.iter().rev().cloned().collect();
    let is_put = flags == DISPATCH_PROPERTYPUT;
    let mut named_arg = DISPID_PROPERTYPUT;

    let params = DISPPARAMS {
        rgvarg: reversed.as_mut_ptr(),
        rgdispidNamedArgs: if is_put {
            &mut named_arg as *mut i32
        } else {
            std::ptr::null_mut()
        },
        cArgs: reversed.len() as u32,
        cNamedArgs: u32::from(is_put),
    };

    let mut result = VARIANT::default();
    unsafe {
        target.Invoke(
            id,
            &GUID::zeroed(),
            LOCALE_USER_DEFAULT,
            flags,
            &params,
            Some(&mut result),
            None,
            None,
        )
    }
    .map_err(|e| call_error(name, e))?;

    Ok(result)
}

fn put(target: &IDispatch, name: &str, value: VARIANT) -> Result<(), AutomationError> {
    invoke(target, name, DISPATCH_PROPERTYPUT, &[value]).map(|_| ())
}

fn get_object(target: &IDispatch, name: &str) -> Result<IDispatch, AutomationError> {
    let value = invoke(target, name, DISPATCH_PROPERTYGET, &[])?;
    to_dispatch(name, &value)
}

fn to_dispatch(name: &str, value: &VARIANT) -> Result<IDispatch, AutomationError> {
    let unknown = IUnknown::try_from(value).map_err(|e| call_error(name, e))?;
    unknown.cast().map_err(|e| call_error(name, e))
}
