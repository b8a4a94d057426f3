pub mod conv;
pub mod output;

use std::fmt;
use std::ops::Deref;
use std::ptr;

use winapi::ctypes::c_void;
use winapi::shared::winerror;
use winapi::um::unknwnbase::IUnknown;
use winapi::Interface;

/// Minimal COM smart pointer: owns one reference, releases it on drop.
#[repr(transparent)]
pub struct ComPtr<T>(*mut T);

impl<T> ComPtr<T> {
    pub fn null() -> Self {
        Self(ptr::null_mut())
    }

    /// Takes ownership of an existing reference.
    pub unsafe fn from_raw(raw: *mut T) -> Self {
        Self(raw)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_mut_ptr(&self) -> *mut T {
        self.0
    }

    /// Releases ownership without decrementing the reference count.
    pub fn into_raw(self) -> *mut T {
        let raw = self.0;
        std::mem::forget(self);
        raw
    }

    /// Out-parameter slot for creation calls. Any existing reference is
    /// leaked, so only use on a null pointer.
    pub fn mut_self(&mut self) -> *mut *mut T {
        debug_assert!(self.is_null());
        &mut self.0
    }

    pub fn mut_void(&mut self) -> *mut *mut c_void {
        debug_assert!(self.is_null());
        &mut self.0 as *mut *mut T as *mut *mut c_void
    }
}

impl<T> ComPtr<T> {
    // Every T this wrapper is used with is a COM interface, so the
    // pointer doubles as an IUnknown.
    fn as_unknown(&self) -> *mut IUnknown {
        self.0 as *mut IUnknown
    }

    /// The object's current reference count, observed by a transient
    /// AddRef/Release pair.
    pub unsafe fn ref_count(&self) -> u32 {
        debug_assert!(!self.is_null());
        unsafe {
            (*self.as_unknown()).AddRef();
            (*self.as_unknown()).Release()
        }
    }
}

impl<T: Interface> ComPtr<T> {
    pub unsafe fn cast<U: Interface>(&self) -> Result<ComPtr<U>, i32> {
        debug_assert!(!self.is_null());
        let mut out = ComPtr::<U>::null();
        let hr = unsafe { (*self.as_unknown()).QueryInterface(&U::uuidof(), out.mut_void()) };
        if winerror::SUCCEEDED(hr) {
            Ok(out)
        } else {
            Err(hr)
        }
    }
}

impl<T> Clone for ComPtr<T> {
    fn clone(&self) -> Self {
        if !self.is_null() {
            unsafe { (*self.as_unknown()).AddRef() };
        }
        Self(self.0)
    }
}

impl<T> Drop for ComPtr<T> {
    fn drop(&mut self) {
        if !self.is_null() {
            unsafe { (*self.as_unknown()).Release() };
        }
    }
}

impl<T> Deref for ComPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        debug_assert!(!self.is_null());
        unsafe { &*self.0 }
    }
}

impl<T> fmt::Debug for ComPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComPtr({:p})", self.0)
    }
}

impl<T> PartialEq for ComPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
