//! C ABI for embedding the extractor in a host application.
//!
//! `emlsift_extract` takes raw message bytes and returns an owned list of
//! records; release it with `emlsift_free_results`. Strings are UTF-8 and
//! NUL-terminated. On failure NULL is returned and `emlsift_last_error`
//! describes why.

use std::cell::RefCell;
use std::ffi::CString;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use libc::{c_char, c_int, size_t};

use crate::model::{ExtractionResult, Role};

pub const EMLSIFT_ROLE_ATTACHMENT: c_int = 0;
pub const EMLSIFT_ROLE_BODY_HTML: c_int = 1;
pub const EMLSIFT_ROLE_BODY_TEXT: c_int = 2;
pub const EMLSIFT_ROLE_INLINE: c_int = 3;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    let msg = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(msg));
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

/// One extracted part (owned by the enclosing list).
#[repr(C)]
pub struct EmlsiftResult {
    pub name: *mut c_char,
    pub content_type: *mut c_char,
    pub data: *mut u8,
    pub data_len: size_t,
    /// One of the `EMLSIFT_ROLE_*` constants.
    pub role: c_int,
}

/// Results in document order. Caller frees with `emlsift_free_results`.
#[repr(C)]
pub struct EmlsiftResultList {
    pub count: size_t,
    pub items: *mut EmlsiftResult,
}

fn role_code(role: Role) -> c_int {
    match role {
        Role::Attachment => EMLSIFT_ROLE_ATTACHMENT,
        Role::PrimaryBodyHtml => EMLSIFT_ROLE_BODY_HTML,
        Role::PrimaryBodyText => EMLSIFT_ROLE_BODY_TEXT,
        Role::InlineResource | Role::None => EMLSIFT_ROLE_INLINE,
    }
}

fn c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', "")).unwrap_or_default().into_raw()
}

fn to_c_result(result: ExtractionResult) -> EmlsiftResult {
    let data = result.data.into_boxed_slice();
    let data_len = data.len();
    EmlsiftResult {
        name: c_string(&result.name),
        content_type: c_string(&result.content_type),
        data: Box::into_raw(data) as *mut u8,
        data_len,
        role: role_code(result.role),
    }
}

/// Version string (static, do not free).
#[no_mangle]
pub extern "C" fn emlsift_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

/// Last error message from a failed call on this thread. Valid until the next
/// call. Do not free.
#[no_mangle]
pub extern "C" fn emlsift_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(ptr::null())
    })
}

/// Extract all results from `len` bytes at `data`. Returns NULL on a
/// malformed message.
///
/// # Safety
/// `data` must point to `len` readable bytes (or be NULL with `len == 0`).
#[no_mangle]
pub unsafe extern "C" fn emlsift_extract(
    data: *const u8,
    len: size_t,
) -> *mut EmlsiftResultList {
    clear_last_error();
    let raw: &[u8] = if data.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(data, len)
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| crate::parser::extract(raw)));
    let extraction = match outcome {
        Ok(Ok(extraction)) => extraction,
        Ok(Err(e)) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
        Err(_) => {
            set_last_error("internal error during extraction");
            return ptr::null_mut();
        }
    };

    let items: Box<[EmlsiftResult]> = extraction
        .results
        .into_iter()
        .map(to_c_result)
        .collect();
    let count = items.len();
    let list = EmlsiftResultList {
        count,
        items: Box::into_raw(items) as *mut EmlsiftResult,
    };
    Box::into_raw(Box::new(list))
}

/// Free a list returned by `emlsift_extract`. No-op if `list` is NULL.
///
/// # Safety
/// `list` must come from `emlsift_extract` and not have been freed.
#[no_mangle]
pub unsafe extern "C" fn emlsift_free_results(list: *mut EmlsiftResultList) {
    if list.is_null() {
        return;
    }
    let list = Box::from_raw(list);
    let items = Box::from_raw(ptr::slice_from_raw_parts_mut(list.items, list.count));
    for item in items.iter() {
        if !item.name.is_null() {
            drop(CString::from_raw(item.name));
        }
        if !item.content_type.is_null() {
            drop(CString::from_raw(item.content_type));
        }
        if !item.data.is_null() {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                item.data,
                item.data_len,
            )));
        }
    }
}
