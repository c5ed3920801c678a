//! Foreign memory bridge.
//!
//! Everything that crosses the C boundary goes through the helpers in this
//! module, which enforce two invariants:
//!
//! 1. **Symmetry** — every foreign allocation has exactly one release, and
//!    the release runs on every exit path. Encode-side memory is owned by
//!    RAII guards (`CStringGuard`, `CStringArrayGuard`, `StringMapGuard`,
//!    `BoxedGuard`, `PtrArrayGuard`) whose `Drop` tears the structure down.
//! 2. **Read-only decode** — `read_*` functions copy out of engine-owned
//!    memory and never free it; the paired `destroy_*` driver call does.
//!
//! A live-allocation counter tracks every retained block so tests can assert
//! the encode → call → cleanup cycle leaves nothing behind.
//!
//! Null pointers and empty values are never conflated: an absent string is a
//! null pointer, an empty string is a one-byte allocation; an absent array is
//! a null array pointer, an empty array has `size == 0`.

pub mod driver;
#[cfg(feature = "linked")]
pub mod linked;
pub mod stub;
pub mod types;

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ColloquyError, Result};
use types::{CMapStringToStringArray, CMapStringToStringArrayEntry, CStringArray};

// ---------------------------------------------------------------------------
// Allocation accounting
// ---------------------------------------------------------------------------

static LIVE_FOREIGN_ALLOCS: AtomicUsize = AtomicUsize::new(0);

/// Number of foreign blocks currently retained by this crate (strings, boxed
/// structs and pointer arrays built for engine calls). Returns to zero when
/// no call is in flight.
pub fn live_foreign_allocations() -> usize {
    LIVE_FOREIGN_ALLOCS.load(Ordering::SeqCst)
}

fn track_retain() {
    LIVE_FOREIGN_ALLOCS.fetch_add(1, Ordering::SeqCst);
}

fn track_release() {
    LIVE_FOREIGN_ALLOCS.fetch_sub(1, Ordering::SeqCst);
}

// ---------------------------------------------------------------------------
// Primitive retain / release / read
// ---------------------------------------------------------------------------

/// Allocates a NUL-terminated copy of `s`. Pair with [`release_string`].
pub(crate) fn retain_string(s: &str) -> Result<*mut c_char> {
    let c = CString::new(s)?;
    track_retain();
    Ok(c.into_raw())
}

/// `None` becomes a null pointer (absent), `Some("")` a real empty string.
pub(crate) fn retain_opt_string(s: Option<&str>) -> Result<*mut c_char> {
    match s {
        Some(s) => retain_string(s),
        None => Ok(std::ptr::null_mut()),
    }
}

/// # Safety
/// `ptr` must be null or come from [`retain_string`], not yet released.
pub(crate) unsafe fn release_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
        track_release();
    }
}

/// Moves `value` to the heap so its address stays stable while nested C
/// structs point at it. Pair with [`release_boxed`].
pub(crate) fn retain_boxed<T>(value: T) -> *mut T {
    track_retain();
    Box::into_raw(Box::new(value))
}

/// # Safety
/// `ptr` must be null or come from [`retain_boxed`], not yet released.
pub(crate) unsafe fn release_boxed<T>(ptr: *mut T) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
        track_release();
    }
}

/// Leaks `items` as a length-known contiguous block. Pair with
/// [`release_slice`] using the original length.
pub(crate) fn retain_slice<T>(items: Vec<T>) -> *mut T {
    track_retain();
    Box::into_raw(items.into_boxed_slice()) as *mut T
}

/// # Safety
/// `ptr`/`len` must describe a block from [`retain_slice`], not yet released.
pub(crate) unsafe fn release_slice<T>(ptr: *mut T, len: usize) {
    drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)));
    track_release();
}

/// Copies a required engine string. A null pointer here is a protocol
/// violation (the schema marks the field non-nullable).
///
/// # Safety
/// `ptr` must be null or point at a NUL-terminated string.
pub(crate) unsafe fn read_string(ptr: *const c_char) -> Result<String> {
    if ptr.is_null() {
        return Err(ColloquyError::Protocol(
            "unexpected null for a required string field".into(),
        ));
    }
    Ok(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

/// Copies a nullable engine string; null means absent.
///
/// # Safety
/// `ptr` must be null or point at a NUL-terminated string.
pub(crate) unsafe fn read_opt_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Copies a length-prefixed string array.
///
/// # Safety
/// `array` must point at a well-formed [`CStringArray`].
pub(crate) unsafe fn read_string_array(array: *const CStringArray) -> Result<Vec<String>> {
    if array.is_null() {
        return Err(ColloquyError::Protocol(
            "unexpected null for a required string array".into(),
        ));
    }
    let array = &*array;
    if array.size < 0 {
        return Err(ColloquyError::Protocol(format!(
            "negative string array size {}",
            array.size
        )));
    }
    let mut out = Vec::with_capacity(array.size as usize);
    for i in 0..array.size as usize {
        out.push(read_string(*array.data.add(i))?);
    }
    Ok(out)
}

/// Copies a key → string-list map.
///
/// # Safety
/// `map` must point at a well-formed [`CMapStringToStringArray`].
pub(crate) unsafe fn read_string_map(
    map: *const CMapStringToStringArray,
) -> Result<HashMap<String, Vec<String>>> {
    if map.is_null() {
        return Err(ColloquyError::Protocol(
            "unexpected null for a required map".into(),
        ));
    }
    let map = &*map;
    if map.count < 0 {
        return Err(ColloquyError::Protocol(format!(
            "negative map entry count {}",
            map.count
        )));
    }
    let mut out = HashMap::with_capacity(map.count as usize);
    for i in 0..map.count as usize {
        let entry = *map.entries.add(i);
        if entry.is_null() {
            return Err(ColloquyError::Protocol("null map entry".into()));
        }
        let entry = &*entry;
        out.insert(read_string(entry.key)?, read_string_array(entry.value)?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Encode guards
// ---------------------------------------------------------------------------

/// Owns one retained C string (or null for absent) for the duration of an
/// engine call.
#[derive(Debug)]
pub(crate) struct CStringGuard {
    raw: *mut c_char,
}

impl CStringGuard {
    pub(crate) fn new(s: Option<&str>) -> Result<Self> {
        Ok(Self {
            raw: retain_opt_string(s)?,
        })
    }

    pub(crate) fn as_ptr(&self) -> *const c_char {
        self.raw
    }
}

impl Drop for CStringGuard {
    fn drop(&mut self) {
        unsafe { release_string(self.raw) };
    }
}

/// Owns one heap-stable struct. The pointer stays valid until drop, even if
/// the guard itself moves.
pub(crate) struct BoxedGuard<T> {
    raw: *mut T,
}

impl<T> BoxedGuard<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            raw: retain_boxed(value),
        }
    }

    pub(crate) fn as_ptr(&self) -> *const T {
        self.raw
    }
}

impl<T> Drop for BoxedGuard<T> {
    fn drop(&mut self) {
        unsafe { release_boxed(self.raw) };
    }
}

/// Owns a contiguous array of `*const T`.
pub(crate) struct PtrArrayGuard<T> {
    data: *mut *const T,
    len: usize,
}

impl<T> PtrArrayGuard<T> {
    pub(crate) fn new(ptrs: Vec<*const T>) -> Self {
        let len = ptrs.len();
        Self {
            data: retain_slice(ptrs),
            len,
        }
    }

    pub(crate) fn as_ptr(&self) -> *const *const T {
        self.data
    }
}

impl<T> Drop for PtrArrayGuard<T> {
    fn drop(&mut self) {
        unsafe { release_slice(self.data, self.len) };
    }
}

/// Owns a fully materialized `CStringArray` (the struct, its pointer block
/// and every element string).
pub(crate) struct CStringArrayGuard {
    array: BoxedGuard<CStringArray>,
    _data: PtrArrayGuard<c_char>,
    _strings: Vec<CStringGuard>,
}

impl CStringArrayGuard {
    pub(crate) fn new(items: &[String]) -> Result<Self> {
        let mut strings = Vec::with_capacity(items.len());
        for item in items {
            strings.push(CStringGuard::new(Some(item))?);
        }
        let data = PtrArrayGuard::new(strings.iter().map(|s| s.as_ptr()).collect());
        let array = BoxedGuard::new(CStringArray {
            data: data.as_ptr(),
            size: items.len() as c_int,
        });
        Ok(Self {
            array,
            _data: data,
            _strings: strings,
        })
    }

    pub(crate) fn as_ptr(&self) -> *const CStringArray {
        self.array.as_ptr()
    }
}

/// Nullable-array helper: `None` encodes as a null pointer.
pub(crate) fn opt_array_ptr(guard: &Option<CStringArrayGuard>) -> *const CStringArray {
    guard
        .as_ref()
        .map_or(std::ptr::null(), CStringArrayGuard::as_ptr)
}

/// Owns a fully materialized `CMapStringToStringArray`.
pub(crate) struct StringMapGuard {
    map: BoxedGuard<CMapStringToStringArray>,
    _entries: Vec<BoxedGuard<CMapStringToStringArrayEntry>>,
    _ptrs: PtrArrayGuard<CMapStringToStringArrayEntry>,
    _keys: Vec<CStringGuard>,
    _values: Vec<CStringArrayGuard>,
}

impl StringMapGuard {
    pub(crate) fn new(map: &HashMap<String, Vec<String>>) -> Result<Self> {
        let mut keys = Vec::with_capacity(map.len());
        let mut values = Vec::with_capacity(map.len());
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let key = CStringGuard::new(Some(key))?;
            let value = CStringArrayGuard::new(value)?;
            entries.push(BoxedGuard::new(CMapStringToStringArrayEntry {
                key: key.as_ptr(),
                value: value.as_ptr(),
            }));
            keys.push(key);
            values.push(value);
        }
        let ptrs = PtrArrayGuard::new(entries.iter().map(|e| e.as_ptr()).collect());
        let map = BoxedGuard::new(CMapStringToStringArray {
            entries: ptrs.as_ptr(),
            count: entries.len() as c_int,
        });
        Ok(Self {
            map,
            _entries: entries,
            _ptrs: ptrs,
            _keys: keys,
            _values: values,
        })
    }

    pub(crate) fn as_ptr(&self) -> *const CMapStringToStringArray {
        self.map.as_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_strings_stay_distinct() {
        let absent = CStringGuard::new(None).unwrap();
        let empty = CStringGuard::new(Some("")).unwrap();
        assert!(absent.as_ptr().is_null());
        assert!(!empty.as_ptr().is_null());
        assert_eq!(unsafe { read_opt_string(absent.as_ptr()) }, None);
        assert_eq!(
            unsafe { read_opt_string(empty.as_ptr()) },
            Some(String::new())
        );
    }

    #[test]
    fn interior_nul_is_a_caller_error() {
        let err = CStringGuard::new(Some("he\0llo")).unwrap_err();
        assert!(matches!(err, ColloquyError::InteriorNul(_)));
    }

    #[test]
    fn string_array_round_trips_including_empty() {
        let items = vec!["weather".to_string(), String::new()];
        let guard = CStringArrayGuard::new(&items).unwrap();
        let back = unsafe { read_string_array(guard.as_ptr()) }.unwrap();
        assert_eq!(back, items);

        let empty = CStringArrayGuard::new(&[]).unwrap();
        let back = unsafe { read_string_array(empty.as_ptr()) }.unwrap();
        assert!(back.is_empty());
        // Empty is a real array, not an absent one.
        assert!(!empty.as_ptr().is_null());
    }

    #[test]
    fn string_map_round_trips() {
        let mut map = HashMap::new();
        map.insert(
            "locality".to_string(),
            vec!["wonderland".to_string(), "oz".to_string()],
        );
        map.insert("region".to_string(), vec![]);
        let guard = StringMapGuard::new(&map).unwrap();
        let back = unsafe { read_string_map(guard.as_ptr()) }.unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn required_null_string_is_a_protocol_error() {
        let err = unsafe { read_string(std::ptr::null()) }.unwrap_err();
        assert!(matches!(err, ColloquyError::Protocol(_)));
    }

    #[test]
    fn negative_array_size_is_a_protocol_error() {
        let array = CStringArray {
            data: std::ptr::null(),
            size: -1,
        };
        let err = unsafe { read_string_array(&array) }.unwrap_err();
        assert!(matches!(err, ColloquyError::Protocol(_)));
    }

    #[test]
    fn negative_map_count_is_a_protocol_error() {
        let map = CMapStringToStringArray {
            entries: std::ptr::null(),
            count: -3,
        };
        let err = unsafe { read_string_map(&map) }.unwrap_err();
        assert!(matches!(err, ColloquyError::Protocol(_)));
    }
}
