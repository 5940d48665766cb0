//! Process-lifetime string cache
//!
//! The logging backend keeps references to the trace labels it is handed, so
//! those labels must never move or be freed. This cache interns strings into
//! leaked, process-lifetime storage and hands out stable `&'static str`
//! references. Interning the same string twice returns the same reference.

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;

lazy_static! {
    static ref CACHE: Mutex<HashMap<String, &'static str>> = Mutex::new(HashMap::new());
}

/// Intern a string, returning a stable process-lifetime reference
pub fn intern(s: &str) -> &'static str {
    let mut cache = CACHE.lock().unwrap();
    if let Some(&cached) = cache.get(s) {
        return cached;
    }
    let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
    cache.insert(s.to_owned(), leaked);
    leaked
}
