//! Virtual file-path composition shared by the Planner and the Simulator.
//! Structure-node `file_path` contributions compose by directory join (the
//! way the reference implementation's `path.join`/`path.dirname` do), not by
//! raw string concatenation.

pub(crate) fn dirname(path: &str) -> String {
    match path.rfind('/') {
        Some(i) => path[..i].to_string(),
        None => String::new(),
    }
}

/// An absolute `component` replaces `base` outright; an empty `base` is just
/// `component`; otherwise they're joined with exactly one separator.
pub(crate) fn join(base: &str, component: &str) -> String {
    if component.starts_with('/') {
        component.to_string()
    } else if base.is_empty() {
        component.to_string()
    } else if base.ends_with('/') {
        format!("{base}{component}")
    } else {
        format!("{base}/{component}")
    }
}
