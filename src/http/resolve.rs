use std::path::{Path, PathBuf};

use super::error::{RouteError, RouteResult};

/// Map a request path onto a file below `root`
///
/// ## Arguments
///
/// `req_path`: the request path, without query string
/// `root`: absolute static assets folder from config
/// `index_file`: default document for directory requests
///
/// Paths containing `..` anywhere are rejected before touching the disk.
/// The result is used as the cache key, so equal files always map to the
/// same path: empty and `.` segments are dropped.
pub fn resolve_path(req_path: &str, root: &Path, index_file: &str) -> RouteResult<PathBuf> {
    if req_path.contains("..") {
        return Err(RouteError::BadRequest());
    }

    let mut path = root.to_path_buf();
    req_path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .for_each(|segment| path.push(segment));

    if req_path.is_empty() || req_path.ends_with('/') {
        path.push(index_file);
    }
    Ok(path)
}
