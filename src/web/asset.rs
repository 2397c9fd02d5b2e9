use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Gzipped page produced by the build script.
const INDEX_HTML_GZ: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/index.html.gz"));

pub(crate) const ASSETS: &[(&[u8], &str)] = &[(INDEX_HTML_GZ, "text/html; charset=utf-8")];

pub(crate) static ASSETS_MAP: Lazy<HashMap<&str, usize>> =
    Lazy::new(|| HashMap::from([("/", 0), (r"/index.html", 0)]));
