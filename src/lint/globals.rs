//! Predeclared globals per environment.

use crate::{Error, Result};

const BUILTIN: &[&str] = &[
    "Array", "ArrayBuffer", "BigInt", "Boolean", "DataView", "Date", "Error", "EvalError",
    "Float32Array", "Float64Array", "Function", "Infinity", "Int16Array", "Int32Array",
    "Int8Array", "Intl", "JSON", "Map", "Math", "NaN", "Number", "Object", "Promise", "Proxy",
    "RangeError", "ReferenceError", "Reflect", "RegExp", "Set", "String", "Symbol",
    "SyntaxError", "TypeError", "URIError", "Uint16Array", "Uint32Array", "Uint8Array",
    "Uint8ClampedArray", "WeakMap", "WeakSet", "arguments", "decodeURI", "decodeURIComponent",
    "encodeURI", "encodeURIComponent", "eval", "globalThis", "isFinite", "isNaN", "parseFloat",
    "parseInt", "undefined",
];

const BROWSER: &[&str] = &[
    "Blob", "CustomEvent", "Element", "Event", "File", "FileReader", "FormData", "HTMLElement",
    "Image", "Node", "URL", "URLSearchParams", "WebSocket", "XMLHttpRequest", "alert",
    "cancelAnimationFrame", "clearInterval", "clearTimeout", "confirm", "console", "document",
    "fetch", "getComputedStyle", "history", "localStorage", "location", "matchMedia", "navigator",
    "performance", "prompt", "requestAnimationFrame", "screen", "self", "sessionStorage",
    "setInterval", "setTimeout", "window",
];

const NODE: &[&str] = &[
    "Buffer", "__dirname", "__filename", "clearImmediate", "clearInterval", "clearTimeout",
    "console", "exports", "global", "module", "process", "require", "setImmediate",
    "setInterval", "setTimeout",
];

/// Globals of a named environment.
pub fn environment(name: &str) -> Result<&'static [&'static str]> {
    match name {
        "builtin" => Ok(BUILTIN),
        "browser" => Ok(BROWSER),
        "node" => Ok(NODE),
        other => Err(Error::Validation(format!(
            "Unknown lint environment: {} (expected builtin, browser or node)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_environments() {
        assert!(environment("builtin").unwrap().contains(&"undefined"));
        assert!(environment("browser").unwrap().contains(&"document"));
        assert!(environment("node").unwrap().contains(&"require"));
    }

    #[test]
    fn test_unknown_environment() {
        let err = environment("deno").unwrap_err();
        assert!(err.to_string().contains("Unknown lint environment: deno"));
    }
}
