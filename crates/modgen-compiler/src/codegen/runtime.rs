//! Base class skeletons embedded at compile time.
//!
//! The generated classes extend `BaseObject`, `BaseComponent` and
//! `BaseResult`, which are hand-maintained per project. These sources live in
//! the `runtime/` directory and are written once by `modgen scaffold`.
//! `__NAMESPACE__` stands for the target's root namespace.

use std::path::Path;

use super::RenderedFile;

const NAMESPACE: &str = "__NAMESPACE__";

/// Single ES module exporting all three base classes.
pub const JAVASCRIPT: &str = include_str!("../../runtime/javascript/runtime.js");

/// C# base classes as (class, source) pairs.
pub const CSHARP: &[(&str, &str)] = &[
    ("BaseObject", include_str!("../../runtime/csharp/BaseObject.cs")),
    ("BaseComponent", include_str!("../../runtime/csharp/BaseComponent.cs")),
    ("BaseResult", include_str!("../../runtime/csharp/BaseResult.cs")),
];

/// ActionScript 2 base classes as (class, source) pairs. AS2 needs one file per class.
pub const ACTIONSCRIPT2: &[(&str, &str)] = &[
    ("BaseObject", include_str!("../../runtime/actionscript2/BaseObject.as")),
    ("BaseComponent", include_str!("../../runtime/actionscript2/BaseComponent.as")),
    ("BaseResult", include_str!("../../runtime/actionscript2/BaseResult.as")),
];

/// One file per class, `<dir>/<Class><ext>`, with the namespace filled in.
pub fn per_class(sources: &[(&str, &str)], dir: &Path, extension: &str, namespace: &str) -> Vec<RenderedFile> {
    sources
        .iter()
        .map(|(class, source)| RenderedFile {
            path: dir.join(format!("{}{}", class, extension)),
            contents: source.replace(NAMESPACE, namespace),
        })
        .collect()
}
