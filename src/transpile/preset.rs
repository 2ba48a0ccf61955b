//! Presets and the passes they expand to.

use std::fmt;

use crate::{Error, Result};

/// A single transform pass.
///
/// The declaration order is the order passes run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pass {
    Jsx,
    ModulesCommonjs,
    Classes,
    ShorthandProperties,
    ComputedProperties,
    TemplateLiterals,
    Literals,
    Destructuring,
    ForOf,
    ArrowFunctions,
    Parameters,
    Spread,
    BlockScoping,
}

impl Pass {
    pub const ALL: [Pass; 13] = [
        Pass::Jsx,
        Pass::ModulesCommonjs,
        Pass::Classes,
        Pass::ShorthandProperties,
        Pass::ComputedProperties,
        Pass::TemplateLiterals,
        Pass::Literals,
        Pass::Destructuring,
        Pass::ForOf,
        Pass::ArrowFunctions,
        Pass::Parameters,
        Pass::Spread,
        Pass::BlockScoping,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Pass::Jsx => "jsx",
            Pass::ModulesCommonjs => "modules-commonjs",
            Pass::Classes => "classes",
            Pass::ShorthandProperties => "shorthand-properties",
            Pass::ComputedProperties => "computed-properties",
            Pass::TemplateLiterals => "template-literals",
            Pass::Literals => "literals",
            Pass::Destructuring => "destructuring",
            Pass::ForOf => "for-of",
            Pass::ArrowFunctions => "arrow-functions",
            Pass::Parameters => "parameters",
            Pass::Spread => "spread",
            Pass::BlockScoping => "block-scoping",
        }
    }

    /// Passes of the `es2015` preset.
    pub fn es2015() -> Vec<Pass> {
        Self::ALL
            .into_iter()
            .filter(|pass| *pass != Pass::Jsx)
            .collect()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pass| pass.name() == name)
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Passes of a named preset, or the single pass of that name.
pub fn expand(name: &str) -> Result<Vec<Pass>> {
    match name {
        "react" => Ok(vec![Pass::Jsx]),
        "es2015" => Ok(Pass::es2015()),
        other => Pass::from_name(other)
            .map(|pass| vec![pass])
            .ok_or_else(|| Error::UnknownPreset(other.to_string())),
    }
}

/// Expand preset names into the deduplicated passes, in run order.
pub fn resolve_presets(names: &[String]) -> Result<Vec<Pass>> {
    let mut passes = Vec::new();
    for name in names {
        passes.extend(expand(name)?);
    }
    passes.sort();
    passes.dedup();
    Ok(passes)
}
