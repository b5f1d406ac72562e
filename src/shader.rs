mod extract;
mod unescape;
mod validate;

pub use extract::Extractor;
pub use validate::{ExternalValidator, ShaderValidator, Validation};

/// Pipeline stage of an embedded shader, taken from the `...VertexSource` /
/// `...FragmentSource` suffix of its declaration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    /// The file extension glslang-style validators use to pick the stage.
    pub fn extension(self) -> &'static str {
        match self {
            ShaderKind::Vertex => "vert",
            ShaderKind::Fragment => "frag",
        }
    }

    fn from_suffix(suffix: &str) -> Option<ShaderKind> {
        match suffix {
            "Vertex" => Some(ShaderKind::Vertex),
            "Fragment" => Some(ShaderKind::Fragment),
            _ => None,
        }
    }
}

impl std::fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderKind::Vertex => f.write_str("vertex"),
            ShaderKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// A shader literal found in a host source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderBlock {
    /// Full declaration token, e.g. `overlayVertexSource`.
    pub name: String,
    pub kind: ShaderKind,
    /// Shader text with string-literal escapes already decoded.
    pub source: String,
    /// 1-based line of the opening marker.
    pub line: usize,
}
