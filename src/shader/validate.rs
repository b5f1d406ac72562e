use std::{
    ffi::OsString,
    io::Write,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::Context;

use super::ShaderBlock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Passed,
    Failed { diagnostic: String },
}

/// Something that can decide whether a shader compiles.
pub trait ShaderValidator {
    /// Returns `Ok(Validation::Failed { .. })` for shaders that do not compile. `Err` is reserved
    /// for failures of the check itself.
    fn validate(&self, shader: &ShaderBlock) -> anyhow::Result<Validation>;
}

/// Runs a command line validator such as `glslangValidator` on a temporary
/// copy of the shader. The tool gets the path as its last argument and infers
/// the stage from its `.vert` / `.frag` extension.
#[derive(Debug, Clone)]
pub struct ExternalValidator {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalValidator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ExternalValidator {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Adds an argument passed ahead of the shader path.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ShaderValidator for ExternalValidator {
    fn validate(&self, shader: &ShaderBlock) -> anyhow::Result<Validation> {
        let suffix = format!(".{}", shader.kind.extension());

        // deleted on drop, on every path out of this function
        let mut file = tempfile::Builder::new()
            .prefix("shader-check-")
            .suffix(&suffix)
            .tempfile()
            .context("could not create temporary shader file")?;

        let written = file
            .write_all(shader.source.as_bytes())
            .and_then(|()| file.flush());
        written.with_context(|| format!("could not write {} to {:?}", shader.name, file.path()))?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .output()
            .with_context(|| format!("could not run '{}'", self.program.display()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!(shader = %shader.name, %stderr, "validator wrote to stderr");
        }

        if output.status.success() {
            Ok(Validation::Passed)
        } else {
            debug!(shader = %shader.name, status = %output.status, "validation failed");
            Ok(Validation::Failed {
                diagnostic: String::from_utf8_lossy(&output.stdout).into_owned(),
            })
        }
    }
}
