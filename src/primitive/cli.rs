//! Subprocess-backed transformer

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;

use super::{TransformError, TransformOptions, Transformer};
use crate::logger;

/// Runs the external `primitive` program once per transform
#[derive(Debug, Clone)]
pub struct PrimitiveCli {
    program: String,
    extra_args: Vec<String>,
    /// Where intermediate files go, the system temp dir when `None`
    scratch_dir: Option<PathBuf>,
}

impl PrimitiveCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            scratch_dir: None,
        }
    }

    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    fn scratch_file(&self, prefix: &str, ext: &str) -> std::io::Result<tempfile::NamedTempFile> {
        let suffix = format!(".{ext}");
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix).suffix(&suffix);
        match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}

/// Build the argument list: `-i <in> -o <out> -n <shapes> [-m <mode>] [extra...]`
pub fn build_args(
    input: &Path,
    output: &Path,
    options: TransformOptions,
    extra: &[String],
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-i".into(),
        input.as_os_str().to_owned(),
        "-o".into(),
        output.as_os_str().to_owned(),
        "-n".into(),
        options.shapes.to_string().into(),
    ];
    if let Some(mode) = options.mode {
        args.push("-m".into());
        args.push(mode.code().to_string().into());
    }
    args.extend(extra.iter().map(OsString::from));
    args
}

/// Join stdout and stderr the way a terminal would show them
fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut out = String::from_utf8_lossy(stdout).into_owned();
    let err = String::from_utf8_lossy(stderr);
    if !out.is_empty() && !err.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&err);
    out.trim_end().to_string()
}

#[async_trait]
impl Transformer for PrimitiveCli {
    async fn transform(
        &self,
        input: &[u8],
        ext: &str,
        options: TransformOptions,
    ) -> Result<Vec<u8>, TransformError> {
        // Both files are removed when they go out of scope
        let input_file = self.scratch_file("input_", ext)?;
        let output_file = self.scratch_file("output_", ext)?;

        tokio::fs::write(input_file.path(), input).await?;

        let args = build_args(
            input_file.path(),
            output_file.path(),
            options,
            &self.extra_args,
        );
        logger::log_transform_start(&self.program, &args);

        let started = Instant::now();
        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| TransformError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let combined = combined_output(&output.stdout, &output.stderr);
        logger::log_transform_finish(&self.program, output.status, started.elapsed(), &combined);

        if !output.status.success() {
            return Err(TransformError::Failed {
                program: self.program.clone(),
                status: output.status,
                output: combined,
            });
        }

        let image = tokio::fs::read(output_file.path()).await?;
        if image.is_empty() {
            return Err(TransformError::EmptyOutput(self.program.clone()));
        }
        Ok(image)
    }
}
