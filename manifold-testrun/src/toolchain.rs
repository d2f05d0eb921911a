//! Toolchain pin verification.

use crate::error::ToolchainError;
use crate::process::{ProcessLauncher, ProcessSpec};
use camino::Utf8Path;
use manifold_descriptor::ToolchainPin;
use tracing::{debug, info};

/// Major version reported by a runtime's version banner.
///
/// Takes the first version number after a `version` token, falling back to
/// the first number anywhere. Legacy `1.x` numbering reports `x`.
pub fn parse_major_version(output: &str) -> Option<u32> {
    let lower = output.to_ascii_lowercase();
    lower
        .find("version")
        .and_then(|at| first_major(&lower[at + "version".len()..]))
        .or_else(|| first_major(&lower))
}

fn first_major(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let number: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts = number.split('.').filter(|p| !p.is_empty());
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        if let Some(minor) = parts.next().and_then(|p| p.parse().ok()) {
            return Some(minor);
        }
    }
    Some(first)
}

/// Run the pin's probe, if any, and compare major versions.
///
/// Returns the detected major version, or `None` when no probe is configured.
pub fn verify_toolchain(
    launcher: &dyn ProcessLauncher,
    project_root: &Utf8Path,
    pin: &ToolchainPin,
) -> Result<Option<u32>, ToolchainError> {
    let Some(argv) = pin.probe.as_deref() else {
        debug!(language = %pin.language, "no toolchain probe configured");
        return Ok(None);
    };
    let Some(spec) = ProcessSpec::from_argv(argv, project_root) else {
        return Err(ToolchainError::Probe {
            probe: String::new(),
            message: "probe command is empty".to_string(),
        });
    };
    let probe = spec.display();
    let output = launcher.capture(&spec).map_err(|err| ToolchainError::Probe {
        probe: probe.clone(),
        message: format!("{err:#}"),
    })?;

    // `java -version` prints to stderr.
    let text = format!("{}\n{}", output.stdout, output.stderr);
    if output.code != Some(0) {
        return Err(ToolchainError::ProbeFailed {
            probe,
            code: output.code,
            output: text.trim().to_string(),
        });
    }
    let found = parse_major_version(&text).ok_or_else(|| ToolchainError::Unrecognized {
        language: pin.language.clone(),
        probe: probe.clone(),
        output: text.trim().to_string(),
    })?;
    if found != pin.version {
        return Err(ToolchainError::Mismatch {
            language: pin.language.clone(),
            expected: pin.version,
            found,
            probe,
        });
    }
    info!(language = %pin.language, version = found, "toolchain verified");
    Ok(Some(found))
}
