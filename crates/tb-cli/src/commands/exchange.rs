//! Commands that talk to the geometry server

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use tb_core::config::ClientConfig;
use tb_core::operators::Operator;
use tb_core::{with_session, HostMesh};
use tb_protocol::PropertyBag;

use crate::obj;
use crate::output::{format_objects, print_info, print_success, print_warning};

/// Run a preset operator, reading the active object from `input` when the
/// operator needs one
pub fn operator_command(
    config: &ClientConfig,
    operator: &dyn Operator,
    input: Option<&Path>,
    output_dir: &Path,
) -> Result<()> {
    let object = match input {
        Some(path) if operator.requires_object() => Some(load_input(path)?),
        Some(path) => {
            print_warning(&format!(
                "{} takes no input object, ignoring {:?}",
                operator.label(),
                path
            ));
            None
        }
        None if operator.requires_object() => {
            bail!("{} needs an input object", operator.label())
        }
        None => None,
    };

    print_info(&format!("{} via {}", operator.label(), config.address()));
    let objects = with_session(config, |c| c.execute(operator, object.as_ref()))
        .with_context(|| format!("{} failed", operator.command()))?;

    report(operator.command(), objects, output_dir)
}

/// Send an arbitrary command with `key=value` properties
pub fn send_command(
    config: &ClientConfig,
    command: &str,
    input: Option<&Path>,
    properties: &[String],
    output_dir: &Path,
) -> Result<()> {
    let properties = parse_properties(properties)?;
    let object = input.map(load_input).transpose()?;

    let objects = with_session(config, |c| {
        match &object {
            Some(object) => c.send_single_object(object, command, &properties)?,
            None => c.send_command_only(command, &properties)?,
        }
        c.receive_objects()
    })
    .with_context(|| format!("{} failed", command))?;

    report(command, objects, output_dir)
}

fn load_input(path: &Path) -> Result<HostMesh> {
    let mesh = obj::read_obj(path)?;
    tracing::debug!(
        object = %mesh.name,
        vertices = mesh.vertices.len(),
        polygons = mesh.polygons.len(),
        "Loaded input"
    );
    Ok(mesh)
}

/// Parse `key=value` pairs. Later pairs replace earlier ones.
pub fn parse_properties(pairs: &[String]) -> Result<PropertyBag> {
    let mut properties = PropertyBag::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Expected key=value, got '{}'", pair))?;
        if key.is_empty() {
            bail!("Empty property name in '{}'", pair);
        }
        properties.insert(key, value);
    }
    Ok(properties)
}

fn report(command: &str, objects: Vec<HostMesh>, output_dir: &Path) -> Result<()> {
    let written = write_objects(command, objects, output_dir)?;
    println!("{}", format_objects(&written));
    if !written.is_empty() {
        print_success(&format!(
            "Wrote {} object(s) to {:?}",
            written.len(),
            output_dir
        ));
    }
    Ok(())
}

/// Write each object to `<output_dir>/<command>-<n>.obj`
pub fn write_objects(
    command: &str,
    objects: Vec<HostMesh>,
    output_dir: &Path,
) -> Result<Vec<(HostMesh, PathBuf)>> {
    if objects.is_empty() {
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let stem = command.rsplit('.').next().unwrap_or(command);
    objects
        .into_iter()
        .enumerate()
        .map(|(n, mesh)| -> Result<(HostMesh, PathBuf)> {
            let path = output_dir.join(format!("{}-{}.obj", stem, n));
            obj::write_obj(&path, &mesh)
                .with_context(|| format!("Failed to write {:?}", path))?;
            Ok((mesh, path))
        })
        .collect()
}
