//! Shader program compilation.
//!
//! Every program is WGSL embedded in the binary. Before a module is handed to
//! wgpu it is parsed and validated with naga, so syntax and type errors come
//! back as [`ShaderError::Compile`] with a rendered diagnostic instead of a
//! device validation panic, and a missing entry point is reported as
//! [`ShaderError::Link`].

use std::borrow::Cow;

use log::{debug, info};
use thiserror::Error;

use crate::{post, scene, shadow};

/// Error types for shader compilation.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' failed to compile:\n{diagnostic}")]
    Compile { name: String, diagnostic: String },

    #[error("shader '{name}' has no entry point '{entry_point}'")]
    Link { name: String, entry_point: String },
}

/// Source text and entry points of one program.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    pub name: &'static str,
    pub source: Cow<'static, str>,
    pub vertex_entry: &'static str,
    /// `None` for depth-only programs.
    pub fragment_entry: Option<&'static str>,
}

impl ProgramSource {
    fn entry_points(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.vertex_entry).chain(self.fragment_entry)
    }
}

/// A validated shader module and the entry points pipelines use.
#[derive(Debug)]
pub struct ShaderProgram {
    pub name: &'static str,
    pub module: wgpu::ShaderModule,
    pub vertex_entry: &'static str,
    pub fragment_entry: Option<&'static str>,
}

/// Parse and validate a program's WGSL and check its entry points exist.
pub fn validate_program(program: &ProgramSource) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(&program.source).map_err(|err| {
        ShaderError::Compile {
            name: program.name.to_string(),
            diagnostic: err.emit_to_string(&program.source),
        }
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|err| ShaderError::Compile {
        name: program.name.to_string(),
        diagnostic: err.emit_to_string(&program.source),
    })?;

    for entry_point in program.entry_points() {
        if !module.entry_points.iter().any(|ep| ep.name == entry_point) {
            return Err(ShaderError::Link {
                name: program.name.to_string(),
                entry_point: entry_point.to_string(),
            });
        }
    }

    Ok(module)
}

/// Validate a program and create its wgpu shader module.
pub fn compile_program(
    device: &wgpu::Device,
    program: &ProgramSource,
) -> Result<ShaderProgram, ShaderError> {
    debug!("Compiling shader '{}'", program.name);
    validate_program(program)?;

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(program.name),
        source: wgpu::ShaderSource::Wgsl(program.source.clone()),
    });

    Ok(ShaderProgram {
        name: program.name,
        module,
        vertex_entry: program.vertex_entry,
        fragment_entry: program.fragment_entry,
    })
}

/// One compiled program per frame stage, built once at startup.
#[derive(Debug)]
pub struct ShaderSet {
    pub scene: ShaderProgram,
    pub shadow: ShaderProgram,
    pub cutoff: ShaderProgram,
    pub horizontal_blur: ShaderProgram,
    pub vertical_blur: ShaderProgram,
    pub composite: ShaderProgram,
}

impl ShaderSet {
    /// Sources in the order scene, shadow, cutoff, horizontal blur, vertical
    /// blur, composite.
    pub fn sources() -> [ProgramSource; 6] {
        [
            scene::program_source(),
            shadow::program_source(),
            post::cutoff_program_source(),
            post::horizontal_blur_program_source(),
            post::vertical_blur_program_source(),
            post::composite_program_source(),
        ]
    }

    /// Compile every program; the first failure aborts.
    pub fn compile(device: &wgpu::Device) -> Result<Self, ShaderError> {
        let [scene, shadow, cutoff, horizontal_blur, vertical_blur, composite] =
            Self::sources().map(|source| compile_program(device, &source));

        let set = Self {
            scene: scene?,
            shadow: shadow?,
            cutoff: cutoff?,
            horizontal_blur: horizontal_blur?,
            vertical_blur: vertical_blur?,
            composite: composite?,
        };
        info!("Compiled {} shader programs", Self::sources().len());
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_SHADER: &str = r#"
        @vertex
        fn vs_main(@builtin(vertex_index) idx: u32) -> @builtin(position) vec4<f32> {
            return vec4<f32>(0.0, 0.0, 0.0, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 0.0, 0.0, 1.0);
        }
    "#;

    const INVALID_SHADER: &str = r#"
        @vertex
        fn vs_main() -> @builtin(position) vec4<f32> {
            return undeclared_variable;
        }
    "#;

    fn program(source: &'static str, fragment_entry: Option<&'static str>) -> ProgramSource {
        ProgramSource {
            name: "test",
            source: Cow::Borrowed(source),
            vertex_entry: "vs_main",
            fragment_entry,
        }
    }

    #[test]
    fn test_valid_program_passes() {
        assert!(validate_program(&program(VALID_SHADER, Some("fs_main"))).is_ok());
    }

    #[test]
    fn test_parse_error_is_compile_error_with_diagnostic() {
        let err = validate_program(&program(INVALID_SHADER, None)).unwrap_err();
        match err {
            ShaderError::Compile { name, diagnostic } => {
                assert_eq!(name, "test");
                assert!(diagnostic.contains("undeclared_variable"));
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn test_type_error_is_compile_error() {
        let source = r#"
            @vertex
            fn vs_main() -> @builtin(position) vec4<f32> {
                let x: f32 = vec2<f32>(1.0, 2.0);
                return vec4<f32>(x);
            }
        "#;
        assert!(matches!(
            validate_program(&program(source, None)),
            Err(ShaderError::Compile { .. })
        ));
    }

    #[test]
    fn test_missing_entry_point_is_link_error() {
        let err = validate_program(&program(VALID_SHADER, Some("fs_missing"))).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Link { ref entry_point, .. } if entry_point == "fs_missing"
        ));
        assert!(err.to_string().contains("fs_missing"));
    }

    #[test]
    fn test_embedded_programs_all_validate() {
        for source in ShaderSet::sources() {
            if let Err(err) = validate_program(&source) {
                panic!("{err}");
            }
        }
    }

    #[test]
    fn test_program_names_are_unique() {
        let sources = ShaderSet::sources();
        let mut names: Vec<&str> = sources.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn test_only_shadow_program_is_depth_only() {
        let depth_only: Vec<&str> = ShaderSet::sources()
            .iter()
            .filter(|s| s.fragment_entry.is_none())
            .map(|s| s.name)
            .collect();
        assert_eq!(depth_only, vec!["shadow"]);
    }
}
