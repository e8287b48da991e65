use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gamekit_atlas::{AtlasRegistry, build_pass_shader};
use gamekit_shadergen::{Pass, TextureAddressingMode, TextureUnitState, UvwAddressingMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gamekit-cli", about = "CLI tool for gamekit atlas and shader inspection")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// List the tables and records of an atlas definition file
    Atlas {
        /// Definition file to parse
        file: PathBuf,
    },
    /// Print the WGSL generated for a pass sampling the given textures
    Shader {
        /// Atlas definition file
        file: PathBuf,
        /// Texture bound to each unit, in order
        #[arg(short, long = "texture", required = true)]
        textures: Vec<String>,
        /// Addressing mode applied to every unit
        #[arg(short, long, default_value = "wrap")]
        addressing: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("gamekit-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", gamekit_input::crate_info());
            println!("shadergen: {}", gamekit_shadergen::crate_info());
            println!("atlas: {}", gamekit_atlas::crate_info());
            println!("scene: {}", gamekit_scene::crate_info());
        }
        Commands::Atlas { file } => {
            let mut registry = AtlasRegistry::new();
            registry
                .load_definition_file(&file)
                .with_context(|| format!("loading {}", file.display()))?;

            println!("{} atlas table(s) in {}", registry.len(), file.display());
            for (name, table) in registry.tables() {
                println!("{name}: {} record(s)", table.len());
                for record in table.iter() {
                    println!(
                        "  [{}] {:<24} u={:.4} v={:.4} w={:.4} h={:.4}",
                        record.index_in_atlas,
                        record.source_texture_name,
                        record.offset_u,
                        record.offset_v,
                        record.width,
                        record.height
                    );
                }
            }
        }
        Commands::Shader {
            file,
            textures,
            addressing,
        } => {
            let mode: TextureAddressingMode = addressing.parse()?;
            tracing::debug!(units = textures.len(), ?mode, "building cli pass");
            let mut registry = AtlasRegistry::new();
            registry
                .load_definition_file(&file)
                .with_context(|| format!("loading {}", file.display()))?;

            let pass = textures.iter().fold(Pass::new("cli"), |pass, name| {
                pass.with_texture_unit(
                    TextureUnitState::new(name).with_addressing(UvwAddressingMode::uniform(mode)),
                )
            });
            let built = build_pass_shader(&pass, &registry)?;

            eprintln!("stages: {}", built.render_state.type_names().join(", "));
            for slot in &built.shader.uniforms {
                eprintln!(
                    "uniform {} @group({}) @binding({})",
                    slot.name, slot.group, slot.binding
                );
            }
            println!("{}", built.shader.source);
        }
    }

    Ok(())
}
