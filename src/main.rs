//! `molmount` command line: compile protein lists into MolViewSpec scenes
//! and print the options schema.

use std::cell::Cell;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use molmount::{
    compile, MolmountError, ObjectUrlProvider, Options, Protein, UploadedFile,
};

#[derive(Parser)]
#[command(name = "molmount", about = "MolViewSpec scene tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a JSON list of proteins into a .mvsj scene
    Compile {
        /// JSON file holding an array of proteins
        proteins: PathBuf,
        /// Write the scene here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// TOML options preset (only the [sources] table is used)
        #[arg(long)]
        options: Option<PathBuf>,
        /// Directory that receives embedded structure files
        #[arg(long, default_value = ".")]
        assets: PathBuf,
    },
    /// Print the JSON Schema of the options file
    Schema,
    /// List the option presets (TOML files) in a directory
    Presets {
        /// Directory holding `<name>.toml` presets
        dir: PathBuf,
    },
}

/// Writes uploaded files to disk and references them by path.
///
/// Only the final component of an uploaded name is kept, prefixed with the
/// upload's position so equal names do not overwrite each other.
struct AssetDir<'a> {
    dir: &'a Path,
    written: Cell<usize>,
}

impl<'a> AssetDir<'a> {
    fn new(dir: &'a Path) -> Self {
        Self {
            dir,
            written: Cell::new(0),
        }
    }
}

impl ObjectUrlProvider for AssetDir<'_> {
    fn create_object_url(
        &self,
        file: &UploadedFile,
    ) -> Result<String, MolmountError> {
        let name = Path::new(&file.name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                MolmountError::configuration(format!(
                    "uploaded file name {:?} has no file component",
                    file.name
                ))
            })?;
        let index = self.written.get();
        let path = self.dir.join(format!("{index}-{name}"));
        std::fs::write(&path, &file.bytes)?;
        self.written.set(index + 1);
        log::info!("Wrote {}", path.display());
        Ok(path.display().to_string())
    }
}

fn compile_cmd(
    proteins: &Path,
    output: Option<&Path>,
    options: Option<&Path>,
    assets: &Path,
) -> Result<()> {
    let options = match options {
        Some(path) => Options::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Options::default(),
    };
    let text = std::fs::read_to_string(proteins)
        .with_context(|| format!("reading {}", proteins.display()))?;
    let proteins: Vec<Protein> =
        serde_json::from_str(&text).context("parsing protein list")?;

    std::fs::create_dir_all(assets)?;
    let scene = compile(
        &proteins,
        &options.sources.model_source_urls(),
        Some(&AssetDir::new(assets)),
    )?;
    let json = scene.to_json_pretty()?;
    log::info!(
        "Compiled {} structure(s) from {} protein(s)",
        scene.structure_count(),
        proteins.len()
    );

    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => writeln!(std::io::stdout().lock(), "{json}")?,
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Compile {
            proteins,
            output,
            options,
            assets,
        } => compile_cmd(
            &proteins,
            output.as_deref(),
            options.as_deref(),
            &assets,
        ),
        Command::Schema => {
            let schema = serde_json::to_string_pretty(&Options::json_schema())?;
            writeln!(std::io::stdout().lock(), "{schema}")?;
            Ok(())
        }
        Command::Presets { dir } => {
            let mut out = std::io::stdout().lock();
            for name in Options::list_presets(&dir) {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_stay_inside_the_asset_dir() {
        let root = tempfile::tempdir().unwrap();
        let assets = root.path().join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        let dir = AssetDir::new(&assets);

        let escaped = dir
            .create_object_url(&UploadedFile::new("../escaped.pdb", vec![1]))
            .unwrap();
        let absolute = dir
            .create_object_url(&UploadedFile::new("/etc/model.pdb", vec![2]))
            .unwrap();
        assert!(Path::new(&escaped).starts_with(&assets));
        assert!(Path::new(&absolute).starts_with(&assets));
        assert!(!root.path().join("escaped.pdb").exists());
    }

    #[test]
    fn equal_names_do_not_collide() {
        let assets = tempfile::tempdir().unwrap();
        let dir = AssetDir::new(assets.path());
        let a = dir
            .create_object_url(&UploadedFile::new("model.cif", vec![1]))
            .unwrap();
        let b = dir
            .create_object_url(&UploadedFile::new("model.cif", vec![2]))
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(std::fs::read(&a).unwrap(), vec![1]);
        assert_eq!(std::fs::read(&b).unwrap(), vec![2]);
    }

    #[test]
    fn name_without_file_component_is_rejected() {
        let assets = tempfile::tempdir().unwrap();
        let err = AssetDir::new(assets.path())
            .create_object_url(&UploadedFile::new("..", vec![1]))
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
