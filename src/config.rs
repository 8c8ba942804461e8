//! On-disk layout of a sysdef root: `config.yaml` plus one YAML file per module.

use anyhow::{Context, Result, bail};
use log::debug;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::module::{FileSource, Module};
use crate::runtime::Runtime;
use crate::variables::VariableStore;

pub const CONFIG_FILE: &str = "config.yaml";
pub const LOCKFILE_NAME: &str = "sysdef-lock.json";
pub const MODULES_DIR: &str = "modules";
pub const DOTFILES_DIR: &str = "dotfiles";

/// `<root>/config.yaml`. Every field may be left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Providers to manage, in run order.
    pub providers: Vec<String>,
    /// Module files to load from `<root>/modules`, in order.
    pub modules: Vec<String>,
    /// Global variables; these override the built-in ones.
    pub variables: HashMap<String, String>,
}

/// A `files` entry: a dotfiles path to link, or a template to generate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FileDeclaration {
    Link(String),
    Template { template: String },
}

/// `<root>/modules/<name>.yaml`.
///
/// Maps are kept as raw [`Mapping`]s so their key order survives parsing;
/// that order is the order the engine processes entries in.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleFile {
    pub name: Option<String>,
    pub variables: Option<HashMap<String, String>>,
    pub packages: Option<Mapping>,
    pub files: Option<Mapping>,
    pub directories: Option<Mapping>,
    pub on_every_sync: Option<Vec<String>>,
}

fn ordered_entries<T>(mapping: Option<Mapping>, field: &str) -> Result<Vec<(String, T)>>
where
    T: serde::de::DeserializeOwned,
{
    let Some(mapping) = mapping else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = match key {
            Value::String(s) => s,
            other => bail!("Keys under `{}` must be strings, got {:?}", field, other),
        };
        let value: T = serde_yaml::from_value(value)
            .with_context(|| format!("Invalid value for `{}` under `{}`", key, field))?;
        entries.push((key, value));
    }
    Ok(entries)
}

impl ModuleFile {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Convert into a [`Module`], naming it `default_name` if the file doesn't.
    pub fn into_module(self, default_name: &str) -> Result<Module> {
        let name = self.name.unwrap_or_else(|| default_name.to_string());

        let files = ordered_entries::<FileDeclaration>(self.files, "files")?
            .into_iter()
            .map(|(dest, decl)| {
                let source = match decl {
                    FileDeclaration::Link(path) => FileSource::link(path),
                    FileDeclaration::Template { template } => FileSource::template(template),
                };
                (dest, source)
            })
            .collect();

        Ok(Module {
            name,
            variables: self.variables.unwrap_or_default(),
            packages: ordered_entries(self.packages, "packages")?,
            directories: ordered_entries(self.directories, "directories")?,
            files,
            on_every_sync: self.on_every_sync.unwrap_or_default(),
        })
    }
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn module_path(root: &Path, name: &str) -> PathBuf {
    root.join(MODULES_DIR).join(format!("{}.yaml", name))
}

#[tracing::instrument(skip(runtime))]
pub fn load_config<R: Runtime>(runtime: &R, root: &Path) -> Result<ConfigFile> {
    let path = config_path(root);
    if !runtime.exists(&path) {
        bail!("No {} found in {:?}", CONFIG_FILE, root);
    }

    let text = runtime.read_to_string(&path)?;
    let config: ConfigFile =
        serde_yaml::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))?;
    debug!(
        "Loaded config: {} provider(s), {} module(s)",
        config.providers.len(),
        config.modules.len()
    );
    Ok(config)
}

/// Load the named modules in the order given. A missing file is an error.
#[tracing::instrument(skip(runtime))]
pub fn load_modules<R: Runtime>(runtime: &R, root: &Path, names: &[String]) -> Result<Vec<Module>> {
    let mut modules = Vec::with_capacity(names.len());
    for name in names {
        let path = module_path(root, name);
        if !runtime.exists(&path) {
            bail!("Module {} was not found at {:?}", name, path);
        }

        let text = runtime.read_to_string(&path)?;
        let module = ModuleFile::parse(&text)
            .and_then(|file| file.into_module(name))
            .with_context(|| format!("Failed to load module {} from {:?}", name, path))?;
        debug!("Loaded module {}", module.name);
        modules.push(module);
    }
    Ok(modules)
}

/// `HOMEDIR` and `ROOTDIR`, overlaid with the config's variables.
pub fn base_variables<R: Runtime>(runtime: &R, root: &Path, config: &ConfigFile) -> Result<VariableStore> {
    let home = runtime.home_dir().context("Could not find home directory")?;

    let mut store = VariableStore::new();
    store.set("HOMEDIR", home.to_string_lossy());
    store.set("ROOTDIR", root.to_string_lossy());
    store.insert_all(&config.variables);
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use tempfile::tempdir;

    const MODULE_YAML: &str = r#"
name: core
variables:
  shell: zsh
packages:
  cargo: [ripgrep, "bat:0.24.0"]
  arch-official: [git]
files:
  "{HOMEDIR}/.zshrc": zshrc
  "{HOMEDIR}/.profile":
    template: "export SHELL={shell}"
  "{HOMEDIR}/.bashrc": bashrc
directories:
  "{HOMEDIR}/.config/nvim": nvim
on_every_sync: ["echo synced"]
"#;

    #[test]
    fn test_parse_module_keeps_declaration_order() {
        let module = ModuleFile::parse(MODULE_YAML)
            .unwrap()
            .into_module("ignored")
            .unwrap();

        assert_eq!(module.name, "core");
        assert_eq!(module.variables["shell"], "zsh");
        assert_eq!(
            module.packages,
            vec![
                ("cargo".to_string(), vec!["ripgrep".to_string(), "bat:0.24.0".to_string()]),
                ("arch-official".to_string(), vec!["git".to_string()]),
            ]
        );
        let dests: Vec<&str> = module.files.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(dests, ["{HOMEDIR}/.zshrc", "{HOMEDIR}/.profile", "{HOMEDIR}/.bashrc"]);
        assert!(matches!(&module.files[0].1, FileSource::Link(p) if p == "zshrc"));
        assert_eq!(module.directories[0].1, "nvim");
        assert_eq!(module.on_every_sync, ["echo synced"]);
    }

    #[test]
    fn test_template_file_fills_in_at_generation() {
        let module = ModuleFile::parse(MODULE_YAML)
            .unwrap()
            .into_module("core")
            .unwrap();

        let FileSource::Generated(generate) = &module.files[1].1 else {
            panic!("Expected a generated file");
        };
        let mut store = VariableStore::new();
        store.set("shell", "fish");
        assert_eq!(generate(&store).unwrap(), "export SHELL=fish");
    }

    #[test]
    fn test_name_defaults_to_file_stem_and_empty_sections() {
        let module = ModuleFile::parse("files:\n")
            .unwrap()
            .into_module("tiny")
            .unwrap();
        assert_eq!(module.name, "tiny");
        assert!(module.files.is_empty());
        assert!(module.packages.is_empty());
    }

    #[test]
    fn test_unknown_module_field_is_rejected() {
        assert!(ModuleFile::parse("packagez:\n  cargo: [bat]\n").is_err());
    }

    #[test]
    fn test_bad_file_declaration_is_rejected() {
        let err = ModuleFile::parse("files:\n  /tmp/x:\n    nope: 1\n")
            .unwrap()
            .into_module("m")
            .unwrap_err();
        assert!(format!("{:#}", err).contains("/tmp/x"));
    }

    #[test]
    fn test_load_config_and_modules_from_disk() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::write(
            root.join("config.yaml"),
            "providers: [cargo]\nmodules: [b, a]\nvariables:\n  editor: nvim\n",
        )
        .unwrap();
        std::fs::create_dir(root.join("modules")).unwrap();
        std::fs::write(root.join("modules/a.yaml"), "on_every_sync: [\"true\"]\n").unwrap();
        std::fs::write(root.join("modules/b.yaml"), "name: custom\n").unwrap();

        let runtime = RealRuntime;
        let config = load_config(&runtime, root).unwrap();
        assert_eq!(config.providers, ["cargo"]);
        assert_eq!(config.variables["editor"], "nvim");

        let modules = load_modules(&runtime, root, &config.modules).unwrap();
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["custom", "a"]);
    }

    #[test]
    fn test_missing_module_file_is_fatal() {
        let dir = tempdir().unwrap();
        let err = load_modules(&RealRuntime, dir.path(), &["ghost".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Module ghost was not found"));
    }

    #[test]
    fn test_missing_config_is_fatal() {
        let dir = tempdir().unwrap();
        assert!(load_config(&RealRuntime, dir.path()).is_err());
    }

    #[test]
    fn test_base_variables_config_overrides_builtins() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));

        let config = ConfigFile {
            variables: HashMap::from([
                ("editor".to_string(), "nvim".to_string()),
                ("ROOTDIR".to_string(), "/elsewhere".to_string()),
            ]),
            ..Default::default()
        };

        let store = base_variables(&runtime, Path::new("/home/user/sysdef"), &config).unwrap();
        assert_eq!(store.get("HOMEDIR").unwrap(), "/home/user");
        assert_eq!(store.get("ROOTDIR").unwrap(), "/elsewhere");
        assert_eq!(store.get("editor").unwrap(), "nvim");
    }

    #[test]
    fn test_modules_are_looked_up_under_modules_dir() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/r/modules/x.yaml")))
            .returning(|_| false);
        assert!(load_modules(&runtime, Path::new("/r"), &["x".to_string()]).is_err());
    }
}
