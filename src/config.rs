use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};

/// Files scanned when no paths are given on the command line.
pub const DEFAULT_PATHS: &[&str] = &["Sources/awc/Neon.swift"];

pub const DEFAULT_VALIDATOR: &str = "glslangValidator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Files to scan, or directories to search for them.
    pub paths: Vec<PathBuf>,
    /// Extensions of the files picked up when walking a directory.
    pub extensions: Vec<String>,
    pub validator: PathBuf,
    /// Extra validator arguments, passed ahead of the shader path.
    pub validator_args: Vec<String>,
    /// Only print the shaders found.
    pub list: bool,
}

pub fn command() -> Command {
    Command::new("shader_check")
        .about("Validates GLSL shaders embedded as string literals in source files")
        .arg(
            Arg::new("paths")
                .value_name("PATHS")
                .num_args(1..)
                .value_parser(clap::value_parser!(PathBuf))
                .default_values(DEFAULT_PATHS.iter().copied())
                .help("Files to scan; directories are searched recursively"),
        )
        .arg(
            Arg::new("validator")
                .long("validator")
                .env("SHADER_VALIDATOR")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_VALIDATOR)
                .help("Shader compiler used to check each shader"),
        )
        .arg(
            Arg::new("validator-arg")
                .long("validator-arg")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Extra argument for the validator, placed before the shader path"),
        )
        .arg(
            Arg::new("extension")
                .long("extension")
                .action(ArgAction::Append)
                .default_value("swift")
                .help("Extension of files to scan inside directories"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("List the embedded shaders instead of validating them"),
        )
}

impl Config {
    pub fn from_env() -> Config {
        Config::from_matches(&command().get_matches())
    }

    pub fn from_matches(matches: &ArgMatches) -> Config {
        fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
            matches
                .get_many::<String>(id)
                .map(|values| values.cloned().collect())
                .unwrap_or_default()
        }

        Config {
            paths: matches
                .get_many::<PathBuf>("paths")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            extensions: strings(matches, "extension"),
            validator: matches
                .get_one::<PathBuf>("validator")
                .cloned()
                .unwrap_or_else(|| DEFAULT_VALIDATOR.into()),
            validator_args: strings(matches, "validator-arg"),
            list: matches.get_flag("list"),
        }
    }
}
